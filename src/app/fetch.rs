//! Async boundary between the reactor and the archive collaborators.
//!
//! The reactor queues [`Command`]s; [`dispatch`] runs each one on a blocking
//! worker and reports a [`Completion`] over the completion channel.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use crate::deletion::{self, Manifest};
use crate::export::ExportOutcome;
use crate::query::{
    AccountInfo, AggregateOptions, AggregateRow, Dimension, Engine, MessageDetail, MessageFilter,
    MessageSort, MessageSortField, MessageSummary, SortDirection, StatsOptions, TotalStats,
};
use crate::search::{self, SearchEngine, SearchMode};
use crate::constants::THREAD_MESSAGE_LIMIT;

use super::controller::{ActionController, ExportRequest, StageRequest};

/// Handles to everything the explorer reads from or writes to
#[derive(Clone)]
pub struct Collaborators {
    pub engine: Arc<dyn Engine>,
    pub search: Arc<dyn SearchEngine>,
    pub deletions: Arc<deletion::Manager>,
    pub attachments_dir: PathBuf,
    pub export_dir: PathBuf,
}

/// Work requested by the reactor. Commands own their inputs.
#[derive(Debug, Clone)]
pub enum Command {
    LoadAggregates {
        tag: u64,
        dimension: Dimension,
        /// Present for sub-aggregation under a drill filter
        drill: Option<MessageFilter>,
        opts: AggregateOptions,
    },
    LoadMessages {
        tag: u64,
        filter: MessageFilter,
    },
    LoadDetail {
        tag: u64,
        id: i64,
    },
    LoadThread {
        tag: u64,
        conversation_id: i64,
    },
    Search {
        tag: u64,
        query: String,
        mode: SearchMode,
        filter: MessageFilter,
        offset: usize,
        limit: usize,
        append: bool,
    },
    LoadStats(StatsOptions),
    LoadAccounts,
    /// Fire [`Completion::DebounceFired`] after `delay`
    Debounce {
        token: u64,
        query: String,
        delay: Duration,
    },
    StageDeletion(Box<StageRequest>),
    SaveManifest(Box<Manifest>),
    ExportAttachments(Box<ExportRequest>),
}

/// One page of search results
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub messages: Vec<MessageSummary>,
    /// `-1` when the backend cannot count matches
    pub total_count: i64,
    pub stats: Option<TotalStats>,
}

#[derive(Debug, Clone)]
pub enum Completion {
    Aggregates {
        tag: u64,
        result: Result<Vec<AggregateRow>, String>,
    },
    Messages {
        tag: u64,
        result: Result<Vec<MessageSummary>, String>,
    },
    Detail {
        tag: u64,
        result: Result<MessageDetail, String>,
    },
    Thread {
        tag: u64,
        conversation_id: i64,
        /// Messages and whether the conversation was truncated
        result: Result<(Vec<MessageSummary>, bool), String>,
    },
    Search {
        tag: u64,
        append: bool,
        result: Result<SearchPage, String>,
    },
    Stats(Result<TotalStats, String>),
    Accounts(Result<Vec<AccountInfo>, String>),
    DebounceFired {
        token: u64,
        query: String,
    },
    DeletionStaged(Result<Manifest, String>),
    ManifestSaved(Result<Manifest, String>),
    Exported(Result<ExportOutcome, String>),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::LoadAggregates { .. } => "aggregates",
            Self::LoadMessages { .. } => "messages",
            Self::LoadDetail { .. } => "detail",
            Self::LoadThread { .. } => "thread",
            Self::Search { .. } => "search",
            Self::LoadStats(_) => "stats",
            Self::LoadAccounts => "accounts",
            Self::Debounce { .. } => "debounce",
            Self::StageDeletion(_) => "stage deletion",
            Self::SaveManifest(_) => "save manifest",
            Self::ExportAttachments(_) => "export",
        }
    }

    /// Error completion carrying this command's tag
    pub fn failed(self, error: String) -> Completion {
        match self {
            Self::LoadAggregates { tag, .. } => Completion::Aggregates {
                tag,
                result: Err(error),
            },
            Self::LoadMessages { tag, .. } => Completion::Messages {
                tag,
                result: Err(error),
            },
            Self::LoadDetail { tag, .. } => Completion::Detail {
                tag,
                result: Err(error),
            },
            Self::LoadThread {
                tag,
                conversation_id,
            } => Completion::Thread {
                tag,
                conversation_id,
                result: Err(error),
            },
            Self::Search { tag, append, .. } => Completion::Search {
                tag,
                append,
                result: Err(error),
            },
            Self::LoadStats(_) => Completion::Stats(Err(error)),
            Self::LoadAccounts => Completion::Accounts(Err(error)),
            Self::Debounce { token, query, .. } => Completion::DebounceFired { token, query },
            Self::StageDeletion(_) => Completion::DeletionStaged(Err(error)),
            Self::SaveManifest(_) => Completion::ManifestSaved(Err(error)),
            Self::ExportAttachments(_) => Completion::Exported(Err(error)),
        }
    }
}

/// Run `cmd` against the collaborators on the calling thread
pub fn execute(collab: &Collaborators, cmd: Command) -> Completion {
    let engine = collab.engine.as_ref();
    match cmd {
        Command::LoadAggregates {
            tag,
            dimension,
            drill,
            opts,
        } => {
            let result = match &drill {
                Some(filter) => engine.sub_aggregate(filter, dimension, &opts),
                None => engine.aggregate(dimension, &opts),
            };
            Completion::Aggregates {
                tag,
                result: result.map_err(|e| e.to_string()),
            }
        }
        Command::LoadMessages { tag, filter } => Completion::Messages {
            tag,
            result: engine.list_messages(&filter).map_err(|e| e.to_string()),
        },
        Command::LoadDetail { tag, id } => Completion::Detail {
            tag,
            result: engine.get_message(id).map_err(|e| e.to_string()),
        },
        Command::LoadThread {
            tag,
            conversation_id,
        } => Completion::Thread {
            tag,
            conversation_id,
            result: load_thread(engine, conversation_id).map_err(|e| e.to_string()),
        },
        Command::Search {
            tag,
            query,
            mode,
            filter,
            offset,
            limit,
            append,
        } => Completion::Search {
            tag,
            append,
            result: run_search(collab.search.as_ref(), &query, mode, &filter, offset, limit),
        },
        Command::LoadStats(opts) => {
            Completion::Stats(engine.total_stats(&opts).map_err(|e| e.to_string()))
        }
        Command::LoadAccounts => {
            Completion::Accounts(engine.list_accounts().map_err(|e| e.to_string()))
        }
        // Timers are handled by `dispatch`; executed inline they fire at once
        Command::Debounce { token, query, .. } => Completion::DebounceFired { token, query },
        Command::StageDeletion(req) => Completion::DeletionStaged(
            ActionController::new(collab)
                .stage(&req)
                .map_err(|e| e.to_string()),
        ),
        Command::SaveManifest(manifest) => Completion::ManifestSaved(
            ActionController::new(collab)
                .confirm(&manifest)
                .map(|_| *manifest)
                .map_err(|e| e.to_string()),
        ),
        Command::ExportAttachments(req) => Completion::Exported(
            ActionController::new(collab)
                .export(&req)
                .map_err(|e| e.to_string()),
        ),
    }
}

fn load_thread(
    engine: &dyn Engine,
    conversation_id: i64,
) -> Result<(Vec<MessageSummary>, bool), crate::query::QueryError> {
    let filter = MessageFilter {
        conversation_id: Some(conversation_id),
        sort: MessageSort {
            field: MessageSortField::Date,
            direction: SortDirection::Asc,
        },
        // One extra row detects truncation
        limit: THREAD_MESSAGE_LIMIT + 1,
        ..MessageFilter::default()
    };
    let mut messages = engine.list_messages(&filter)?;
    let truncated = messages.len() > THREAD_MESSAGE_LIMIT;
    messages.truncate(THREAD_MESSAGE_LIMIT);
    Ok((messages, truncated))
}

fn run_search(
    engine: &dyn SearchEngine,
    text: &str,
    mode: SearchMode,
    filter: &MessageFilter,
    offset: usize,
    limit: usize,
) -> Result<SearchPage, String> {
    let query = search::parse(text);
    match mode {
        SearchMode::Fast => engine
            .search_fast(&query, filter, limit, offset)
            .map(|page| SearchPage {
                messages: page.messages,
                total_count: page.total_count,
                stats: page.stats,
            })
            .map_err(|e| e.to_string()),
        SearchMode::Deep => {
            let merged = search::merge_filter_into_query(&query, filter);
            let messages = engine
                .search_deep(&merged, limit, offset)
                .map_err(|e| e.to_string())?;
            // A full page means there may be more; the total is unknown
            let total_count = if messages.len() == limit {
                -1
            } else {
                (offset + messages.len()) as i64
            };
            Ok(SearchPage {
                messages,
                total_count,
                stats: None,
            })
        }
    }
}

/// Run `cmd` off the event loop and send its completion on `tx`.
///
/// A panic inside the collaborator becomes an error completion with the
/// same tag.
pub fn dispatch(collab: Collaborators, cmd: Command, tx: UnboundedSender<Completion>) {
    tracing::debug!("Dispatching {} command", cmd.name());

    if let Command::Debounce {
        token,
        query,
        delay,
    } = cmd
    {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tx.send(Completion::DebounceFired { token, query }).ok();
        });
        return;
    }

    tokio::spawn(async move {
        let name = cmd.name();
        let fallback = cmd.clone();
        let completion = match tokio::task::spawn_blocking(move || execute(&collab, cmd)).await {
            Ok(completion) => completion,
            Err(e) => {
                let reason = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    "cancelled".to_string()
                };
                tracing::warn!("{} fetch failed: {}", name, reason);
                fallback.failed(format!("{} failed: {}", name, reason))
            }
        };
        if tx.send(completion).is_err() {
            tracing::debug!("Completion channel closed, dropping {} result", name);
        }
    });
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
