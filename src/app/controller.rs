//! Deletion staging and attachment export.

use std::path::PathBuf;

use thiserror::Error;

use crate::constants::DELETION_DESCRIPTION_LIMIT;
use crate::deletion::{DeletionError, Filters, Manifest};
use crate::export::{self, ExportError, ExportOutcome};
use crate::query::{AttachmentInfo, Dimension, MessageFilter, QueryError, TimeGranularity};

use super::fetch::Collaborators;
use super::state::{AppState, Level};

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("No messages selected. Use Space to select, S for all visible.")]
    NothingSelected,
    #[error("Error loading messages: {0}")]
    Query(#[from] QueryError),
    #[error("Error saving manifest: {0}")]
    Deletion(#[from] DeletionError),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

/// Everything needed to resolve a selection into origin ids
#[derive(Debug, Clone, Default)]
pub struct StageRequest {
    pub dimension: Dimension,
    /// Granularity the selected time keys were grouped under
    pub granularity: TimeGranularity,
    pub aggregate_keys: Vec<String>,
    /// Filter each aggregate key is added to
    pub base_filter: MessageFilter,
    /// Origin ids of selected, loaded messages
    pub message_source_ids: Vec<String>,
    pub description: String,
    pub filters: Filters,
}

impl StageRequest {
    /// Capture the current selection. None when nothing is selected.
    pub fn from_state(state: &AppState) -> Option<Self> {
        let view = &state.view;
        let selection = &state.selection;

        let aggregate_keys: Vec<String> = if view.level.is_aggregate() {
            selection.aggregate_keys().iter().cloned().collect()
        } else {
            Vec::new()
        };
        let message_source_ids: Vec<String> = if view.level == Level::MessageList {
            view.messages
                .iter()
                .filter(|m| selection.is_message_selected(m.id))
                .map(|m| m.source_message_id.clone())
                .collect()
        } else {
            Vec::new()
        };
        if aggregate_keys.is_empty() && message_source_ids.is_empty() {
            return None;
        }

        let dimension = selection.aggregate_dimension();
        let base_filter = if view.level == Level::SubAggregate {
            view.drill_filter.clone()
        } else {
            MessageFilter {
                source_id: state.account_filter,
                ..MessageFilter::default()
            }
        };

        let description = match aggregate_keys.as_slice() {
            [key] => format!("{}-{}", dimension.label(), key),
            [] => format!("messages-multiple({})", message_source_ids.len()),
            keys => format!("{}-multiple({})", dimension.label(), keys.len()),
        };

        let mut filters = Filters {
            account: account_identifier(state),
            ..Filters::default()
        };
        if let Some(key) = aggregate_keys.first() {
            match dimension {
                Dimension::Sender => filters.senders.push(key.clone()),
                Dimension::Recipient => filters.recipients.push(key.clone()),
                Dimension::Domain => filters.sender_domains.push(key.clone()),
                Dimension::Label => filters.labels.push(key.clone()),
                _ => {}
            }
        }

        Some(Self {
            dimension,
            granularity: view.granularity,
            aggregate_keys,
            base_filter,
            message_source_ids,
            description: description
                .chars()
                .take(DELETION_DESCRIPTION_LIMIT)
                .collect(),
            filters,
        })
    }
}

/// The filtered account, or the only account when there is just one
fn account_identifier(state: &AppState) -> Option<String> {
    match state.account_filter {
        Some(id) => state
            .accounts
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.identifier.clone()),
        None if state.accounts.len() == 1 => Some(state.accounts[0].identifier.clone()),
        None => None,
    }
}

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub message_id: i64,
    pub subject: String,
    pub attachments: Vec<AttachmentInfo>,
}

/// Performs the explorer's side effects against the collaborators
pub struct ActionController<'a> {
    collab: &'a Collaborators,
}

impl<'a> ActionController<'a> {
    pub fn new(collab: &'a Collaborators) -> Self {
        Self { collab }
    }

    /// Resolve the selection into origin ids and build an unsaved manifest
    pub fn stage(&self, req: &StageRequest) -> Result<Manifest, ActionError> {
        let mut ids = Vec::new();
        for key in &req.aggregate_keys {
            let mut filter = req.base_filter.clone();
            filter.set_dimension(req.dimension, key, req.granularity);
            filter.limit = 0;
            ids.extend(self.collab.engine.source_ids_by_filter(&filter)?);
        }
        ids.extend(req.message_source_ids.iter().cloned());
        ids.sort();
        ids.dedup();

        if ids.is_empty() {
            return Err(ActionError::NothingSelected);
        }

        let mut manifest = Manifest::new(&req.description, ids);
        manifest.created_by = "tui".to_string();
        manifest.filters = req.filters.clone();
        tracing::debug!(
            "Staged {} messages as {}",
            manifest.message_count(),
            manifest.id
        );
        Ok(manifest)
    }

    pub fn confirm(&self, manifest: &Manifest) -> Result<PathBuf, ActionError> {
        let path = self.collab.deletions.save_manifest(manifest)?;
        tracing::info!("Saved deletion manifest {}", path.display());
        Ok(path)
    }

    pub fn export(&self, req: &ExportRequest) -> Result<ExportOutcome, ActionError> {
        let zip_path = self
            .collab
            .export_dir
            .join(export::archive_name(&req.subject, req.message_id));
        Ok(export::export_attachments(
            &zip_path,
            &self.collab.attachments_dir,
            &req.attachments,
        )?)
    }
}

/// Result dialog text for a saved manifest
pub fn confirm_message(manifest: &Manifest) -> String {
    format!(
        "Staged {} messages for deletion.\nBatch ID: {}\n\nRun 'vaultnav pending' to review staged batches.",
        manifest.message_count(),
        manifest.id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::fetch::tests::collaborators;
    use crate::query::{AccountInfo, MessageSummary, TimeGranularity};

    fn state_with_accounts() -> AppState {
        AppState {
            accounts: vec![AccountInfo {
                id: 1,
                identifier: "me@example.com".into(),
                ..AccountInfo::default()
            }],
            ..AppState::default()
        }
    }

    #[test]
    fn test_nothing_selected_yields_no_request() {
        assert!(StageRequest::from_state(&AppState::default()).is_none());
    }

    #[test]
    fn test_single_key_description_and_filters() {
        let mut state = state_with_accounts();
        state.selection.toggle_key(Dimension::Sender, "alice@example.com");

        let req = StageRequest::from_state(&state).unwrap();
        assert_eq!(req.description, "Senders-alice@example.com");
        assert_eq!(req.filters.senders, vec!["alice@example.com"]);
        assert_eq!(req.filters.account.as_deref(), Some("me@example.com"));
    }

    #[test]
    fn test_description_is_truncated() {
        let mut state = state_with_accounts();
        state
            .selection
            .toggle_key(Dimension::Sender, "someone.with.a.long.name@example.com");
        let req = StageRequest::from_state(&state).unwrap();
        assert_eq!(req.description.chars().count(), DELETION_DESCRIPTION_LIMIT);
    }

    #[test]
    fn test_multiple_messages_description() {
        let mut state = state_with_accounts();
        state.view.level = Level::MessageList;
        state.view.messages = (1..=3)
            .map(|id| MessageSummary {
                id,
                source_message_id: format!("src-{id}"),
                ..MessageSummary::default()
            })
            .collect();
        state.selection.select_messages([1, 3]);

        let req = StageRequest::from_state(&state).unwrap();
        assert_eq!(req.description, "messages-multiple(2)");
        assert_eq!(req.message_source_ids, vec!["src-1", "src-3"]);
    }

    #[test]
    fn test_stage_resolves_keys_and_confirm_writes_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let collab = collaborators(dir.path());
        let controller = ActionController::new(&collab);

        let mut state = state_with_accounts();
        state.selection.toggle_key(Dimension::Sender, "alice@example.com");
        let manifest = controller
            .stage(&StageRequest::from_state(&state).unwrap())
            .unwrap();
        assert_eq!(manifest.source_ids, vec!["src-1", "src-2", "src-3"]);
        assert_eq!(manifest.created_by, "tui");

        let path = controller.confirm(&manifest).unwrap();
        assert!(path.exists());
        assert!(confirm_message(&manifest).starts_with("Staged 3 messages for deletion."));
    }

    #[test]
    fn test_stage_under_drill_filter() {
        let dir = tempfile::tempdir().unwrap();
        let collab = collaborators(dir.path());

        let mut state = state_with_accounts();
        state.view.level = Level::SubAggregate;
        state
            .view
            .drill_filter
            .set_dimension(Dimension::Sender, "alice@example.com", TimeGranularity::Month);
        state.selection.toggle_key(Dimension::Recipient, "carol@other.org");

        let manifest = ActionController::new(&collab)
            .stage(&StageRequest::from_state(&state).unwrap())
            .unwrap();
        assert_eq!(manifest.source_ids, vec!["src-2", "src-3"]);
    }

    #[test]
    fn test_stage_time_keys_use_view_granularity() {
        let dir = tempfile::tempdir().unwrap();
        let collab = collaborators(dir.path());
        let controller = ActionController::new(&collab);

        // Year rows at the top level
        let mut state = state_with_accounts();
        state.view.dimension = Dimension::Time;
        state.view.granularity = TimeGranularity::Year;
        state.selection.toggle_key(Dimension::Time, "2024");
        let req = StageRequest::from_state(&state).unwrap();
        assert_eq!(req.granularity, TimeGranularity::Year);
        assert_eq!(controller.stage(&req).unwrap().message_count(), 5);

        // Drill made under Year, sub-aggregate stepped to Month since
        let mut state = state_with_accounts();
        state.view.level = Level::SubAggregate;
        state
            .view
            .drill_filter
            .set_dimension(Dimension::Sender, "alice@example.com", TimeGranularity::Year);
        state.view.dimension = Dimension::Time;
        state.view.granularity = TimeGranularity::Month;
        state.selection.toggle_key(Dimension::Time, "2024-02");
        let manifest = controller
            .stage(&StageRequest::from_state(&state).unwrap())
            .unwrap();
        assert_eq!(manifest.source_ids, vec!["src-2", "src-3"]);
    }

    #[test]
    fn test_stage_with_no_matches_is_nothing_selected() {
        let dir = tempfile::tempdir().unwrap();
        let collab = collaborators(dir.path());
        let mut state = state_with_accounts();
        state.selection.toggle_key(Dimension::Sender, "nobody@nowhere");

        let err = ActionController::new(&collab)
            .stage(&StageRequest::from_state(&state).unwrap())
            .unwrap_err();
        assert!(matches!(err, ActionError::NothingSelected));
    }
}
