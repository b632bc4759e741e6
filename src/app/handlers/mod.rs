//! Completion handlers for the application
//!
//! Every async result comes back through [`App::handle_completion`]. Fetch
//! results are applied only while their tag is current and the view is still
//! at a level that displays them; anything else is dropped.

mod data;
mod operations;

use super::App;
use super::fetch::Completion;

impl App {
    pub(crate) fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Aggregates { tag, result } => self.on_aggregates(tag, result),
            Completion::Messages { tag, result } => self.on_messages(tag, result),
            Completion::Detail { tag, result } => self.on_detail(tag, result),
            Completion::Thread {
                tag,
                conversation_id,
                result,
            } => self.on_thread(tag, conversation_id, result),
            Completion::Search {
                tag,
                append,
                result,
            } => self.on_search(tag, append, result),
            Completion::Stats(result) => match result {
                Ok(stats) => self.state.stats = Some(stats),
                Err(e) => tracing::warn!("Failed to load stats: {}", e),
            },
            Completion::Accounts(result) => match result {
                Ok(accounts) => self.state.accounts = accounts,
                Err(e) => tracing::warn!("Failed to load accounts: {}", e),
            },
            Completion::DebounceFired { token, query } => self.debounce_fired(token, query),
            Completion::DeletionStaged(result) => self.on_deletion_staged(result),
            Completion::ManifestSaved(result) => self.on_manifest_saved(result),
            Completion::Exported(result) => self.on_exported(result),
        }
    }
}
