//! Selection and deletion staging

use crate::app::controller::{ActionError, StageRequest};
use crate::app::fetch::Command;
use crate::app::selection::visible_range;
use crate::app::state::{Level, ModalState};

use super::super::App;

impl App {
    pub(crate) fn toggle_select(&mut self) {
        let view = &self.state.view;
        match view.level {
            Level::Aggregates | Level::SubAggregate => {
                if let Some(row) = view.current_row() {
                    self.state.selection.toggle_key(view.dimension, &row.key);
                }
            }
            Level::MessageList => {
                if let Some(msg) = view.current_message() {
                    self.state.selection.toggle_message(msg.id);
                }
            }
            _ => {}
        }
    }

    /// `S`: select every row on the visible page
    pub(crate) fn select_visible(&mut self) {
        let view = &self.state.view;
        let range = visible_range(view.scroll_offset, self.state.page_size, view.item_count());
        match view.level {
            Level::Aggregates | Level::SubAggregate => {
                let keys = view.rows[range].iter().map(|r| r.key.as_str());
                self.state.selection.select_keys(view.dimension, keys);
            }
            Level::MessageList => {
                let ids = view.messages[range].iter().map(|m| m.id);
                self.state.selection.select_messages(ids);
            }
            _ => {}
        }
    }

    /// True when the current level has something selected to stage
    fn has_level_selection(&mut self) -> bool {
        let view = &self.state.view;
        let selection = &mut self.state.selection;
        match view.level {
            Level::Aggregates | Level::SubAggregate => {
                selection.clear_if_stale(view.dimension);
                !selection.aggregate_keys().is_empty()
            }
            Level::MessageList => view
                .messages
                .iter()
                .any(|m| selection.is_message_selected(m.id)),
            _ => false,
        }
    }

    /// `d`/`D`: resolve the selection (or the cursor row) into a deletion batch
    pub(crate) fn stage_deletion(&mut self) {
        if !self.has_level_selection() {
            self.toggle_select();
        }
        let Some(request) = StageRequest::from_state(&self.state) else {
            self.state.modal = ModalState::DeleteResult {
                message: ActionError::NothingSelected.to_string(),
            };
            return;
        };
        tracing::debug!("Staging deletion: {}", request.description);
        self.state.modal = ModalState::Busy {
            message: "Staging messages for deletion...".to_string(),
        };
        self.queue(Command::StageDeletion(Box::new(request)));
    }
}
