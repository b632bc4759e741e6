//! Modal dialog handling

use crate::app::controller::ExportRequest;
use crate::app::fetch::Command;
use crate::app::state::{Level, ModalState};
use crate::input::Action;

use super::super::App;

/// Move a selector cursor over `len` entries, wrapping
fn wrap_cursor(cursor: usize, len: usize, action: Action) -> usize {
    if len == 0 {
        return 0;
    }
    match action {
        Action::Up => (cursor + len - 1) % len,
        Action::Down => (cursor + 1) % len,
        _ => cursor,
    }
}

impl App {
    pub(crate) fn handle_modal_action(&mut self, action: Action) {
        match &mut self.state.modal {
            ModalState::None | ModalState::Busy { .. } => {}
            ModalState::QuitConfirm => match action {
                Action::Confirm => {
                    self.state.modal = ModalState::None;
                    self.state.quitting = true;
                }
                Action::Cancel => self.state.modal = ModalState::None,
                _ => {}
            },
            ModalState::DeleteConfirm { .. } => match action {
                Action::Confirm => self.confirm_deletion(),
                Action::Cancel => {
                    self.state.modal = ModalState::None;
                    self.state.flash("Deletion cancelled");
                }
                _ => {}
            },
            ModalState::DeleteResult { .. } | ModalState::ExportResult { .. } => {
                self.state.modal = ModalState::None;
            }
            ModalState::AccountSelector { cursor } => match action {
                Action::Up | Action::Down => {
                    *cursor = wrap_cursor(*cursor, self.state.accounts.len() + 1, action);
                }
                Action::Confirm => {
                    let cursor = *cursor;
                    self.apply_account_filter(cursor);
                }
                Action::Cancel => self.state.modal = ModalState::None,
                _ => {}
            },
            ModalState::AttachmentFilter { cursor } => match action {
                Action::Up | Action::Down => *cursor = wrap_cursor(*cursor, 2, action),
                Action::Confirm => {
                    let with_attachments = *cursor == 1;
                    self.apply_attachment_filter(with_attachments);
                }
                Action::Cancel => self.state.modal = ModalState::None,
                _ => {}
            },
            ModalState::ExportAttachments { cursor, selected } => match action {
                Action::Up | Action::Down => *cursor = wrap_cursor(*cursor, selected.len(), action),
                Action::ToggleSelect => {
                    if let Some(flag) = selected.get_mut(*cursor) {
                        *flag = !*flag;
                    }
                }
                Action::SelectAll => selected.iter_mut().for_each(|f| *f = true),
                Action::SelectNone => selected.iter_mut().for_each(|f| *f = false),
                Action::Confirm => {
                    let selected = selected.clone();
                    self.start_export(&selected);
                }
                Action::Cancel => self.state.modal = ModalState::None,
                _ => {}
            },
            ModalState::Help { .. } => match action {
                Action::Up => self.help_scroll(-1),
                Action::Down => self.help_scroll(1),
                Action::PageUp => self.help_scroll(-10),
                Action::PageDown => self.help_scroll(10),
                _ => self.state.modal = ModalState::None,
            },
        }
    }

    fn confirm_deletion(&mut self) {
        let ModalState::DeleteConfirm { manifest } = std::mem::take(&mut self.state.modal) else {
            return;
        };
        self.state.modal = ModalState::Busy {
            message: "Saving deletion manifest...".to_string(),
        };
        self.queue(Command::SaveManifest(manifest));
    }

    pub(crate) fn open_account_selector(&mut self) {
        let cursor = self
            .state
            .account_filter
            .and_then(|id| self.state.accounts.iter().position(|a| a.id == id))
            .map_or(0, |idx| idx + 1);
        self.state.modal = ModalState::AccountSelector { cursor };
    }

    pub(crate) fn open_attachment_filter(&mut self) {
        self.state.modal = ModalState::AttachmentFilter {
            cursor: usize::from(self.state.attachments_only),
        };
    }

    /// Cursor 0 clears the account filter
    fn apply_account_filter(&mut self, cursor: usize) {
        self.state.modal = ModalState::None;
        self.state.account_filter = cursor
            .checked_sub(1)
            .and_then(|idx| self.state.accounts.get(idx))
            .map(|a| a.id);
        tracing::debug!("Account filter {:?}", self.state.account_filter);
        self.reload_after_scope_change();
    }

    fn apply_attachment_filter(&mut self, with_attachments: bool) {
        self.state.modal = ModalState::None;
        self.state.attachments_only = with_attachments;
        self.reload_after_scope_change();
    }

    fn reload_after_scope_change(&mut self) {
        if self.state.view.level == Level::MessageList {
            self.refresh_message_list();
        } else {
            self.load_aggregates();
        }
        self.load_stats();
    }

    fn start_export(&mut self, selected: &[bool]) {
        let Some(detail) = self.state.view.detail.as_ref() else {
            self.state.modal = ModalState::None;
            return;
        };
        let attachments: Vec<_> = detail
            .attachments
            .iter()
            .zip(selected)
            .filter(|(_, chosen)| **chosen)
            .map(|(att, _)| att.clone())
            .collect();
        if attachments.is_empty() {
            self.state.flash("No attachments selected");
            return;
        }
        let request = ExportRequest {
            message_id: detail.id,
            subject: detail.subject.clone(),
            attachments,
        };
        self.state.modal = ModalState::Busy {
            message: "Exporting attachments...".to_string(),
        };
        self.queue(Command::ExportAttachments(Box::new(request)));
    }
}
