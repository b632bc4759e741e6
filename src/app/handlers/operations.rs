//! Deletion staging and attachment export results

use crate::app::controller::confirm_message;
use crate::app::state::ModalState;
use crate::deletion::Manifest;
use crate::export::ExportOutcome;

use super::super::App;

impl App {
    pub(super) fn on_deletion_staged(&mut self, result: Result<Manifest, String>) {
        self.state.modal = match result {
            Ok(manifest) => ModalState::DeleteConfirm {
                manifest: Box::new(manifest),
            },
            Err(message) => ModalState::DeleteResult { message },
        };
    }

    pub(super) fn on_manifest_saved(&mut self, result: Result<Manifest, String>) {
        self.state.modal = match result {
            Ok(manifest) => {
                self.state.selection.clear();
                ModalState::DeleteResult {
                    message: confirm_message(&manifest),
                }
            }
            Err(message) => {
                tracing::warn!("Saving manifest failed: {}", message);
                ModalState::DeleteResult { message }
            }
        };
    }

    pub(super) fn on_exported(&mut self, result: Result<ExportOutcome, String>) {
        let message = match result {
            Ok(outcome) => {
                tracing::info!(
                    "Exported {} attachments to {}",
                    outcome.exported_count,
                    outcome.path.display()
                );
                outcome.summary()
            }
            Err(message) => message,
        };
        self.state.modal = ModalState::ExportResult { message };
    }
}

#[cfg(test)]
mod tests {
    use crate::app::actions::tests::app_in;
    use crate::app::fetch::Completion;
    use crate::app::state::ModalState;
    use crate::deletion::Manifest;

    #[test]
    fn test_failures_surface_in_result_modal() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.state.selection.toggle_message(3);

        app.handle_completion(Completion::ManifestSaved(Err("Error saving manifest: denied".into())));
        assert!(matches!(
            &app.state.modal,
            ModalState::DeleteResult { message } if message.contains("denied")
        ));
        // A failed save keeps the selection for another try
        assert!(app.state.selection.is_message_selected(3));

        app.handle_completion(Completion::Exported(Err("Export failed: disk full".into())));
        assert!(matches!(
            &app.state.modal,
            ModalState::ExportResult { message } if message == "Export failed: disk full"
        ));
    }

    #[test]
    fn test_staged_manifest_awaits_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        let manifest = Manifest::new("Sender-a", vec!["x".into(), "y".into()]);
        app.handle_completion(Completion::DeletionStaged(Ok(manifest)));
        let ModalState::DeleteConfirm { manifest } = &app.state.modal else {
            panic!("expected confirmation");
        };
        assert_eq!(manifest.message_count(), 2);
    }
}
