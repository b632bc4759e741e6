//! Background render thread for non-blocking UI rendering.
//!
//! The render thread owns the Terminal and renders snapshots of AppState
//! sent from the main event loop. This keeps the event loop responsive
//! to completions and user input.

use std::io;
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use super::state::AppState;
use crate::config::ThemeVariant;

/// Command sent to the render thread.
pub enum RenderCommand {
    /// Render this state snapshot
    Render(Box<AppState>),
    /// Shutdown the render thread
    Shutdown,
}

/// Handle to the background render thread.
pub struct RenderThread {
    /// Channel to send render commands
    cmd_tx: SyncSender<RenderCommand>,
    /// Thread join handle
    handle: Option<JoinHandle<()>>,
}

impl RenderThread {
    /// Spawn a new render thread.
    ///
    /// The render thread takes ownership of terminal setup/teardown.
    /// Returns the handle for sending render commands.
    pub fn spawn(theme: ThemeVariant) -> io::Result<Self> {
        // Channel with capacity 1 - we only care about the latest state
        let (cmd_tx, cmd_rx) = mpsc::sync_channel::<RenderCommand>(1);

        crate::ui::theme::init_theme(theme);

        let handle = thread::Builder::new()
            .name("render".into())
            .spawn(move || {
                // Setup terminal in the render thread
                if let Err(e) = enable_raw_mode() {
                    tracing::error!("Failed to enable raw mode: {}", e);
                    return;
                }

                let mut stdout = io::stdout();
                if let Err(e) = execute!(stdout, EnterAlternateScreen) {
                    tracing::error!("Failed to enter alternate screen: {}", e);
                    disable_raw_mode().ok();
                    return;
                }

                let backend = CrosstermBackend::new(stdout);
                let mut terminal = match Terminal::new(backend) {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::error!("Failed to create terminal: {}", e);
                        disable_raw_mode().ok();
                        return;
                    }
                };

                // Render loop
                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        RenderCommand::Render(state) => {
                            if let Err(e) = terminal.draw(|f| crate::ui::render(f, &state)) {
                                tracing::error!("Render error: {}", e);
                            }
                        }
                        RenderCommand::Shutdown => break,
                    }
                }

                // Cleanup terminal
                disable_raw_mode().ok();
                execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
            })?;

        Ok(Self {
            cmd_tx,
            handle: Some(handle),
        })
    }

    /// Request a render of the given state (non-blocking).
    ///
    /// Returns false when the render thread is still busy with the previous
    /// frame; the caller keeps the state dirty and retries on the next turn.
    pub fn render(&self, state: AppState) -> bool {
        match self.cmd_tx.try_send(RenderCommand::Render(Box::new(state))) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::trace!("Render thread busy, deferring frame");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::error!("Render thread disconnected");
                true
            }
        }
    }

    /// Shutdown the render thread and wait for it to finish.
    pub fn shutdown(mut self) {
        // Send shutdown command (blocking to ensure it's received)
        let _ = self.cmd_tx.send(RenderCommand::Shutdown);

        // Wait for thread to finish
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}
