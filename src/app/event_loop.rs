//! Main event loop and completion processing

use anyhow::Result;
use crossterm::event;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::input::{InputResult, handle_input};

use super::App;
use super::fetch::{self, Completion};
use super::render_thread::RenderThread;

impl App {
    pub(crate) async fn event_loop(
        &mut self,
        render_thread: &RenderThread,
        tx: UnboundedSender<Completion>,
        mut rx: UnboundedReceiver<Completion>,
    ) -> Result<()> {
        self.start();

        loop {
            // Process completions FIRST (non-blocking) - prioritize responsiveness
            while let Ok(completion) = rx.try_recv() {
                self.handle_completion(completion);
                self.dirty = true;
            }

            // Hand queued commands to blocking workers
            self.flush_commands(&tx);

            // Expire errors and flash notices, animate the spinner
            if self.state.tick() {
                self.dirty = true;
            }

            // Render only when dirty (non-blocking - sends to render thread)
            if self.dirty && render_thread.render(self.state.clone()) {
                self.dirty = false;
            }

            if self.state.quitting {
                break;
            }

            // Handle input (adaptive timeout: faster while waiting on data)
            let poll_timeout = if self.state.is_busy() { 40 } else { 150 };
            if event::poll(Duration::from_millis(poll_timeout))? {
                let evt = event::read()?;
                // Any input event (including resize) requires re-render
                self.dirty = true;
                match handle_input(evt, &self.state, &self.bindings) {
                    InputResult::Quit => break,
                    InputResult::Action(action) => self.handle_action(action),
                    InputResult::Char(c) => self.handle_char(c),
                    InputResult::Backspace => self.handle_backspace(),
                    InputResult::Resize(width, height) => self.handle_resize(width, height),
                    InputResult::Continue => {}
                }
            }
        }

        Ok(())
    }

    fn flush_commands(&mut self, tx: &UnboundedSender<Completion>) {
        for cmd in self.outbox.drain(..) {
            fetch::dispatch(self.collab.clone(), cmd, tx.clone());
        }
    }

    pub(crate) fn handle_resize(&mut self, width: u16, height: u16) {
        self.state.set_terminal_size(width, height);
        self.refresh_detail_layout();
        self.state.view.ensure_cursor_visible(self.state.page_size);
    }
}
