//! Application core - owns the session state and coordinates fetches

mod actions;
pub mod breadcrumbs;
pub mod controller;
pub mod debounce;
mod event_loop;
pub mod fetch;
mod handlers;
pub mod layout;
pub mod render_thread;
pub mod requests;
pub mod selection;
pub mod state;

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use render_thread::RenderThread;

use crate::config::Config;
use crate::input::KeyBindings;
use debounce::SearchDebouncer;
use fetch::{Collaborators, Command};
use state::AppState;

pub struct App {
    pub(crate) config: Config,
    pub(crate) collab: Collaborators,
    pub(crate) state: AppState,
    pub(crate) bindings: KeyBindings,
    /// Commands queued by handlers, dispatched by the event loop
    pub(crate) outbox: Vec<Command>,
    /// Dirty flag: when true, UI needs re-render. Skips renders when nothing changed.
    pub(crate) dirty: bool,
}

impl App {
    pub fn new(config: Config, collab: Collaborators) -> Self {
        let mut state = AppState {
            date_format: config.ui.date_format.clone(),
            ..AppState::default()
        };
        state.search.default_mode = config.search.default_mode;
        state.search.mode = config.search.default_mode;
        state.search.page_size = config.search.page_size.max(1);
        state.search.debouncer = SearchDebouncer::new(
            Duration::from_millis(config.search.fast_debounce_ms),
            Duration::from_millis(config.search.deep_debounce_ms),
        );

        Self {
            config,
            collab,
            state,
            bindings: KeyBindings::new(),
            outbox: Vec::new(),
            dirty: true, // Start dirty for initial render
        }
    }

    pub(crate) fn queue(&mut self, cmd: Command) {
        self.outbox.push(cmd);
    }

    /// Initial loads: top-level aggregates, archive stats and accounts
    pub(crate) fn start(&mut self) {
        self.load_aggregates();
        self.load_stats();
        self.queue(Command::LoadAccounts);
    }

    pub async fn run(&mut self) -> Result<()> {
        // Spawn background render thread (owns terminal setup/teardown)
        let render_thread = RenderThread::spawn(self.config.ui.theme)?;

        if let Ok((width, height)) = crossterm::terminal::size() {
            self.state.set_terminal_size(width, height);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let result = self.event_loop(&render_thread, tx, rx).await;

        // Shutdown render thread (handles terminal cleanup)
        render_thread.shutdown();

        result
    }
}
