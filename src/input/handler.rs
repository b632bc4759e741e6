use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::keybindings::{Action, KeyBindings, KeyContext};
use crate::app::state::{AppState, Level, ModalState};

#[derive(Debug, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    Quit,
    Action(Action),
    Char(char),
    Backspace,
    Resize(u16, u16),
}

pub fn handle_input(event: Event, state: &AppState, bindings: &KeyBindings) -> InputResult {
    match event {
        Event::Key(key_event) if key_event.kind != KeyEventKind::Release => {
            handle_key(key_event, state, bindings)
        }
        Event::Resize(width, height) => InputResult::Resize(width, height),
        _ => InputResult::Continue,
    }
}

fn handle_key(key: KeyEvent, state: &AppState, bindings: &KeyBindings) -> InputResult {
    // Ctrl-C always exits, even behind a modal
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return InputResult::Quit;
    }

    if state.modal.is_active() {
        return handle_modal_input(key, &state.modal);
    }

    if is_search_input_mode(state) {
        return handle_search_input(key, state.view.level);
    }

    if is_find_input_mode(state) {
        return handle_find_input(key);
    }

    let context = KeyContext::for_level(state.view.level);
    match bindings.get(context, &key) {
        Some(action) => InputResult::Action(action),
        None => InputResult::Continue,
    }
}

fn is_search_input_mode(state: &AppState) -> bool {
    state.search.inline_active
}

fn handle_search_input(key: KeyEvent, level: Level) -> InputResult {
    match key.code {
        KeyCode::Enter => InputResult::Action(Action::Open),
        KeyCode::Esc => InputResult::Action(Action::Back),
        KeyCode::Tab if level == Level::MessageList => {
            InputResult::Action(Action::ToggleSearchMode)
        }
        KeyCode::Backspace => InputResult::Backspace,
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            InputResult::Char(c)
        }
        _ => InputResult::Continue,
    }
}

fn is_find_input_mode(state: &AppState) -> bool {
    state.view.level == Level::MessageDetail && state.view.detail_state.find.active
}

fn handle_find_input(key: KeyEvent) -> InputResult {
    match key.code {
        KeyCode::Enter => InputResult::Action(Action::Open),
        KeyCode::Esc => InputResult::Action(Action::Back),
        KeyCode::Backspace => InputResult::Backspace,
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            InputResult::Char(c)
        }
        _ => InputResult::Continue,
    }
}

fn handle_modal_input(key: KeyEvent, modal: &ModalState) -> InputResult {
    let action = match modal {
        ModalState::None | ModalState::Busy { .. } => None,
        ModalState::DeleteConfirm { .. } => match key.code {
            KeyCode::Char('y' | 'Y') => Some(Action::Confirm),
            KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(Action::Cancel),
            _ => None,
        },
        ModalState::QuitConfirm => match key.code {
            KeyCode::Char('y' | 'Y') | KeyCode::Enter => Some(Action::Confirm),
            KeyCode::Char('n' | 'N' | 'q') | KeyCode::Esc => Some(Action::Cancel),
            _ => None,
        },
        ModalState::DeleteResult { .. } | ModalState::ExportResult { .. } => {
            Some(Action::Cancel)
        }
        ModalState::AccountSelector { .. } | ModalState::AttachmentFilter { .. } => {
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => Some(Action::Up),
                KeyCode::Down | KeyCode::Char('j') => Some(Action::Down),
                KeyCode::Enter => Some(Action::Confirm),
                KeyCode::Esc => Some(Action::Cancel),
                _ => None,
            }
        }
        ModalState::ExportAttachments { .. } => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Action::Up),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::Down),
            KeyCode::Char(' ') => Some(Action::ToggleSelect),
            KeyCode::Char('a') => Some(Action::SelectAll),
            KeyCode::Char('n') => Some(Action::SelectNone),
            KeyCode::Enter => Some(Action::Confirm),
            KeyCode::Esc => Some(Action::Cancel),
            _ => None,
        },
        // Scroll keys scroll, anything else closes
        ModalState::Help { .. } => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Action::Up),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::Down),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::PageDown => Some(Action::PageDown),
            _ => Some(Action::Cancel),
        },
    };
    action.map_or(InputResult::Continue, InputResult::Action)
}
