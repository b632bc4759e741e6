use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::state::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Navigation
    Up,
    Down,
    Left,
    Right,
    Top,
    Bottom,
    PageUp,
    PageDown,

    // Views
    Open,
    Back,
    Quit,
    Help,
    NextGrouping,
    PrevGrouping,
    TimeGrouping,
    SubGroup,
    SubGroupOrTop,
    AllMessages,
    Thread,

    // Sorting and filters
    CycleSort,
    ReverseSort,
    AccountFilter,
    AttachmentFilter,

    // Search
    Search,
    ToggleSearchMode,
    NextMatch,
    PrevMatch,

    // Selection
    ToggleSelect,
    SelectVisible,
    ClearSelection,
    StageDeletion,
    Export,

    // Dialogs
    Confirm,
    Cancel,
    SelectAll,
    SelectNone,
}

/// Key table in effect for a view level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Aggregates,
    Messages,
    Detail,
    Thread,
}

impl KeyContext {
    pub fn for_level(level: Level) -> Self {
        match level {
            Level::Aggregates | Level::SubAggregate => Self::Aggregates,
            Level::MessageList => Self::Messages,
            Level::MessageDetail => Self::Detail,
            Level::ThreadView => Self::Thread,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Aggregates => "Aggregates",
            Self::Messages => "Messages",
            Self::Detail => "Message",
            Self::Thread => "Thread",
        }
    }

    const ALL: [KeyContext; 4] = [Self::Aggregates, Self::Messages, Self::Detail, Self::Thread];
}

pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyEvent, Action>>,
}

/// A displayable keybinding entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeybindingEntry {
    pub key: String,
    pub description: String,
    pub category: &'static str,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        let bindings = KeyContext::ALL
            .iter()
            .map(|ctx| {
                let mut map = Self::common_bindings();
                match ctx {
                    KeyContext::Aggregates => Self::aggregate_bindings(&mut map),
                    KeyContext::Messages => Self::message_bindings(&mut map),
                    KeyContext::Detail => Self::detail_bindings(&mut map),
                    KeyContext::Thread => {
                        map.insert(key_code(KeyCode::Enter), Action::Open);
                    }
                }
                (*ctx, map)
            })
            .collect();
        Self { bindings }
    }

    pub fn get(&self, context: KeyContext, event: &KeyEvent) -> Option<Action> {
        let map = self.bindings.get(&context)?;
        map.get(&normalize(event)).copied()
    }

    /// All keybindings as displayable entries, grouped by view
    pub fn all_bindings(&self) -> Vec<KeybindingEntry> {
        let mut entries = Vec::new();
        for ctx in KeyContext::ALL {
            let Some(map) = self.bindings.get(&ctx) else {
                continue;
            };
            // Merge keys that share an action into one entry
            let mut by_action: HashMap<Action, Vec<String>> = HashMap::new();
            for (event, action) in map {
                by_action
                    .entry(*action)
                    .or_default()
                    .push(format_key_event(event));
            }
            let mut group: Vec<_> = by_action
                .into_iter()
                .map(|(action, mut keys)| {
                    keys.sort();
                    (
                        action_order(action),
                        KeybindingEntry {
                            key: keys.join("/"),
                            description: action_description(action, ctx),
                            category: ctx.label(),
                        },
                    )
                })
                .collect();
            group.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.key.cmp(&b.1.key)));
            entries.extend(group.into_iter().map(|(_, entry)| entry));
        }
        entries
    }

    fn common_bindings() -> HashMap<KeyEvent, Action> {
        let mut map = HashMap::new();

        // Navigation
        map.insert(key('j'), Action::Down);
        map.insert(key('k'), Action::Up);
        map.insert(key_code(KeyCode::Down), Action::Down);
        map.insert(key_code(KeyCode::Up), Action::Up);
        map.insert(key_code(KeyCode::PageDown), Action::PageDown);
        map.insert(key_code(KeyCode::PageUp), Action::PageUp);
        map.insert(ctrl_key('d'), Action::PageDown);
        map.insert(ctrl_key('u'), Action::PageUp);
        map.insert(key_code(KeyCode::Home), Action::Top);
        map.insert(key_code(KeyCode::End), Action::Bottom);
        map.insert(key('G'), Action::Bottom);

        map.insert(key_code(KeyCode::Esc), Action::Back);
        map.insert(key('q'), Action::Quit);
        map.insert(key('?'), Action::Help);
        map
    }

    fn list_bindings(map: &mut HashMap<KeyEvent, Action>) {
        map.insert(key_code(KeyCode::Enter), Action::Open);
        map.insert(key('s'), Action::CycleSort);
        map.insert(key('r'), Action::ReverseSort);
        map.insert(key('v'), Action::ReverseSort);
        map.insert(key('A'), Action::AccountFilter);
        map.insert(key('f'), Action::AttachmentFilter);
        map.insert(key('/'), Action::Search);
        map.insert(key(' '), Action::ToggleSelect);
        map.insert(key('S'), Action::SelectVisible);
        map.insert(key('x'), Action::ClearSelection);
        map.insert(key('d'), Action::StageDeletion);
        map.insert(key('D'), Action::StageDeletion);
    }

    fn aggregate_bindings(map: &mut HashMap<KeyEvent, Action>) {
        Self::list_bindings(map);
        map.insert(key('g'), Action::NextGrouping);
        map.insert(key_code(KeyCode::Tab), Action::NextGrouping);
        map.insert(shift_key_code(KeyCode::BackTab), Action::PrevGrouping);
        map.insert(key_code(KeyCode::BackTab), Action::PrevGrouping);
        map.insert(key('t'), Action::TimeGrouping);
        map.insert(key('a'), Action::AllMessages);
    }

    fn message_bindings(map: &mut HashMap<KeyEvent, Action>) {
        Self::list_bindings(map);
        map.insert(key_code(KeyCode::Tab), Action::SubGroup);
        map.insert(key('t'), Action::TimeGrouping);
        map.insert(key('g'), Action::SubGroupOrTop);
        map.insert(key('T'), Action::Thread);
    }

    fn detail_bindings(map: &mut HashMap<KeyEvent, Action>) {
        map.insert(key('g'), Action::Top);
        map.insert(key('h'), Action::Left);
        map.insert(key('l'), Action::Right);
        map.insert(key_code(KeyCode::Left), Action::Left);
        map.insert(key_code(KeyCode::Right), Action::Right);
        map.insert(key('T'), Action::Thread);
        map.insert(key('e'), Action::Export);
        map.insert(key('/'), Action::Search);
        map.insert(key('n'), Action::NextMatch);
        map.insert(key('N'), Action::PrevMatch);
    }
}

/// Terminals disagree on whether an uppercase letter carries SHIFT
fn normalize(event: &KeyEvent) -> KeyEvent {
    match event.code {
        KeyCode::Char(c) => {
            let mut modifiers = event.modifiers;
            modifiers.remove(KeyModifiers::SHIFT);
            KeyEvent::new(KeyCode::Char(c), modifiers)
        }
        code => KeyEvent::new(code, event.modifiers),
    }
}

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

fn ctrl_key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn key_code(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn shift_key_code(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::SHIFT)
}

/// Format a KeyEvent for display
fn format_key_event(event: &KeyEvent) -> String {
    let mut parts = Vec::new();

    if event.modifiers.contains(KeyModifiers::CONTROL) {
        parts.push("Ctrl+");
    }
    if event.modifiers.contains(KeyModifiers::ALT) {
        parts.push("Alt+");
    }

    let key_str = match event.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PgUp".to_string(),
        KeyCode::PageDown => "PgDn".to_string(),
        _ => format!("{:?}", event.code),
    };

    format!("{}{}", parts.join(""), key_str)
}

/// Human-readable description of an action within a view
fn action_description(action: Action, ctx: KeyContext) -> String {
    let text = match (action, ctx) {
        (Action::Up, KeyContext::Detail) => "Scroll up",
        (Action::Down, KeyContext::Detail) => "Scroll down",
        (Action::Up, _) => "Move up",
        (Action::Down, _) => "Move down",
        (Action::Left, _) => "Previous message",
        (Action::Right, _) => "Next message",
        (Action::Top, _) => "Go to top",
        (Action::Bottom, _) => "Go to bottom",
        (Action::PageUp, _) => "Page up",
        (Action::PageDown, _) => "Page down",
        (Action::Open, KeyContext::Aggregates) => "Drill into group",
        (Action::Open, _) => "Open message",
        (Action::Back, KeyContext::Detail) => "Clear find / go back",
        (Action::Back, _) => "Go back / clear search",
        (Action::Quit, _) => "Quit",
        (Action::Help, _) => "Toggle help",
        (Action::NextGrouping, _) => "Next grouping",
        (Action::PrevGrouping, _) => "Previous grouping",
        (Action::TimeGrouping, KeyContext::Aggregates) => "Group by time / cycle granularity",
        (Action::TimeGrouping, _) => "Sub-group by time",
        (Action::SubGroup, _) => "Sub-group messages",
        (Action::SubGroupOrTop, _) => "Sub-group, or back to top",
        (Action::AllMessages, _) => "All messages",
        (Action::Thread, _) => "View conversation",
        (Action::CycleSort, _) => "Cycle sort field",
        (Action::ReverseSort, _) => "Reverse sort",
        (Action::AccountFilter, _) => "Filter by account",
        (Action::AttachmentFilter, _) => "Filter by attachments",
        (Action::Search, KeyContext::Detail) => "Find in message",
        (Action::Search, _) => "Search",
        (Action::ToggleSearchMode, _) => "Toggle fast/deep search",
        (Action::NextMatch, _) => "Next match",
        (Action::PrevMatch, _) => "Previous match",
        (Action::ToggleSelect, _) => "Toggle selection",
        (Action::SelectVisible, _) => "Select visible",
        (Action::ClearSelection, _) => "Clear selection",
        (Action::StageDeletion, _) => "Stage selection for deletion",
        (Action::Export, _) => "Export attachments",
        (Action::Confirm, _) => "Confirm",
        (Action::Cancel, _) => "Cancel",
        (Action::SelectAll, _) => "Select all",
        (Action::SelectNone, _) => "Select none",
    };
    text.to_string()
}

/// Display order within a view's help section
fn action_order(action: Action) -> u8 {
    match action {
        Action::Up
        | Action::Down
        | Action::PageUp
        | Action::PageDown
        | Action::Top
        | Action::Bottom
        | Action::Left
        | Action::Right => 0,
        Action::Open | Action::Back | Action::Thread | Action::AllMessages => 1,
        Action::NextGrouping
        | Action::PrevGrouping
        | Action::TimeGrouping
        | Action::SubGroup
        | Action::SubGroupOrTop => 2,
        Action::CycleSort
        | Action::ReverseSort
        | Action::AccountFilter
        | Action::AttachmentFilter => 3,
        Action::Search | Action::ToggleSearchMode | Action::NextMatch | Action::PrevMatch => 4,
        Action::ToggleSelect
        | Action::SelectVisible
        | Action::ClearSelection
        | Action::StageDeletion
        | Action::Export => 5,
        _ => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_depends_on_context() {
        let bindings = KeyBindings::new();

        assert_eq!(
            bindings.get(KeyContext::Aggregates, &key('g')),
            Some(Action::NextGrouping)
        );
        assert_eq!(
            bindings.get(KeyContext::Messages, &key('g')),
            Some(Action::SubGroupOrTop)
        );
        assert_eq!(bindings.get(KeyContext::Detail, &key('g')), Some(Action::Top));
        assert_eq!(
            bindings.get(KeyContext::Messages, &key_code(KeyCode::Tab)),
            Some(Action::SubGroup)
        );
        assert_eq!(bindings.get(KeyContext::Thread, &key('d')), None);
    }

    #[test]
    fn test_uppercase_with_or_without_shift() {
        let bindings = KeyBindings::new();
        let shifted = KeyEvent::new(KeyCode::Char('S'), KeyModifiers::SHIFT);

        assert_eq!(
            bindings.get(KeyContext::Aggregates, &shifted),
            Some(Action::SelectVisible)
        );
        assert_eq!(
            bindings.get(KeyContext::Aggregates, &key('S')),
            Some(Action::SelectVisible)
        );
        assert_eq!(
            bindings.get(KeyContext::Messages, &shift_key_code(KeyCode::BackTab)),
            None
        );
    }

    #[test]
    fn test_help_entries_group_keys() {
        let entries = KeyBindings::new().all_bindings();
        let bottom = entries
            .iter()
            .find(|e| e.category == "Aggregates" && e.description == "Go to bottom")
            .unwrap();
        assert_eq!(bottom.key, "End/G");
        assert_eq!(entries.first().map(|e| e.category), Some("Aggregates"));
    }
}
