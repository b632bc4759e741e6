//! Terminal rendering of `AppState` snapshots

mod aggregates;
mod components;
mod detail;
mod messages;
mod popups;
mod status_bar;
pub mod theme;
mod widgets;

use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    widgets::{Block, Paragraph},
};

use crate::app::state::{AppState, Level};
use crate::query::filter::EMPTY_KEY_LABEL;
use theme::{Theme, symbols};
use widgets::{help_bar, truncate_to_width};

/// Path from the top level to the current view
pub fn breadcrumb_text(state: &AppState) -> String {
    let view = &state.view;
    let sep = symbols::BREADCRUMB_SEP;

    let scope = if view.has_drill_filter() {
        view.drill_filter.describe()
    } else if view.all_messages {
        "All messages".to_string()
    } else if view.level.is_aggregate() {
        String::new()
    } else {
        let key = if view.filter_key.is_empty() {
            EMPTY_KEY_LABEL
        } else {
            view.filter_key.as_str()
        };
        format!("{}:{}", view.dimension.short_name(), key)
    };

    let mut parts: Vec<String> = Vec::new();
    if !scope.is_empty() {
        parts.push(scope);
    }
    match view.level {
        Level::Aggregates | Level::SubAggregate => parts.push(view.dimension.label().to_string()),
        Level::MessageList => {}
        Level::ThreadView => parts.push("Conversation".to_string()),
        Level::MessageDetail => {
            if view.detail_state.from_thread {
                parts.push("Conversation".to_string());
            }
            let subject = view
                .detail
                .as_ref()
                .map(|d| d.subject.as_str())
                .unwrap_or(view.detail_state.pending_subject.as_str());
            parts.push(if subject.is_empty() {
                "(no subject)".to_string()
            } else {
                subject.to_string()
            });
        }
    }
    if view.is_searching() {
        parts.push(format!("search: {}", view.search_query));
    }
    parts.join(sep)
}

fn footer_hints(state: &AppState) -> &'static [(&'static str, &'static str)] {
    if state.search.inline_active {
        return &[("Enter", "search"), ("Esc", "cancel"), ("Tab", "fast/deep")];
    }
    if state.view.level == Level::MessageDetail && state.view.detail_state.find.active {
        return &[("Enter", "find"), ("Esc", "cancel")];
    }
    match state.view.level {
        Level::Aggregates | Level::SubAggregate => &[
            ("Enter", "drill"),
            ("Tab", "group"),
            ("t", "time"),
            ("s/r", "sort"),
            ("a", "all"),
            ("/", "search"),
            ("Space", "select"),
            ("d", "stage"),
            ("A", "account"),
            ("f", "attachments"),
            ("?", "help"),
            ("q", "quit"),
        ],
        Level::MessageList => &[
            ("Enter", "open"),
            ("Esc", "back"),
            ("Tab", "sub-group"),
            ("T", "thread"),
            ("s/r", "sort"),
            ("/", "search"),
            ("Space", "select"),
            ("d", "stage"),
            ("?", "help"),
        ],
        Level::MessageDetail => &[
            ("j/k", "scroll"),
            ("h/l", "prev/next"),
            ("T", "thread"),
            ("e", "export"),
            ("/", "find"),
            ("n/N", "match"),
            ("Esc", "back"),
        ],
        Level::ThreadView => &[("Enter", "open"), ("Esc", "back"), ("?", "help")],
    }
}

pub fn render(frame: &mut Frame, state: &AppState) {
    let area = frame.area();
    frame.render_widget(Block::default().style(Theme::main_bg()), area);

    let [title, crumbs, header, body, info, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    status_bar::render_title_bar(frame, title, state);

    let path = truncate_to_width(&format!(" {}", breadcrumb_text(state)), crumbs.width as usize);
    frame.render_widget(Paragraph::new(path).style(Theme::text_accent()), crumbs);

    match state.view.level {
        Level::Aggregates | Level::SubAggregate => {
            aggregates::render_aggregates(frame, header, body, state)
        }
        Level::MessageList => messages::render_message_list(frame, header, body, state),
        Level::MessageDetail => detail::render_detail(frame, header, body, state),
        Level::ThreadView => messages::render_thread(frame, header, body, state),
    }

    status_bar::render_info_line(frame, info, state);
    help_bar(frame, footer, footer_hints(state));

    popups::render_modal(frame, area, state);
}
