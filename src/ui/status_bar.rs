//! Title bar with archive or context statistics, and the info line below the table

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use super::widgets::{error_bar, format_count, format_size, truncate_to_width};
use crate::app::state::{AppState, Level};

/// Left and right halves of the title bar
pub fn title_text(state: &AppState) -> (String, String) {
    let account = state.account_label().unwrap_or("All accounts");
    let mut left = format!("vaultnav │ {}", account);
    if let Some(stats) = state.header_stats() {
        left.push_str(&format!(
            " │ {} msgs │ {}",
            format_count(stats.message_count),
            format_size(stats.total_size)
        ));
        if stats.attachment_count > 0 {
            left.push_str(&format!(
                " │ {} attachments ({})",
                format_count(stats.attachment_count),
                format_size(stats.attachment_size)
            ));
        }
    }

    let mut right = String::new();
    if state.attachments_only {
        right.push_str("[with attachments] ");
    }
    if state.is_busy() {
        right.push_str(state.status.spinner());
        right.push_str(" Loading");
    }
    (left, right)
}

pub fn render_title_bar(frame: &mut Frame, area: Rect, state: &AppState) {
    let style = Theme::title_bar();
    let (left, right) = title_text(state);
    let width = area.width as usize;
    let right_width = right.width() + 2;
    let left = truncate_to_width(&format!(" {}", left), width.saturating_sub(right_width));
    let padding = width.saturating_sub(left.width() + right_width);

    let line = Line::from(vec![
        Span::styled(left, style),
        Span::styled(" ".repeat(padding), style),
        Span::styled(format!(" {} ", right), style),
    ]);
    frame.render_widget(Paragraph::new(line).style(style), area);
}

/// Summary of the current view shown when nothing else claims the info line
pub fn context_info(state: &AppState) -> String {
    let view = &state.view;
    let mut parts: Vec<String> = Vec::new();
    match view.level {
        Level::Aggregates | Level::SubAggregate => {
            parts.push(format!(
                "{} {}",
                format_count(view.rows.len() as i64),
                view.dimension.label().to_lowercase()
            ));
            if view.dimension == crate::query::Dimension::Time {
                parts.push(format!("by {}", view.granularity.label().to_lowercase()));
            }
            parts.push(format!(
                "sort: {} {}",
                view.aggregate_sort.field.label(),
                view.aggregate_sort.direction.arrow()
            ));
            if view.is_searching() {
                parts.push(format!("search: {}", view.search_query));
            }
        }
        Level::MessageList => {
            if view.is_searching() {
                let total = match state.search.total_count {
                    -1 => "?".to_string(),
                    n => format_count(n),
                };
                parts.push(format!(
                    "{} of {} results for \"{}\" ({})",
                    format_count(view.messages.len() as i64),
                    total,
                    view.search_query,
                    state.search.mode.label()
                ));
                if state.search.loading_more {
                    parts.push("loading more...".to_string());
                }
            } else {
                parts.push(format!("{} messages", format_count(view.messages.len() as i64)));
            }
            parts.push(format!(
                "sort: {} {}",
                view.message_sort.field.label(),
                view.message_sort.direction.arrow()
            ));
        }
        Level::MessageDetail => {
            let find = &view.detail_state.find;
            if !find.query.is_empty() {
                if find.matches.is_empty() {
                    parts.push(format!("no matches for \"{}\"", find.query));
                } else {
                    parts.push(format!(
                        "match {}/{} for \"{}\"",
                        find.match_index + 1,
                        find.matches.len(),
                        find.query
                    ));
                }
            }
            let source_len = if view.detail_state.from_thread {
                view.thread.messages.len()
            } else {
                view.messages.len()
            };
            if source_len > 0 {
                parts.push(format!("message {}/{}", view.detail_state.index + 1, source_len));
            }
            if let Some(detail) = &view.detail
                && !detail.attachments.is_empty()
            {
                parts.push(format!("{} attachments", detail.attachments.len()));
            }
        }
        Level::ThreadView => {
            parts.push(format!(
                "{} messages in conversation",
                format_count(view.thread.messages.len() as i64)
            ));
            if view.thread.truncated {
                parts.push("truncated".to_string());
            }
        }
    }

    if !state.selection.is_empty() {
        parts.push(format!("{} selected", state.selection.len()));
    }
    parts.join(" │ ")
}

/// Input bars first, then errors, then flash notices, then the view summary
pub fn render_info_line(frame: &mut Frame, area: Rect, state: &AppState) {
    let width = area.width as usize;

    if state.search.inline_active {
        let mut spans = vec![
            Span::styled(format!(" [{}] / ", state.search.mode.label()), Theme::text_accent()),
            Span::styled(state.search.input.clone(), Theme::text()),
            Span::styled("│", Theme::text_accent()),
        ];
        if state.search.inline_loading {
            spans.push(Span::styled(
                format!(" {}", state.status.spinner()),
                Theme::text_muted(),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
        return;
    }

    let find = &state.view.detail_state.find;
    if state.view.level == Level::MessageDetail && find.active {
        let line = Line::from(vec![
            Span::styled(" Find: ", Theme::text_accent()),
            Span::styled(find.input.clone(), Theme::text()),
            Span::styled("│", Theme::text_accent()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    if let Some(error) = &state.status.error {
        error_bar(frame, area, error);
        return;
    }

    if let Some(flash) = &state.status.flash {
        let text = truncate_to_width(&format!(" {}", flash), width);
        frame.render_widget(Paragraph::new(text).style(Theme::text_warning()), area);
        return;
    }

    let text = truncate_to_width(&format!(" {}", context_info(state)), width);
    frame.render_widget(Paragraph::new(text).style(Theme::text_secondary()), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{AccountInfo, AggregateRow, TotalStats};

    #[test]
    fn test_title_prefers_context_stats() {
        let mut state = AppState {
            stats: Some(TotalStats {
                message_count: 1200,
                total_size: 2048,
                ..TotalStats::default()
            }),
            ..AppState::default()
        };
        state.status.loading = false;
        let (left, right) = title_text(&state);
        assert_eq!(left, "vaultnav │ All accounts │ 1,200 msgs │ 2 KB");
        assert!(right.is_empty());

        state.view.context_stats = Some(TotalStats {
            message_count: 7,
            attachment_count: 2,
            attachment_size: 512,
            ..TotalStats::default()
        });
        state.accounts = vec![AccountInfo {
            id: 3,
            identifier: "me@example.com".into(),
            ..AccountInfo::default()
        }];
        state.account_filter = Some(3);
        let (left, _) = title_text(&state);
        assert_eq!(
            left,
            "vaultnav │ me@example.com │ 7 msgs │ 0 B │ 2 attachments (512 B)"
        );
    }

    #[test]
    fn test_context_info_per_level() {
        let mut state = AppState::default();
        state.view.rows = vec![AggregateRow::default(); 3];
        assert_eq!(context_info(&state), "3 senders │ sort: Count ↓");

        state.view.level = Level::MessageList;
        state.view.search_query = "invoice".into();
        state.search.total_count = -1;
        assert_eq!(
            context_info(&state),
            "0 of ? results for \"invoice\" (Fast) │ sort: Date ↓"
        );

        state.selection.toggle_message(4);
        assert!(context_info(&state).ends_with("│ 1 selected"));
    }
}
