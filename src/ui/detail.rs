//! Message detail view

use ratatui::{
    Frame,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme::Theme;
use super::widgets::{sanitize_text, truncate_to_width};
use crate::app::layout::detail_lines;
use crate::app::state::AppState;

/// Subject shown above the body; the pending one while the detail loads
fn subject_line(state: &AppState) -> String {
    let subject = match &state.view.detail {
        Some(detail) => detail.subject.as_str(),
        None => state.view.detail_state.pending_subject.as_str(),
    };
    if subject.is_empty() {
        "(no subject)".to_string()
    } else {
        sanitize_text(subject)
    }
}

pub fn render_detail(frame: &mut Frame, header: Rect, body: Rect, state: &AppState) {
    let subject = truncate_to_width(&format!(" {}", subject_line(state)), header.width as usize);
    frame.render_widget(
        Paragraph::new(subject).style(Theme::text_bold().add_modifier(Modifier::UNDERLINED)),
        header,
    );

    let Some(detail) = &state.view.detail else {
        let msg = if state.status.loading {
            "  Loading message..."
        } else {
            "  Message not loaded"
        };
        frame.render_widget(Paragraph::new(msg).style(Theme::text_muted()), body);
        return;
    };

    let detail_state = &state.view.detail_state;
    let find = &detail_state.find;
    let current_match = find.current_line();
    let lines: Vec<Line> = detail_lines(detail, body.width, &state.date_format)
        .into_iter()
        .enumerate()
        .skip(detail_state.scroll)
        .take(body.height as usize)
        .map(|(idx, text)| {
            let text = sanitize_text(&text);
            if current_match == Some(idx) {
                Line::from(Span::styled(text, Theme::find_match()))
            } else if find.matches.binary_search(&idx).is_ok() {
                Line::from(Span::styled(text, Theme::text_warning()))
            } else {
                Line::from(Span::styled(text, Theme::text()))
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), body);
}
