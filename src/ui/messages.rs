//! Message list and conversation thread tables

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme::{Theme, symbols, with_selection_bg};
use super::widgets::{fit_width, format_size, sanitize_text};
use crate::app::selection::visible_range;
use crate::app::state::AppState;
use crate::query::{MessageSortField, MessageSummary};

const DATE_COL: usize = 17;
const FROM_COL: usize = 24;
const SIZE_COL: usize = 9;

fn header_line(width: u16, state: &AppState, sortable: bool) -> Line<'static> {
    let sort = state.view.message_sort;
    let title = |label: &str, field: MessageSortField| {
        if sortable && sort.field == field {
            format!("{} {}", label, sort.direction.arrow())
        } else {
            label.to_string()
        }
    };
    let subject_width = subject_width(width);
    Line::from(Span::styled(
        format!(
            "    {}{}{}{:>w$}",
            fit_width(&title("Date", MessageSortField::Date), DATE_COL),
            fit_width("From", FROM_COL),
            fit_width(&title("Subject", MessageSortField::Subject), subject_width),
            title("Size", MessageSortField::Size),
            w = SIZE_COL
        ),
        Theme::table_header(),
    ))
}

fn subject_width(width: u16) -> usize {
    (width as usize).saturating_sub(4 + DATE_COL + FROM_COL + SIZE_COL)
}

fn message_line(
    msg: &MessageSummary,
    width: u16,
    is_cursor: bool,
    is_selected: bool,
    date_format: &str,
) -> Line<'static> {
    let mark = if is_selected {
        symbols::SELECTED
    } else {
        symbols::UNSELECTED
    };
    let attach = if msg.has_attachments {
        symbols::ATTACHMENT
    } else {
        symbols::NO_ATTACHMENT
    };
    let base = if is_cursor {
        Theme::selected_bold()
    } else {
        Theme::text()
    };
    let subject = if msg.subject.is_empty() {
        "(no subject)".to_string()
    } else {
        sanitize_text(&msg.subject)
    };

    Line::from(vec![
        Span::styled(
            format!("{} ", mark),
            with_selection_bg(Theme::selection_mark(), is_cursor),
        ),
        Span::styled(
            format!("{} ", attach),
            with_selection_bg(Theme::text_accent(), is_cursor),
        ),
        Span::styled(
            fit_width(&msg.sent_at.format(date_format).to_string(), DATE_COL),
            with_selection_bg(Theme::text_secondary(), is_cursor),
        ),
        Span::styled(fit_width(&sanitize_text(msg.display_from()), FROM_COL), base),
        Span::styled(fit_width(&subject, subject_width(width)), base),
        Span::styled(
            format!("{:>w$}", format_size(msg.size_estimate), w = SIZE_COL),
            with_selection_bg(Theme::text_secondary(), is_cursor),
        ),
    ])
}

fn render_rows(
    frame: &mut Frame,
    body: Rect,
    state: &AppState,
    messages: &[MessageSummary],
    cursor: usize,
    scroll_offset: usize,
) {
    let range = visible_range(scroll_offset, body.height as usize, messages.len());
    let lines: Vec<Line> = messages[range.clone()]
        .iter()
        .zip(range)
        .map(|(msg, idx)| {
            message_line(
                msg,
                body.width,
                idx == cursor,
                state.selection.is_message_selected(msg.id),
                &state.date_format,
            )
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), body);
}

fn render_empty(frame: &mut Frame, body: Rect, msg: &str) {
    frame.render_widget(Paragraph::new(format!("  {}", msg)).style(Theme::text_muted()), body);
}

pub fn render_message_list(frame: &mut Frame, header: Rect, body: Rect, state: &AppState) {
    let view = &state.view;
    frame.render_widget(Paragraph::new(header_line(header.width, state, true)), header);

    if view.messages.is_empty() {
        let msg = if state.status.loading {
            "Loading..."
        } else if view.is_searching() {
            "No messages match the search"
        } else {
            "No messages"
        };
        render_empty(frame, body, msg);
        return;
    }
    render_rows(frame, body, state, &view.messages, view.cursor, view.scroll_offset);
}

pub fn render_thread(frame: &mut Frame, header: Rect, body: Rect, state: &AppState) {
    let thread = &state.view.thread;
    frame.render_widget(Paragraph::new(header_line(header.width, state, false)), header);

    if thread.messages.is_empty() {
        let msg = if state.status.loading {
            "Loading conversation..."
        } else {
            "No messages in this conversation"
        };
        render_empty(frame, body, msg);
        return;
    }
    render_rows(frame, body, state, &thread.messages, thread.cursor, thread.scroll_offset);
}
