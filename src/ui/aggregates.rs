//! Aggregate table (top level and sub-aggregates)

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme::{Theme, symbols, with_selection_bg};
use super::widgets::{fit_width, format_count, format_size, sanitize_text};
use crate::app::selection::visible_range;
use crate::app::state::AppState;
use crate::query::{AggregateRow, Dimension, SortField};
use crate::query::filter::EMPTY_KEY_LABEL;

const NUM_COL: usize = 11;

fn key_label(row: &AggregateRow) -> String {
    if row.key.is_empty() {
        EMPTY_KEY_LABEL.to_string()
    } else {
        sanitize_text(&row.key)
    }
}

fn header_title(dimension: Dimension, state: &AppState) -> String {
    if dimension == Dimension::Time {
        format!("{} ({})", dimension.label(), state.view.granularity.label())
    } else {
        dimension.label().to_string()
    }
}

/// Sort arrow appended to the sorted column's title
fn column_title(title: &str, field: SortField, state: &AppState) -> String {
    let sort = state.view.aggregate_sort;
    if sort.field == field {
        format!("{} {}", title, sort.direction.arrow())
    } else {
        title.to_string()
    }
}

pub fn render_aggregates(frame: &mut Frame, header: Rect, body: Rect, state: &AppState) {
    let view = &state.view;
    let key_width = (header.width as usize).saturating_sub(2 + NUM_COL * 3);

    let title = column_title(&header_title(view.dimension, state), SortField::Name, state);
    let header_line = Line::from(Span::styled(
        format!(
            "  {}{:>w$}{:>w$}{:>w$}",
            fit_width(&title, key_width),
            column_title("Count", SortField::Count, state),
            column_title("Size", SortField::Size, state),
            column_title("Attach", SortField::Attachments, state),
            w = NUM_COL
        ),
        Theme::table_header(),
    ));
    frame.render_widget(Paragraph::new(header_line), header);

    if view.rows.is_empty() {
        let msg = if state.status.loading {
            "Loading..."
        } else if view.is_searching() {
            "No groups match the search"
        } else {
            "No messages"
        };
        frame.render_widget(Paragraph::new(format!("  {}", msg)).style(Theme::text_muted()), body);
        return;
    }

    let range = visible_range(view.scroll_offset, body.height as usize, view.rows.len());
    let lines: Vec<Line> = view.rows[range.clone()]
        .iter()
        .zip(range)
        .map(|(row, idx)| {
            let is_cursor = idx == view.cursor;
            let is_selected = state.selection.is_key_selected(view.dimension, &row.key);
            let mark = if is_selected {
                symbols::SELECTED
            } else {
                symbols::UNSELECTED
            };
            let base = if is_cursor {
                Theme::selected_bold()
            } else {
                Theme::text()
            };
            let numbers = format!(
                "{:>w$}{:>w$}{:>w$}",
                format_count(row.count),
                format_size(row.total_size),
                format_size(row.attachment_size),
                w = NUM_COL
            );
            Line::from(vec![
                Span::styled(
                    format!("{} ", mark),
                    with_selection_bg(Theme::selection_mark(), is_cursor),
                ),
                Span::styled(fit_width(&key_label(row), key_width), base),
                Span::styled(numbers, with_selection_bg(Theme::text_secondary(), is_cursor)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), body);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_gets_placeholder() {
        let row = AggregateRow::default();
        assert_eq!(key_label(&row), "(empty)");
        let row = AggregateRow {
            key: "alice@example.com".into(),
            ..AggregateRow::default()
        };
        assert_eq!(key_label(&row), "alice@example.com");
    }

    #[test]
    fn test_sorted_column_gets_arrow() {
        let state = AppState::default();
        assert_eq!(column_title("Count", SortField::Count, &state), "Count ↓");
        assert_eq!(column_title("Size", SortField::Size, &state), "Size");
    }
}
