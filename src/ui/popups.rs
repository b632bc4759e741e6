//! Modal popup overlays

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use super::components::{centered_rect_constrained, popup_frame};
use super::theme::{Theme, symbols};
use super::widgets::{fit_width, format_count, truncate_to_width};
use crate::app::state::{AppState, ModalState};
use crate::deletion::Manifest;
use crate::export::format_bytes_long;
use crate::input::KeybindingEntry;

pub fn render_modal(frame: &mut Frame, area: Rect, state: &AppState) {
    match &state.modal {
        ModalState::None => {}
        ModalState::DeleteConfirm { manifest } => render_delete_confirm(frame, area, manifest),
        ModalState::DeleteResult { message } => {
            render_message(frame, area, "Deletion", message, "any key to close")
        }
        ModalState::ExportResult { message } => {
            render_message(frame, area, "Export", message, "any key to close")
        }
        ModalState::QuitConfirm => {
            render_message(frame, area, "Quit", "Quit vaultnav?", "y quit │ n cancel")
        }
        ModalState::AccountSelector { cursor } => {
            let mut options = vec!["All accounts".to_string()];
            options.extend(state.accounts.iter().map(|a| a.display().to_string()));
            render_selector(frame, area, "Account", &options, *cursor);
        }
        ModalState::AttachmentFilter { cursor } => {
            let options = ["All messages".to_string(), "With attachments".to_string()];
            render_selector(frame, area, "Attachment filter", &options, *cursor);
        }
        ModalState::ExportAttachments { cursor, selected } => {
            render_export(frame, area, state, *cursor, selected)
        }
        ModalState::Help { entries, scroll } => render_help(frame, area, entries, *scroll),
        ModalState::Busy { message } => {
            let text = format!("{} {}", state.status.spinner(), message);
            render_message(frame, area, "Working", &text, "please wait")
        }
    }
}

fn render_message(frame: &mut Frame, area: Rect, title: &str, message: &str, footer: &str) {
    let height = message.lines().count().max(1) as u16 + 4;
    let popup = centered_rect_constrained(area, 30, 64, 5, height);
    let inner = popup_frame(frame, popup, title, Some(footer));
    let paragraph = Paragraph::new(format!("\n{}", message))
        .style(Theme::text())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner);
}

fn render_delete_confirm(frame: &mut Frame, area: Rect, manifest: &Manifest) {
    let popup = centered_rect_constrained(area, 36, 64, 8, 10);
    let inner = popup_frame(frame, popup, "Stage deletion", Some("y confirm │ n cancel"));
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "Stage {} messages for deletion?",
                format_count(manifest.message_count() as i64)
            ),
            Theme::text_bold(),
        )),
        Line::from(Span::styled(
            truncate_to_width(&manifest.description, inner.width as usize),
            Theme::text_secondary(),
        )),
    ];
    if let Some(account) = &manifest.filters.account {
        lines.push(Line::from(Span::styled(
            format!("Account: {}", account),
            Theme::text_muted(),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Nothing is deleted until the batch is executed",
        Theme::text_muted(),
    )));
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn render_selector(frame: &mut Frame, area: Rect, title: &str, options: &[String], cursor: usize) {
    let height = options.len() as u16 + 2;
    let popup = centered_rect_constrained(area, 30, 50, 4, height);
    let inner = popup_frame(frame, popup, title, Some("Enter select │ Esc cancel"));

    let visible = inner.height.max(1) as usize;
    let start = cursor.saturating_sub(visible.saturating_sub(1));
    let lines: Vec<Line> = options
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(idx, option)| {
            let (prefix, style) = if idx == cursor {
                (symbols::CURSOR, Theme::selected_bold())
            } else {
                ("  ", Theme::text())
            };
            Line::from(Span::styled(
                fit_width(&format!("{}{}", prefix, option), inner.width as usize),
                style,
            ))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_export(frame: &mut Frame, area: Rect, state: &AppState, cursor: usize, selected: &[bool]) {
    let Some(detail) = &state.view.detail else {
        return;
    };
    let height = detail.attachments.len() as u16 + 2;
    let popup = centered_rect_constrained(area, 40, 70, 4, height);
    let inner = popup_frame(
        frame,
        popup,
        "Export attachments",
        Some("Space toggle │ a all │ n none │ Enter export"),
    );

    let visible = inner.height.max(1) as usize;
    let start = cursor.saturating_sub(visible.saturating_sub(1));
    let lines: Vec<Line> = detail
        .attachments
        .iter()
        .zip(selected)
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(idx, (att, chosen))| {
            let check = if *chosen {
                symbols::CHECKED
            } else {
                symbols::UNCHECKED
            };
            let style = if idx == cursor {
                Theme::selected()
            } else {
                Theme::text()
            };
            let text = format!("{} {} ({})", check, att.filename, format_bytes_long(att.size));
            Line::from(Span::styled(fit_width(&text, inner.width as usize), style))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Help lines grouped by category: a header and a spacer per category
fn help_lines(entries: &[KeybindingEntry], width: u16) -> Vec<Line<'_>> {
    let key_width = 14;
    let mut lines = Vec::new();
    let mut current_category: Option<&str> = None;
    for entry in entries {
        if current_category != Some(entry.category) {
            if current_category.is_some() {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(vec![
                Span::styled(
                    format!("── {} ", entry.category),
                    Theme::text_secondary().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    "─".repeat(width.saturating_sub(entry.category.len() as u16 + 4) as usize),
                    Theme::border(),
                ),
            ]));
            current_category = Some(entry.category);
        }
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(fit_width(&entry.key, key_width), Theme::text_accent()),
            Span::styled(entry.description.as_str(), Theme::text()),
        ]));
    }
    lines
}

fn render_help(frame: &mut Frame, area: Rect, entries: &[KeybindingEntry], scroll: usize) {
    let popup = centered_rect_constrained(area, 36, 64, 10, area.height);
    let inner = popup_frame(frame, popup, "Help", Some("j/k scroll │ any key close"));
    let lines: Vec<Line> = help_lines(entries, inner.width)
        .into_iter()
        .skip(scroll)
        .take(inner.height as usize)
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_lines_group_categories() {
        let entries = vec![
            KeybindingEntry {
                key: "q".into(),
                description: "Quit".into(),
                category: "Global",
            },
            KeybindingEntry {
                key: "?".into(),
                description: "Help".into(),
                category: "Global",
            },
            KeybindingEntry {
                key: "Enter".into(),
                description: "Drill down".into(),
                category: "Aggregates",
            },
        ];
        // 3 entries, 2 headers, 1 spacer between categories
        assert_eq!(help_lines(&entries, 40).len(), 6);
    }
}
