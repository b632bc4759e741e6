use ratatui::{
    Frame,
    layout::Rect,
    widgets::{Block, Borders, Clear},
};

use crate::ui::theme::{Theme, borders};

/// Creates a centered rect with min/max constraints for width and height.
/// The actual size is clamped between min and max, then constrained to fit within area.
pub fn centered_rect_constrained(
    area: Rect,
    min_width: u16,
    max_width: u16,
    min_height: u16,
    max_height: u16,
) -> Rect {
    let w = max_width
        .min(area.width.saturating_sub(4))
        .max(min_width)
        .min(area.width);
    let h = max_height
        .min(area.height.saturating_sub(4))
        .max(min_height)
        .min(area.height);

    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}

/// Clear `area` and draw a titled popup frame, returning the inner area
pub fn popup_frame(frame: &mut Frame, area: Rect, title: &str, footer: Option<&str>) -> Rect {
    frame.render_widget(Clear, area);
    let mut block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_type(borders::popup())
        .border_style(Theme::border_focused());
    if let Some(footer) = footer {
        block = block.title_bottom(format!(" {} ", footer));
    }
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}
