//! Raw-telemetry overlay.
//!
//! Shows the telemetry payload exactly as it would be published, scrolled
//! with the arrow keys.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;

/// Minimum width required for the overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 40;
/// Minimum height required for the overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 10;

/// Render the telemetry payload as a modal overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    let overlay_width = (area.width * 80 / 100).clamp(MIN_OVERLAY_WIDTH, 90);
    let overlay_height = (area.height * 90 / 100).clamp(MIN_OVERLAY_HEIGHT, 50);
    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    let json = app.telemetry_json();
    let lines: Vec<Line> = json.lines().map(Line::from).collect();

    // Keep the last page in view when scrolled past the end
    let visible = overlay_height.saturating_sub(2);
    let max_scroll = u16::try_from(lines.len())
        .unwrap_or(u16::MAX)
        .saturating_sub(visible);
    let scroll = app.telemetry_scroll.min(max_scroll);

    let block = Block::default()
        .title(" Raw Telemetry ")
        .title_bottom(Line::styled(
            " ↑↓ scroll · Esc close ",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    frame.render_widget(Clear, overlay_area);
    frame.render_widget(
        Paragraph::new(lines).block(block).scroll((scroll, 0)),
        overlay_area,
    );
}
