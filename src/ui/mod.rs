//! Terminal rendering.
//!
//! [`render`] draws one frame: header, dashboard, status bar, and whichever
//! overlay is open.

pub mod common;
pub mod dashboard;
pub mod telemetry;
pub mod theme;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

pub use theme::Theme;

use crate::app::App;

/// Minimum terminal size for a usable display.
pub const MIN_WIDTH: u16 = 72;
pub const MIN_HEIGHT: u16 = 20;

/// Draw the whole UI for the current app state.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        let y = (area.height / 2).saturating_sub(2);
        let centered = Rect::new(0, y, area.width, 5.min(area.height - y));
        frame.render_widget(paragraph, centered);
        return;
    }

    let [header, body, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(18),
        Constraint::Length(1),
    ])
    .areas(area);

    common::render_header(frame, app, header);
    dashboard::render(frame, app, body);
    common::render_status_bar(frame, app, status);

    if app.show_telemetry {
        telemetry::render_overlay(frame, app, area);
    }

    if app.show_help {
        common::render_help(frame, app, area);
    }
}
