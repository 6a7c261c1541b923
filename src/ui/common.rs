//! Common UI components shared across views.
//!
//! This module contains the header bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::scheduler::Phase;

/// Render the header bar with system health overview.
///
/// Displays: status indicator, system status, link, device, classification.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.state;
    let current = state.current();
    let status = state.system_status();
    let status_style = app.theme.system_status_style(status);
    let telemetry = app.telemetry();

    let label = current.assessment.classification.classification;
    let label_style = if label.is_alarming() {
        Style::default().fg(app.theme.warning).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.healthy)
    };

    let mut spans = vec![
        Span::styled(" ● ", status_style),
        Span::styled("S.A.L.A.I.N. ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(status.as_str().to_uppercase(), status_style),
        Span::raw(" │ "),
        Span::raw(telemetry.link.as_str()),
        Span::raw(format!(" ({}) │ ", current.provenance)),
        Span::raw(telemetry.device_id),
        Span::raw(" │ "),
        Span::styled(label.as_str(), label_style),
        Span::raw(format!(" │ cycle {}", state.cycles())),
    ];
    if state.phase() == Phase::Fetching {
        spans.push(Span::styled(" ⟳", Style::default().add_modifier(Modifier::DIM)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the status bar at the bottom.
///
/// Shows: time since last update, acquisition source, available controls.
/// Also displays temporary status messages.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = if app.show_telemetry {
        "↑↓:scroll Esc:close q:quit"
    } else {
        "t:telemetry e:export r:refresh ?:help q:quit"
    };

    let status = format!(
        " Updated {:.1}s ago | {} | {}",
        app.last_updated.elapsed().as_secs_f64(),
        app.source_description(),
        controls,
    );

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Centered rectangle of at most `width`×`height` inside `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the dashboard.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Dashboard"),
        Line::from("  r         Acquire a reading now"),
        Line::from("  e         Export stats to JSON"),
        Line::from("  t         Show raw telemetry"),
        Line::from(""),
        section(" Telemetry"),
        Line::from("  ↑/↓ j/k   Scroll"),
        Line::from("  PgUp/PgDn Scroll 10 lines"),
        Line::from("  Esc       Close"),
        Line::from(""),
        section(" General"),
        Line::from("  ?         Toggle help"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let help_area = centered(area, 40, 20);
    frame.render_widget(Clear, help_area);
    frame.render_widget(Paragraph::new(help_text).block(block), help_area);
}
