//! Dashboard view rendering.
//!
//! Six parameter cards with status tags and sparkline trends, the
//! classification panel, and the dosing log list.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame,
};
use salain_types::{Metric, SensorReading};

use crate::app::App;
use crate::data::{overflow_alert, status_of};
use crate::snapshot::FORECAST_HORIZON_MIN;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Decimal places shown for a metric value.
fn precision(metric: Metric) -> usize {
    match metric {
        Metric::Ph => 2,
        Metric::Tds | Metric::WaterLevel => 0,
        Metric::Temperature | Metric::Turbidity | Metric::FlowRate => 1,
    }
}

/// Format a metric value with its unit, e.g. `7.20 pH` or `450 ppm`.
pub fn format_value(metric: Metric, value: f64) -> String {
    let def = metric.definition();
    format!("{:.*} {}", precision(metric), value, def.unit)
}

/// Sparkline string from normalized levels.
pub fn sparkline(levels: &[u8]) -> String {
    levels
        .iter()
        .map(|&l| SPARKLINE_CHARS[usize::from(l).min(SPARKLINE_CHARS.len() - 1)])
        .collect()
}

/// Render the dashboard.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [cards, bottom] =
        Layout::vertical([Constraint::Length(12), Constraint::Min(6)]).areas(area);

    render_cards(frame, app, cards);

    let [ai, logs] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(bottom);
    render_analysis(frame, app, ai);
    render_dosing_logs(frame, app, logs);
}

fn render_cards(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::vertical([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)]).split(area);
    let reading = &app.state.current().reading;

    for (row, metrics) in rows.iter().zip(Metric::ALL.chunks(3)) {
        let cols = Layout::horizontal([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(*row);
        for (col, metric) in cols.iter().zip(metrics) {
            render_card(frame, app, reading, *metric, *col);
        }
    }
}

fn render_card(frame: &mut Frame, app: &App, reading: &SensorReading, metric: Metric, area: Rect) {
    let def = metric.definition();
    let value = reading.get(metric);
    let status = status_of(metric, value);
    let status_style = app.theme.status_style(status);

    let trend = sparkline(&app.state.history().sparkline(metric));
    let range = format!(
        "Range {:.*}-{:.*} {}",
        precision(metric),
        def.display_range.min,
        precision(metric),
        def.display_range.max,
        def.unit
    );

    let lines = vec![
        Line::from(vec![
            Span::styled(
                format_value(metric, value),
                status_style.add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(status.as_str().to_uppercase(), status_style),
        ]),
        Line::from(Span::styled(range, Style::default().add_modifier(Modifier::DIM))),
        Line::from(Span::styled(trend, Style::default().fg(app.theme.trend))),
    ];

    let block = Block::default()
        .title(format!(" {} ", def.label))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_analysis(frame: &mut Frame, app: &App, area: Rect) {
    let current = app.state.current();
    let classification = current.assessment.classification;
    let forecast = current.assessment.forecast;

    let block = Block::default()
        .title(" AI Analysis ")
        .title_style(app.theme.header)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [label_area, gauge_area, detail_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(1),
    ])
    .areas(inner);

    let label_style = if classification.classification.is_alarming() {
        Style::default().fg(app.theme.warning).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.healthy).add_modifier(Modifier::BOLD)
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw("Classification: "),
            Span::styled(classification.classification.as_str(), label_style),
        ])),
        label_area,
    );

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(app.theme.highlight))
        .ratio(classification.confidence_fraction().clamp(0.0, 1.0))
        .label(format!("{}% confidence", classification.confidence));
    frame.render_widget(gauge, gauge_area);

    let mut lines = Vec::new();
    if let Some(alert) = overflow_alert(current.reading.water_level) {
        lines.push(Line::from(Span::styled(
            alert.message,
            Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(Span::styled(
        format!("Forecast (+{FORECAST_HORIZON_MIN} min)"),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!(
        "  pH {}  TDS {}  Turbidity {}",
        format_value(Metric::Ph, forecast.predicted_ph),
        format_value(Metric::Tds, forecast.predicted_tds),
        format_value(Metric::Turbidity, forecast.predicted_turbidity),
    )));
    frame.render_widget(Paragraph::new(lines), detail_area);
}

fn render_dosing_logs(frame: &mut Frame, app: &App, area: Rect) {
    let logs = app.snapshots().logs();

    let items: Vec<ListItem> = if logs.is_empty() {
        vec![ListItem::new(Span::styled(
            "No dosing events",
            Style::default().add_modifier(Modifier::DIM),
        ))]
    } else {
        logs.iter()
            .map(|log| {
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(
                            format!("{} ", log.timestamp),
                            Style::default().add_modifier(Modifier::DIM),
                        ),
                        Span::styled(
                            format!("{} {}", log.chemical, log.amount),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::raw(format!(" [{}]", log.industry)),
                    ]),
                    Line::from(format!("  {}", log.reason)),
                ])
            })
            .collect()
    };

    let block = Block::default()
        .title(" Dosing Log ")
        .title_style(app.theme.header)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    frame.render_widget(List::new(items).block(block), area);
}
