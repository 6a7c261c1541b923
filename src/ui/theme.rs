//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;
use salain_types::{Severity, StatusTag};

use crate::data::SystemStatus;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for titles and active elements.
    pub highlight: Color,
    /// Color for statuses that need attention.
    pub warning: Color,
    /// Color for critical statuses.
    pub critical: Color,
    /// Color for nominal statuses.
    pub healthy: Color,
    pub border: Color,
    /// Style for section titles.
    pub header: Style,
    /// Sparkline color.
    pub trend: Color,
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            trend: Color::LightBlue,
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            trend: Color::Blue,
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn severity_style(&self, severity: Severity) -> Style {
        match severity {
            Severity::Normal => Style::default().fg(self.healthy),
            Severity::Attention => Style::default().fg(self.warning),
            Severity::Critical => Style::default().fg(self.critical).add_modifier(Modifier::BOLD),
        }
    }

    /// Get style for a metric status tag
    pub fn status_style(&self, status: StatusTag) -> Style {
        self.severity_style(status.severity())
    }

    pub fn system_status_style(&self, status: SystemStatus) -> Style {
        match status {
            SystemStatus::Online => self.severity_style(Severity::Normal),
            SystemStatus::Degraded => self.severity_style(Severity::Attention),
            SystemStatus::Offline => self.severity_style(Severity::Critical),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_styles_follow_severity() {
        let theme = Theme::dark();
        assert_eq!(theme.status_style(StatusTag::Optimal).fg, Some(Color::Green));
        assert_eq!(theme.status_style(StatusTag::Stagnant).fg, Some(Color::Yellow));
        assert_eq!(
            theme.system_status_style(SystemStatus::Offline).fg,
            Some(Color::Red)
        );
    }
}
