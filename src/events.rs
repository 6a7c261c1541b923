use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::App;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Ctrl-C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Telemetry overlay keys
    if app.show_telemetry {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('t') | KeyCode::Char('q') => {
                app.close_overlay();
            }
            KeyCode::Up | KeyCode::Char('k') => app.scroll_telemetry(-1),
            KeyCode::Down | KeyCode::Char('j') => app.scroll_telemetry(1),
            KeyCode::PageUp => app.scroll_telemetry(-10),
            KeyCode::PageDown => app.scroll_telemetry(10),
            KeyCode::Home => app.telemetry_scroll = 0,
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc => {
            app.close_overlay();
        }

        KeyCode::Char('t') => app.toggle_telemetry(),
        KeyCode::Char('?') => app.toggle_help(),

        // Manual acquisition cycle
        KeyCode::Char('r') => app.request_refresh(),

        KeyCode::Char('e') => {
            // Outcome is reported in the status bar
            let _ = app.export();
        }

        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if !app.show_telemetry {
        return;
    }
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_telemetry(-1),
        MouseEventKind::ScrollDown => app.scroll_telemetry(1),
        // Right-click closes the overlay
        MouseEventKind::Down(MouseButton::Right) => {
            app.close_overlay();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_overlay_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path().to_path_buf()).await;

        handle_key_event(&mut app, key(KeyCode::Char('t')));
        assert!(app.show_telemetry);

        handle_key_event(&mut app, key(KeyCode::Char('j')));
        handle_key_event(&mut app, key(KeyCode::Char('j')));
        assert_eq!(app.telemetry_scroll, 2);
        // 'q' closes the overlay instead of quitting
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.show_telemetry);
        assert!(app.running);

        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key_event(&mut app, key(KeyCode::Char('x')));
        assert!(!app.show_help);

        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[tokio::test]
    async fn test_export_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path().to_path_buf()).await;

        handle_key_event(&mut app, key(KeyCode::Char('e')));
        let exported = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(exported, 1);
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_from_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path().to_path_buf()).await;
        app.toggle_telemetry();

        let ctrl_c = KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        };
        handle_key_event(&mut app, ctrl_c);
        assert!(!app.running);
    }
}
