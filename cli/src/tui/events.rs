use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use crate::tui::app::App;

/// Returns `true` when the user asked to quit.
pub fn handle_events(app: &mut App) -> Result<bool> {
    if event::poll(std::time::Duration::from_millis(100))? {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                return Ok(false);
            }
            return Ok(handle_key(app, key.code));
        }
    }
    Ok(false)
}

fn handle_key(app: &mut App, key_code: KeyCode) -> bool {
    match key_code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return true,
        KeyCode::Char('t') | KeyCode::Char('T') => app.top_up(),
        KeyCode::Char('s') | KeyCode::Char('S') => app.send(),
        KeyCode::Char('r') | KeyCode::Char('R') => app.refresh(),
        _ => {}
    }
    false
}
