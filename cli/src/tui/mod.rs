//! Terminal wallet view
//!
//! Draws the last published [`AppState`](elusiv_demo_core::AppState) every
//! tick. Key presses trigger workflows on the wallet service; their results
//! come back through state.

mod app;
mod events;
mod layout;
mod theme;

use anyhow::Result;
use elusiv_demo_core::WalletService;
use ratatui::DefaultTerminal;

use app::App;
use events::handle_events;
use layout::render_ui;

pub fn run(service: WalletService) -> Result<()> {
    let mut terminal = ratatui::init();
    let mut app = App::new(service);

    let result = run_loop(&mut terminal, &mut app);

    ratatui::restore();
    app.service.shutdown();
    result
}

fn run_loop(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        app.sync();
        terminal.draw(|f| render_ui(f, app))?;

        if handle_events(app)? {
            return Ok(());
        }
    }
}
