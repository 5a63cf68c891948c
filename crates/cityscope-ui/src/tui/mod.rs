//! Terminal front end: the table route and the weather route, drawn with
//! ratatui on a crossterm backend.

mod app;
mod event_loop;
mod render;

pub use app::{App, InputMode, Screen};

use std::io::{self, IsTerminal};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use cityscope_core::Config;

use crate::app_services::AppServices;

/// Run the interactive UI until the user quits.
pub fn run(config: &Config) -> Result<()> {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        anyhow::bail!("cityscope requires an interactive terminal (TTY)");
    }

    let services = AppServices::from_config(config)?;
    let mut app = App::new(
        services.city_source(),
        services.weather_provider(),
        services.runtime_handle(),
        usize::from(config.ui.prefetch_margin),
    );
    let tick_rate = Duration::from_millis(config.ui.tick_rate_ms);

    let mut stdout = io::stdout();
    enable_raw_mode().context("enable raw mode")?;
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let res = event_loop::run_loop(&mut terminal, &mut app, tick_rate);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    // Tear down models before the runtime goes away
    drop(app);
    drop(services);

    tracing::info!("cityscope exited");
    res
}
