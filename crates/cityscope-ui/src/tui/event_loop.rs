use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use cityscope_cities::CitySource;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use super::app::App;
use super::render;

pub(super) fn run_loop<S: CitySource + 'static>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<S>,
    tick_rate: Duration,
) -> Result<()> {
    loop {
        app.poll_messages();

        // Drawing also reports the visible rows to the scroll trigger
        terminal
            .draw(|f| render::draw(f, app))
            .context("draw")?;
        if app.quit {
            return Ok(());
        }

        if event::poll(tick_rate).context("poll")? {
            match event::read().context("read event")? {
                Event::Key(k) if k.kind == KeyEventKind::Press => app.handle_key(k),
                _ => {}
            }
        }
    }
}
