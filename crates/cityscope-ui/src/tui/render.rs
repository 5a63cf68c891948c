use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use cityscope_cities::{CitySource, SortKey, SortSpec};

use super::app::{App, InputMode, Screen};
use crate::models::weather_model::{FAILURE_MESSAGE, LOADING_MESSAGE};
use crate::models::{CityTableModel, WeatherModel, WeatherState};

const SEARCH_PLACEHOLDER: &str = "Search for a city...";

const COLUMN_WIDTHS: [Constraint; 6] = [
    Constraint::Percentage(24),
    Constraint::Percentage(16),
    Constraint::Percentage(22),
    Constraint::Percentage(14),
    Constraint::Percentage(12),
    Constraint::Percentage(12),
];

pub(super) fn draw<S: CitySource + 'static>(frame: &mut Frame, app: &mut App<S>) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let path = app.route().path();
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("cityscope ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(path, Style::default().fg(Color::DarkGray)),
        ])),
        parts[0],
    );

    let searching = app.input_mode() == InputMode::Search;
    match app.screen_mut() {
        Screen::Table(table) => render_table(frame, table, searching, parts[1]),
        Screen::Weather { detail, table } => {
            let halves = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(parts[1]);
            render_weather(frame, detail, halves[0]);
            render_table(frame, table, searching, halves[1]);
        }
    }

    render_status(frame, app, parts[2]);
}

fn render_table<S: CitySource + 'static>(
    frame: &mut Frame,
    model: &mut CityTableModel<S>,
    searching: bool,
    area: Rect,
) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_search(frame, model.search_text(), searching, parts[0]);

    // Borders plus the header row
    let body_height = usize::from(parts[1].height.saturating_sub(3));
    model.sync_viewport(body_height);

    let sort = model.sort_spec();
    let header = Row::new(SortKey::ALL.iter().map(|key| {
        let indicator = SortSpec::indicator(sort, *key);
        if indicator.is_empty() {
            Cell::from(key.label())
        } else {
            Cell::from(format!("{} {}", key.label(), indicator))
        }
    }))
    .style(Style::default().add_modifier(Modifier::BOLD));

    let selected = model.selected();
    let mut rows: Vec<Row> = model
        .visible_rows()
        .map(|(position, city)| {
            Row::new(vec![
                Cell::from(city.name.clone()).style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                ),
                Cell::from(city.country.clone()),
                Cell::from(city.timezone.clone()),
                Cell::from(city.population.to_string()),
                Cell::from(city.latitude.to_string()),
                Cell::from(city.longitude.to_string()),
            ])
            .style(row_style(position, selected))
        })
        .collect();

    if model.is_loading() {
        rows.push(
            Row::new(vec![Cell::from("Loading...")])
                .style(Style::default().add_modifier(Modifier::ITALIC)),
        );
    } else if rows.is_empty() && !model.search_text().is_empty() {
        rows.push(Row::new(vec![Cell::from("No matching cities")]));
    }

    let collection = model.collection();
    let title = format!(
        "Cities ({} of {})",
        collection.view_len(),
        collection.full_set().len()
    );
    let table = Table::new(rows, COLUMN_WIDTHS)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, parts[1]);
}

/// Selection wins over striping; even rows are shaded, starting with the first.
fn row_style(position: usize, selected: usize) -> Style {
    if position == selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else if position % 2 == 0 {
        Style::default().bg(Color::Rgb(40, 40, 48))
    } else {
        Style::default()
    }
}

fn render_search(frame: &mut Frame, text: &str, searching: bool, area: Rect) {
    let border = if searching {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let content = if text.is_empty() {
        Span::styled(SEARCH_PLACEHOLDER, Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(text)
    };
    frame.render_widget(
        Paragraph::new(Line::from(content)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title("Search"),
        ),
        area,
    );

    if searching {
        let width = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
        frame.set_cursor_position(Position::new(
            area.x.saturating_add(1).saturating_add(width),
            area.y.saturating_add(1),
        ));
    }
}

fn render_weather(frame: &mut Frame, model: &WeatherModel, area: Rect) {
    let accent = background_color(model.background_image());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .title(model.title());

    let mut lines = vec![
        Line::from(Span::styled(
            "Home (h)",
            Style::default().add_modifier(Modifier::UNDERLINED),
        )),
        Line::default(),
    ];

    match model.state() {
        WeatherState::Loading => lines.push(Line::from(LOADING_MESSAGE)),
        WeatherState::Failed { hint } => {
            lines.push(Line::from(Span::styled(
                FAILURE_MESSAGE,
                Style::default().fg(Color::Red),
            )));
            if let Some(hint) = hint {
                lines.push(Line::from(Span::styled(
                    *hint,
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        WeatherState::Loaded(_) => {
            if let Some(icon) = model.icon_name().map(icon_glyph) {
                lines.push(Line::from(icon));
            }
            lines.extend(model.detail_lines().into_iter().map(Line::from));
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                model.background_image(),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_status<S: CitySource + 'static>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let line = if let Some(message) = app.table().error_message() {
        Line::from(Span::styled(
            with_retry_hint(message),
            Style::default().fg(Color::Red),
        ))
    } else if app.input_mode() == InputMode::Search {
        Line::from("Type to filter · Enter/Esc done")
    } else if app.weather().is_some() {
        Line::from("h/Esc home · ↑↓ move · / search · 1-6 sort · Enter weather · q quit")
    } else {
        Line::from("↑↓ move · / search · 1-6 sort · Enter weather · q quit")
    };
    frame.render_widget(
        Paragraph::new(line).style(Style::default().fg(Color::Gray)),
        area,
    );
}

fn with_retry_hint(message: &str) -> String {
    format!("{} (r to retry)", message)
}

fn icon_glyph(name: &str) -> &'static str {
    match name {
        "sun" => "☀",
        "cloud_rain" => "🌧",
        "cloud_sun_rain" => "🌦",
        _ => "",
    }
}

fn background_color(image: &str) -> Color {
    match image {
        "/images/sunny.jpeg" => Color::Yellow,
        "/images/cloudy.jpeg" => Color::Gray,
        "/images/rain.jpeg" => Color::Blue,
        "/images/thunderstorm.jpeg" => Color::Magenta,
        _ => Color::White,
    }
}
