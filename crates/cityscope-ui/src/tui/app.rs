use std::sync::Arc;

use cityscope_cities::CitySource;
use cityscope_weather::WeatherProvider;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::runtime::Handle;

use crate::models::{CityTableModel, WeatherModel};
use crate::route::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

pub enum Screen<S> {
    Table(CityTableModel<S>),
    Weather {
        detail: WeatherModel,
        table: CityTableModel<S>,
    },
}

pub struct App<S> {
    source: Arc<S>,
    provider: Arc<WeatherProvider>,
    runtime: Handle,
    prefetch_margin: usize,
    route: Route,
    screen: Screen<S>,
    input_mode: InputMode,
    pub quit: bool,
}

impl<S: CitySource + 'static> App<S> {
    pub fn new(
        source: Arc<S>,
        provider: Arc<WeatherProvider>,
        runtime: Handle,
        prefetch_margin: usize,
    ) -> Self {
        let mut table = CityTableModel::new(Arc::clone(&source), runtime.clone(), prefetch_margin);
        table.mount();
        Self {
            source,
            provider,
            runtime,
            prefetch_margin,
            route: Route::CityTable,
            screen: Screen::Table(table),
            input_mode: InputMode::Normal,
            quit: false,
        }
    }

    /// Replace the current screen. Every route gets fresh models; the old
    /// ones are torn down when dropped.
    pub fn navigate(&mut self, route: Route) {
        tracing::info!("Navigating to {}", route.path());

        let mut table = CityTableModel::new(
            Arc::clone(&self.source),
            self.runtime.clone(),
            self.prefetch_margin,
        );
        table.mount();

        self.screen = match &route {
            Route::CityTable => Screen::Table(table),
            Route::Weather {
                city_name,
                coordinates,
            } => {
                let mut detail = WeatherModel::new(
                    city_name.clone(),
                    *coordinates,
                    Arc::clone(&self.provider),
                    self.runtime.clone(),
                );
                detail.mount();
                Screen::Weather { detail, table }
            }
        };
        self.route = route;
        self.input_mode = InputMode::Normal;
    }

    /// Drain service channels. Returns true if anything changed.
    pub fn poll_messages(&mut self) -> bool {
        match &mut self.screen {
            Screen::Table(table) => table.poll_messages(),
            Screen::Weather { detail, table } => {
                let weather_changed = detail.poll_messages();
                table.poll_messages() || weather_changed
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }

        match self.input_mode {
            InputMode::Search => self.handle_search_key(key),
            InputMode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.input_mode = InputMode::Normal,
            KeyCode::Backspace => self.table_mut().pop_search_char(),
            KeyCode::Char(c) => self.table_mut().push_search_char(c),
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char('/') => self.input_mode = InputMode::Search,
            KeyCode::Char('r') => self.table_mut().retry(),
            KeyCode::Char(c @ '1'..='6') => {
                if let Some(column) = c.to_digit(10) {
                    self.table_mut().sort_by_column(column as usize - 1);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.table_mut().select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.table_mut().select_next(),
            KeyCode::PageUp => self.table_mut().page_up(),
            KeyCode::PageDown => self.table_mut().page_down(),
            KeyCode::Home => self.table_mut().select_first(),
            KeyCode::End => self.table_mut().select_last(),
            KeyCode::Enter => {
                let route = self.table().selected_city().map(Route::for_city);
                if let Some(route) = route {
                    self.navigate(route);
                }
            }
            KeyCode::Esc | KeyCode::Char('h') if self.route != Route::CityTable => {
                self.navigate(Route::CityTable);
            }
            _ => {}
        }
    }
}

impl<S> App<S> {
    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn screen_mut(&mut self) -> &mut Screen<S> {
        &mut self.screen
    }

    pub fn table(&self) -> &CityTableModel<S> {
        match &self.screen {
            Screen::Table(table) | Screen::Weather { table, .. } => table,
        }
    }

    pub fn table_mut(&mut self) -> &mut CityTableModel<S> {
        match &mut self.screen {
            Screen::Table(table) | Screen::Weather { table, .. } => table,
        }
    }

    pub fn weather(&self) -> Option<&WeatherModel> {
        match &self.screen {
            Screen::Weather { detail, .. } => Some(detail),
            Screen::Table(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use cityscope_cities::{City, CityError, PageRequest, SortDirection, SortKey};
    use std::future::Future;
    use std::time::{Duration, Instant};

    struct TwoCities;

    impl CitySource for TwoCities {
        fn fetch_page(
            &self,
            request: PageRequest,
        ) -> impl Future<Output = Result<Vec<City>, CityError>> + Send {
            let cities = if request.page == 0 {
                vec![city("Aachen", 50.7766, 6.0834), city("Aalborg", 57.048, 9.9187)]
            } else {
                Vec::new()
            };
            std::future::ready(Ok(cities))
        }
    }

    fn city(name: &str, latitude: f64, longitude: f64) -> City {
        City {
            name: name.to_string(),
            country: "Somewhere".to_string(),
            timezone: "Europe/Berlin".to_string(),
            population: 100,
            latitude,
            longitude,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(runtime: &tokio::runtime::Runtime) -> App<TwoCities> {
        let provider = Arc::new(WeatherProvider::new("http://127.0.0.1:9", None).unwrap());
        let mut app = App::new(Arc::new(TwoCities), provider, runtime.handle().clone(), 0);
        settle(&mut app);
        app
    }

    fn settle(app: &mut App<TwoCities>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            app.poll_messages();
            if !app.table().is_loading() {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("table did not load");
    }

    #[test]
    fn test_search_mode_edits_search_text() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt);

        app.handle_key(key(KeyCode::Char('/')));
        assert_eq!(app.input_mode(), InputMode::Search);
        for c in "alb".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        // 'q' is text while searching
        app.handle_key(key(KeyCode::Char('q')));
        app.handle_key(key(KeyCode::Backspace));
        assert!(!app.quit);
        assert_eq!(app.table().search_text(), "alb");
        assert_eq!(app.table().collection().view_len(), 1);

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.input_mode(), InputMode::Normal);
    }

    #[test]
    fn test_digit_keys_sort() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt);

        app.handle_key(key(KeyCode::Char('5')));
        app.handle_key(key(KeyCode::Char('5')));
        let spec = app.table().sort_spec().unwrap();
        assert_eq!(spec.key, SortKey::Latitude);
        assert_eq!(spec.direction, SortDirection::Descending);
        assert_eq!(app.table().selected_city().unwrap().name, "Aalborg");
    }

    #[test]
    fn test_enter_opens_weather_and_home_returns() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt);

        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.route().path(), "/weather/Aalborg");
        let detail = app.weather().unwrap();
        assert_eq!(detail.city_name(), "Aalborg");
        assert_eq!(detail.coordinates().latitude, 57.048);

        // The side table is a fresh instance
        settle(&mut app);
        assert_eq!(app.table().collection().view_len(), 2);
        assert_eq!(app.table().selected(), 0);

        app.handle_key(key(KeyCode::Char('h')));
        assert_eq!(app.route(), &Route::CityTable);
        assert!(app.weather().is_none());
    }

    #[test]
    fn test_escape_on_table_route_does_nothing() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.route(), &Route::CityTable);
        assert!(!app.quit);

        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.quit);
    }
}
