//! Weather detail for one city.
//!
//! A model instance issues exactly one request when mounted and is fatal
//! to itself on failure; navigating to another city builds a new one.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use cityscope_core::AppError;
use cityscope_weather::{Coordinates, CurrentWeather, WeatherProvider, DEFAULT_BACKGROUND};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::services::weather_service::{self, WeatherServiceMessage};

pub const LOADING_MESSAGE: &str = "Loading weather data...";
pub const FAILURE_MESSAGE: &str = "Failed to load weather data";

#[derive(Debug, Clone)]
pub enum WeatherState {
    Loading,
    Loaded(CurrentWeather),
    /// `hint` carries a more specific message when one is available
    Failed { hint: Option<&'static str> },
}

pub struct WeatherModel {
    city_name: String,
    coordinates: Coordinates,
    state: WeatherState,
    provider: Arc<WeatherProvider>,
    runtime: Handle,
    tx: Sender<WeatherServiceMessage>,
    rx: Receiver<WeatherServiceMessage>,
    cancel: CancellationToken,
    requested: bool,
}

impl WeatherModel {
    pub fn new(
        city_name: impl Into<String>,
        coordinates: Coordinates,
        provider: Arc<WeatherProvider>,
        runtime: Handle,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            city_name: city_name.into(),
            coordinates,
            state: WeatherState::Loading,
            provider,
            runtime,
            tx,
            rx,
            cancel: CancellationToken::new(),
            requested: false,
        }
    }

    /// Issue the weather request. Only the first call does anything.
    pub fn mount(&mut self) {
        if self.requested {
            return;
        }
        self.requested = true;
        tracing::info!(
            "Fetching weather for {} at {}, {}",
            self.city_name,
            self.coordinates.latitude,
            self.coordinates.longitude
        );
        weather_service::request_fetch(
            &self.runtime,
            &self.tx,
            Arc::clone(&self.provider),
            self.coordinates,
            self.cancel.clone(),
        );
    }

    /// Apply a result if one has arrived. Returns true if state changed.
    pub fn poll_messages(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.rx.try_recv() {
            match message {
                WeatherServiceMessage::FetchDone(Ok(weather)) => {
                    self.state = WeatherState::Loaded(weather);
                }
                WeatherServiceMessage::FetchDone(Err(e)) => {
                    let error = AppError::from(e);
                    tracing::error!("Error fetching weather data: {}", error);
                    let hint = error.user_message();
                    self.state = WeatherState::Failed {
                        hint: (hint != FAILURE_MESSAGE).then_some(hint),
                    };
                }
            }
            changed = true;
        }
        changed
    }

    pub fn city_name(&self) -> &str {
        &self.city_name
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn state(&self) -> &WeatherState {
        &self.state
    }

    pub fn title(&self) -> String {
        format!("Weather in {}", self.city_name)
    }

    /// Background asset for the current state
    pub fn background_image(&self) -> &'static str {
        match &self.state {
            WeatherState::Loaded(weather) => weather.condition.background_image(),
            _ => DEFAULT_BACKGROUND,
        }
    }

    pub fn icon_name(&self) -> Option<&'static str> {
        match &self.state {
            WeatherState::Loaded(weather) => weather.condition.icon_name(),
            _ => None,
        }
    }

    /// Labeled readings, one per line. Empty unless loaded.
    pub fn detail_lines(&self) -> Vec<String> {
        let WeatherState::Loaded(weather) = &self.state else {
            return Vec::new();
        };
        let (temperature_unit, speed_unit) = unit_suffixes(self.provider.units());
        vec![
            format!("Temperature: {}{}", weather.temperature, temperature_unit),
            format!("Description: {}", weather.description),
            format!("Humidity: {}%", weather.humidity),
            format!("Pressure: {} hPa", weather.pressure),
            format!("Wind Speed: {} {}", weather.wind_speed, speed_unit),
        ]
    }
}

impl Drop for WeatherModel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn unit_suffixes(units: &str) -> (&'static str, &'static str) {
    match units {
        "imperial" => ("°F", "mph"),
        "standard" => (" K", "m/s"),
        _ => ("°C", "m/s"),
    }
}
