//! Weather backend: async weather fetching.
//! All network work runs off the UI thread; results sent via mpsc.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use cityscope_weather::{Coordinates, CurrentWeather, WeatherProvider};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Error type for weather operations
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherError {
    Network(String),
    Status(u16),
    InvalidApiKey,
    MissingApiKey,
    Parse(String),
    Config(String),
}

impl std::fmt::Display for WeatherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherError::Network(s) => write!(f, "Weather error: {}", s),
            WeatherError::Status(status) => write!(f, "Weather service returned {}", status),
            WeatherError::InvalidApiKey => write!(f, "Weather API key rejected"),
            WeatherError::MissingApiKey => write!(f, "Weather API key not configured"),
            WeatherError::Parse(s) => write!(f, "Weather response malformed: {}", s),
            WeatherError::Config(s) => write!(f, "Weather provider misconfigured: {}", s),
        }
    }
}

impl std::error::Error for WeatherError {}

impl From<cityscope_weather::WeatherError> for WeatherError {
    fn from(e: cityscope_weather::WeatherError) -> Self {
        use cityscope_weather::WeatherError as Provider;
        if e.is_auth_failure() {
            return match e {
                Provider::MissingApiKey => WeatherError::MissingApiKey,
                _ => WeatherError::InvalidApiKey,
            };
        }
        match e {
            Provider::Network(e) => WeatherError::Network(e.to_string()),
            Provider::Status { status, .. } => WeatherError::Status(status),
            Provider::Parse(s) => WeatherError::Parse(s),
            Provider::MissingApiKey => WeatherError::MissingApiKey,
            Provider::InvalidConfig(s) => WeatherError::Config(s),
        }
    }
}

/// Messages sent from async operations back to the UI thread
#[derive(Debug)]
pub enum WeatherServiceMessage {
    /// Result of fetching current conditions
    FetchDone(Result<CurrentWeather, WeatherError>),
}

/// Request current conditions at `coordinates`.
/// Sends `FetchDone` on the channel when complete; nothing if cancelled.
pub fn request_fetch(
    runtime: &Handle,
    tx: &Sender<WeatherServiceMessage>,
    provider: Arc<WeatherProvider>,
    coordinates: Coordinates,
    cancel: CancellationToken,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Weather fetch cancelled");
                return;
            }
            result = provider.fetch_current(coordinates) => result,
        };
        let _ = tx.send(WeatherServiceMessage::FetchDone(result.map_err(WeatherError::from)));
    });
}
