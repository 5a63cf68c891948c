use crate::services::weather_service::WeatherError as UiWeatherError;
use cityscope_core::{AppError, ConfigError, NetworkError, WeatherError};

impl From<UiWeatherError> for AppError {
    fn from(e: UiWeatherError) -> Self {
        match e {
            UiWeatherError::Network(s) => AppError::Weather(WeatherError::ApiError(s)),
            UiWeatherError::Status(status) if status >= 500 => {
                AppError::Weather(WeatherError::ServiceUnavailable)
            }
            UiWeatherError::Status(status) => {
                AppError::Weather(WeatherError::ApiError(format!("status {}", status)))
            }
            UiWeatherError::InvalidApiKey => AppError::Weather(WeatherError::InvalidApiKey),
            UiWeatherError::MissingApiKey => AppError::Weather(WeatherError::MissingApiKey),
            UiWeatherError::Parse(s) => AppError::Network(NetworkError::InvalidResponse(s)),
            UiWeatherError::Config(s) => AppError::Config(ConfigError::Invalid(s)),
        }
    }
}
