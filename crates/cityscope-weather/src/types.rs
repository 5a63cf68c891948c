use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Background shown when the condition has no dedicated image
pub const DEFAULT_BACKGROUND: &str = "/images/default.jpeg";

/// Weather condition categories, from the provider's `weather[0].main` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Snow,
    Thunderstorm,
    Mist,
    #[default]
    Other,
}

impl WeatherCondition {
    /// Map the provider's condition group name.
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_main(main: &str) -> Self {
        match main {
            "Clear" => Self::Clear,
            "Clouds" => Self::Clouds,
            "Rain" => Self::Rain,
            "Drizzle" => Self::Drizzle,
            "Snow" => Self::Snow,
            "Thunderstorm" => Self::Thunderstorm,
            "Mist" | "Fog" | "Haze" | "Smoke" | "Dust" => Self::Mist,
            _ => Self::Other,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
            Self::Rain => "Rain",
            Self::Drizzle => "Drizzle",
            Self::Snow => "Snow",
            Self::Thunderstorm => "Thunderstorm",
            Self::Mist => "Mist",
            Self::Other => "Other",
        }
    }

    /// Icon shown above the readings; only the three common groups have one
    pub fn icon_name(&self) -> Option<&'static str> {
        match self {
            Self::Rain => Some("cloud_rain"),
            Self::Clear => Some("sun"),
            Self::Clouds => Some("cloud_sun_rain"),
            _ => None,
        }
    }

    /// Background asset for the detail panel
    pub fn background_image(&self) -> &'static str {
        match self {
            Self::Clear => "/images/sunny.jpeg",
            Self::Clouds => "/images/cloudy.jpeg",
            Self::Rain | Self::Snow => "/images/rain.jpeg",
            Self::Thunderstorm => "/images/thunderstorm.jpeg",
            _ => DEFAULT_BACKGROUND,
        }
    }
}

/// Geographic coordinates handed over by navigation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Current weather conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// Degrees in the requested unit system (Celsius for metric)
    pub temperature: f64,
    pub description: String,
    pub condition: WeatherCondition,
    /// Percent
    pub humidity: u8,
    /// hPa
    pub pressure: u32,
    /// m/s for metric
    pub wind_speed: f64,
    pub fetched_at: DateTime<Utc>,
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Network response was not ok: {status}")]
    Status { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("No weather API key configured")]
    MissingApiKey,
    #[error("Invalid weather provider configuration: {0}")]
    InvalidConfig(String),
}

impl WeatherError {
    /// Message shown in place of the detail panel.
    pub fn user_message(&self) -> &'static str {
        "Failed to load weather data"
    }

    /// True for rejected credentials
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::MissingApiKey | Self::Status { status: 401, .. })
    }
}
