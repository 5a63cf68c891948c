//! Current-weather lookups against the OpenWeatherMap API.

use crate::types::{Coordinates, CurrentWeather, WeatherCondition, WeatherError};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const WEATHER_PATH: &str = "data/2.5/weather";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    main: ApiMain,
    weather: Vec<ApiCondition>,
    wind: ApiWind,
}

#[derive(Debug, Deserialize)]
struct ApiMain {
    temp: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ApiWind {
    speed: f64,
}

impl TryFrom<ApiResponse> for CurrentWeather {
    type Error = WeatherError;

    fn try_from(response: ApiResponse) -> Result<Self, Self::Error> {
        let condition = response
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::Parse("response has no weather entries".to_string()))?;

        Ok(CurrentWeather {
            temperature: response.main.temp,
            description: condition.description,
            condition: WeatherCondition::from_main(&condition.main),
            humidity: response.main.humidity,
            pressure: response.main.pressure,
            wind_speed: response.wind.speed,
            fetched_at: chrono::Utc::now(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    weather_url: Url,
    api_key: Option<String>,
    units: String,
}

impl WeatherProvider {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, WeatherError> {
        Self::with_timeout(base_url, api_key, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let weather_url = Url::parse(base_url)
            .and_then(|base| base.join(WEATHER_PATH))
            .map_err(|e| WeatherError::InvalidConfig(format!("{}: {}", base_url, e)))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            weather_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            units: "metric".to_string(),
        })
    }

    /// Unit system sent with each request (`metric`, `imperial`, `standard`)
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch current conditions at `coordinates`.
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn fetch_current(
        &self,
        coordinates: Coordinates,
    ) -> Result<CurrentWeather, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;

        let mut url = self.weather_url.clone();
        url.query_pairs_mut()
            .append_pair("lat", &coordinates.latitude.to_string())
            .append_pair("lon", &coordinates.longitude.to_string())
            .append_pair("appid", api_key)
            .append_pair("units", &self.units);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!("Weather request returned status {}", status);
            return Err(WeatherError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: ApiResponse =
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))?;
        let weather = CurrentWeather::try_from(parsed)?;

        tracing::info!(
            "Weather at {}, {}: {} {}",
            coordinates.latitude,
            coordinates.longitude,
            weather.temperature,
            weather.description
        );
        Ok(weather)
    }
}
