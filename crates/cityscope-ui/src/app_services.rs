//! Shared services built once at startup: the tokio runtime, the city
//! source and the weather provider. Models borrow clones of the `Arc`s and
//! spawn onto the runtime handle.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cityscope_cities::OpenDataSoftSource;
use cityscope_core::Config;
use cityscope_weather::WeatherProvider;
use tokio::runtime::{Handle, Runtime};

pub struct AppServices {
    /// Tokio runtime for async operations
    runtime: Runtime,

    /// Paged city source
    city_source: Arc<OpenDataSoftSource>,

    /// Weather provider
    weather_provider: Arc<WeatherProvider>,
}

impl AppServices {
    pub fn from_config(config: &Config) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("cityscope-worker")
            .build()
            .context("Failed to create tokio runtime")?;

        let city_source = OpenDataSoftSource::with_timeout(
            &config.cities.base_url,
            config.cities.dataset.clone(),
            Duration::from_secs(config.cities.timeout_secs),
        )
        .context("Failed to create city source")?
        .with_sort_field(config.cities.sort_field.clone())
        .with_page_size(config.cities.page_size);

        let weather_provider = WeatherProvider::with_timeout(
            &config.weather.base_url,
            config.weather.effective_api_key(),
            Duration::from_secs(config.weather.timeout_secs),
        )
        .context("Failed to create weather provider")?
        .with_units(config.weather.units.clone());

        if !weather_provider.has_api_key() {
            tracing::warn!("No weather API key configured; weather lookups will fail");
        }

        tracing::info!(
            "Services initialized (dataset {}, {} rows per page)",
            config.cities.dataset,
            config.cities.page_size
        );

        Ok(Self {
            runtime,
            city_source: Arc::new(city_source),
            weather_provider: Arc::new(weather_provider),
        })
    }

    pub fn runtime_handle(&self) -> Handle {
        self.runtime.handle().clone()
    }

    pub fn city_source(&self) -> Arc<OpenDataSoftSource> {
        Arc::clone(&self.city_source)
    }

    pub fn weather_provider(&self) -> Arc<WeatherProvider> {
        Arc::clone(&self.weather_provider)
    }
}
