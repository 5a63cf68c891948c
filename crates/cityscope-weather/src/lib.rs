//! Weather service for cityscope
//!
//! Fetches current conditions for a coordinate pair from OpenWeatherMap and
//! maps condition groups to icons and background images.

pub mod provider;
pub mod types;

pub use provider::WeatherProvider;
pub use types::*;
