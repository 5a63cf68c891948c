pub mod config;
pub mod error;

pub use config::{CitiesConfig, Config, UiConfig, ValidationResult, WeatherConfig};
pub use error::{AppError, CitiesError, ConfigError, NetworkError, ReqwestErrorExt, WeatherError};

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Mutex;

/// Initialize tracing/logging.
///
/// The terminal UI owns stdout, so logs go to `log_file` when one is given
/// and to stderr otherwise.
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let installed = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).context("Failed to create log directory")?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!("cityscope core initialized");
    Ok(())
}
