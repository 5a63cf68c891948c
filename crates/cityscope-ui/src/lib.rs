//! cityscope terminal UI.
//!
//! Services run network work on a tokio runtime and hand results back over
//! channels; models own per-screen state and are polled from the UI thread.

pub mod app_services;
pub mod error_mapping;
pub mod models;
pub mod route;
pub mod services;
pub mod tui;

pub use app_services::AppServices;
pub use route::Route;
pub use tui::run;
