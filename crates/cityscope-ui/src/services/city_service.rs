//! City page fetching off the UI thread.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use cityscope_cities::{fetch_unless_cancelled, City, CityError, CitySource, PageRequest};
use cityscope_core::{NetworkError, ReqwestErrorExt};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Error type for city page operations
#[derive(Debug, Clone, PartialEq)]
pub enum CityServiceError {
    Network(String),
    Timeout,
    Server { status: u16, message: String },
    Parse(String),
    Config(String),
}

impl std::fmt::Display for CityServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CityServiceError::Network(s) => write!(f, "City request failed: {}", s),
            CityServiceError::Timeout => write!(f, "City request timed out"),
            CityServiceError::Server { status, message } => {
                write!(f, "City source returned {}: {}", status, message)
            }
            CityServiceError::Parse(s) => write!(f, "Malformed city page: {}", s),
            CityServiceError::Config(s) => write!(f, "City source misconfigured: {}", s),
        }
    }
}

impl std::error::Error for CityServiceError {}

impl From<CityError> for CityServiceError {
    fn from(e: CityError) -> Self {
        match e {
            CityError::Network(e) => match e.into_network_error() {
                NetworkError::Timeout => CityServiceError::Timeout,
                NetworkError::ServerError { status, message } => {
                    CityServiceError::Server { status, message }
                }
                NetworkError::InvalidResponse(s) => CityServiceError::Parse(s),
                NetworkError::ConnectionFailed(s) => CityServiceError::Network(s),
            },
            CityError::Status { status, message } => CityServiceError::Server { status, message },
            CityError::Parse(s) => CityServiceError::Parse(s),
            CityError::InvalidConfig(s) => CityServiceError::Config(s),
        }
    }
}

/// Messages sent from async operations back to the UI thread
#[derive(Debug)]
pub enum CityServiceMessage {
    /// Result of fetching one page. `None` when the fetch was cancelled.
    PageDone {
        request: PageRequest,
        result: Option<Result<Vec<City>, CityError>>,
    },
}

/// Fetch `request` on `runtime` and send `PageDone` when it settles.
///
/// Cancelling `cancel` abandons the request; the receiver may already be gone
/// by then, so send failures are ignored.
pub fn request_page<S>(
    runtime: &Handle,
    tx: &Sender<CityServiceMessage>,
    source: Arc<S>,
    request: PageRequest,
    cancel: CancellationToken,
) where
    S: CitySource + 'static,
{
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = fetch_unless_cancelled(&source, request, &cancel).await;
        let _ = tx.send(CityServiceMessage::PageDone { request, result });
    });
}
