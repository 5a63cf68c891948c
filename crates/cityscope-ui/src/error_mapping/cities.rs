use crate::services::city_service::CityServiceError;
use cityscope_core::{AppError, CitiesError, ConfigError, NetworkError};

impl From<CityServiceError> for AppError {
    fn from(e: CityServiceError) -> Self {
        match e {
            CityServiceError::Network(s) => AppError::Network(NetworkError::ConnectionFailed(s)),
            CityServiceError::Timeout => AppError::Network(NetworkError::Timeout),
            CityServiceError::Server { status, message } => {
                AppError::Network(NetworkError::ServerError { status, message })
            }
            CityServiceError::Parse(s) => AppError::Cities(CitiesError::MalformedPage(s)),
            CityServiceError::Config(s) => AppError::Config(ConfigError::Invalid(s)),
        }
    }
}
