//! Maps UI service errors to cityscope_core::AppError for consistent user-facing messages.
//! Each service has its own module to keep mappings small and readable.

mod cities;
mod weather;
