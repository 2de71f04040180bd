pub mod healthcheck;
pub mod metrics;
pub mod movies;
pub mod tokens;
pub mod users;
pub mod utils;

pub use healthcheck::healthcheck;
pub use metrics::metrics;

use crate::error::ApiError;

/// Fallback for unmatched routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
