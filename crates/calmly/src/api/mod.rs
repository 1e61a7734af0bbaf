//! Backend HTTP API.

pub mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse, normalize_error_message};
pub use routes::create_router;
pub use state::AppState;
