pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod logging_middleware;
pub mod middleware;
pub mod openapi;

pub use error::{ApiError, ApiResult};
