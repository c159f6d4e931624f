//! HTTP surface: routing, extractors, the response envelope and error mapping.

pub mod error;
pub mod extract;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use server::{build_router, serve};
pub use state::AppState;
