//! Axum HTTP API server.
//!
//! This crate provides:
//! - The `/analyze` upload endpoint around the orchestration engine
//! - Rate limiting and security headers
//! - Prometheus metrics
//! - Health and readiness probes

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
