//! # api-adapters
//!
//! JSON-over-HTTP surface of the engagement engine. The axum router lives
//! behind the `web-axum` feature; wire types and metrics are always built so
//! other adapters can reuse them.

pub mod dto;
pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;
#[cfg(feature = "web-axum")]
mod router;

#[cfg(feature = "web-axum")]
pub use router::build_router;

pub use metrics::{Action, Metrics};

use services::Engine;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            metrics: Metrics::new(),
        }
    }
}
