//! API layer
//!
//! HTTP handlers for:
//! - Status interaction endpoints (descendants, favourites, boosts)
//! - Metrics (Prometheus)

pub mod metrics;
mod statuses;

pub use metrics::metrics_router;
pub use statuses::{StatusQuery, statuses_router};
