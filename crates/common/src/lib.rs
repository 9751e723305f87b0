//! Shared configuration, error types, IDs, and observability primitives for FMR crates.
//!
//! Architecture role:
//! - defines the runtime configuration passed across layers
//! - provides common [`FmrError`] / [`Result`] contracts
//! - hosts the metrics registry shared by the runtime
//!
//! Key modules:
//! - [`config`]
//! - [`error`]
//! - [`ids`]
//! - [`metrics`]

pub mod config;
pub mod error;
pub mod ids;
pub mod metrics;

pub use config::RunnerConfig;
pub use error::{FmrError, Result};
pub use ids::*;
pub use metrics::MetricsRegistry;
