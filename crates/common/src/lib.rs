//! Shared configuration, error types, and observability primitives for veloq crates.
//!
//! Architecture role:
//! - defines engine configuration passed across layers
//! - provides common [`VeloqError`] / [`Result`] contracts, including the
//!   schema-change condition surfaced by schema-stable operators
//! - hosts the metrics registry
//!
//! Key modules:
//! - [`config`]
//! - [`error`]
//! - [`metrics`]

pub mod config;
pub mod error;
pub mod metrics;

pub use config::{EngineConfig, SchemaDriftPolicy};
pub use error::{Result, SchemaChangeError, VeloqError};
pub use metrics::{MetricsRegistry, global_metrics};
