#![deny(missing_docs)]

//! Execution-layer primitives for schema-compatibility tracking.
//!
//! Architecture role:
//! - column vector handles and the batch container operators exchange
//! - batch-to-batch schema version tracking
//! - batch stream abstractions, channels, and the schema-stability guard
//!
//! Key modules:
//! - [`vector`]
//! - [`batch`]
//! - [`schema_tracker`]
//! - [`stream`]
//! - [`schema_guard`]

pub mod batch;
pub mod schema_guard;
pub mod schema_tracker;
pub mod stream;
pub mod vector;

// Re-export only what you want at the crate root (no globs).
pub use batch::VectorBatch;
pub use schema_guard::SchemaGuardStream;
pub use schema_tracker::SchemaTracker;
pub use stream::{
    BatchSender, SendableVectorBatchStream, StreamAdapter, VectorBatchStream,
    bounded_batch_channel, empty_stream,
};
pub use vector::{ColumnVector, NestedVector, ScalarVector, VectorWithOrdinal};
