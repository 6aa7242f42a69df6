//! Schema-stability guard wrapped around a batch stream.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use arrow_schema::{Schema, SchemaRef};
use futures::Stream;
use tracing::debug;
use veloq_common::{MetricsRegistry, Result, SchemaChangeError, SchemaDriftPolicy};

use crate::batch::VectorBatch;
use crate::schema_tracker::SchemaTracker;
use crate::stream::{SendableVectorBatchStream, VectorBatchStream};

/// Runs a [`SchemaTracker`] over every batch an upstream stream yields and
/// applies the configured drift policy.
///
/// The first capture (version 0 to 1) is never drift. Afterwards, a version
/// bump either aborts the stream with a schema-change error carrying both
/// schemas ([`SchemaDriftPolicy::Fail`]) or is logged and passed through for
/// downstream recompilation ([`SchemaDriftPolicy::Adapt`]).
///
/// Errors from the upstream stream and invalid-structure errors from the
/// tracker are propagated unchanged.
pub struct SchemaGuardStream {
    inner: SendableVectorBatchStream,
    tracker: SchemaTracker,
    policy: SchemaDriftPolicy,
    operator: &'static str,
    query_id: String,
    metrics: MetricsRegistry,
    done: bool,
}

impl SchemaGuardStream {
    /// Wrap an upstream stream. `operator` and `query_id` label logs and
    /// metrics.
    pub fn new(
        inner: SendableVectorBatchStream,
        policy: SchemaDriftPolicy,
        operator: &'static str,
        query_id: impl Into<String>,
        metrics: MetricsRegistry,
    ) -> Self {
        Self {
            inner,
            tracker: SchemaTracker::new(),
            policy,
            operator,
            query_id: query_id.into(),
            metrics,
            done: false,
        }
    }

    /// Version assigned to the most recently observed batch; 0 before any.
    pub fn schema_version(&self) -> u64 {
        self.tracker.schema_version()
    }

    /// Schema of the last accepted batch, if any.
    pub fn current_schema(&self) -> Option<&SchemaRef> {
        self.tracker.schema()
    }

    fn observe(&mut self, batch: &VectorBatch) -> Result<u64> {
        let prior_version = self.tracker.schema_version();
        let prior_schema = self.tracker.schema().cloned();
        let version = self.tracker.observe(batch)?;

        self.metrics
            .record_batch_observed(&self.query_id, self.operator);
        self.metrics
            .set_schema_version(&self.query_id, self.operator, version);

        if prior_version != 0 && version != prior_version {
            self.metrics
                .record_schema_change(&self.query_id, self.operator);
            match self.policy {
                SchemaDriftPolicy::Fail => {
                    // prior_version > 0 guarantees a snapshot was captured.
                    let prior = prior_schema.unwrap_or_else(|| Arc::new(Schema::empty()));
                    return Err(SchemaChangeError::new(
                        format!("schema changed between batches in {}", self.operator),
                        prior,
                        batch.schema(),
                    )
                    .into());
                }
                SchemaDriftPolicy::Adapt => {
                    debug!(
                        version,
                        query_id = %self.query_id,
                        operator = self.operator,
                        "schema changed; continuing under adapt policy"
                    );
                }
            }
        }
        Ok(version)
    }
}

impl Stream for SchemaGuardStream {
    type Item = Result<VectorBatch>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(batch))) => match this.observe(&batch) {
                Ok(_) => Poll::Ready(Some(Ok(batch))),
                Err(e) => {
                    this.done = true;
                    Poll::Ready(Some(Err(e)))
                }
            },
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl VectorBatchStream for SchemaGuardStream {
    fn schema(&self) -> SchemaRef {
        self.inner.schema()
    }
}
