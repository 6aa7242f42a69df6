//! Vector-batch stream abstractions and channel adapters.

use std::pin::Pin;
use std::task::{Context, Poll};

use arrow_schema::SchemaRef;
use futures::Stream;
use futures::channel::mpsc;
use veloq_common::Result;

use crate::batch::VectorBatch;

/// A stream of vector batches that also knows its declared output schema.
///
/// Individual batches may still drift from the declared schema; detecting
/// that is the schema tracker's job, not the stream's.
pub trait VectorBatchStream: Stream<Item = Result<VectorBatch>> + Send {
    /// Declared schema for the batches yielded by this stream.
    fn schema(&self) -> SchemaRef;
}

/// The standard "stream you can return from operators".
pub type SendableVectorBatchStream = Pin<Box<dyn VectorBatchStream>>;

/// Adapter that attaches a schema to any `Stream<Item = Result<VectorBatch>>`.
pub struct StreamAdapter<S> {
    schema: SchemaRef,
    inner: S,
}

impl<S> StreamAdapter<S> {
    /// Create a new schema-attached stream adapter.
    pub fn new(schema: SchemaRef, inner: S) -> Self {
        Self { schema, inner }
    }
}

impl<S> VectorBatchStream for StreamAdapter<S>
where
    S: Stream<Item = Result<VectorBatch>> + Send + Unpin + 'static,
{
    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }
}

impl<S> Stream for StreamAdapter<S>
where
    S: Stream<Item = Result<VectorBatch>> + Unpin,
{
    type Item = Result<VectorBatch>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Create an empty stream (useful for stubs or early returns).
pub fn empty_stream(schema: SchemaRef) -> SendableVectorBatchStream {
    let inner = futures::stream::empty::<Result<VectorBatch>>();
    Box::pin(StreamAdapter::new(schema, inner))
}

/// Create a stream backed by a bounded channel.
///
/// Backpressure: when the receiver is slow and the buffer fills up,
/// `sender.send(..).await` will wait until there is capacity again.
pub fn bounded_batch_channel(
    schema: SchemaRef,
    capacity: usize,
) -> (BatchSender, SendableVectorBatchStream) {
    let (tx, rx) = mpsc::channel::<Result<VectorBatch>>(capacity);
    let stream = Box::pin(StreamAdapter::new(schema, rx));
    (BatchSender { tx }, stream)
}

/// Sender side for [`bounded_batch_channel`].
#[derive(Clone)]
pub struct BatchSender {
    tx: mpsc::Sender<Result<VectorBatch>>,
}

impl BatchSender {
    /// Send a batch (awaits if the channel buffer is full).
    pub async fn send_batch(&mut self, batch: VectorBatch) -> Result<()> {
        use futures::SinkExt;
        self.tx
            .send(Ok(batch))
            .await
            .map_err(|e| veloq_common::VeloqError::Execution(format!("batch channel closed: {e}")))
    }

    /// Send an error and terminate downstream consumption.
    pub async fn send_error(&mut self, err: veloq_common::VeloqError) -> Result<()> {
        use futures::SinkExt;
        self.tx
            .send(Err(err))
            .await
            .map_err(|e| veloq_common::VeloqError::Execution(format!("batch channel closed: {e}")))
    }
}
