//! The batch container passed between execution stages.

use std::sync::Arc;

use arrow_schema::{Fields, Schema, SchemaRef};

use crate::vector::ColumnVector;

/// One columnar unit of data flowing between operators: an ordered sequence
/// of named column vector handles plus the column-type schema derived from
/// them. Column order is significant.
///
/// Cloning a batch shares every vector allocation; the producer keeps
/// ownership of the backing storage.
#[derive(Debug, Clone)]
pub struct VectorBatch {
    schema: SchemaRef,
    columns: Vec<ColumnVector>,
}

impl VectorBatch {
    /// Build a batch from its columns, deriving the schema from their
    /// declared fields.
    pub fn new(columns: Vec<ColumnVector>) -> Self {
        let fields: Fields = columns.iter().map(|c| Arc::clone(c.field())).collect();
        let schema = Arc::new(Schema::new(fields));
        Self { schema, columns }
    }

    /// A batch with zero columns and an empty schema.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Column-type schema of this batch.
    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column handle at the given ordinal, if any.
    pub fn column(&self, ordinal: usize) -> Option<&ColumnVector> {
        self.columns.get(ordinal)
    }

    /// All column handles in ordinal order.
    pub fn columns(&self) -> &[ColumnVector] {
        &self.columns
    }
}
