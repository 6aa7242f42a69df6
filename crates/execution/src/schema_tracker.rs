//! Batch-to-batch schema compatibility tracking.

use arrow_schema::SchemaRef;
use tracing::debug;
use veloq_common::Result;

use crate::batch::VectorBatch;
use crate::vector::{ColumnVector, NestedVector};

/// Tracks schema changes across the batches an upstream stage produces, as
/// periodic snapshots taken once per batch.
///
/// "Schema change" means more than a change in column names or types: code
/// compiled downstream binds to the specific vector allocations of a batch,
/// so handing over a different allocation is as serious as a different
/// column set. The one exception is nested columns, which readers typically
/// rebuild on every batch; those are compared structurally so a rebuild with
/// identical shape does not spuriously invalidate downstream logic.
///
/// Versions start at 1. A version of 0 means no batch was ever observed.
///
/// A tracker belongs to a single operator instance and a single batch
/// stream; it is not meant to be shared across threads.
#[derive(Debug, Default)]
pub struct SchemaTracker {
    schema_version: u64,
    current_schema: Option<SchemaRef>,
    current_vectors: Vec<ColumnVector>,
}

impl SchemaTracker {
    /// A tracker that has observed nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare one incoming batch against the current snapshot.
    ///
    /// Compatible batches leave the tracker untouched. An incompatible batch
    /// (or the very first one) bumps the version and replaces the snapshot
    /// wholesale. Returns the version in effect after the call.
    ///
    /// The only error is the invalid-structure condition, raised when a
    /// nested column reports an ambiguous child; a malformed handle is a
    /// producer bug, and treating it as "unchanged" would hide real drift.
    pub fn observe(&mut self, batch: &VectorBatch) -> Result<u64> {
        if self.schema_version == 0 || !self.is_same_schema(batch)? {
            self.schema_version += 1;
            self.capture(batch);
            debug!(
                version = self.schema_version,
                columns = batch.num_columns(),
                operator = "SchemaTracker",
                "captured new schema snapshot"
            );
        }
        Ok(self.schema_version)
    }

    fn is_same_schema(&self, batch: &VectorBatch) -> Result<bool> {
        if self.current_vectors.len() != batch.num_columns() {
            return Ok(false);
        }

        // Top-level columns must be the same allocation, not merely the same
        // name and type.
        for (current, new) in self.current_vectors.iter().zip(batch.columns().iter()) {
            if current.same_storage(new) {
                continue;
            }
            match (current, new) {
                (ColumnVector::Nested(c), ColumnVector::Nested(n)) => {
                    if !same_nested_vectors(c, n)? {
                        debug!(
                            column = current.name(),
                            operator = "SchemaTracker",
                            "nested columns differ"
                        );
                        return Ok(false);
                    }
                    debug!(
                        column = current.name(),
                        operator = "SchemaTracker",
                        "nested columns match structurally"
                    );
                }
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    fn capture(&mut self, batch: &VectorBatch) {
        self.current_vectors.clear();
        self.current_vectors.extend_from_slice(batch.columns());
        self.current_schema = Some(batch.schema());
    }

    /// Version of the current snapshot; 0 iff no batch was ever observed.
    pub fn schema_version(&self) -> u64 {
        self.schema_version
    }

    /// Column-type schema of the last accepted batch, if any.
    pub fn schema(&self) -> Option<&SchemaRef> {
        self.current_schema.as_ref()
    }
}

/// Structural comparison for nested columns whose allocations differ.
///
/// Capacity and child count must match, every current child must be present
/// in the new vector under the same name at the same ordinal, nested children
/// recurse, and scalar children compare by declared field definition.
fn same_nested_vectors(current: &NestedVector, new: &NestedVector) -> Result<bool> {
    if current.capacity() != new.capacity() {
        return Ok(false);
    }
    if current.child_count() != new.child_count() {
        return Ok(false);
    }
    for (ordinal, child_current) in current.children() {
        let Some(child_new) = new.child_by_name(child_current.name())? else {
            return Ok(false);
        };
        if child_new.ordinal != ordinal {
            return Ok(false);
        }
        match (child_current, child_new.vector) {
            (ColumnVector::Nested(c), ColumnVector::Nested(n)) => {
                if !same_nested_vectors(c, n)? {
                    return Ok(false);
                }
            }
            _ => {
                if !child_current.same_definition(child_new.vector) {
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Date32Array, Int64Array};
    use arrow_schema::{DataType, Field};
    use veloq_common::VeloqError;

    use super::SchemaTracker;
    use crate::batch::VectorBatch;
    use crate::vector::{ColumnVector, NestedVector, ScalarVector};

    fn int_col(name: &str) -> ColumnVector {
        ScalarVector::new(
            Field::new(name, DataType::Int64, true),
            Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef,
        )
        .into()
    }

    fn date_col(name: &str) -> ColumnVector {
        ScalarVector::new(
            Field::new(name, DataType::Date32, true),
            Arc::new(Date32Array::from(vec![18993, 18994])) as ArrayRef,
        )
        .into()
    }

    #[test]
    fn version_is_zero_before_first_batch() {
        let tracker = SchemaTracker::new();
        assert_eq!(tracker.schema_version(), 0);
        assert!(tracker.schema().is_none());
    }

    #[test]
    fn first_batch_sets_version_one() {
        let mut tracker = SchemaTracker::new();
        let batch = VectorBatch::new(vec![date_col("date_col")]);
        assert_eq!(tracker.observe(&batch).unwrap(), 1);
        assert_eq!(tracker.schema_version(), 1);
        let schema = tracker.schema().unwrap();
        assert_eq!(schema.field(0).name(), "date_col");
    }

    #[test]
    fn same_vectors_leave_version_unchanged() {
        let mut tracker = SchemaTracker::new();
        let batch = VectorBatch::new(vec![date_col("date_col")]);
        tracker.observe(&batch).unwrap();
        // A clone shares every allocation, so it reads as the same batch.
        let again = batch.clone();
        assert_eq!(tracker.observe(&again).unwrap(), 1);
        assert_eq!(tracker.observe(&batch).unwrap(), 1);
    }

    #[test]
    fn new_storage_with_same_type_bumps_version() {
        let mut tracker = SchemaTracker::new();
        tracker
            .observe(&VectorBatch::new(vec![date_col("date_col")]))
            .unwrap();
        // Same name and type, different backing allocation.
        let rebuilt = VectorBatch::new(vec![date_col("date_col")]);
        assert_eq!(tracker.observe(&rebuilt).unwrap(), 2);
        assert_eq!(tracker.schema().unwrap().field(0).name(), "date_col");
    }

    #[test]
    fn column_count_change_bumps_version() {
        let mut tracker = SchemaTracker::new();
        let a = int_col("a");
        tracker
            .observe(&VectorBatch::new(vec![a.clone()]))
            .unwrap();
        assert_eq!(
            tracker
                .observe(&VectorBatch::new(vec![a, int_col("b")]))
                .unwrap(),
            2
        );
    }

    #[test]
    fn empty_batches_are_compatible_with_each_other() {
        let mut tracker = SchemaTracker::new();
        assert_eq!(tracker.observe(&VectorBatch::empty()).unwrap(), 1);
        assert!(tracker.schema().unwrap().fields().is_empty());
        assert_eq!(tracker.observe(&VectorBatch::empty()).unwrap(), 1);
    }

    #[test]
    fn rebuilt_nested_column_is_tolerated() {
        let mut tracker = SchemaTracker::new();
        let first = NestedVector::new("info", 16, vec![int_col("a"), int_col("b")]);
        tracker
            .observe(&VectorBatch::new(vec![first.into()]))
            .unwrap();
        // New storage, same child names, types, ordinals, and capacity.
        let rebuilt = NestedVector::new("info", 16, vec![int_col("a"), int_col("b")]);
        assert_eq!(
            tracker.observe(&VectorBatch::new(vec![rebuilt.into()])).unwrap(),
            1
        );
    }

    #[test]
    fn reordered_nested_children_bump_version() {
        let mut tracker = SchemaTracker::new();
        let first = NestedVector::new("info", 16, vec![int_col("a"), int_col("b")]);
        tracker
            .observe(&VectorBatch::new(vec![first.into()]))
            .unwrap();
        let reordered = NestedVector::new("info", 16, vec![int_col("b"), int_col("a")]);
        assert_eq!(
            tracker
                .observe(&VectorBatch::new(vec![reordered.into()]))
                .unwrap(),
            2
        );
    }

    #[test]
    fn renamed_nested_child_bumps_version() {
        let mut tracker = SchemaTracker::new();
        let first = NestedVector::new("info", 16, vec![int_col("a"), int_col("b")]);
        tracker
            .observe(&VectorBatch::new(vec![first.into()]))
            .unwrap();
        let renamed = NestedVector::new("info", 16, vec![int_col("a"), int_col("c")]);
        assert_eq!(
            tracker
                .observe(&VectorBatch::new(vec![renamed.into()]))
                .unwrap(),
            2
        );
    }

    #[test]
    fn removed_nested_child_bumps_version() {
        let mut tracker = SchemaTracker::new();
        let first = NestedVector::new("info", 16, vec![int_col("a"), int_col("b")]);
        tracker
            .observe(&VectorBatch::new(vec![first.into()]))
            .unwrap();
        let shrunk = NestedVector::new("info", 16, vec![int_col("a")]);
        assert_eq!(
            tracker.observe(&VectorBatch::new(vec![shrunk.into()])).unwrap(),
            2
        );
    }

    #[test]
    fn nested_capacity_change_bumps_version() {
        let mut tracker = SchemaTracker::new();
        let first = NestedVector::new("info", 16, vec![int_col("a")]);
        tracker
            .observe(&VectorBatch::new(vec![first.into()]))
            .unwrap();
        let grown = NestedVector::new("info", 32, vec![int_col("a")]);
        assert_eq!(
            tracker.observe(&VectorBatch::new(vec![grown.into()])).unwrap(),
            2
        );
    }

    #[test]
    fn nested_child_type_change_bumps_version() {
        let mut tracker = SchemaTracker::new();
        let first = NestedVector::new("info", 16, vec![int_col("a")]);
        tracker
            .observe(&VectorBatch::new(vec![first.into()]))
            .unwrap();
        let retyped = NestedVector::new("info", 16, vec![date_col("a")]);
        assert_eq!(
            tracker
                .observe(&VectorBatch::new(vec![retyped.into()]))
                .unwrap(),
            2
        );
    }

    #[test]
    fn deeply_nested_rebuild_is_tolerated_but_reorder_is_not() {
        let mut tracker = SchemaTracker::new();
        let inner = NestedVector::new("inner", 8, vec![int_col("x"), int_col("y")]);
        let outer = NestedVector::new("outer", 8, vec![inner.into(), int_col("z")]);
        tracker
            .observe(&VectorBatch::new(vec![outer.into()]))
            .unwrap();

        // Full rebuild with identical shape at every level.
        let inner2 = NestedVector::new("inner", 8, vec![int_col("x"), int_col("y")]);
        let outer2 = NestedVector::new("outer", 8, vec![inner2.into(), int_col("z")]);
        assert_eq!(
            tracker.observe(&VectorBatch::new(vec![outer2.into()])).unwrap(),
            1
        );

        // Reorder two levels down.
        let inner3 = NestedVector::new("inner", 8, vec![int_col("y"), int_col("x")]);
        let outer3 = NestedVector::new("outer", 8, vec![inner3.into(), int_col("z")]);
        assert_eq!(
            tracker.observe(&VectorBatch::new(vec![outer3.into()])).unwrap(),
            2
        );
    }

    #[test]
    fn nested_replacing_scalar_bumps_version() {
        let mut tracker = SchemaTracker::new();
        tracker
            .observe(&VectorBatch::new(vec![int_col("info")]))
            .unwrap();
        let nested = NestedVector::new("info", 16, vec![int_col("a")]);
        assert_eq!(
            tracker.observe(&VectorBatch::new(vec![nested.into()])).unwrap(),
            2
        );
    }

    #[test]
    fn duplicate_child_name_surfaces_invalid_structure() {
        let mut tracker = SchemaTracker::new();
        let first = NestedVector::new("info", 16, vec![int_col("a"), int_col("b")]);
        tracker
            .observe(&VectorBatch::new(vec![first.into()]))
            .unwrap();
        let malformed = NestedVector::new("info", 16, vec![int_col("a"), int_col("a")]);
        let err = tracker
            .observe(&VectorBatch::new(vec![malformed.into()]))
            .unwrap_err();
        assert!(matches!(err, VeloqError::InvalidStructure(_)));
        // The failed observation must not have disturbed the snapshot.
        assert_eq!(tracker.schema_version(), 1);
    }

    #[test]
    fn version_is_monotonic_over_a_mixed_sequence() {
        let mut tracker = SchemaTracker::new();
        let stable = VectorBatch::new(vec![int_col("a"), int_col("b")]);
        let mut last = 0;
        for batch in [
            stable.clone(),
            stable.clone(),
            VectorBatch::new(vec![int_col("a"), int_col("b")]),
            stable.clone(),
            VectorBatch::new(vec![int_col("a")]),
        ] {
            let version = tracker.observe(&batch).unwrap();
            assert!(version >= last);
            assert!(version - last <= 1);
            last = version;
        }
        assert_eq!(last, 4);
    }
}
