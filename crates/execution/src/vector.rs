//! Column vector handles exchanged between operators.
//!
//! Every column of a batch is backed by one vector allocation. Downstream
//! operators compile processing logic against the exact allocation, so two
//! notions of equality exist side by side and must not be conflated:
//!
//! - [`ColumnVector::same_storage`]: the same underlying allocation
//! - [`ColumnVector::same_definition`]: the same declared field definition
//!
//! Nested (struct-like) columns carry named, ordinally positioned children
//! and expose the lookup capability the schema tracker compares with.

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow_schema::{DataType, Field, FieldRef, Fields};
use veloq_common::{Result, VeloqError};

/// Handle to one column's backing storage for a batch.
///
/// A closed set of shapes: comparison code matches on the variant instead of
/// inspecting runtime types.
#[derive(Debug, Clone)]
pub enum ColumnVector {
    /// Flat column backed by a single array allocation.
    Scalar(ScalarVector),
    /// Struct-like column containing named child columns.
    Nested(NestedVector),
}

impl ColumnVector {
    /// Declared field definition (name, type, nullability) of this column.
    pub fn field(&self) -> &FieldRef {
        match self {
            ColumnVector::Scalar(v) => v.field(),
            ColumnVector::Nested(v) => v.field(),
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        self.field().name()
    }

    /// Column data type.
    pub fn data_type(&self) -> &DataType {
        self.field().data_type()
    }

    /// Whether this handle is a nested (struct-like) column.
    pub fn is_nested(&self) -> bool {
        matches!(self, ColumnVector::Nested(_))
    }

    /// Storage identity: true only if both handles refer to the exact same
    /// underlying allocation. Handles of different shapes never share storage.
    pub fn same_storage(&self, other: &Self) -> bool {
        match (self, other) {
            (ColumnVector::Scalar(a), ColumnVector::Scalar(b)) => a.same_storage(b),
            (ColumnVector::Nested(a), ColumnVector::Nested(b)) => a.same_storage(b),
            _ => false,
        }
    }

    /// Structural equality of the declared field definitions, ignoring which
    /// allocation backs each handle.
    pub fn same_definition(&self, other: &Self) -> bool {
        self.field() == other.field()
    }
}

impl From<ScalarVector> for ColumnVector {
    fn from(v: ScalarVector) -> Self {
        ColumnVector::Scalar(v)
    }
}

impl From<NestedVector> for ColumnVector {
    fn from(v: NestedVector) -> Self {
        ColumnVector::Nested(v)
    }
}

/// Flat column vector: a declared field plus the array allocation holding its
/// values. Cloning shares the allocation; identity follows the allocation,
/// not the handle.
#[derive(Debug, Clone)]
pub struct ScalarVector {
    field: FieldRef,
    values: ArrayRef,
}

impl ScalarVector {
    /// Wrap an array allocation under a declared field.
    ///
    /// The field's data type must describe `values`; producers build both
    /// together.
    pub fn new(field: impl Into<FieldRef>, values: ArrayRef) -> Self {
        Self {
            field: field.into(),
            values,
        }
    }

    /// Declared field definition.
    pub fn field(&self) -> &FieldRef {
        &self.field
    }

    /// The backing array.
    pub fn values(&self) -> &ArrayRef {
        &self.values
    }

    /// True only if both handles share the same array allocation.
    pub fn same_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }
}

/// Struct-like column vector with named, ordinally positioned children.
///
/// The whole child tree hangs off one shared allocation; cloning the handle
/// never copies children.
#[derive(Debug, Clone)]
pub struct NestedVector {
    inner: Arc<NestedData>,
}

#[derive(Debug)]
struct NestedData {
    field: FieldRef,
    capacity: usize,
    children: Vec<ColumnVector>,
}

/// A child column found by name, together with its ordinal position inside
/// the parent.
#[derive(Debug)]
pub struct VectorWithOrdinal<'a> {
    /// Position of the child within its parent.
    pub ordinal: usize,
    /// The child column handle.
    pub vector: &'a ColumnVector,
}

impl NestedVector {
    /// Build a nested vector from its children. The struct field definition
    /// is derived from the children's fields, in order.
    ///
    /// `capacity` is the allocated value-slot count, which can exceed the row
    /// count of any batch the vector currently holds.
    pub fn new(name: impl Into<String>, capacity: usize, children: Vec<ColumnVector>) -> Self {
        let fields: Fields = children.iter().map(|c| Arc::clone(c.field())).collect();
        let field = Arc::new(Field::new(name, DataType::Struct(fields), true));
        Self {
            inner: Arc::new(NestedData {
                field,
                capacity,
                children,
            }),
        }
    }

    /// Declared struct field definition.
    pub fn field(&self) -> &FieldRef {
        &self.inner.field
    }

    /// Allocated value-slot count.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Number of child columns.
    pub fn child_count(&self) -> usize {
        self.inner.children.len()
    }

    /// Iterate children in ordinal order.
    pub fn children(&self) -> impl Iterator<Item = (usize, &ColumnVector)> + '_ {
        self.inner.children.iter().enumerate()
    }

    /// Child at the given ordinal, if any.
    pub fn child_by_ordinal(&self, ordinal: usize) -> Option<&ColumnVector> {
        self.inner.children.get(ordinal)
    }

    /// Look up a child by field name, returning it with its ordinal.
    ///
    /// A duplicate child name makes the lookup ambiguous and is surfaced as
    /// an invalid-structure error rather than resolved arbitrarily.
    pub fn child_by_name(&self, name: &str) -> Result<Option<VectorWithOrdinal<'_>>> {
        let mut found: Option<VectorWithOrdinal<'_>> = None;
        for (ordinal, child) in self.children() {
            if child.name() == name {
                if found.is_some() {
                    return Err(VeloqError::InvalidStructure(format!(
                        "duplicate child field `{name}` in nested column `{}`",
                        self.field().name()
                    )));
                }
                found = Some(VectorWithOrdinal {
                    ordinal,
                    vector: child,
                });
            }
        }
        Ok(found)
    }

    /// True only if both handles share the same underlying allocation.
    pub fn same_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
