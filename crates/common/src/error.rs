use arrow_schema::SchemaRef;
use thiserror::Error;

/// Canonical veloq error taxonomy used across crates.
///
/// Classification guidance:
/// - [`VeloqError::InvalidConfig`]: config/environment contract violations
/// - [`VeloqError::Execution`]: runtime operator evaluation or data-shape failures
/// - [`VeloqError::SchemaChange`]: a batch stream changed shape under an operator
///   whose contract requires a stable schema
/// - [`VeloqError::InvalidStructure`]: a column vector reported inconsistent
///   internal structure (producer bug, not a schema change)
/// - [`VeloqError::Io`]: raw filesystem/network IO failures from std APIs
#[derive(Debug, Error)]
pub enum VeloqError {
    /// Invalid or inconsistent configuration state.
    ///
    /// Examples:
    /// - zero batch size
    /// - invalid policy/env/CLI option values
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Runtime execution failures.
    ///
    /// Examples:
    /// - expression evaluation/type mismatch at runtime
    /// - batch channel shut down mid-stream
    #[error("execution error: {0}")]
    Execution(String),

    /// The schema of a batch stream changed and the surrounding operator
    /// cannot handle it. Carries both schemas for diagnostics.
    #[error(transparent)]
    SchemaChange(#[from] SchemaChangeError),

    /// A column vector handle is internally inconsistent, e.g. a nested
    /// column with duplicate child field names. Surfaced immediately instead
    /// of letting a corrupt handle silently compare as unchanged.
    #[error("invalid vector structure: {0}")]
    InvalidStructure(String),

    /// Transparent std IO failures.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Standard veloq result alias.
pub type Result<T> = std::result::Result<T, VeloqError>;

/// Batch schema changed and can't be handled by the current operator.
///
/// Built by the operator that detected the change, never by the tracker
/// itself; the tracker only reports version numbers.
#[derive(Debug, Clone, Error)]
#[error(
    "{message}\nPrior schema: {}\nNew schema: {}",
    format_schema(.prior),
    format_schema(.new)
)]
pub struct SchemaChangeError {
    message: String,
    prior: SchemaRef,
    new: SchemaRef,
}

impl SchemaChangeError {
    /// Build the condition from a message plus the schema before and after
    /// the change.
    pub fn new(message: impl Into<String>, prior: SchemaRef, new: SchemaRef) -> Self {
        Self {
            message: message.into(),
            prior,
            new,
        }
    }

    /// Schema in effect before the change.
    pub fn prior_schema(&self) -> &SchemaRef {
        &self.prior
    }

    /// Schema observed after the change.
    pub fn new_schema(&self) -> &SchemaRef {
        &self.new
    }
}

fn format_schema(schema: &SchemaRef) -> String {
    let cols = schema
        .fields()
        .iter()
        .map(|f| format!("{}: {:?}", f.name(), f.data_type()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{cols}]")
}
