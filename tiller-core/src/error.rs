use thiserror::Error;

/// Failures raised by the compiler and the entity engine.
///
/// Public functions return [`crate::Result`], inspect the kind with
/// `error.downcast_ref::<TillerError>()`.
#[derive(Debug, Error)]
pub enum TillerError {
    /// Operands of an operator have incompatible declared types.
    #[error("Type mismatch in `{operation}`: {left} is not compatible with {right}")]
    TypeMismatch {
        operation: String,
        left: String,
        right: String,
    },
    #[error("Identifier `{identifier}` is {length} characters long, {dialect} allows at most {limit}")]
    IdentifierTooLong {
        dialect: &'static str,
        identifier: String,
        length: usize,
        limit: usize,
    },
    #[error("Alias `{0}` is declared by more than one table in the same query")]
    DuplicateAlias(String),
    #[error(
        "Bulk item {index} assigns columns ({found}) but the first item assigns ({expected})"
    )]
    InconsistentBulkShape {
        index: usize,
        expected: String,
        found: String,
    },
    /// Driver failure, the original cause is the next element of the error chain.
    #[error("Error while executing the query:\n{sql}")]
    QueryExecution { sql: String },
    #[error("Entity `{0}` is not attached to any table, load or insert it first")]
    NotAttached(String),
    #[error("Primary key `{0}` cannot be modified once the entity is attached")]
    PrimaryKeyImmutable(String),
    #[error(
        "this.{0} may be unexpectedly discarded: it belongs to another entity graph and has unflushed changes, flush it first"
    )]
    UnflushedNestedChanges(String),
    #[error("{feature} is not supported by the {dialect} dialect")]
    Unsupported {
        dialect: &'static str,
        feature: String,
    },
}

impl TillerError {
    pub(crate) fn type_mismatch(
        operation: impl Into<String>,
        left: &crate::Value,
        right: &crate::Value,
    ) -> Self {
        TillerError::TypeMismatch {
            operation: operation.into(),
            left: left.type_name().into(),
            right: right.type_name().into(),
        }
    }
}
