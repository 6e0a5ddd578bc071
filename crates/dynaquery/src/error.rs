//! Error types for dynaquery

use crate::qb::QueryMode;
use thiserror::Error;

/// Result type alias for dynaquery operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while building or compiling a query.
///
/// Every variant is a configuration error: compilation is pure, so nothing here is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// UPDATE rendered without any field/value assignments
    #[error("No fields to update provided")]
    MissingUpdateFields,

    /// No root entity type and no custom source to render the FROM part
    #[error("Root entity type is not set for {0} query")]
    MissingRootType(QueryMode),

    /// A condition kind received the wrong number of operands
    #[error("Condition '{op}' expects {expected} operand(s), got {actual}")]
    InvalidArity {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A condition operand has a type the kind cannot use
    #[error("Invalid operand for '{op}': {message}")]
    InvalidOperand { op: &'static str, message: String },

    /// Operation is only valid for another query mode
    #[error("Query builder type should be {expected}, got {actual}")]
    WrongMode {
        expected: QueryMode,
        actual: QueryMode,
    },

    /// A fixed placeholder name would be bound to two different values
    #[error("Placeholder ':{0}' is already bound to a different value")]
    PlaceholderConflict(String),

    /// Condition kind that cannot be evaluated outside the query engine
    #[error("Unsupported condition: {0}")]
    Unsupported(String),

    /// Configuration loading error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Example object could not be converted to property values
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error reported by a query executor
    #[error("Executor error: {0}")]
    Executor(String),
}

impl QueryError {
    /// Create an arity error for a condition operator
    pub fn invalid_arity(op: &'static str, expected: usize, actual: usize) -> Self {
        Self::InvalidArity {
            op,
            expected,
            actual,
        }
    }

    /// Create an invalid operand error
    pub fn invalid_operand(op: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidOperand {
            op,
            message: message.into(),
        }
    }

    /// Create an unsupported condition error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Create an executor error
    pub fn executor(message: impl Into<String>) -> Self {
        Self::Executor(message.into())
    }

    /// Check if this is an unsupported condition error
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    /// Check if this is an arity error
    pub fn is_invalid_arity(&self) -> bool {
        matches!(self, Self::InvalidArity { .. })
    }
}

impl From<toml::de::Error> for QueryError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
