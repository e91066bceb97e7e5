//! Unified error type for the domain layer.
//!
//! Adapters and the vision engine convert these into their own error enums;
//! nothing here depends on I/O or async.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Validation failed (e.g., thresholds out of order)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Parse error (for value objects with FromStr)
    #[error("Parse error: {0}")]
    Parse(String),

    /// A coordinate was NaN or infinite
    #[error("Non-finite coordinate in {context}")]
    NonFiniteCoordinate { context: &'static str },
}

impl DomainError {
    /// Create a validation error for violated invariants.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a parse error for string-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a non-finite coordinate error.
    pub fn non_finite(context: &'static str) -> Self {
        Self::NonFiniteCoordinate { context }
    }
}
