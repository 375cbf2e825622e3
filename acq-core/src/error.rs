//! Error types for acquisition

use thiserror::Error;

/// Acquisition error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AcqError {
    /// The attribute was found neither on the object nor anywhere up its context.
    #[error("{name}")]
    AttributeNotFound {
        /// Name that was requested
        name: String,
    },
    /// The container graph loops back on itself.
    #[error("Recursion detected in acquisition wrapper while resolving '{name}'")]
    RecursionDetected {
        /// Name being resolved when the loop was found
        name: String,
    },
    /// A wrapper could not be constructed from the given arguments.
    #[error("Construction error: {0}")]
    Construction(String),
    /// Persistable state was requested from a wrapper.
    #[error("Can't serialize objects in acquisition wrappers")]
    NotSerializable,
    /// The value does not support the requested protocol operation.
    #[error("'{type_name}' does not support {operation}")]
    Unsupported {
        /// Operation that was attempted
        operation: String,
        /// Type name of the value the operation was attempted on
        type_name: String,
    },
    /// Sequence index outside the valid range.
    #[error("Index out of range: {index}")]
    IndexOutOfRange {
        /// Requested index
        index: i64,
    },
    /// Mapping key is absent.
    #[error("Key not found: {key}")]
    KeyNotFound {
        /// Display form of the missing key
        key: String,
    },
    /// Numeric operation failed (overflow, division by zero).
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),
    /// Attribute assignment on a wrapper that wraps nothing.
    #[error("Attempt to set attribute on empty acquisition wrapper")]
    EmptyWrapper,
    /// A configured limit is invalid.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
    /// Failure raised by user code (filters, methods, capability impls).
    #[error("{0}")]
    Custom(String),
}

impl AcqError {
    /// Build an `AttributeNotFound` for `name`.
    pub fn not_found(name: impl Into<String>) -> Self {
        AcqError::AttributeNotFound { name: name.into() }
    }

    /// Build a `RecursionDetected` for `name`.
    pub fn recursion(name: impl Into<String>) -> Self {
        AcqError::RecursionDetected { name: name.into() }
    }

    /// Build an `Unsupported` error.
    pub fn unsupported(operation: impl Into<String>, type_name: impl Into<String>) -> Self {
        AcqError::Unsupported {
            operation: operation.into(),
            type_name: type_name.into(),
        }
    }

    /// True only for `AttributeNotFound`, the one failure a search may swallow.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AcqError::AttributeNotFound { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AcqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_attribute_not_found_is_recoverable() {
        assert!(AcqError::not_found("color").is_not_found());
        assert!(!AcqError::recursion("color").is_not_found());
        assert!(!AcqError::NotSerializable.is_not_found());
        assert!(!AcqError::KeyNotFound { key: "k".into() }.is_not_found());
    }

    #[test]
    fn test_attribute_not_found_displays_bare_name() {
        assert_eq!(AcqError::not_found("color").to_string(), "color");
    }
}
