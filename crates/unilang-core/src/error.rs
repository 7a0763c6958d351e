//! Error types and error code constants for the unilang core.
//!
//! Every fallible operation in the core (tree construction, reflection,
//! value access, native resolution, evaluation) returns [`CoreError`].
//! All failures are local and recoverable: the caller decides whether a
//! failure aborts a pass or becomes a diagnostic against a source node.
//!
//! ## Error Code Mapping
//!
//! - `2`: Declaration errors (duplicate names, unknown tree handles)
//! - `3`: Resolution errors (unregistered types, unknown members, unbound names)
//! - `4`: Invocation errors (arity mismatch, reentrant accessors)
//! - `5`: Value errors (variant mismatch, missing keys)
//! - `6`: Configuration errors (malformed resolver tables, unsupported operations)
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

// ============================================================================
// Error Codes
// ============================================================================

/// Stable error classes for host diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    /// Malformed structural input.
    Declaration = 2,
    /// A name or type could not be resolved.
    Resolution = 3,
    /// A call could not be performed as requested.
    Invocation = 4,
    /// A value was used in a role its variant does not support.
    Value = 5,
    /// Resolver tables or configuration are missing or malformed.
    Configuration = 6,
    /// Internal errors (bugs, unexpected state).
    Internal = 10,
}

impl ErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for the core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two declarations share a name within one namespace.
    #[error("duplicate {kind} '{name}' in {scope}")]
    DuplicateDeclaration {
        kind: String,
        name: String,
        scope: String,
    },

    /// Reflection lookup on a value whose type was never described.
    #[error("type '{type_name}' is not registered")]
    NotRegistered { type_name: String },

    /// A registered description lacks the requested member.
    #[error("'{owner}' has no {kind} named '{name}'")]
    UnknownMember {
        owner: String,
        kind: String,
        name: String,
    },

    /// Invocation arity mismatch.
    #[error("expected {expected} arguments, but got {actual} in {method} call")]
    ArgumentCountMismatch {
        expected: usize,
        actual: usize,
        method: String,
    },

    /// A property accessor was re-entered on the same target.
    #[error("reentrant access to property {property}")]
    ReentrantAccessor { property: String },

    /// A value was used in a role its variant does not support.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// An operand has the right variant but a value the operation rejects
    /// (overflow, zero divisor, malformed pattern).
    #[error("invalid operand for '{operation}': {reason}")]
    InvalidOperand { operation: String, reason: String },

    /// Canonical `get`/`remove` on an absent key.
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// An adapter was asked to translate an operation it does not map.
    #[error("unsupported operation '{operation}' for {language}")]
    UnsupportedOperation { operation: String, language: String },

    /// A tree handle does not name a node in this tree.
    #[error("unknown {kind} {id}")]
    UnknownNode { kind: &'static str, id: String },

    /// The evaluator met a name with no binding.
    #[error("unbound identifier '{name}'")]
    UnboundIdentifier { name: String },

    /// Resolver table or configuration could not be loaded.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    Internal { message: String },
}

/// Result alias used throughout the core.
pub type CoreResult<T> = Result<T, CoreError>;

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&CoreError> for ErrorCode {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::DuplicateDeclaration { .. } => ErrorCode::Declaration,
            CoreError::UnknownNode { .. } => ErrorCode::Declaration,
            CoreError::NotRegistered { .. } => ErrorCode::Resolution,
            CoreError::UnknownMember { .. } => ErrorCode::Resolution,
            CoreError::UnboundIdentifier { .. } => ErrorCode::Resolution,
            CoreError::ArgumentCountMismatch { .. } => ErrorCode::Invocation,
            CoreError::ReentrantAccessor { .. } => ErrorCode::Invocation,
            CoreError::TypeMismatch { .. } => ErrorCode::Value,
            CoreError::KeyNotFound { .. } => ErrorCode::Value,
            CoreError::InvalidOperand { .. } => ErrorCode::Value,
            CoreError::UnsupportedOperation { .. } => ErrorCode::Configuration,
            CoreError::Config { .. } => ErrorCode::Configuration,
            CoreError::Internal { .. } => ErrorCode::Internal,
        }
    }
}

impl From<CoreError> for ErrorCode {
    fn from(err: CoreError) -> Self {
        ErrorCode::from(&err)
    }
}

// ============================================================================
// Bridges
// ============================================================================

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Config {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Config {
            message: format!("IO error: {}", err),
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl CoreError {
    /// Create a duplicate declaration error.
    pub fn duplicate(
        kind: impl Into<String>,
        name: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        CoreError::DuplicateDeclaration {
            kind: kind.into(),
            name: name.into(),
            scope: scope.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(expected: impl fmt::Display, actual: impl fmt::Display) -> Self {
        CoreError::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an invalid operand error.
    pub fn invalid_operand(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidOperand {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a key not found error.
    pub fn key_not_found(key: impl fmt::Display) -> Self {
        CoreError::KeyNotFound {
            key: key.to_string(),
        }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(operation: impl Into<String>, language: impl Into<String>) -> Self {
        CoreError::UnsupportedOperation {
            operation: operation.into(),
            language: language.into(),
        }
    }

    /// Create an unknown member error.
    pub fn unknown_member(
        owner: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        CoreError::UnknownMember {
            owner: owner.into(),
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        CoreError::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CoreError::Internal {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod error_code_mapping {
        use super::*;

        #[test]
        fn duplicate_maps_to_declaration() {
            let err = CoreError::duplicate("field", "count", "class Counter");
            assert_eq!(ErrorCode::from(&err), ErrorCode::Declaration);
            assert_eq!(err.error_code().code(), 2);
        }

        #[test]
        fn not_registered_maps_to_resolution() {
            let err = CoreError::NotRegistered {
                type_name: "string".to_string(),
            };
            assert_eq!(err.error_code(), ErrorCode::Resolution);
            assert_eq!(err.error_code().code(), 3);
        }

        #[test]
        fn arity_maps_to_invocation() {
            let err = CoreError::ArgumentCountMismatch {
                expected: 1,
                actual: 2,
                method: "Counter::add".to_string(),
            };
            assert_eq!(err.error_code(), ErrorCode::Invocation);
        }

        #[test]
        fn value_errors_map_to_value() {
            assert_eq!(
                CoreError::type_mismatch("object", "string").error_code(),
                ErrorCode::Value
            );
            assert_eq!(CoreError::key_not_found("x").error_code(), ErrorCode::Value);
            assert_eq!(
                CoreError::invalid_operand("/", "division by zero").error_code(),
                ErrorCode::Value
            );
        }

        #[test]
        fn unsupported_maps_to_configuration() {
            let err = CoreError::unsupported("splice", "typescript");
            assert_eq!(err.error_code().code(), 6);
        }

        #[test]
        fn json_error_bridges_to_config() {
            let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
            let err = CoreError::from(json_err);
            assert!(matches!(err, CoreError::Config { .. }));
        }
    }

    mod error_display {
        use super::*;

        #[test]
        fn arity_display_names_method() {
            let err = CoreError::ArgumentCountMismatch {
                expected: 0,
                actual: 1,
                method: "Counter::increment".to_string(),
            };
            assert_eq!(
                err.to_string(),
                "expected 0 arguments, but got 1 in Counter::increment call"
            );
        }

        #[test]
        fn unsupported_display_names_language() {
            let err = CoreError::unsupported("TsArray.splice", "typescript");
            assert_eq!(
                err.to_string(),
                "unsupported operation 'TsArray.splice' for typescript"
            );
        }

        #[test]
        fn duplicate_display() {
            let err = CoreError::duplicate("method", "run", "class Job");
            assert_eq!(err.to_string(), "duplicate method 'run' in class Job");
        }
    }
}
