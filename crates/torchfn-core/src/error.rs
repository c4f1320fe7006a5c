//! Error types shared by the object model.
//!
//! ```text
//! NativeError        - raised by a callable (handlers, implementations, getters)
//! RegistrationError  - type registration failures
//! ProbeError         - override attribute probing, never surfaced past the registry
//! ```

use thiserror::Error;

use crate::TypeHash;

// ============================================================================
// Native (callable) Errors
// ============================================================================

/// An error raised by a native callable.
///
/// Handler failures travel through dispatch unchanged, so this is what a
/// caller sees when an override handler raises.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    /// A raised exception with its class name and message.
    #[error("{exception}: {message}")]
    Raised { exception: String, message: String },

    /// A non-callable value was called.
    #[error("'{type_name}' object is not callable")]
    NotCallable { type_name: String },

    /// Wrong number of positional arguments.
    #[error("{function}() takes {expected} positional argument(s) but {got} were given")]
    ArgumentCount {
        function: String,
        expected: usize,
        got: usize,
    },

    /// An argument had the wrong type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
}

impl NativeError {
    /// Raise an exception of class `exception`.
    pub fn raise(exception: impl Into<String>, message: impl Into<String>) -> Self {
        NativeError::Raised {
            exception: exception.into(),
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::raise("TypeError", message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::raise("ValueError", message)
    }

    pub fn runtime_error(message: impl Into<String>) -> Self {
        Self::raise("RuntimeError", message)
    }

    /// Exception class name of this error.
    pub fn exception(&self) -> &str {
        match self {
            NativeError::Raised { exception, .. } => exception,
            NativeError::NotCallable { .. }
            | NativeError::ArgumentCount { .. }
            | NativeError::TypeMismatch { .. } => "TypeError",
        }
    }
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors that occur while registering types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("duplicate type: {0}")]
    DuplicateType(String),

    #[error("type not found: {0}")]
    TypeNotFound(String),

    #[error("type '{type_name}' names unregistered base {base}")]
    UnknownBase { type_name: String, base: TypeHash },

    #[error("type '{type_name}' lists base {base} more than once")]
    DuplicateBase { type_name: String, base: TypeHash },

    /// The bases admit no consistent method resolution order.
    #[error("cannot create a consistent method resolution order for '{type_name}'")]
    InconsistentMro { type_name: String },
}

// ============================================================================
// Lookup Errors
// ============================================================================

/// Failure while reading the override attribute of a type.
///
/// The precedence registry converts every lookup error into "no override".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbeError {
    #[error("type {0} is not registered")]
    UnknownType(TypeHash),

    #[error("attribute '{attribute}' getter raised: {source}")]
    Getter {
        attribute: String,
        #[source]
        source: NativeError,
    },
}
