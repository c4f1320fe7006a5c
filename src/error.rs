//! Dispatch errors.

use thiserror::Error;

use torchfn_core::NativeError;

/// Errors surfaced by dispatch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// A handler (or the default implementation) raised. Passed through unchanged.
    #[error(transparent)]
    Handler(#[from] NativeError),

    /// Every override handler declined the call.
    #[error(
        "no implementation found for '{operation}' on types that implement {protocol}: [{}]",
        types.join(", ")
    )]
    NoUsableOverride {
        /// Qualified operation name, e.g. `torch.add`.
        operation: String,
        protocol: String,
        /// Participating type names, in overload-set order.
        types: Vec<String>,
    },

    /// Dispatch reached a state compliant callers and handlers cannot produce.
    #[error("internal dispatch error: {message}")]
    Internal { message: String },
}

impl DispatchError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        DispatchError::Internal {
            message: message.into(),
        }
    }

    /// The handler error, if a handler raised.
    pub fn as_handler(&self) -> Option<&NativeError> {
        match self {
            DispatchError::Handler(err) => Some(err),
            _ => None,
        }
    }
}

/// Mismatch between an implementation and its relevant-args extractor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("implementation and dispatcher for {name} have different function signatures")]
    Mismatch { name: String },
}
