//! Object model for the override dispatch protocol.
//!
//! This crate holds the pieces every other crate in the workspace shares:
//!
//! - [`TypeHash`]: deterministic type identity
//! - [`BuiltinKind`] / [`ExclusionSet`]: built-in types that never override
//! - [`Value`], [`NativeFn`], [`Instance`]: runtime values and callables
//! - [`OverrideLookup`]: the capability interface dispatch is written against
//! - error types ([`NativeError`], [`RegistrationError`], [`ProbeError`])

pub mod builtin;
pub mod error;
pub mod protocol;
pub mod runtime;
mod type_hash;

pub use builtin::{BuiltinKind, ExclusionSet, UnknownBuiltin, builtins};
pub use error::{NativeError, ProbeError, RegistrationError};
pub use protocol::{DEFAULT_PROTOCOL, OverrideLookup};
pub use runtime::{
    BoundMethod, Complex, Instance, Kwargs, Module, NativeCallable, NativeFn, ObjectRef, Slice,
    Value,
};
pub use type_hash::{TypeHash, hash_constants};
