//! Override dispatch for polymorphic operations.
//!
//! Given a call and the arguments relevant to it, `torchfn` finds the
//! arguments whose types define an override handler (the `__torch_function__`
//! protocol by default), orders them most-derived first and invokes them
//! until one produces a result.
//!
//! ```text
//! call site -> relevant args -> collect (PrecedenceRegistry) -> invoke -> result
//! ```
//!
//! The object model lives in `torchfn-core` and the type registry in
//! `torchfn-registry`; this crate holds the collector, the invoker and the
//! [`DispatchableFn`] wrapper built on them.

mod collector;
mod dispatcher;
mod error;
mod invoker;
mod signature;

#[cfg(test)]
mod testing;

pub use collector::{OverloadSet, collect};
pub use dispatcher::{DispatchableFn, Dispatcher, RelevantArgs};
pub use error::{DispatchError, SignatureError};
pub use invoker::{Operation, OverrideCall, invoke};
pub use signature::{Param, Signature, verify_matching_signatures};

/// Everything needed to register types and dispatch calls.
pub mod prelude {
    pub use crate::{
        DispatchError, DispatchableFn, Dispatcher, Operation, OverloadSet, OverrideCall,
        Signature, SignatureError, collect, invoke,
    };
    pub use torchfn_core::{
        BuiltinKind, ExclusionSet, Instance, Kwargs, NativeError, NativeFn, OverrideLookup,
        TypeHash, Value,
    };
    pub use torchfn_registry::{
        Attribute, DispatchConfig, PrecedenceRegistry, Property, TypeEntry, TypeRegistry,
    };
}
