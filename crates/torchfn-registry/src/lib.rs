//! Type-precedence registry for override dispatch.
//!
//! - [`TypeRegistry`]: the host type system (types, bases, method resolution
//!   order, class attributes)
//! - [`PrecedenceRegistry`]: the [`OverrideLookup`](torchfn_core::OverrideLookup)
//!   implementation deciding which candidates carry an override handler
//! - [`DispatchConfig`]: protocol name, namespace, base domain type and
//!   exclusion set

mod config;
mod entry;
mod mro;
mod precedence;
mod registry;

pub use config::{ConfigError, DispatchConfig};
pub use entry::{Attribute, Property, TypeEntry};
pub use precedence::PrecedenceRegistry;
pub use registry::TypeRegistry;
