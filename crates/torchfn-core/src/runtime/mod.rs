//! Runtime values and callables.
//!
//! ## Key Types
//!
//! - [`Value`]: dynamic value passed to and returned from handlers
//! - [`NativeFn`]: type-erased callable (handlers, implementations, extractors)
//! - [`BoundMethod`]: callable bound to a receiver
//! - [`Instance`]: instance of a registered class

mod native_fn;
mod object;
mod value;

pub use native_fn::{BoundMethod, NativeCallable, NativeFn};
pub use object::{Instance, ObjectRef};
pub use value::{Complex, Kwargs, Module, Slice, Value};
