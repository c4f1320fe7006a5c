//! Native callables and bound methods.

use std::fmt;
use std::sync::Arc;

use crate::TypeHash;
use crate::error::NativeError;

use super::{Kwargs, Value};

/// Type-erased native function.
///
/// Wraps anything implementing [`NativeCallable`] so handlers, operation
/// implementations and relevant-argument extractors share one
/// representation. The callable sits behind an `Arc`, so clones are cheap and
/// compare equal by identity.
#[derive(Clone)]
pub struct NativeFn {
    id: TypeHash,
    name: Arc<str>,
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl NativeFn {
    /// Create a function from a closure; the id is derived from the name.
    pub fn new<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&[Value], &Kwargs) -> Result<Value, NativeError> + Send + Sync + 'static,
    {
        Self::from_callable(name, f)
    }

    /// Create a function from any [`NativeCallable`].
    pub fn from_callable<C>(name: impl Into<Arc<str>>, callable: C) -> Self
    where
        C: NativeCallable + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            id: TypeHash::from_operation(&name),
            name,
            inner: Arc::new(callable),
        }
    }

    /// Replace the id, keeping the callable.
    pub fn with_id(mut self, id: TypeHash) -> Self {
        self.id = id;
        self
    }

    /// Call this function.
    #[inline]
    pub fn call(&self, args: &[Value], kwargs: &Kwargs) -> Result<Value, NativeError> {
        self.inner.call(args, kwargs)
    }

    pub fn id(&self) -> TypeHash {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether both handles share the same underlying callable.
    pub fn ptr_eq(&self, other: &NativeFn) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Trait for callable native functions.
pub trait NativeCallable {
    fn call(&self, args: &[Value], kwargs: &Kwargs) -> Result<Value, NativeError>;
}

impl<F> NativeCallable for F
where
    F: Fn(&[Value], &Kwargs) -> Result<Value, NativeError>,
{
    fn call(&self, args: &[Value], kwargs: &Kwargs) -> Result<Value, NativeError> {
        (self)(args, kwargs)
    }
}

/// A callable bound to a receiver.
///
/// Calling it prepends the receiver to the positional arguments, the way a
/// class-level function becomes a method when fetched through an instance.
#[derive(Debug, Clone)]
pub struct BoundMethod {
    receiver: Value,
    function: Value,
}

impl BoundMethod {
    pub fn new(receiver: Value, function: Value) -> Self {
        Self { receiver, function }
    }

    pub fn receiver(&self) -> &Value {
        &self.receiver
    }

    pub fn function(&self) -> &Value {
        &self.function
    }

    pub fn call(&self, args: &[Value], kwargs: &Kwargs) -> Result<Value, NativeError> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(self.receiver.clone());
        full.extend_from_slice(args);
        self.function.call(&full, kwargs)
    }
}
