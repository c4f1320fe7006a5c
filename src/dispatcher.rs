//! Dispatcher facade and dispatchable operations.
//!
//! A [`Dispatcher`] wraps an [`OverrideLookup`] and runs collect + invoke.
//! A [`DispatchableFn`] packages one overridable operation: its default
//! implementation, its relevant-args extractor, and the public function
//! handed to override handlers.
//!
//! # Example
//!
//! ```
//! use torchfn::{DispatchableFn, Dispatcher};
//! use torchfn_core::{Kwargs, NativeError, NativeFn, Value};
//! use torchfn_registry::{DispatchConfig, TypeRegistry};
//!
//! let types = TypeRegistry::with_builtins();
//! let config = DispatchConfig::default();
//! let dispatcher = Dispatcher::over(&types, &config);
//!
//! let neg = DispatchableFn::new(
//!     NativeFn::new("neg", |args: &[Value], _: &Kwargs| {
//!         Ok(Value::Int(-args[0].as_int().unwrap_or(0)))
//!     }),
//!     |args: &[Value], _: &Kwargs| -> Result<Vec<Value>, NativeError> { Ok(args.to_vec()) },
//! );
//!
//! let result = dispatcher.call(&neg, &[Value::Int(2)], &Kwargs::new()).unwrap();
//! assert_eq!(result, Value::Int(-2));
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use torchfn_core::{Kwargs, NativeError, NativeFn, OverrideLookup, Value};
use torchfn_registry::{DispatchConfig, PrecedenceRegistry, TypeRegistry};

use crate::collector::{OverloadSet, collect};
use crate::error::{DispatchError, SignatureError};
use crate::invoker::{Operation, invoke};
use crate::signature::{Signature, verify_matching_signatures};

// ============================================================================
// Dispatcher
// ============================================================================

/// Runs dispatch against one lookup.
#[derive(Debug, Clone)]
pub struct Dispatcher<L> {
    lookup: L,
}

impl<'r> Dispatcher<PrecedenceRegistry<'r>> {
    /// Dispatch over a type registry with the given configuration.
    pub fn over(types: &'r TypeRegistry, config: &'r DispatchConfig) -> Self {
        Self::new(PrecedenceRegistry::new(types, config))
    }
}

impl<L: OverrideLookup> Dispatcher<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub fn collect<'a, I>(&self, relevant: I) -> OverloadSet<'a>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        collect(&self.lookup, relevant)
    }

    /// Collect and invoke.
    ///
    /// A call with no overriding arguments is an internal error here; use
    /// [`try_dispatch`](Self::try_dispatch) or [`implement`](Self::implement)
    /// when that can happen.
    pub fn dispatch<'a, I>(
        &self,
        operation: &Operation<'_>,
        relevant: I,
    ) -> Result<Value, DispatchError>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let overloads = self.collect(relevant);
        invoke(&self.lookup, &overloads, operation)
    }

    /// Collect and invoke, or `Ok(None)` when no argument overrides.
    pub fn try_dispatch<'a, I>(
        &self,
        operation: &Operation<'_>,
        relevant: I,
    ) -> Result<Option<Value>, DispatchError>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let overloads = self.collect(relevant);
        if overloads.is_empty() {
            return Ok(None);
        }
        invoke(&self.lookup, &overloads, operation).map(Some)
    }

    /// Dispatch, falling back to `implementation` when no argument overrides.
    pub fn implement<'a, I>(
        &self,
        implementation: &NativeFn,
        operation: &Operation<'_>,
        relevant: I,
    ) -> Result<Value, DispatchError>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        match self.try_dispatch(operation, relevant)? {
            Some(result) => Ok(result),
            None => {
                trace!(op = operation.name, "no overrides, calling implementation");
                Ok(implementation.call(operation.args, operation.kwargs)?)
            }
        }
    }

    /// Call a dispatchable operation.
    pub fn call(
        &self,
        function: &DispatchableFn,
        args: &[Value],
        kwargs: &Kwargs,
    ) -> Result<Value, DispatchError> {
        function.call(&self.lookup, args, kwargs)
    }
}

// ============================================================================
// DispatchableFn
// ============================================================================

/// Extracts the arguments that should be checked for overrides.
pub trait RelevantArgs: Send + Sync {
    fn relevant_args(&self, args: &[Value], kwargs: &Kwargs) -> Result<Vec<Value>, NativeError>;
}

impl<F> RelevantArgs for F
where
    F: Fn(&[Value], &Kwargs) -> Result<Vec<Value>, NativeError> + Send + Sync,
{
    fn relevant_args(&self, args: &[Value], kwargs: &Kwargs) -> Result<Vec<Value>, NativeError> {
        self(args, kwargs)
    }
}

/// An overridable operation.
///
/// Calling it extracts the relevant arguments, runs the default
/// implementation when none of them overrides, and otherwise invokes the
/// overrides with [`reference`](Self::reference) as the operation. The
/// reference is a function named after the operation that runs the
/// implementation, so a handler can defer to the default behaviour by
/// calling it.
///
/// Calling [`reference`](Self::reference) or [`public_api`](Self::public_api)
/// runs the implementation directly. It does not dispatch again, so overrides
/// on its arguments are not consulted.
#[derive(Clone)]
pub struct DispatchableFn {
    name: Arc<str>,
    module: Option<Arc<str>>,
    implementation: NativeFn,
    relevant_args: Arc<dyn RelevantArgs>,
    public_api: NativeFn,
    reference: Value,
}

impl DispatchableFn {
    /// Wrap `implementation`, taking the operation name from it.
    pub fn new<R>(implementation: NativeFn, relevant_args: R) -> Self
    where
        R: RelevantArgs + 'static,
    {
        let name: Arc<str> = Arc::from(implementation.name());
        let inner = implementation.clone();
        let public_api = NativeFn::new(name.clone(), move |args: &[Value], kwargs: &Kwargs| {
            inner.call(args, kwargs)
        });

        Self {
            name,
            module: None,
            implementation,
            relevant_args: Arc::new(relevant_args),
            reference: Value::Function(public_api.clone()),
            public_api,
        }
    }

    /// Like [`new`](Self::new), after checking the two parameter lists agree.
    pub fn verified<R>(
        implementation: NativeFn,
        implementation_signature: &Signature,
        relevant_args: R,
        dispatcher_signature: &Signature,
    ) -> Result<Self, SignatureError>
    where
        R: RelevantArgs + 'static,
    {
        verify_matching_signatures(
            implementation.name(),
            implementation_signature,
            dispatcher_signature,
        )?;
        Ok(Self::new(implementation, relevant_args))
    }

    /// Record the module the public function belongs to.
    ///
    /// This is metadata only. Dispatch diagnostics qualify the operation with
    /// the lookup's namespace, never with this module.
    pub fn with_module(mut self, module: impl Into<Arc<str>>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module set by [`with_module`](Self::with_module).
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// The undecorated implementation.
    pub fn implementation(&self) -> &NativeFn {
        &self.implementation
    }

    /// The public function handed to handlers.
    ///
    /// Calling it runs the implementation without dispatching.
    pub fn public_api(&self) -> &NativeFn {
        &self.public_api
    }

    /// [`public_api`](Self::public_api) as a value.
    ///
    /// Calling it runs the implementation without dispatching.
    pub fn reference(&self) -> &Value {
        &self.reference
    }

    /// Dispatch a call to this operation.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call<L>(
        &self,
        lookup: &L,
        args: &[Value],
        kwargs: &Kwargs,
    ) -> Result<Value, DispatchError>
    where
        L: OverrideLookup + ?Sized,
    {
        let relevant = self.relevant_args.relevant_args(args, kwargs)?;
        let overloads = collect(lookup, &relevant);
        if overloads.is_empty() {
            trace!(op = %self.name, "no overrides, calling implementation");
            return Ok(self.implementation.call(args, kwargs)?);
        }
        invoke(
            lookup,
            &overloads,
            &Operation::new(&self.name, &self.reference, args, kwargs),
        )
    }
}

impl fmt::Debug for DispatchableFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchableFn")
            .field("name", &self.name)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::OverrideCall;
    use crate::testing::{Outcome, PROTOCOL, World, instance};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use torchfn_core::TypeHash;
    use torchfn_registry::TypeEntry;

    fn sum_impl() -> NativeFn {
        NativeFn::new("sum", |args: &[Value], _: &Kwargs| {
            Ok(Value::Int(args.iter().filter_map(Value::as_int).sum()))
        })
    }

    fn all_args(args: &[Value], _: &Kwargs) -> Result<Vec<Value>, NativeError> {
        Ok(args.to_vec())
    }

    #[test]
    fn default_path_when_nothing_overrides() {
        let world = World::new();
        let sum = DispatchableFn::new(sum_impl(), all_args);
        let dispatcher = Dispatcher::new(world.lookup());

        let args = [Value::Int(1), Value::Int(2), instance(world.tensor)];
        let result = dispatcher.call(&sum, &args, &Kwargs::new()).unwrap();
        assert_eq!(result, Value::Int(3));
    }

    #[test]
    fn override_receives_public_reference() {
        let mut world = World::new();
        let sub = world.class("SubTensor", &[world.tensor], Outcome::Decline);
        let seen = NativeFn::new("seen", |args: &[Value], _: &Kwargs| {
            let call = OverrideCall::from_args(args)?;
            Ok(Value::str(call.operation_name().unwrap_or("?")))
        });
        let entry = TypeEntry::class("Seen")
            .with_base(sub)
            .with_method(PROTOCOL, seen);
        let seen_ty = world.types.register_type(entry).unwrap();

        let sum = DispatchableFn::new(sum_impl(), all_args);
        let args = [instance(sub), instance(seen_ty)];
        let result = sum.call(&world.lookup(), &args, &Kwargs::new()).unwrap();
        assert_eq!(result.as_str(), Some("sum"));
        // The subclass handler answered, the base one never ran.
        assert!(world.log.calls().is_empty());
    }

    #[test]
    fn handler_can_defer_to_the_default() {
        let mut world = World::new();
        let deferring = NativeFn::new("deferring", |args: &[Value], _: &Kwargs| {
            let call = OverrideCall::from_args(args)?;
            let plain: Vec<Value> = call
                .args
                .iter()
                .filter(|arg| arg.as_int().is_some())
                .cloned()
                .collect();
            call.operation.call(&plain, call.kwargs)
        });
        let entry = TypeEntry::class("Deferring").with_method(PROTOCOL, deferring);
        let ty = world.types.register_type(entry).unwrap();

        let sum = DispatchableFn::new(sum_impl(), all_args);
        let args = [Value::Int(4), instance(ty), Value::Int(5)];
        let result = sum.call(&world.lookup(), &args, &Kwargs::new()).unwrap();
        assert_eq!(result, Value::Int(9));
    }

    #[test]
    fn reference_runs_the_implementation_without_dispatching() {
        static RUNS: AtomicUsize = AtomicUsize::new(0);

        let mut world = World::new();
        let sub = world.class("SubTensor", &[world.tensor], Outcome::Decline);
        let counted = NativeFn::new("sum", |args: &[Value], _: &Kwargs| {
            RUNS.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Int(args.len() as i64))
        });
        let sum = DispatchableFn::new(counted, all_args);

        let args = [instance(sub), instance(sub)];
        let result = sum.public_api().call(&args, &Kwargs::new()).unwrap();
        assert_eq!(result, Value::Int(2));
        let result = sum.reference().call(&args, &Kwargs::new()).unwrap();
        assert_eq!(result, Value::Int(2));

        assert_eq!(RUNS.load(Ordering::SeqCst), 2);
        assert!(world.log.calls().is_empty());
    }

    #[test]
    fn extractor_errors_propagate() {
        let world = World::new();
        let lookup = world.lookup();
        let strict = DispatchableFn::new(
            sum_impl(),
            |_: &[Value], _: &Kwargs| -> Result<Vec<Value>, NativeError> {
                Err(NativeError::type_error("sum() missing required argument"))
            },
        );
        let err = strict.call(&lookup, &[], &Kwargs::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: sum() missing required argument"
        );
    }

    #[test]
    fn implementation_errors_propagate_on_the_default_path() {
        let world = World::new();
        let lookup = world.lookup();
        let kwargs = Kwargs::new();
        let failing = NativeFn::new("fail", |_: &[Value], _: &Kwargs| {
            Err(NativeError::runtime_error("nope"))
        });
        let op = DispatchableFn::new(failing, all_args);
        let err = op.call(&lookup, &[Value::Int(1)], &kwargs).unwrap_err();
        assert_eq!(err.as_handler(), Some(&NativeError::runtime_error("nope")));
    }

    #[test]
    fn verified_rejects_mismatched_extractor() {
        let implementation = Signature::new()
            .with_param("input")
            .with_default("dim", Value::Int(0));
        let extractor = Signature::new().with_param("input");

        let verified = DispatchableFn::verified(sum_impl(), &implementation, all_args, &extractor);
        let SignatureError::Mismatch { name } = verified.unwrap_err();
        assert_eq!(name, "sum");

        let extractor = Signature::new()
            .with_param("input")
            .with_default("dim", Value::None);
        let verified = DispatchableFn::verified(sum_impl(), &implementation, all_args, &extractor);
        assert!(verified.is_ok());
    }

    #[test]
    fn metadata() {
        let sum = DispatchableFn::new(sum_impl(), all_args).with_module("torch.functional");
        assert_eq!(sum.name(), "sum");
        assert_eq!(sum.module(), Some("torch.functional"));
        assert_eq!(sum.public_api().name(), "sum");
        assert_eq!(sum.public_api().id(), TypeHash::from_operation("sum"));
        assert_eq!(sum.implementation().name(), "sum");
        assert!(!sum.public_api().ptr_eq(sum.implementation()));

        let public = Value::Function(sum.public_api().clone());
        assert!(sum.reference().is(&public));
    }

    #[test]
    fn module_does_not_change_diagnostics() {
        let mut world = World::new();
        let sub = world.class("SubTensor", &[world.tensor], Outcome::Decline);
        let sum = DispatchableFn::new(sum_impl(), all_args).with_module("torch.functional");

        let lookup = world.lookup();
        let args = [instance(sub)];
        let err = sum.call(&lookup, &args, &Kwargs::new()).unwrap_err();
        let DispatchError::NoUsableOverride { operation, .. } = err else {
            panic!("expected NoUsableOverride");
        };
        assert_eq!(operation, "torch.sum");
    }

    #[test]
    fn try_dispatch_and_implement() {
        let mut world = World::new();
        let answer = Outcome::Return(Value::Int(99));
        let sub = world.class("SubTensor", &[world.tensor], answer);
        let dispatcher = Dispatcher::new(world.lookup());

        let sum = sum_impl();
        let reference = Value::Function(sum_impl());
        let kwargs = Kwargs::new();
        let plain = [Value::Int(1), Value::Int(2)];
        let op = Operation::new("sum", &reference, &plain, &kwargs);

        assert_eq!(dispatcher.try_dispatch(&op, &plain).unwrap(), None);
        let implemented = dispatcher.implement(&sum, &op, &plain).unwrap();
        assert_eq!(implemented, Value::Int(3));
        let err = dispatcher.dispatch(&op, &plain).unwrap_err();
        assert!(matches!(err, DispatchError::Internal { .. }));

        let overriding = [instance(sub)];
        let expected = Value::Int(99);
        let dispatched = dispatcher.try_dispatch(&op, &overriding).unwrap();
        assert_eq!(dispatched, Some(expected.clone()));
        let implemented = dispatcher.implement(&sum, &op, &overriding).unwrap();
        assert_eq!(implemented, expected);
        assert_eq!(dispatcher.dispatch(&op, &overriding).unwrap(), expected);
    }
}
