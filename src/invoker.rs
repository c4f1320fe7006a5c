//! Dispatch invocation.
//!
//! Walks an [`OverloadSet`] in order and calls each handler with
//! `(operation, Tuple(args), Dict(kwargs))` until one returns something other
//! than `NotImplemented`.
//!
//! Outcomes:
//!
//! - a handler returns a value: that value is the result, later handlers never run
//! - a handler raises: its error is returned unchanged, later handlers never run
//! - every handler declines: [`DispatchError::NoUsableOverride`]

use tracing::{debug, trace};

use torchfn_core::{Kwargs, NativeError, OverrideLookup, Value};

use crate::collector::OverloadSet;
use crate::error::DispatchError;

/// One call being dispatched.
///
/// Arguments are forwarded to every handler exactly as given here.
#[derive(Debug, Clone, Copy)]
pub struct Operation<'a> {
    /// Unqualified operation name, used in diagnostics.
    pub name: &'a str,
    /// The public operation, passed to handlers so they can identify or defer to it.
    pub reference: &'a Value,
    pub args: &'a [Value],
    pub kwargs: &'a Kwargs,
}

impl<'a> Operation<'a> {
    pub fn new(name: &'a str, reference: &'a Value, args: &'a [Value], kwargs: &'a Kwargs) -> Self {
        Self {
            name,
            reference,
            args,
            kwargs,
        }
    }

    /// Positional values every handler receives after its receiver.
    fn handler_args(&self) -> [Value; 3] {
        [
            self.reference.clone(),
            Value::tuple(self.args.iter().cloned()),
            Value::dict(self.kwargs.clone()),
        ]
    }
}

/// Invoke the handlers of a non-empty overload set.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn invoke<L>(
    lookup: &L,
    overloads: &OverloadSet<'_>,
    operation: &Operation<'_>,
) -> Result<Value, DispatchError>
where
    L: OverrideLookup + ?Sized,
{
    if overloads.is_empty() {
        return Err(DispatchError::internal(format!(
            "'{}' invoked with an empty overload set",
            operation.name
        )));
    }

    let call_args = operation.handler_args();
    let no_kwargs = Kwargs::new();

    for (index, candidate) in overloads.iter().enumerate() {
        let Some(handler) = lookup.fetch_override(candidate) else {
            let type_name = lookup.type_name(candidate.type_hash());
            return Err(DispatchError::internal(format!(
                "override for {type_name} disappeared before '{}' was invoked",
                operation.name
            )));
        };

        trace!(op = operation.name, index, ty = %candidate.type_hash(), "invoking override");
        let result = handler.call(&call_args, &no_kwargs).map_err(|err| {
            debug!(op = operation.name, index, error = %err, "override raised");
            DispatchError::Handler(err)
        })?;

        if !result.is_not_implemented() {
            debug!(op = operation.name, index, "override resolved");
            return Ok(result);
        }
        trace!(op = operation.name, index, "override declined");
    }

    let types: Vec<String> = overloads.types().map(|ty| lookup.type_name(ty)).collect();
    debug!(op = operation.name, ?types, "every override declined");
    Err(DispatchError::NoUsableOverride {
        operation: lookup.qualify(operation.name),
        protocol: lookup.protocol().to_string(),
        types,
    })
}

// ============================================================================
// Handler-side view
// ============================================================================

/// The positional arguments a handler receives, unpacked.
///
/// Handlers are plain native functions; this gives them typed access to
/// `(self, operation, args, kwargs)`.
#[derive(Debug, Clone, Copy)]
pub struct OverrideCall<'a> {
    pub receiver: &'a Value,
    pub operation: &'a Value,
    pub args: &'a [Value],
    pub kwargs: &'a Kwargs,
}

impl<'a> OverrideCall<'a> {
    pub fn from_args(args: &'a [Value]) -> Result<Self, NativeError> {
        let [receiver, operation, call_args, call_kwargs] = args else {
            return Err(NativeError::ArgumentCount {
                function: "override handler".to_string(),
                expected: 4,
                got: args.len(),
            });
        };
        let Some(args) = call_args.as_tuple() else {
            return Err(type_mismatch("tuple", call_args));
        };
        let Some(kwargs) = call_kwargs.as_dict() else {
            return Err(type_mismatch("dict", call_kwargs));
        };
        Ok(Self {
            receiver,
            operation,
            args,
            kwargs,
        })
    }

    /// Name of the operation, when it is a native function.
    pub fn operation_name(&self) -> Option<&'a str> {
        self.operation.as_function().map(|f| f.name())
    }
}

fn type_mismatch(expected: &str, actual: &Value) -> NativeError {
    NativeError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.type_label().to_string(),
    }
}
