//! The capability interface dispatch runs against.
//!
//! The collector and invoker never inspect types themselves. Everything they
//! need to know about a candidate (does it carry an override, what is its
//! handler, how do types relate) comes through [`OverrideLookup`].

use crate::{TypeHash, Value};

/// Default protocol attribute name.
pub const DEFAULT_PROTOCOL: &str = "__torch_function__";

/// Type-level override lookup and subtype predicate.
///
/// Implementations must be side-effect free and reentrant: a handler may
/// dispatch again while an outer dispatch holds a reference to the same
/// lookup.
pub trait OverrideLookup {
    /// Attribute name handlers are registered under.
    fn protocol(&self) -> &str;

    /// Prefix used when naming operations in diagnostics (e.g. `"torch"`).
    fn namespace(&self) -> &str;

    /// Whether `candidate` carries an override handler at all.
    fn has_override(&self, candidate: &Value) -> bool;

    /// Fetch the handler for `candidate`, bound to it.
    ///
    /// Lookup failures are reported as `None`.
    fn fetch_override(&self, candidate: &Value) -> Option<Value>;

    /// Whether `candidate` is an instance of `owner` or of a subtype of it.
    fn is_instance(&self, candidate: &Value, owner: TypeHash) -> bool;

    /// Display name of a type, for diagnostics.
    fn type_name(&self, ty: TypeHash) -> String;

    /// Qualify an operation name with the namespace (`"torch.add"`).
    ///
    /// Without a namespace the name is returned unchanged.
    fn qualify(&self, operation: &str) -> String {
        let namespace = self.namespace();
        if namespace.is_empty() {
            operation.to_string()
        } else {
            format!("{namespace}.{operation}")
        }
    }
}

impl<L: OverrideLookup + ?Sized> OverrideLookup for &L {
    fn protocol(&self) -> &str {
        (**self).protocol()
    }

    fn namespace(&self) -> &str {
        (**self).namespace()
    }

    fn has_override(&self, candidate: &Value) -> bool {
        (**self).has_override(candidate)
    }

    fn fetch_override(&self, candidate: &Value) -> Option<Value> {
        (**self).fetch_override(candidate)
    }

    fn is_instance(&self, candidate: &Value, owner: TypeHash) -> bool {
        (**self).is_instance(candidate, owner)
    }

    fn type_name(&self, ty: TypeHash) -> String {
        (**self).type_name(ty)
    }

    fn qualify(&self, operation: &str) -> String {
        (**self).qualify(operation)
    }
}
