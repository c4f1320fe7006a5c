//! Type entries and class attributes.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use torchfn_core::{BuiltinKind, NativeError, NativeFn, TypeHash, Value, builtins};

/// Registry entry for a type.
///
/// Covers both built-in types and user classes. Class attributes live here;
/// they are what override lookup resolves, walking the method resolution
/// order computed at registration.
#[derive(Debug, Clone)]
pub struct TypeEntry {
    /// Type name, also the source of `type_hash`.
    pub name: String,
    /// Type hash for identity.
    pub type_hash: TypeHash,
    /// Direct bases, in declaration order.
    pub bases: Vec<TypeHash>,
    /// Class-level attributes.
    pub attributes: FxHashMap<String, Attribute>,
    /// Set for the built-in types.
    pub builtin: Option<BuiltinKind>,
    /// Method resolution order, filled in by the registry.
    pub(crate) mro: Vec<TypeHash>,
}

impl TypeEntry {
    fn new(name: String, type_hash: TypeHash) -> Self {
        Self {
            name,
            type_hash,
            bases: Vec::new(),
            attributes: FxHashMap::default(),
            builtin: None,
            mro: Vec::new(),
        }
    }

    /// Create a user class entry. The hash is derived from the name.
    pub fn class(name: impl Into<String>) -> Self {
        let name = name.into();
        let type_hash = TypeHash::from_name(&name);
        Self::new(name, type_hash)
    }

    /// Create the entry for a built-in type.
    pub fn builtin(kind: BuiltinKind) -> Self {
        let mut entry = Self::new(kind.name().to_string(), kind.type_hash());
        entry.bases.push(kind.base());
        entry.builtin = Some(kind);
        entry
    }

    /// Create the `object` root entry.
    pub fn object() -> Self {
        Self::new("object".to_string(), builtins::OBJECT)
    }

    // === Builder Methods ===

    /// Add a direct base. Order matters for the method resolution order.
    pub fn with_base(mut self, base: TypeHash) -> Self {
        self.bases.push(base);
        self
    }

    /// Add a plain class attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), Attribute::Value(value));
        self
    }

    /// Add a method (a class-level function, bound on instance lookup).
    pub fn with_method(self, name: impl Into<String>, function: NativeFn) -> Self {
        self.with_attribute(name, Value::Function(function))
    }

    /// Add a computed attribute.
    pub fn with_property(mut self, name: impl Into<String>, property: Property) -> Self {
        self.attributes
            .insert(name.into(), Attribute::Property(property));
        self
    }

    // === Query Methods ===

    /// Method resolution order, starting with this type.
    ///
    /// Empty until the entry is registered.
    pub fn mro(&self) -> &[TypeHash] {
        &self.mro
    }

    /// Find an attribute defined directly on this type.
    pub fn own_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin.is_some()
    }
}

/// A class attribute.
#[derive(Debug, Clone)]
pub enum Attribute {
    /// A stored value. Functions become bound methods when fetched through an instance.
    Value(Value),
    /// A value computed from the instance on access. The getter may fail.
    Property(Property),
}

type Getter = dyn Fn(&Value) -> Result<Value, NativeError> + Send + Sync;

/// Computed attribute: a getter called with the instance.
#[derive(Clone)]
pub struct Property {
    getter: Arc<Getter>,
}

impl Property {
    pub fn new<F>(getter: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, NativeError> + Send + Sync + 'static,
    {
        Self {
            getter: Arc::new(getter),
        }
    }

    /// Evaluate the property for `instance`.
    pub fn get(&self, instance: &Value) -> Result<Value, NativeError> {
        (self.getter)(instance)
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use torchfn_core::Kwargs;

    #[test]
    fn class_hash_comes_from_name() {
        let entry = TypeEntry::class("Tensor");
        assert_eq!(entry.type_hash, TypeHash::from_name("Tensor"));
        assert!(entry.bases.is_empty());
        assert!(!entry.is_builtin());
        assert!(entry.mro().is_empty());
    }

    #[test]
    fn builtin_entry_has_base() {
        let entry = TypeEntry::builtin(BuiltinKind::Bool);
        assert_eq!(entry.name, "bool");
        assert_eq!(entry.bases, vec![builtins::INT]);
        assert_eq!(entry.builtin, Some(BuiltinKind::Bool));
    }

    #[test]
    fn builder_attributes() {
        let handler = NativeFn::new("handler", |_: &[Value], _: &Kwargs| Ok(Value::None));
        let entry = TypeEntry::class("Tensor")
            .with_method("__torch_function__", handler)
            .with_attribute("ndim", Value::Int(2))
            .with_property("T", Property::new(|this| Ok(this.clone())));

        assert!(matches!(
            entry.own_attribute("__torch_function__"),
            Some(Attribute::Value(Value::Function(_)))
        ));
        assert!(matches!(
            entry.own_attribute("T"),
            Some(Attribute::Property(_))
        ));
        assert!(entry.own_attribute("shape").is_none());
    }

    #[test]
    fn property_getter_can_fail() {
        let property = Property::new(|_| Err(NativeError::runtime_error("no")));
        assert!(property.get(&Value::None).is_err());
    }
}
