//! TypeRegistry - the host type system.
//!
//! [`TypeRegistry`] stores every type participating in dispatch: the
//! built-ins, the base domain type and user classes. It answers the two
//! questions the precedence registry asks of a type system:
//!
//! - **Where is an attribute defined?** [`TypeRegistry::lookup_attribute`]
//!   walks the method resolution order of a type.
//! - **Is a value an instance of a type?** [`TypeRegistry::is_instance`]
//!   checks whether the type appears in the value's method resolution order.
//!
//! # Thread Safety
//!
//! Registration takes `&mut self`; lookups take `&self` and never mutate.
//! Once populated the registry can be shared (`TypeRegistry: Send + Sync`)
//! and every thread dispatches against it independently.
//!
//! # Example
//!
//! ```
//! use torchfn_registry::{TypeEntry, TypeRegistry};
//!
//! let mut registry = TypeRegistry::with_builtins();
//! let tensor = registry.register_type(TypeEntry::class("Tensor")).unwrap();
//! let param = registry
//!     .register_type(TypeEntry::class("Parameter").with_base(tensor))
//!     .unwrap();
//!
//! assert!(registry.is_subtype(param, tensor));
//! assert!(!registry.is_subtype(tensor, param));
//! ```

use rustc_hash::FxHashMap;
use tracing::trace;

use torchfn_core::{BuiltinKind, ProbeError, RegistrationError, TypeHash, Value, builtins};

use crate::entry::{Attribute, TypeEntry};
use crate::mro;

/// Registry of types keyed by [`TypeHash`].
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: FxHashMap<TypeHash, TypeEntry>,
    /// Reverse index: name -> hash.
    by_name: FxHashMap<String, TypeHash>,
}

impl TypeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with `object` and every built-in type registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register `object` and all built-in types not yet present.
    pub fn register_builtins(&mut self) {
        if !self.contains(builtins::OBJECT) {
            let mut object = TypeEntry::object();
            object.mro = vec![builtins::OBJECT];
            self.insert(object);
        }

        // Bases before derived: `bool` derives from `int`.
        let (roots, derived): (Vec<_>, Vec<_>) = BuiltinKind::ALL
            .into_iter()
            .partition(|kind| kind.base() == builtins::OBJECT);

        for kind in roots.into_iter().chain(derived) {
            if self.contains(kind.type_hash()) {
                continue;
            }
            let mut entry = TypeEntry::builtin(kind);
            let base_mro = self.mro(kind.base()).unwrap_or(&[]);
            let mut linear = Vec::with_capacity(base_mro.len() + 1);
            linear.push(kind.type_hash());
            linear.extend_from_slice(base_mro);
            entry.mro = linear;
            self.insert(entry);
        }
    }

    /// Register a type, computing its method resolution order.
    ///
    /// A type without bases implicitly derives from `object` when `object`
    /// is registered. Bases must be registered first.
    pub fn register_type(&mut self, mut entry: TypeEntry) -> Result<TypeHash, RegistrationError> {
        let hash = entry.type_hash;
        if self.types.contains_key(&hash) {
            return Err(RegistrationError::DuplicateType(entry.name));
        }

        if entry.bases.is_empty() && hash != builtins::OBJECT && self.contains(builtins::OBJECT) {
            entry.bases.push(builtins::OBJECT);
        }

        for (i, base) in entry.bases.iter().enumerate() {
            if entry.bases[..i].contains(base) {
                return Err(RegistrationError::DuplicateBase {
                    type_name: entry.name,
                    base: *base,
                });
            }
        }

        let mut base_mros = Vec::with_capacity(entry.bases.len());
        for base in &entry.bases {
            match self.types.get(base) {
                Some(base_entry) => base_mros.push(base_entry.mro.as_slice()),
                None => {
                    return Err(RegistrationError::UnknownBase {
                        type_name: entry.name,
                        base: *base,
                    });
                }
            }
        }

        let Some(linear) = mro::linearize(hash, &entry.bases, &base_mros) else {
            return Err(RegistrationError::InconsistentMro {
                type_name: entry.name,
            });
        };
        entry.mro = linear;

        trace!(name = %entry.name, hash = %hash, depth = entry.mro.len(), "registered type");
        self.insert(entry);
        Ok(hash)
    }

    /// Set (or replace) a class attribute on a registered type.
    pub fn set_attribute(
        &mut self,
        ty: TypeHash,
        name: impl Into<String>,
        attribute: Attribute,
    ) -> Result<(), RegistrationError> {
        let entry = self
            .types
            .get_mut(&ty)
            .ok_or_else(|| RegistrationError::TypeNotFound(ty.to_string()))?;
        entry.attributes.insert(name.into(), attribute);
        Ok(())
    }

    fn insert(&mut self, entry: TypeEntry) {
        self.by_name.insert(entry.name.clone(), entry.type_hash);
        self.types.insert(entry.type_hash, entry);
    }

    // ==========================================================================
    // Type Lookup
    // ==========================================================================

    pub fn get(&self, hash: TypeHash) -> Option<&TypeEntry> {
        self.types.get(&hash)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&TypeEntry> {
        self.by_name.get(name).and_then(|hash| self.types.get(hash))
    }

    pub fn contains(&self, hash: TypeHash) -> bool {
        self.types.contains_key(&hash)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over all registered types.
    pub fn types(&self) -> impl Iterator<Item = &TypeEntry> {
        self.types.values()
    }

    pub fn type_name(&self, hash: TypeHash) -> Option<&str> {
        self.types.get(&hash).map(|entry| entry.name.as_str())
    }

    /// Method resolution order of a type, starting with the type itself.
    pub fn mro(&self, hash: TypeHash) -> Option<&[TypeHash]> {
        self.types.get(&hash).map(|entry| entry.mro.as_slice())
    }

    // ==========================================================================
    // Subtyping
    // ==========================================================================

    /// Check whether `sub` is `sup` or derives from it.
    ///
    /// Unregistered types are only subtypes of themselves.
    pub fn is_subtype(&self, sub: TypeHash, sup: TypeHash) -> bool {
        sub == sup || self.mro(sub).is_some_and(|mro| mro.contains(&sup))
    }

    /// Check whether `value` is an instance of `ty` (same or derived type).
    pub fn is_instance(&self, value: &Value, ty: TypeHash) -> bool {
        self.is_subtype(value.type_hash(), ty)
    }

    // ==========================================================================
    // Attribute Lookup
    // ==========================================================================

    /// Find a class attribute on `ty`, following its method resolution order.
    ///
    /// Returns the defining type along with the attribute. Only class-level
    /// attributes are considered.
    pub fn lookup_attribute(
        &self,
        ty: TypeHash,
        name: &str,
    ) -> Result<Option<(TypeHash, &Attribute)>, ProbeError> {
        let entry = self.types.get(&ty).ok_or(ProbeError::UnknownType(ty))?;
        for owner in &entry.mro {
            let Some(owner_entry) = self.types.get(owner) else {
                continue;
            };
            if let Some(attribute) = owner_entry.own_attribute(name) {
                return Ok(Some((*owner, attribute)));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use torchfn_core::{Instance, Kwargs, NativeFn};

    const PROTOCOL: &str = "__torch_function__";

    fn handler(name: &str) -> NativeFn {
        NativeFn::new(name.to_string(), |_: &[Value], _: &Kwargs| {
            Ok(Value::NotImplemented)
        })
    }

    #[test]
    fn builtins_are_registered() {
        let registry = TypeRegistry::with_builtins();
        assert_eq!(registry.len(), BuiltinKind::ALL.len() + 1);
        assert_eq!(registry.type_name(builtins::INT), Some("int"));
        assert_eq!(
            registry.mro(builtins::BOOL),
            Some(&[builtins::BOOL, builtins::INT, builtins::OBJECT][..])
        );
        let none_type = registry.get_by_name("NoneType");
        assert!(none_type.is_some_and(TypeEntry::is_builtin));
    }

    #[test]
    fn register_builtins_is_idempotent() {
        let mut registry = TypeRegistry::with_builtins();
        registry.register_builtins();
        assert_eq!(registry.len(), BuiltinKind::ALL.len() + 1);
    }

    #[test]
    fn implicit_object_base() {
        let mut registry = TypeRegistry::with_builtins();
        let tensor = registry.register_type(TypeEntry::class("Tensor")).unwrap();
        assert_eq!(registry.mro(tensor), Some(&[tensor, builtins::OBJECT][..]));
    }

    #[test]
    fn without_object_a_class_is_its_own_root() {
        let mut registry = TypeRegistry::new();
        let tensor = registry.register_type(TypeEntry::class("Tensor")).unwrap();
        assert_eq!(registry.mro(tensor), Some(&[tensor][..]));
    }

    #[test]
    fn duplicate_type() {
        let mut registry = TypeRegistry::with_builtins();
        registry.register_type(TypeEntry::class("Tensor")).unwrap();
        let err = registry
            .register_type(TypeEntry::class("Tensor"))
            .unwrap_err();
        assert_eq!(err, RegistrationError::DuplicateType("Tensor".into()));
    }

    #[test]
    fn unknown_base() {
        let mut registry = TypeRegistry::with_builtins();
        let err = registry
            .register_type(TypeEntry::class("Sub").with_base(TypeHash::from_name("Missing")))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::UnknownBase { .. }));
    }

    #[test]
    fn duplicate_base() {
        let mut registry = TypeRegistry::with_builtins();
        let a = registry.register_type(TypeEntry::class("A")).unwrap();
        let err = registry
            .register_type(TypeEntry::class("B").with_base(a).with_base(a))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateBase { .. }));
    }

    #[test]
    fn inconsistent_hierarchy() {
        let mut registry = TypeRegistry::with_builtins();
        let x = registry.register_type(TypeEntry::class("X")).unwrap();
        let y = registry
            .register_type(TypeEntry::class("Y").with_base(x))
            .unwrap();
        let err = registry
            .register_type(TypeEntry::class("Z").with_base(x).with_base(y))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::InconsistentMro { .. }));
        assert_eq!(
            err.to_string(),
            "cannot create a consistent method resolution order for 'Z'"
        );
        assert!(!registry.contains(TypeHash::from_name("Z")));
    }

    #[test]
    fn subtype_through_multiple_inheritance() {
        let mut registry = TypeRegistry::with_builtins();
        let a = registry.register_type(TypeEntry::class("A")).unwrap();
        let b = registry
            .register_type(TypeEntry::class("B").with_base(a))
            .unwrap();
        let c = registry
            .register_type(TypeEntry::class("C").with_base(a))
            .unwrap();
        let d = registry
            .register_type(TypeEntry::class("D").with_base(b).with_base(c))
            .unwrap();

        assert_eq!(registry.mro(d), Some(&[d, b, c, a, builtins::OBJECT][..]));
        assert!(registry.is_subtype(d, c));
        assert!(registry.is_subtype(d, a));
        assert!(!registry.is_subtype(b, c));
        assert!(registry.is_subtype(builtins::BOOL, builtins::INT));
    }

    #[test]
    fn is_instance_uses_exact_type_of_value() {
        let mut registry = TypeRegistry::with_builtins();
        let tensor = registry.register_type(TypeEntry::class("Tensor")).unwrap();
        let sub = registry
            .register_type(TypeEntry::class("SubTensor").with_base(tensor))
            .unwrap();

        let value = Instance::new(sub).into_value();
        assert!(registry.is_instance(&value, tensor));
        assert!(registry.is_instance(&value, builtins::OBJECT));
        assert!(!registry.is_instance(&Instance::new(tensor).into_value(), sub));
        assert!(registry.is_instance(&Value::Bool(true), builtins::INT));
    }

    #[test]
    fn lookup_follows_mro() {
        let mut registry = TypeRegistry::with_builtins();
        let base = registry
            .register_type(TypeEntry::class("Base").with_method(PROTOCOL, handler("base")))
            .unwrap();
        let derived = registry
            .register_type(TypeEntry::class("Derived").with_base(base))
            .unwrap();

        let (owner, attribute) = registry
            .lookup_attribute(derived, PROTOCOL)
            .unwrap()
            .unwrap();
        assert_eq!(owner, base);
        let Attribute::Value(Value::Function(function)) = attribute else {
            panic!("expected a method");
        };
        assert_eq!(function.name(), "base");
        let missing = registry.lookup_attribute(derived, "missing").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn lookup_prefers_most_derived_definition() {
        let mut registry = TypeRegistry::with_builtins();
        let base = registry
            .register_type(TypeEntry::class("Base").with_method("f", handler("base")))
            .unwrap();
        let derived = TypeEntry::class("Derived")
            .with_base(base)
            .with_method("f", handler("derived"));
        let derived = registry.register_type(derived).unwrap();

        let (owner, _) = registry.lookup_attribute(derived, "f").unwrap().unwrap();
        assert_eq!(owner, derived);
    }

    #[test]
    fn lookup_on_unknown_type_fails() {
        let registry = TypeRegistry::with_builtins();
        let missing = TypeHash::from_name("Missing");
        assert_eq!(
            registry.lookup_attribute(missing, "x").unwrap_err(),
            ProbeError::UnknownType(missing)
        );
    }

    #[test]
    fn set_attribute_on_builtin() {
        let mut registry = TypeRegistry::with_builtins();
        registry
            .set_attribute(builtins::INT, PROTOCOL, Attribute::Value(Value::Int(1)))
            .unwrap();
        let inherited = registry.lookup_attribute(builtins::BOOL, PROTOCOL).unwrap();
        assert!(inherited.is_some());

        let missing = TypeHash::from_name("Missing");
        let err = registry
            .set_attribute(missing, "x", Attribute::Value(Value::None))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::TypeNotFound(_)));
    }

    #[test]
    fn registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TypeRegistry>();
    }
}
