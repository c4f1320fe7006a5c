//! PrecedenceRegistry - which candidates carry an override, and their handlers.
//!
//! Lookup rules, in order:
//!
//! 1. A candidate whose exact type is an excluded built-in has no override.
//!    No attribute is read.
//! 2. A candidate whose exact type is the base domain type has no override.
//!    Subclasses of it are eligible.
//! 3. Otherwise the protocol attribute is resolved on the candidate's type,
//!    following its method resolution order. Instance attributes are ignored.
//!
//! Probing never fails the call: an unregistered type or a property getter
//! that raises is reported as "no override".

use tracing::trace;

use torchfn_core::{OverrideLookup, ProbeError, TypeHash, Value};

use crate::config::DispatchConfig;
use crate::entry::Attribute;
use crate::registry::TypeRegistry;

/// Type-level override lookup over a [`TypeRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct PrecedenceRegistry<'r> {
    types: &'r TypeRegistry,
    config: &'r DispatchConfig,
    base_type: Option<TypeHash>,
}

impl<'r> PrecedenceRegistry<'r> {
    pub fn new(types: &'r TypeRegistry, config: &'r DispatchConfig) -> Self {
        Self {
            types,
            config,
            base_type: config.base_type_hash(),
        }
    }

    pub fn types(&self) -> &'r TypeRegistry {
        self.types
    }

    pub fn config(&self) -> &'r DispatchConfig {
        self.config
    }

    /// Whether `ty` is barred from supplying overrides regardless of its attributes.
    #[inline]
    pub fn is_excluded(&self, ty: TypeHash) -> bool {
        self.config.exclude.excludes_type(ty) || self.base_type == Some(ty)
    }

    /// Resolve the protocol attribute for `candidate`, reporting lookup failures.
    ///
    /// Class-level functions are bound to the candidate; other attribute
    /// values are returned as stored, properties are evaluated with the
    /// candidate as receiver.
    pub fn try_probe(&self, candidate: &Value) -> Result<Option<Value>, ProbeError> {
        let protocol = self.config.protocol.as_str();
        let ty = candidate.type_hash();
        let Some((_, attribute)) = self.types.lookup_attribute(ty, protocol)? else {
            return Ok(None);
        };

        match attribute {
            Attribute::Value(function @ Value::Function(_)) => {
                Ok(Some(Value::bound(candidate.clone(), function.clone())))
            }
            Attribute::Value(value) => Ok(Some(value.clone())),
            Attribute::Property(property) => match property.get(candidate) {
                Ok(handler) => Ok(Some(handler)),
                Err(source) => Err(ProbeError::Getter {
                    attribute: protocol.to_string(),
                    source,
                }),
            },
        }
    }
}

impl OverrideLookup for PrecedenceRegistry<'_> {
    fn protocol(&self) -> &str {
        &self.config.protocol
    }

    fn namespace(&self) -> &str {
        &self.config.namespace
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn has_override(&self, candidate: &Value) -> bool {
        if self.is_excluded(candidate.type_hash()) {
            return false;
        }
        self.fetch_override(candidate).is_some()
    }

    fn fetch_override(&self, candidate: &Value) -> Option<Value> {
        match self.try_probe(candidate) {
            Ok(handler) => handler,
            Err(err) => {
                trace!(ty = %candidate.type_hash(), error = %err, "override lookup failed");
                None
            }
        }
    }

    fn is_instance(&self, candidate: &Value, owner: TypeHash) -> bool {
        self.types.is_instance(candidate, owner)
    }

    fn type_name(&self, ty: TypeHash) -> String {
        match self.types.type_name(ty) {
            Some(name) => name.to_string(),
            None => ty.to_string(),
        }
    }
}
