//! Instances of registered classes.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::TypeHash;

use super::Value;

/// Shared handle to an instance. Identity is the `Arc` pointer.
pub type ObjectRef = Arc<Instance>;

/// An instance of a registered class.
///
/// Instance attributes live here. Override lookup never consults them: the
/// protocol attribute is always resolved on the class.
#[derive(Debug, Clone)]
pub struct Instance {
    class: TypeHash,
    attributes: FxHashMap<String, Value>,
}

impl Instance {
    pub fn new(class: TypeHash) -> Self {
        Self {
            class,
            attributes: FxHashMap::default(),
        }
    }

    /// Add an instance attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// The instance's exact runtime type.
    pub fn class(&self) -> TypeHash {
        self.class
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Wrap this instance into a [`Value::Object`].
    pub fn into_value(self) -> Value {
        Value::Object(Arc::new(self))
    }
}
