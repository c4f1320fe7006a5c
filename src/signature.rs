//! Parameter lists for dispatchable operations.
//!
//! Native functions carry no parameter metadata, so a [`Signature`] is
//! declared next to the implementation and its relevant-args extractor when
//! the two should be checked against each other.

use torchfn_core::Value;

use crate::error::SignatureError;

/// A named positional parameter with an optional default.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Value>,
}

impl Param {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
        }
    }
}

/// Declared parameters of a callable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    pub params: Vec<Param>,
    /// Name of the `*args` collector, if any.
    pub varargs: Option<String>,
    /// Name of the `**kwargs` collector, if any.
    pub varkw: Option<String>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    // === Builder Methods ===

    pub fn with_param(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param::required(name));
        self
    }

    pub fn with_default(mut self, name: impl Into<String>, default: Value) -> Self {
        self.params.push(Param::optional(name, default));
        self
    }

    pub fn with_varargs(mut self, name: impl Into<String>) -> Self {
        self.varargs = Some(name.into());
        self
    }

    pub fn with_varkw(mut self, name: impl Into<String>) -> Self {
        self.varkw = Some(name.into());
        self
    }

    // === Query Methods ===

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|param| param.name.as_str())
    }

    pub fn default_count(&self) -> usize {
        self.params
            .iter()
            .filter(|param| param.default.is_some())
            .count()
    }

    pub fn has_defaults(&self) -> bool {
        self.default_count() > 0
    }
}

/// Check that an implementation and its relevant-args extractor take the same parameters.
///
/// Parameter names and order, the `*args` and `**kwargs` collectors, and
/// the number of defaulted parameters must agree. Default values themselves
/// are not compared.
pub fn verify_matching_signatures(
    name: &str,
    implementation: &Signature,
    dispatcher: &Signature,
) -> Result<(), SignatureError> {
    let matches = implementation.param_names().eq(dispatcher.param_names())
        && implementation.varargs == dispatcher.varargs
        && implementation.varkw == dispatcher.varkw
        && implementation.has_defaults() == dispatcher.has_defaults()
        && implementation.default_count() == dispatcher.default_count();

    if matches {
        Ok(())
    } else {
        Err(SignatureError::Mismatch {
            name: name.to_string(),
        })
    }
}
