//! Dispatch configuration.
//!
//! A [`DispatchConfig`] is built once (in code or from TOML) and then only
//! read. The precedence registry borrows it for its whole lifetime.
//!
//! ```toml
//! protocol = "__torch_function__"
//! namespace = "torch"
//! base_type = "Tensor"
//! exclude = ["bool", "int", "float", "str", "dict"]
//! ```

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use torchfn_core::{BuiltinKind, DEFAULT_PROTOCOL, ExclusionSet, TypeHash};

/// Errors produced while loading a [`DispatchConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid dispatch config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("protocol attribute name must not be empty")]
    EmptyProtocol,
}

/// Immutable dispatch settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Class attribute holding override handlers.
    pub protocol: String,
    /// Prefix for operation names in diagnostics. Empty for none.
    pub namespace: String,
    /// Name of the base domain type. Its exact instances never override.
    /// Empty disables the check.
    pub base_type: String,
    /// Built-in kinds that never act as override sources.
    #[serde(deserialize_with = "deserialize_exclusions")]
    pub exclude: ExclusionSet,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.to_string(),
            namespace: "torch".to_string(),
            base_type: "Tensor".to_string(),
            exclude: ExclusionSet::DEFAULT,
        }
    }
}

impl DispatchConfig {
    /// Parse and validate a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: DispatchConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol.is_empty() {
            return Err(ConfigError::EmptyProtocol);
        }
        Ok(())
    }

    // === Builder Methods ===

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_base_type(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = base_type.into();
        self
    }

    pub fn with_exclusions(mut self, exclude: ExclusionSet) -> Self {
        self.exclude = exclude;
        self
    }

    // === Query Methods ===

    /// Hash of the base domain type, if one is configured.
    pub fn base_type_hash(&self) -> Option<TypeHash> {
        (!self.base_type.is_empty()).then(|| TypeHash::from_name(&self.base_type))
    }
}

fn deserialize_exclusions<'de, D>(deserializer: D) -> Result<ExclusionSet, D::Error>
where
    D: Deserializer<'de>,
{
    let kinds = Vec::<BuiltinKind>::deserialize(deserializer)?;
    Ok(kinds.into_iter().collect())
}
