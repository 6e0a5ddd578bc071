use crate::error::{QueryError, QueryResult};
use serde::Deserialize;
use std::path::Path;

/// Compiler defaults shared by builders and parameter sets.
///
/// Loadable from TOML:
///
/// ```toml
/// default_alias = "e"
/// append_alias = true
/// auto_wildcard_strings = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Alias used when a builder is created without one.
    pub default_alias: String,
    /// Qualify bare field names with the alias.
    pub append_alias: bool,
    /// Treat plain text filter values as wildcard `like` searches.
    pub auto_wildcard_strings: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_alias: "t".to_string(),
            append_alias: true,
            auto_wildcard_strings: true,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> QueryResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            QueryError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn with_default_alias(mut self, alias: impl Into<String>) -> Self {
        self.default_alias = alias.into();
        self
    }

    pub fn with_append_alias(mut self, enabled: bool) -> Self {
        self.append_alias = enabled;
        self
    }

    pub fn with_auto_wildcard_strings(mut self, enabled: bool) -> Self {
        self.auto_wildcard_strings = enabled;
        self
    }
}
