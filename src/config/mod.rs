//! @module "Configuration"
//! @summary "Parser configuration loading and defaults"
//! @domain cli
//! @layer config

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::parse::{BuiltinType, Parser, ParserRules, TypeRegistry};
use crate::parse::{DEFAULT_IDENTIFIER, DEFAULT_NAME_PATTERN};

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = ".docnote.config.json";

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_identifier() -> char {
    DEFAULT_IDENTIFIER
}

fn default_name_pattern() -> String {
    DEFAULT_NAME_PATTERN.to_string()
}

/// @summary "docnote configuration file"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Config format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Character introducing an annotation key
    #[serde(default = "default_identifier")]
    pub identifier: char,

    /// Regex fragment for key names after the identifier
    #[serde(default = "default_name_pattern")]
    pub name_pattern: String,

    /// Extra type names mapped onto built-in types (`"int": "integer"`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, BuiltinType>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            identifier: default_identifier(),
            name_pattern: default_name_pattern(),
            aliases: BTreeMap::new(),
        }
    }
}

impl Config {
    /// @summary "Load config from a JSON file"
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// @summary "Save config to a file"
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @summary "Load config, or fall back to defaults when the file is missing"
    ///
    /// A file that exists but cannot be read or parsed is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Validated grammar rules
    pub fn rules(&self) -> crate::Result<ParserRules> {
        ParserRules::new(self.identifier, self.name_pattern.as_str())
    }

    /// Registry with the built-ins plus every configured alias
    pub fn registry(&self) -> crate::Result<TypeRegistry> {
        let mut registry = TypeRegistry::new();
        for (name, target) in &self.aliases {
            registry.register_alias(name, *target)?;
        }
        Ok(registry)
    }

    /// Parser built from this configuration
    pub fn parser(&self) -> crate::Result<Parser> {
        Ok(Parser::with_registry(self.rules()?, self.registry()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocnoteError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_from_empty_object() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.identifier, '@');
        assert_eq!(config.name_pattern, DEFAULT_NAME_PATTERN);
    }

    #[test]
    fn test_aliases_deserialize_lowercase() {
        let config: Config =
            serde_json::from_str(r#"{"aliases": {"int": "integer", "num": "float"}}"#).unwrap();
        assert_eq!(config.aliases.get("int"), Some(&BuiltinType::Integer));
        assert!(serde_json::from_str::<Config>(r#"{"aliases": {"x": "dynamic"}}"#).is_err());
    }

    #[test]
    fn test_registry_applies_aliases() {
        let mut config = Config::default();
        config.aliases.insert("int".to_string(), BuiltinType::Integer);
        let registry = config.registry().unwrap();
        assert_eq!(registry.coerce("int", "42").unwrap(), serde_json::json!(42));
    }

    #[test]
    fn test_invalid_alias_name() {
        let mut config = Config::default();
        config.aliases.insert("dynamic".to_string(), BuiltinType::String);
        assert!(matches!(config.registry(), Err(DocnoteError::ReservedType(_))));
    }

    #[test]
    fn test_invalid_rules() {
        let config = Config {
            identifier: ' ',
            ..Config::default()
        };
        assert!(matches!(config.rules(), Err(DocnoteError::InvalidRules(_))));
        assert!(config.parser().is_err());
    }

    #[test]
    fn test_empty_aliases_are_not_serialized() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(!json.contains("aliases"));
    }
}
