//! @module "Parser Rules"
//! @summary "Annotation identifier and key-name grammar"
//! @domain core
//! @layer config

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DocnoteError, Result};

/// Default marker introducing an annotation key
pub const DEFAULT_IDENTIFIER: char = '@';

/// Default key-name grammar: plain words, dotted namespaces and
/// backslash-separated qualified names (`Acme\Widget`).
pub const DEFAULT_NAME_PATTERN: &str = r"[A-Za-z_\\][A-Za-z0-9_\-\.\\]*";

static DEFAULT_RULES: LazyLock<ParserRules> =
    LazyLock::new(|| ParserRules::new(DEFAULT_IDENTIFIER, DEFAULT_NAME_PATTERN).unwrap());

/// @summary "Grammar configuration, immutable for a parse session"
///
/// Patterns are compiled once when the rules are built.
#[derive(Debug, Clone)]
pub struct ParserRules {
    identifier: char,
    name_pattern: String,
    key_pattern: Regex,
    identifier_pattern: Regex,
}

impl Default for ParserRules {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

impl PartialEq for ParserRules {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier && self.name_pattern == other.name_pattern
    }
}

impl Eq for ParserRules {}

impl ParserRules {
    /// Validate and build rules.
    ///
    /// The identifier must be a visible, non-whitespace character and the
    /// name pattern a non-empty regex fragment.
    pub fn new(identifier: char, name_pattern: impl Into<String>) -> Result<Self> {
        let name_pattern = name_pattern.into();

        if identifier.is_whitespace() || identifier.is_control() {
            return Err(DocnoteError::InvalidRules(format!(
                "identifier must be a visible character, got {:?}",
                identifier
            )));
        }
        if name_pattern.trim().is_empty() {
            return Err(DocnoteError::InvalidRules(
                "name pattern must not be empty".to_string(),
            ));
        }

        let escaped = regex::escape(&identifier.to_string());
        let key_pattern = Regex::new(&format!(r"\A{}(?:{})", escaped, name_pattern)).map_err(|e| {
            DocnoteError::InvalidRules(format!(
                "name pattern '{}' does not compile: {}",
                name_pattern, e
            ))
        })?;
        let identifier_pattern = Regex::new(&format!(r"\A{}", escaped))?;

        Ok(Self {
            identifier,
            name_pattern,
            key_pattern,
            identifier_pattern,
        })
    }

    pub fn identifier(&self) -> char {
        self.identifier
    }

    pub fn name_pattern(&self) -> &str {
        &self.name_pattern
    }

    /// Anchored pattern matching the identifier followed by a key name
    pub fn key_pattern(&self) -> &Regex {
        &self.key_pattern
    }

    /// Anchored pattern matching the identifier alone
    pub fn identifier_pattern(&self) -> &Regex {
        &self.identifier_pattern
    }

    /// Strip the identifier from a scanned key token
    pub fn strip_identifier<'k>(&self, token: &'k str) -> &'k str {
        token.strip_prefix(self.identifier).unwrap_or(token)
    }
}
