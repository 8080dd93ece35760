//! @module "Errors"
//! @summary "Error types for annotation parsing, registration and configuration"
//! @domain core
//! @layer types

use thiserror::Error;

/// @summary "Value coercion failures raised while parsing a block"
///
/// Both variants abort the whole `parse` call; malformed annotation
/// syntax never produces one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    /// Raw text does not satisfy the grammar of the requested type
    #[error("Raw value must be {expected}. Invalid value '{raw}' given")]
    InvalidValue { expected: String, raw: String },

    /// A type tag was detected but no handler is registered for it
    #[error("Unknown annotation type '{0}'")]
    UnknownType(String),
}

impl ParserError {
    /// Shorthand for [`ParserError::InvalidValue`], also meant for custom coercers.
    pub fn invalid_value(expected: impl Into<String>, raw: impl Into<String>) -> Self {
        ParserError::InvalidValue {
            expected: expected.into(),
            raw: raw.into(),
        }
    }

    /// Type name involved in the failure
    pub fn type_name(&self) -> &str {
        match self {
            ParserError::InvalidValue { expected, .. } => expected,
            ParserError::UnknownType(name) => name,
        }
    }
}

/// @summary "Crate-level error type"
#[derive(Debug, Error)]
pub enum DocnoteError {
    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error("Invalid parser rules: {0}")]
    InvalidRules(String),

    #[error("Invalid type name '{0}': expected [A-Za-z_][A-Za-z0-9_]*")]
    InvalidTypeName(String),

    #[error("Type '{0}' is reserved and cannot be registered")]
    ReservedType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, DocnoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_echoes_raw_text() {
        let err = ParserError::invalid_value("integer", "abc");
        assert_eq!(
            err.to_string(),
            "Raw value must be integer. Invalid value 'abc' given"
        );
        assert_eq!(err.type_name(), "integer");
    }

    #[test]
    fn test_invalid_value_with_empty_raw_is_still_visible() {
        let err = ParserError::invalid_value("float", "");
        assert!(err.to_string().contains("''"));
    }

    #[test]
    fn test_parser_error_converts_transparently() {
        let err: DocnoteError = ParserError::UnknownType("foo".to_string()).into();
        assert_eq!(err.to_string(), "Unknown annotation type 'foo'");
    }
}
