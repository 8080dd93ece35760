//! @module "Type Registry"
//! @summary "Type name to coercion handler dispatch table"
//! @domain core
//! @layer service
//!
//! Each parser owns its registry; two parsers never observe each other's
//! registrations. Names are case-insensitive and stored lowercase.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::eval;
use crate::error::{DocnoteError, ParserError, Result};

/// Pseudo-type used when no tag is present: JSON if it parses, else the raw string
pub const DYNAMIC_TYPE: &str = "dynamic";

static TYPE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A[A-Za-z_][A-Za-z0-9_]*\z").unwrap());

static INTEGER_LITERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A[+-]?\d+\z").unwrap());

static FLOAT_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?\z").unwrap()
});

/// @summary "A coercion from raw annotation text to a value"
///
/// Implemented for any `Fn(&str) -> Result<Value, ParserError>` closure, so
/// custom types can be registered without a named type.
pub trait Coerce: Send + Sync {
    fn coerce(&self, raw: &str) -> std::result::Result<Value, ParserError>;
}

impl<F> Coerce for F
where
    F: Fn(&str) -> std::result::Result<Value, ParserError> + Send + Sync,
{
    fn coerce(&self, raw: &str) -> std::result::Result<Value, ParserError> {
        self(raw)
    }
}

/// @summary "Built-in annotation types"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinType {
    String,
    Integer,
    Float,
    Json,
    Eval,
}

impl BuiltinType {
    pub const ALL: [BuiltinType; 5] = [
        BuiltinType::String,
        BuiltinType::Integer,
        BuiltinType::Float,
        BuiltinType::Json,
        BuiltinType::Eval,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinType::String => "string",
            BuiltinType::Integer => "integer",
            BuiltinType::Float => "float",
            BuiltinType::Json => "json",
            BuiltinType::Eval => "eval",
        }
    }

    pub fn coerce(&self, raw: &str) -> std::result::Result<Value, ParserError> {
        match self {
            BuiltinType::String => Ok(Value::String(raw.to_string())),
            BuiltinType::Integer => coerce_integer(raw),
            BuiltinType::Float => coerce_float(raw),
            BuiltinType::Json => coerce_json(raw),
            BuiltinType::Eval => coerce_eval(raw),
        }
    }
}

impl std::str::FromStr for BuiltinType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" => Ok(BuiltinType::String),
            "integer" => Ok(BuiltinType::Integer),
            "float" => Ok(BuiltinType::Float),
            "json" => Ok(BuiltinType::Json),
            "eval" => Ok(BuiltinType::Eval),
            _ => Err(format!("Unknown built-in type: {}", s)),
        }
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn coerce_integer(raw: &str) -> std::result::Result<Value, ParserError> {
    let text = raw.trim();
    if !INTEGER_LITERAL.is_match(text) {
        return Err(ParserError::invalid_value("integer", raw));
    }
    text.parse::<i64>()
        .map(Value::from)
        .map_err(|_| ParserError::invalid_value("integer", raw))
}

fn coerce_float(raw: &str) -> std::result::Result<Value, ParserError> {
    let text = raw.trim();
    if !FLOAT_LITERAL.is_match(text) {
        return Err(ParserError::invalid_value("float", raw));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| ParserError::invalid_value("float", raw))
}

fn coerce_json(raw: &str) -> std::result::Result<Value, ParserError> {
    serde_json::from_str(raw).map_err(|_| ParserError::invalid_value("json", raw))
}

fn coerce_eval(raw: &str) -> std::result::Result<Value, ParserError> {
    eval::evaluate(raw).map_err(|e| {
        tracing::debug!(expression = raw, reason = %e, "eval coercion failed");
        ParserError::invalid_value("eval", raw)
    })
}

/// @summary "Compiled type-tag patterns for the scanner"
///
/// `check` only matches a tag followed by blank space and a value, so a
/// bare reserved word such as `@value string` stays a value.
#[derive(Debug, Clone)]
pub struct TagPatterns {
    check: Regex,
    tag: Regex,
}

impl TagPatterns {
    /// Build from names sorted longest first
    pub fn build(names: &[String]) -> Result<Self> {
        let alternation = names
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");
        Ok(Self {
            check: Regex::new(&format!(r"\A(?:{})\s+\S", alternation))?,
            tag: Regex::new(&format!(r"\A(?:{})", alternation))?,
        })
    }

    pub fn check(&self) -> &Regex {
        &self.check
    }

    pub fn tag(&self) -> &Regex {
        &self.tag
    }
}

static BUILTIN_TAGS: LazyLock<TagPatterns> =
    LazyLock::new(|| TagPatterns::build(&sorted_tag_names(Vec::new())).unwrap());

/// @summary "Registered handler for one type name"
#[derive(Clone)]
pub enum Handler {
    Builtin(BuiltinType),
    Custom(Arc<dyn Coerce>),
}

impl Handler {
    pub fn coerce(&self, raw: &str) -> std::result::Result<Value, ParserError> {
        match self {
            Handler::Builtin(builtin) => builtin.coerce(raw),
            Handler::Custom(coercer) => coercer.coerce(raw),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Builtin(builtin) => f.debug_tuple("Builtin").field(builtin).finish(),
            Handler::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<BuiltinType> for Handler {
    fn from(builtin: BuiltinType) -> Self {
        Handler::Builtin(builtin)
    }
}

/// @summary "Mapping from type name to coercion handler"
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    handlers: HashMap<String, Handler>,
    tags: TagPatterns,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Registry with the five built-in types
    pub fn new() -> Self {
        let handlers = BuiltinType::ALL
            .iter()
            .map(|b| (b.as_str().to_string(), Handler::Builtin(*b)))
            .collect();
        Self {
            handlers,
            tags: BUILTIN_TAGS.clone(),
        }
    }

    /// Registry without any handler, not even the built-ins
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
            tags: BUILTIN_TAGS.clone(),
        }
    }

    /// Register a custom handler, replacing any handler under the same name.
    /// Returns the replaced handler.
    pub fn register<F>(&mut self, name: &str, handler: F) -> Result<Option<Handler>>
    where
        F: Fn(&str) -> std::result::Result<Value, ParserError> + Send + Sync + 'static,
    {
        self.register_handler(name, Handler::Custom(Arc::new(handler)))
    }

    /// Register a named [`Coerce`] implementation
    pub fn register_coercer<C>(&mut self, name: &str, coercer: C) -> Result<Option<Handler>>
    where
        C: Coerce + 'static,
    {
        self.register_handler(name, Handler::Custom(Arc::new(coercer)))
    }

    /// Register `name` as another spelling of a built-in type
    pub fn register_alias(&mut self, name: &str, target: BuiltinType) -> Result<Option<Handler>> {
        self.register_handler(name, Handler::Builtin(target))
    }

    pub fn register_handler(&mut self, name: &str, handler: Handler) -> Result<Option<Handler>> {
        let key = normalize(name)?;
        let previous = self.handlers.insert(key.clone(), handler);
        match previous {
            Some(_) => {
                tracing::warn!(type_name = %key, "replaced registered type handler");
            }
            None => {
                if let Err(e) = self.rebuild_tags() {
                    self.handlers.remove(&key);
                    return Err(e);
                }
            }
        }
        Ok(previous)
    }

    /// Remove a handler; returns it if one was registered
    pub fn unregister(&mut self, name: &str) -> Option<Handler> {
        let removed = self.handlers.remove(&name.to_lowercase());
        if removed.is_some() {
            if let Err(e) = self.rebuild_tags() {
                tracing::warn!(error = %e, "keeping previous type tag patterns");
            }
        }
        removed
    }

    fn rebuild_tags(&mut self) -> Result<()> {
        self.tags = TagPatterns::build(&self.tag_names())?;
        Ok(())
    }

    /// Compiled patterns matching any name from [`TypeRegistry::tag_names`]
    pub fn tag_patterns(&self) -> &TagPatterns {
        &self.tags
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(&name.to_lowercase())
    }

    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(&name.to_lowercase())
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Names a type tag may use: built-ins plus everything registered.
    /// Longest first so a tag never stops at a shorter name's prefix.
    pub fn tag_names(&self) -> Vec<String> {
        sorted_tag_names(self.handlers.keys().cloned().collect())
    }

    /// Coerce `raw` with the handler registered for `type_name`.
    ///
    /// `dynamic` is always available and never fails.
    pub fn coerce(&self, type_name: &str, raw: &str) -> std::result::Result<Value, ParserError> {
        let key = type_name.to_lowercase();
        if key == DYNAMIC_TYPE {
            return Ok(coerce_dynamic(raw));
        }
        match self.handlers.get(&key) {
            Some(handler) => handler.coerce(raw),
            None => Err(ParserError::UnknownType(type_name.to_string())),
        }
    }
}

/// JSON when the text parses as JSON, otherwise the text itself
pub fn coerce_dynamic(raw: &str) -> Value {
    coerce_json(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn sorted_tag_names(registered: Vec<String>) -> Vec<String> {
    let mut names: Vec<String> = BuiltinType::ALL
        .iter()
        .map(|b| b.as_str().to_string())
        .chain(registered)
        .collect();
    names.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    names.dedup();
    names
}

fn normalize(name: &str) -> Result<String> {
    if !TYPE_NAME.is_match(name) {
        return Err(DocnoteError::InvalidTypeName(name.to_string()));
    }
    let key = name.to_lowercase();
    if key == DYNAMIC_TYPE {
        return Err(DocnoteError::ReservedType(key));
    }
    Ok(key)
}
