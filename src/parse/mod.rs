//! @module "Parser"
//! @summary "Docblock annotation tokenizer and coercion engine"
//! @domain core
//! @layer service
//!
//! Splits a raw comment block into lines, tokenizes each line with a fresh
//! [`Scanner`], coerces values through the parser's [`TypeRegistry`] and
//! condenses repeated keys into an [`AnnotationBag`].
//!
//! Text that does not look like an annotation is skipped silently. A value
//! that fails its coercion aborts the whole parse.

pub mod bag;
pub mod eval;
pub mod registry;
pub mod rules;
pub mod scanner;

use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, trace};

pub use bag::{AnnotationBag, Entry};
pub use registry::{BuiltinType, Coerce, Handler, TagPatterns, TypeRegistry, DYNAMIC_TYPE};
pub use rules::{ParserRules, DEFAULT_IDENTIFIER, DEFAULT_NAME_PATTERN};
pub use scanner::Scanner;

use crate::error::{ParserError, Result};

/// Leading comment gutter: ` * `, `** `, `/// `, `//! ` or plain indentation
static GUTTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A\s*(?:\*+|//[/!]?)?\s*").unwrap());

/// `/*` or `/**` opening a block comment
static DOCBLOCK_OPENER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A\s*/\*+").unwrap());

/// `*/` closing a block comment
static DOCBLOCK_CLOSER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\*+/\z").unwrap());

/// @summary "Annotation parser bound to its rules and type registry"
///
/// The parser owns its registry, so registrations are visible to every later
/// [`Parser::parse`] call on the same instance and to no other parser. For
/// use across threads, wrap the parser in a lock; `parse` only needs `&self`.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    rules: ParserRules,
    registry: TypeRegistry,
}

impl Parser {
    /// Parser with the default `@` grammar and the built-in types
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: ParserRules) -> Self {
        Self {
            rules,
            registry: TypeRegistry::new(),
        }
    }

    pub fn with_registry(rules: ParserRules, registry: TypeRegistry) -> Self {
        Self { rules, registry }
    }

    pub fn rules(&self) -> &ParserRules {
        &self.rules
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    /// Register a custom type; see [`TypeRegistry::register`]
    pub fn register_type<F>(&mut self, name: &str, handler: F) -> Result<Option<Handler>>
    where
        F: Fn(&str) -> std::result::Result<Value, ParserError> + Send + Sync + 'static,
    {
        self.registry.register(name, handler)
    }

    /// Remove a type; a later tag using the name is plain text again
    pub fn unregister_type(&mut self, name: &str) -> Option<Handler> {
        self.registry.unregister(name)
    }

    /// Parse a raw comment block into an annotation bag.
    ///
    /// Fails only when a value does not satisfy its type; no partial bag is
    /// ever returned.
    pub fn parse(&self, raw_block: &str) -> std::result::Result<AnnotationBag, ParserError> {
        let mut accumulator: IndexMap<String, Vec<Value>> = IndexMap::new();

        let mut in_block = false;
        for (index, line) in raw_block.lines().enumerate() {
            let line = sanitize_line(line, &mut in_block);
            trace!(line = index + 1, text = line, "tokenizing");
            self.tokenize_line(line, &mut accumulator)?;
        }

        Ok(AnnotationBag::condense(accumulator))
    }

    /// Read a file and parse its whole content as one block
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<AnnotationBag> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(self.parse(&content)?)
    }

    fn tokenize_line(
        &self,
        line: &str,
        accumulator: &mut IndexMap<String, Vec<Value>>,
    ) -> std::result::Result<(), ParserError> {
        let mut scanner = Scanner::new(line);
        scanner.skip(&GUTTER);

        while !scanner.has_terminated() {
            let Some(token) = scanner.scan_key(self.rules.key_pattern()) else {
                scanner.terminate();
                continue;
            };
            let key = self.rules.strip_identifier(token);
            if key.is_empty() {
                scanner.terminate();
                continue;
            }

            let values = accumulator.entry(key.to_string()).or_default();

            if scanner.scan_implicit_boolean(self.rules.identifier_pattern()) {
                debug!(key, "implicit boolean");
                values.push(Value::Bool(true));
                continue;
            }

            let tags = self.registry.tag_patterns();
            let type_name = scanner.scan_type(tags.check(), tags.tag(), DYNAMIC_TYPE);
            let raw = scanner.get_remainder();
            debug!(key, type_name, raw, "annotation");

            values.push(self.registry.coerce(type_name, raw)?);
        }

        Ok(())
    }
}

/// Strip block-comment delimiters and trailing blank space from one line.
///
/// A trailing `*/` only closes a block opened by `/*` on this or an earlier
/// line, so values like `src/**/` survive outside block comments.
fn sanitize_line<'a>(line: &'a str, in_block: &mut bool) -> &'a str {
    let line = line.trim_end();
    let start = DOCBLOCK_OPENER.find(line).map(|opener| {
        *in_block = true;
        opener.end()
    });
    let start = start.unwrap_or(0);

    let mut end = line.len();
    if *in_block {
        if let Some(closer) = DOCBLOCK_CLOSER.find(line) {
            *in_block = false;
            end = closer.start();
        }
    }

    // `/**/` shares its stars between opener and closer
    if end < start {
        return "";
    }
    &line[start..end]
}
