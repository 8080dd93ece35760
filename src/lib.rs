#![forbid(unsafe_code)]

//! @module "docnote Library"
//! @summary "Typed key/value annotations from documentation comment blocks"
//! @domain core
//! @layer api
//! @stability stable
//!
//! # docnote
//!
//! Extracts `@key value` annotations from free-form comment blocks and
//! coerces each value into a typed [`serde_json::Value`].
//!
//! ## Features
//!
//! - **Implicit booleans**: `@flag` alone yields `true`
//! - **Type tags**: `@port integer 8080`, `@tags json ["a", "b"]`, `@area eval 2 * PI`
//! - **Dynamic values**: untagged text is JSON when it parses, else a string
//! - **Custom types**: register closures per parser
//! - **Condensation**: repeated keys collect into ordered lists
//!
//! ## Example
//!
//! ```rust
//! use docnote::Parser;
//! use serde_json::json;
//!
//! let mut parser = Parser::new();
//! parser
//!     .register_type("upper", |raw: &str| Ok(json!(raw.to_uppercase())))
//!     .unwrap();
//!
//! let bag = parser
//!     .parse("/**\n * @route /users\n * @method GET\n * @method POST\n * @name upper users\n */")
//!     .unwrap();
//!
//! assert_eq!(bag.get_as_array("method"), vec![json!("GET"), json!("POST")]);
//! assert_eq!(bag.get("name").and_then(|e| e.as_single()), Some(&json!("USERS")));
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod parse;

// Re-exports
pub use config::Config;
pub use error::{DocnoteError, ParserError, Result};
pub use parse::{
    AnnotationBag, BuiltinType, Coerce, Entry, Handler, Parser, ParserRules, Scanner,
    TypeRegistry,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse a block with the default grammar and built-in types
pub fn parse(raw_block: &str) -> std::result::Result<AnnotationBag, ParserError> {
    Parser::new().parse(raw_block)
}
