//! @module "Parse Command"
//! @summary "Parse one comment block and print its annotations"
//! @domain cli
//! @layer handler

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;
use serde_json::Value;

use crate::config::Config;
use crate::parse::{AnnotationBag, Entry, Parser, ParserRules};

/// Options for the parse command
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// File holding the block; stdin when absent
    pub input: Option<PathBuf>,
    /// Print pretty JSON instead of the human-readable listing
    pub json: bool,
    /// Identifier override
    pub identifier: Option<char>,
    /// Key-name pattern override
    pub name_pattern: Option<String>,
}

/// Execute the parse command
pub fn execute_parse(options: ParseOptions, config: &Config) -> Result<()> {
    let parser = build_parser(&options, config)?;

    let raw = match &options.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let bag = parser.parse(&raw)?;

    if options.json {
        println!("{}", bag.to_json_pretty()?);
    } else if bag.is_empty() {
        println!("{} No annotations found", style("•").dim());
    } else {
        print!("{}", render_bag(&bag));
    }

    Ok(())
}

fn build_parser(options: &ParseOptions, config: &Config) -> Result<Parser> {
    let identifier = options.identifier.unwrap_or(config.identifier);
    let name_pattern = options
        .name_pattern
        .clone()
        .unwrap_or_else(|| config.name_pattern.clone());
    let rules = ParserRules::new(identifier, name_pattern)?;
    Ok(Parser::with_registry(rules, config.registry()?))
}

/// Human-readable listing: one key per line, repeated values indented
pub fn render_bag(bag: &AnnotationBag) -> String {
    let mut out = String::new();
    for (key, entry) in bag {
        match entry {
            Entry::Single(value) => {
                out.push_str(&format!("{} = {}\n", style(key).cyan(), format_value(value)));
            }
            Entry::Multiple(values) => {
                out.push_str(&format!(
                    "{} ({} values)\n",
                    style(key).cyan(),
                    values.len()
                ));
                for value in values {
                    out.push_str(&format!("  - {}\n", format_value(value)));
                }
            }
        }
    }
    out
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}
