//! @module "Types Command"
//! @summary "List the type names a parser recognizes"
//! @domain cli
//! @layer handler

use anyhow::Result;
use console::style;

use crate::config::Config;
use crate::parse::{Handler, TypeRegistry, DYNAMIC_TYPE};

/// One row of the type listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRow {
    pub name: String,
    pub kind: String,
}

/// Describe every registered name, then the reserved `dynamic` fallback
pub fn describe_types(registry: &TypeRegistry) -> Vec<TypeRow> {
    let mut rows: Vec<TypeRow> = registry
        .names()
        .into_iter()
        .filter_map(|name| {
            let kind = match registry.get(name)? {
                Handler::Builtin(builtin) if builtin.as_str() == name => "built-in".to_string(),
                Handler::Builtin(builtin) => format!("alias of {}", builtin),
                Handler::Custom(_) => "custom".to_string(),
            };
            Some(TypeRow {
                name: name.to_string(),
                kind,
            })
        })
        .collect();
    rows.push(TypeRow {
        name: DYNAMIC_TYPE.to_string(),
        kind: "reserved (JSON, else raw text)".to_string(),
    });
    rows
}

/// Execute the types command
pub fn execute_types(config: &Config) -> Result<()> {
    let registry = config.registry()?;
    println!("{} Annotation types:\n", style("→").cyan());
    for row in describe_types(&registry) {
        println!("  {:<12} {}", style(&row.name).bold(), style(&row.kind).dim());
    }
    Ok(())
}
