//! @module "Init Command"
//! @summary "Write a default configuration file"
//! @domain cli
//! @layer handler

use std::path::PathBuf;

use anyhow::{bail, Result};
use console::style;

use crate::config::{Config, DEFAULT_CONFIG_FILE};

/// Options for the init command
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Where to write the config
    pub path: PathBuf,
    /// Force overwrite existing config
    pub force: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CONFIG_FILE),
            force: false,
        }
    }
}

/// Execute the init command
pub fn execute_init(options: InitOptions) -> Result<()> {
    if options.path.exists() && !options.force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            options.path.display()
        );
    }

    Config::default().save(&options.path)?;
    println!("{} Created {}", style("✓").green(), options.path.display());

    println!("\n{}", style("Next steps:").bold());
    println!(
        "  1. Add type aliases under {} if your blocks use custom names",
        style("\"aliases\"").cyan()
    );
    println!(
        "  2. Run {} to parse a block",
        style("docnote parse <FILE>").cyan()
    );

    Ok(())
}
