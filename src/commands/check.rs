//! @module "Check Command"
//! @summary "Verify that comment blocks parse cleanly"
//! @domain cli
//! @layer handler

use std::path::PathBuf;

use anyhow::{bail, Result};
use console::style;

use crate::config::Config;

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Files to check, each parsed as one block
    pub files: Vec<PathBuf>,
}

/// Execute the check command.
///
/// Every file is checked even after a failure; the command fails if any did.
pub fn execute_check(options: CheckOptions, config: &Config) -> Result<()> {
    let parser = config.parser()?;
    let mut failed = 0usize;

    for file in &options.files {
        match parser.parse_file(file) {
            Ok(bag) => {
                println!(
                    "{} {} ({} annotations)",
                    style("✓").green(),
                    file.display(),
                    bag.len()
                );
            }
            Err(e) => {
                failed += 1;
                eprintln!("{} {}: {}", style("✗").red(), file.display(), e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} files failed to parse", failed, options.files.len());
    }
    Ok(())
}
