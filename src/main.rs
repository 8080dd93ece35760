#![forbid(unsafe_code)]
//! docnote Command Line Interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use docnote::commands::{
    execute_check, execute_init, execute_parse, execute_types, CheckOptions, InitOptions,
    ParseOptions,
};
use docnote::config::DEFAULT_CONFIG_FILE;
use docnote::Config;

#[derive(Parser)]
#[command(name = "docnote")]
#[command(about = "Typed annotations from documentation comment blocks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a comment block and print its annotations
    Parse {
        /// File holding the block (reads stdin if not provided)
        file: Option<PathBuf>,

        /// Output as pretty JSON (default: human-readable)
        #[arg(long)]
        json: bool,

        /// Character introducing an annotation key
        #[arg(long)]
        identifier: Option<char>,

        /// Regex fragment for key names
        #[arg(long)]
        name_pattern: Option<String>,
    },

    /// Check that files parse without coercion errors
    Check {
        /// Files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List recognized annotation types
    Types,

    /// Write a default config file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load config
    let config = Config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Parse {
            file,
            json,
            identifier,
            name_pattern,
        } => {
            let options = ParseOptions {
                input: file,
                json,
                identifier,
                name_pattern,
            };
            execute_parse(options, &config)?;
        }

        Commands::Check { files } => {
            execute_check(CheckOptions { files }, &config)?;
        }

        Commands::Types => {
            execute_types(&config)?;
        }

        Commands::Init { force } => {
            let options = InitOptions {
                path: cli.config,
                force,
            };
            execute_init(options)?;
        }
    }

    Ok(())
}
