//! @module "Commands"
//! @summary "CLI command implementations"
//! @domain cli
//! @layer handler
//!
//! Each command is in its own submodule and takes an `*Options` struct.

pub mod check;
pub mod init;
pub mod parse;
pub mod types;

pub use check::{execute_check, CheckOptions};
pub use init::{execute_init, InitOptions};
pub use parse::{execute_parse, render_bag, ParseOptions};
pub use types::{describe_types, execute_types, TypeRow};
