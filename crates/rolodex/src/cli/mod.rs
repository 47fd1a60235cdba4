//! Command-line interface for the rolodex binary.

mod commands;
mod run;

pub use commands::{Cli, Commands};
pub use run::run_command;
