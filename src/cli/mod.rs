//! Command-line surface: subcommands, global server options and logging setup.
pub mod commands;

pub use commands::{Cli, Commands, run};
