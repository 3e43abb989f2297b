//! CLI Adapter
//!
//! Command-line interface for the copy-trading bot.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, HoldingsCmd, RunCmd, StatusCmd, StreamCmd};
