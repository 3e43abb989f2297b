//! CLI Commands
//!
//! Argument definitions for the copy-trading bot.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::VenueKind;

/// Butters Copytrade - mirrors a parent wallet's Jupiter swaps on Solana
#[derive(Parser, Debug)]
#[command(
    name = "butters-copytrade",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Copy-trading bot for Solana/Jupiter",
    long_about = "Watches one or more parent wallets and replays their SOL-funded token \
                  buys and sells on a follower wallet through Jupiter."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Copy trades by polling parent holdings
    Run(RunCmd),

    /// Copy trades from the parent's transaction log stream
    Stream(StreamCmd),

    /// Print a wallet's holdings snapshot
    Holdings(HoldingsCmd),

    /// Show the follower wallet's SOL balance
    Status(StatusCmd),
}

/// Polling monitor
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/copytrade.toml")]
    pub config: PathBuf,

    /// Simulate fills instead of trading (no real transactions)
    #[arg(short, long)]
    pub paper: bool,

    /// Override the execution venue from the config
    #[arg(long, value_enum)]
    pub venue: Option<VenueKind>,

    /// Only monitor this parent wallet instead of every configured one
    #[arg(long, value_name = "ADDRESS")]
    pub parent: Option<String>,
}

/// Event-driven monitor
#[derive(Parser, Debug)]
pub struct StreamCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/copytrade.toml")]
    pub config: PathBuf,

    /// Simulate fills instead of trading (no real transactions)
    #[arg(short, long)]
    pub paper: bool,

    /// Override the execution venue from the config
    #[arg(long, value_enum)]
    pub venue: Option<VenueKind>,

    /// Only monitor this parent wallet instead of every configured one
    #[arg(long, value_name = "ADDRESS")]
    pub parent: Option<String>,

    /// Scrape mints from logs instead of fetching each transaction
    #[arg(long)]
    pub heuristic: bool,
}

/// Holdings snapshot
#[derive(Parser, Debug)]
pub struct HoldingsCmd {
    /// Wallet address to inspect
    #[arg(value_name = "WALLET")]
    pub wallet: String,

    /// Optional configuration file for Jupiter settings
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Follower wallet status
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/copytrade.toml")]
    pub config: PathBuf,
}
