//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Jupiter: Ultra and quote/swap venues, holdings snapshots, token lookup
//! - Solana: RPC client, wallet management and the logs websocket
//! - Paper: simulated fills for dry runs
//! - CLI: Command-line interface definitions

pub mod jupiter;
pub mod solana;
pub mod paper;
pub mod cli;

pub use jupiter::{JupiterClient, QuoteSwapVenue, TokenDirectory, UltraVenue};
pub use solana::{LogsSubscriber, SolanaClient, WalletManager};
pub use paper::PaperVenue;
pub use cli::CliApp;
