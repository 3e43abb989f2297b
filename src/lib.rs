//! Butters Copytrade - Solana/Jupiter Copy-Trading Library
//!
//! Watches parent wallets and mirrors their SOL-funded token trades on a
//! follower wallet.
//!
//! # Modules
//!
//! - `domain`: Snapshots, delta classification, swap extraction, positions
//! - `ports`: Trait abstractions (ExecutionVenue, SnapshotSource, TransactionSource)
//! - `adapters`: External implementations (Jupiter, Solana, Paper, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Copy-trade orchestrator

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
