//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, CopySection, JupiterSection, ParentSection, SolanaSection, StreamSection, VenueKind,
    load_config, validate_wallet_address,
};
