//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml structure.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::jupiter::JupiterConfig;
use crate::application::OrchestratorConfig;
use crate::domain::SwapExtractor;
use crate::ports::execution::RetryPolicy;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub parent: ParentSection,
    #[serde(default)]
    pub copy: CopySection,
    #[serde(default)]
    pub jupiter: JupiterSection,
    pub solana: SolanaSection,
    #[serde(default)]
    pub stream: StreamSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Wallets to mirror
#[derive(Debug, Clone, Deserialize)]
pub struct ParentSection {
    /// Each wallet gets its own independent monitor
    pub wallets: Vec<String>,
}

/// Which execution path copy trades go through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum VenueKind {
    /// Ultra order/execute, reports the exact fill
    #[default]
    Ultra,
    /// Quote + swap transaction sent over RPC, reports the quoted size
    QuoteSwap,
}

/// Copy-trade sizing and timing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CopySection {
    /// SOL spent on each copy-buy (5_000_000 = 0.005 SOL)
    pub amount_lamports: u64,
    /// Parent trades moving less SOL than this are ignored
    pub min_parent_trade_sol: f64,
    /// Balance changes below this are treated as noise
    pub change_threshold: f64,
    /// Order request attempts before a trade is abandoned
    pub max_order_attempts: u32,
    pub retry_backoff_ms: u64,
    pub poll_interval_ms: u64,
    /// Wait for the buy signature to confirm
    pub wait_for_confirmation: bool,
    /// Wait for the bought token to show up in the follower's holdings
    pub wait_for_holdings: bool,
    pub confirmation_timeout_secs: u64,
    pub holdings_timeout_secs: u64,
    pub venue: VenueKind,
}

impl Default for CopySection {
    fn default() -> Self {
        Self {
            amount_lamports: 5_000_000,
            min_parent_trade_sol: 0.1,
            change_threshold: 0.0001,
            max_order_attempts: 6,
            retry_backoff_ms: 1_000,
            poll_interval_ms: 1_000,
            wait_for_confirmation: true,
            wait_for_holdings: true,
            confirmation_timeout_secs: 40,
            holdings_timeout_secs: 40,
            venue: VenueKind::Ultra,
        }
    }
}

/// Jupiter API configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JupiterSection {
    /// Ultra API base URL; defaults depend on whether an API key is set
    pub ultra_api_url: Option<String>,
    pub swap_api_url: Option<String>,
    pub token_api_url: Option<String>,
    /// Optional API key for higher rate limits (get from jup.ag)
    pub api_key: Option<String>,
    /// Slippage tolerance in basis points (5% = 500 bps)
    pub slippage_bps: u16,
    pub timeout_secs: u64,
}

impl Default for JupiterSection {
    fn default() -> Self {
        Self {
            ultra_api_url: None,
            swap_api_url: None,
            token_api_url: None,
            api_key: None,
            slippage_bps: 500,
            timeout_secs: 30,
        }
    }
}

/// Solana RPC configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct SolanaSection {
    /// RPC endpoint (use private RPC for production)
    pub rpc_url: String,
    /// Websocket endpoint; derived from rpc_url when absent
    #[serde(default)]
    pub ws_url: Option<String>,
    /// Commitment level: "processed", "confirmed", "finalized"
    #[serde(default = "default_commitment")]
    pub commitment: String,
    /// Wallet keypair path (NEVER commit this file!)
    pub keypair_path: String,
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

impl SolanaSection {
    /// Get RPC URL with environment variable override
    /// Checks SOLANA_RPC_URL env var first, falls back to config value
    pub fn get_rpc_url(&self) -> String {
        std::env::var("SOLANA_RPC_URL").unwrap_or_else(|_| self.rpc_url.clone())
    }

    /// Get websocket URL: SOLANA_WS_URL, then ws_url, then rpc_url with the
    /// scheme swapped to ws/wss
    pub fn get_ws_url(&self) -> String {
        if let Ok(url) = std::env::var("SOLANA_WS_URL") {
            return url;
        }
        if let Some(ref url) = self.ws_url {
            if !url.is_empty() {
                return url.clone();
            }
        }
        derive_ws_url(&self.get_rpc_url())
    }

    /// Get keypair path with environment variable override
    /// Checks SOLANA_KEYPAIR_PATH env var first, falls back to config value
    pub fn get_keypair_path(&self) -> String {
        std::env::var("SOLANA_KEYPAIR_PATH").unwrap_or_else(|_| self.keypair_path.clone())
    }

    /// Base58 follower secret from FOLLOWER_PRIVATE_KEY, if set
    pub fn get_private_key(&self) -> Option<String> {
        std::env::var("FOLLOWER_PRIVATE_KEY").ok().filter(|k| !k.is_empty())
    }
}

fn derive_ws_url(rpc_url: &str) -> String {
    if let Some(rest) = rpc_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = rpc_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        rpc_url.to_string()
    }
}

/// Event-driven monitor settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamSection {
    /// "structured" (fetch the transaction) or "heuristic" (scrape logs)
    pub extractor: SwapExtractor,
    /// Minimum spacing between copied events for one token
    pub cooldown_ms: u64,
    /// Notification channel capacity
    pub buffer: usize,
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            extractor: SwapExtractor::Structured,
            cooldown_ms: 2_000,
            buffer: 256,
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Lower bound for the holdings polling interval
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Check that a wallet address is base58 and decodes to a 32-byte public key
pub fn validate_wallet_address(wallet: &str) -> Result<(), ConfigError> {
    let decoded = bs58::decode(wallet).into_vec().map_err(|e| {
        ConfigError::ValidationError(format!("parent wallet '{}' is not base58: {}", wallet, e))
    })?;
    if decoded.len() != 32 {
        return Err(ConfigError::ValidationError(format!(
            "parent wallet '{}' must decode to 32 bytes, got {}",
            wallet,
            decoded.len()
        )));
    }
    Ok(())
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parent.wallets.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one parent wallet is required".to_string(),
            ));
        }

        for wallet in &self.parent.wallets {
            validate_wallet_address(wallet)?;
        }

        // Validate copy section
        if self.copy.amount_lamports == 0 {
            return Err(ConfigError::ValidationError(
                "amount_lamports must be > 0".to_string(),
            ));
        }

        if self.copy.min_parent_trade_sol < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "min_parent_trade_sol must be >= 0, got {}",
                self.copy.min_parent_trade_sol
            )));
        }

        if self.copy.change_threshold < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "change_threshold must be >= 0, got {}",
                self.copy.change_threshold
            )));
        }

        if self.copy.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(ConfigError::ValidationError(format!(
                "poll_interval_ms must be >= {}, got {}",
                MIN_POLL_INTERVAL_MS, self.copy.poll_interval_ms
            )));
        }

        if self.copy.max_order_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "max_order_attempts must be > 0".to_string(),
            ));
        }

        // Validate Jupiter
        if self.jupiter.slippage_bps > 10_000 {
            return Err(ConfigError::ValidationError(format!(
                "slippage_bps must be <= 10000, got {}",
                self.jupiter.slippage_bps
            )));
        }

        // Validate Solana
        if self.solana.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc_url cannot be empty".to_string(),
            ));
        }

        if self.solana.keypair_path.is_empty() {
            return Err(ConfigError::ValidationError(
                "keypair_path cannot be empty".to_string(),
            ));
        }

        if self.stream.buffer == 0 {
            return Err(ConfigError::ValidationError(
                "stream buffer must be > 0".to_string(),
            ));
        }

        if self.stream.cooldown_ms == 0 {
            return Err(ConfigError::ValidationError(
                "stream cooldown_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Orchestrator settings for one parent wallet
    pub fn orchestrator_config(&self, parent_wallet: &str) -> OrchestratorConfig {
        OrchestratorConfig {
            parent_wallet: parent_wallet.to_string(),
            copy_amount_lamports: self.copy.amount_lamports,
            min_parent_trade_sol: self.copy.min_parent_trade_sol,
            change_threshold: self.copy.change_threshold,
            retry: RetryPolicy::new(
                self.copy.max_order_attempts,
                Duration::from_millis(self.copy.retry_backoff_ms),
            ),
            poll_interval: Duration::from_millis(self.copy.poll_interval_ms),
            stream_cooldown: Duration::from_millis(self.stream.cooldown_ms),
            confirmation_timeout: Duration::from_secs(self.copy.confirmation_timeout_secs),
            holdings_timeout: Duration::from_secs(self.copy.holdings_timeout_secs),
            extractor: self.stream.extractor,
            ..OrchestratorConfig::default()
        }
    }
}

impl JupiterSection {
    /// Get API key with environment variable fallback
    /// Checks JUPITER_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        // First check config value
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        // Fall back to environment variable
        std::env::var("JUPITER_API_KEY").ok().filter(|k| !k.is_empty())
    }

    /// Client config; keyed requests go to api.jup.ag unless URLs are pinned
    pub fn client_config(&self) -> JupiterConfig {
        let mut config = match self.get_api_key() {
            Some(key) => JupiterConfig::with_api_key(key),
            None => JupiterConfig::default(),
        };

        if let Some(ref url) = self.ultra_api_url {
            config.ultra_api_url = url.clone();
        }
        if let Some(ref url) = self.swap_api_url {
            config.swap_api_url = url.clone();
        }
        if let Some(ref url) = self.token_api_url {
            config.token_api_url = url.clone();
        }
        config.slippage_bps = self.slippage_bps;
        config.timeout = Duration::from_secs(self.timeout_secs);
        config
    }
}
