//! Token metadata lookup
//!
//! Cosmetic only: resolves a mint to name/symbol/decimals so stream-mode logs
//! can print human readable amounts. Lookups never fail; unknown tokens get
//! `("Unknown", "UNK", 6)`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::client::JupiterClient;
use crate::domain::SOL_MINT;

/// Token information from the Jupiter token API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Mint address (`id` in v2 responses, `address` in older lists)
    #[serde(alias = "address")]
    pub id: String,
    #[serde(default = "unknown_name")]
    pub name: String,
    #[serde(default = "unknown_symbol")]
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn unknown_name() -> String {
    "Unknown".to_string()
}

fn unknown_symbol() -> String {
    "UNK".to_string()
}

fn default_decimals() -> u8 {
    6
}

impl TokenInfo {
    pub fn unknown(mint: &str) -> Self {
        Self {
            id: mint.to_string(),
            name: unknown_name(),
            symbol: unknown_symbol(),
            decimals: default_decimals(),
        }
    }

    fn native_sol() -> Self {
        Self {
            id: SOL_MINT.to_string(),
            name: "Wrapped SOL".to_string(),
            symbol: "SOL".to_string(),
            decimals: 9,
        }
    }

    /// Raw integer amount scaled by this token's decimals
    pub fn ui_amount(&self, raw: u64) -> f64 {
        raw as f64 / 10f64.powi(self.decimals as i32)
    }
}

/// Cached mint -> metadata directory
#[derive(Debug, Clone)]
pub struct TokenDirectory {
    client: Option<JupiterClient>,
    cache: Arc<RwLock<HashMap<String, TokenInfo>>>,
}

impl TokenDirectory {
    pub fn new(client: JupiterClient) -> Self {
        Self::build(Some(client))
    }

    /// Directory that never hits the network
    pub fn offline() -> Self {
        Self::build(None)
    }

    fn build(client: Option<JupiterClient>) -> Self {
        let mut cache = HashMap::new();
        cache.insert(SOL_MINT.to_string(), TokenInfo::native_sol());
        Self {
            client,
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    pub async fn insert(&self, info: TokenInfo) {
        self.cache.write().await.insert(info.id.clone(), info);
    }

    /// Resolve a mint, caching both hits and misses
    pub async fn lookup(&self, mint: &str) -> TokenInfo {
        if let Some(info) = self.cache.read().await.get(mint) {
            return info.clone();
        }

        let info = match self.client {
            Some(ref client) => match client.search_tokens(mint).await {
                Ok(tokens) => tokens
                    .into_iter()
                    .find(|t| t.id == mint)
                    .unwrap_or_else(|| TokenInfo::unknown(mint)),
                Err(e) => {
                    debug!("Token lookup for {} failed: {}", mint, e);
                    TokenInfo::unknown(mint)
                }
            },
            None => TokenInfo::unknown(mint),
        };

        self.cache.write().await.insert(mint.to_string(), info.clone());
        info
    }
}
