//! Jupiter API Client
//!
//! HTTP client for Jupiter's Ultra API (order / execute / holdings), the
//! swap API (quote / swap) and the token search endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::quote::{QuoteRequest, QuoteResponse};
use super::swap::{SwapRequest, SwapResponse};
use super::token_list::TokenInfo;
use super::ultra::{ExecuteRequest, ExecuteResponse, HoldingsResponse, OrderRequest, OrderResponse};
use crate::domain::Snapshot;
use crate::ports::chain::{ChainError, SnapshotSource};
use crate::ports::execution::ExecutionError;

/// Jupiter API client configuration
#[derive(Debug, Clone)]
pub struct JupiterConfig {
    /// Base URL for the Ultra API
    pub ultra_api_url: String,
    /// Base URL for the quote/swap API
    pub swap_api_url: String,
    /// Base URL for the token API
    pub token_api_url: String,
    /// Optional API key for higher rate limits
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Slippage tolerance in basis points
    pub slippage_bps: u16,
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            ultra_api_url: "https://lite-api.jup.ag/ultra/v1".to_string(),
            swap_api_url: "https://lite-api.jup.ag/swap/v1".to_string(),
            token_api_url: "https://lite-api.jup.ag/tokens/v2".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            slippage_bps: 500,
        }
    }
}

impl JupiterConfig {
    /// Keyed config pointing at api.jup.ag
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            ultra_api_url: "https://api.jup.ag/ultra/v1".to_string(),
            swap_api_url: "https://api.jup.ag/swap/v1".to_string(),
            token_api_url: "https://api.jup.ag/tokens/v2".to_string(),
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }
}

/// Jupiter DEX aggregator client
#[derive(Debug, Clone)]
pub struct JupiterClient {
    config: JupiterConfig,
    http: Client,
}

impl JupiterClient {
    /// Create a new Jupiter client with default configuration
    pub fn new() -> Result<Self, ExecutionError> {
        Self::with_config(JupiterConfig::default())
    }

    /// Create a new Jupiter client with custom configuration
    pub fn with_config(config: JupiterConfig) -> Result<Self, ExecutionError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExecutionError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &JupiterConfig {
        &self.config
    }

    pub fn slippage_bps(&self) -> u16 {
        self.config.slippage_bps
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self.http.get(url);
        match self.config.api_key {
            Some(ref api_key) => req.header("x-api-key", api_key),
            None => req,
        }
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self.http.post(url);
        match self.config.api_key {
            Some(ref api_key) => req.header("x-api-key", api_key),
            None => req,
        }
    }

    /// Request an unsigned Ultra order
    pub async fn get_order(&self, request: &OrderRequest) -> Result<OrderResponse, ExecutionError> {
        let url = format!("{}/order", self.config.ultra_api_url);
        debug!(
            "Ultra order {} -> {} amount={}",
            request.input_mint, request.output_mint, request.amount
        );

        let response = self
            .get(&url)
            .query(request)
            .send()
            .await
            .map_err(|e| ExecutionError::ApiError(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Submit a signed Ultra order
    pub async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, ExecutionError> {
        let url = format!("{}/execute", self.config.ultra_api_url);

        let response = self
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ExecutionError::ApiError(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Get a quote for a token swap
    pub async fn get_quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, ExecutionError> {
        let url = format!("{}/quote", self.config.swap_api_url);

        let response = self
            .get(&url)
            .query(&request.query_pairs())
            .send()
            .await
            .map_err(|e| ExecutionError::ApiError(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Build the swap transaction for a quote
    pub async fn get_swap_transaction(&self, request: &SwapRequest) -> Result<SwapResponse, ExecutionError> {
        let url = format!("{}/swap", self.config.swap_api_url);

        let response = self
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ExecutionError::ApiError(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Wallet holdings from the Ultra API
    pub async fn get_holdings(&self, wallet: &str) -> Result<HoldingsResponse, ChainError> {
        let url = format!("{}/holdings/{}", self.config.ultra_api_url, wallet);

        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| ChainError::ApiError(e.to_string()))?;

        self.handle_response(response)
            .await
            .map_err(|e| ChainError::ApiError(e.to_string()))
    }

    /// Search the token API; a mint address query returns that token
    pub async fn search_tokens(&self, query: &str) -> Result<Vec<TokenInfo>, ExecutionError> {
        let url = format!("{}/search", self.config.token_api_url);

        let response = self
            .get(&url)
            .query(&[("query", query)])
            .send()
            .await
            .map_err(|e| ExecutionError::ApiError(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Handle API response and deserialize
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ExecutionError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ExecutionError::ApiError("Rate limit exceeded".into()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ExecutionError::ApiError(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ExecutionError::MalformedResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl SnapshotSource for JupiterClient {
    async fn snapshot(&self, wallet: &str) -> Result<Snapshot, ChainError> {
        let holdings = self.get_holdings(wallet).await?;
        Ok(holdings.into_snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jupiter_config_default() {
        let config = JupiterConfig::default();
        assert_eq!(config.ultra_api_url, "https://lite-api.jup.ag/ultra/v1");
        assert_eq!(config.swap_api_url, "https://lite-api.jup.ag/swap/v1");
        assert!(config.api_key.is_none());
        assert_eq!(config.slippage_bps, 500);
    }

    #[test]
    fn test_jupiter_config_with_api_key() {
        let config = JupiterConfig::with_api_key("test-key");
        assert_eq!(config.ultra_api_url, "https://api.jup.ag/ultra/v1");
        assert_eq!(config.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.slippage_bps, 500);
    }

    #[test]
    fn test_jupiter_client_creation() {
        let client = JupiterClient::new();
        assert!(client.is_ok());
        assert_eq!(client.unwrap().slippage_bps(), 500);
    }
}
