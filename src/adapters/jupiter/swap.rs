//! Jupiter Swap Types
//!
//! Request and response structures for the swap API's transaction builder.

use serde::{Deserialize, Serialize};

/// Request parameters for building a swap transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    /// The full quote response from /quote
    pub quote_response: serde_json::Value,
    /// User's public key (wallet address)
    pub user_public_key: String,
    /// Wrap SOL before and unwrap after the swap
    #[serde(default = "default_true")]
    pub wrap_and_unwrap_sol: bool,
    /// Whether to use dynamic compute unit limit calculation
    #[serde(default = "default_true")]
    pub dynamic_compute_unit_limit: bool,
    /// Optional prioritization fee in lamports for faster inclusion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioritization_fee_lamports: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl SwapRequest {
    pub fn new(user_public_key: String, quote_response: serde_json::Value) -> Self {
        Self {
            quote_response,
            user_public_key,
            wrap_and_unwrap_sol: true,
            dynamic_compute_unit_limit: true,
            prioritization_fee_lamports: None,
        }
    }

    /// Set prioritization fee for faster transaction inclusion
    pub fn with_priority_fee(mut self, lamports: u64) -> Self {
        self.prioritization_fee_lamports = Some(lamports);
        self
    }
}

/// Response from the swap API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    /// Base64 encoded serialized transaction ready to sign and send
    pub swap_transaction: String,
    /// Last valid block height for this transaction
    #[serde(default)]
    pub last_valid_block_height: u64,
    /// Prioritization fee applied (in lamports)
    #[serde(default)]
    pub prioritization_fee_lamports: u64,
    /// Present when the API's pre-flight simulation failed
    #[serde(default)]
    pub simulation_error: Option<serde_json::Value>,
}

impl SwapResponse {
    /// Check if transaction is still valid based on current block height
    pub fn is_valid_at_height(&self, current_height: u64) -> bool {
        current_height <= self.last_valid_block_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_request_serialization() {
        let quote = serde_json::json!({"inAmount": "1", "outAmount": "2"});
        let req = SwapRequest::new("wallet123".to_string(), quote).with_priority_fee(5000);

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["userPublicKey"], "wallet123");
        assert_eq!(json["wrapAndUnwrapSol"], true);
        assert_eq!(json["dynamicComputeUnitLimit"], true);
        assert_eq!(json["prioritizationFeeLamports"], 5000);
        assert_eq!(json["quoteResponse"]["outAmount"], "2");
    }

    #[test]
    fn test_priority_fee_omitted_by_default() {
        let req = SwapRequest::new("w".to_string(), serde_json::json!({}));
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("prioritizationFeeLamports").is_none());
    }

    #[test]
    fn test_swap_response_parsing() {
        let json = r#"{
            "swapTransaction": "AQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=",
            "lastValidBlockHeight": 123456789,
            "prioritizationFeeLamports": 5000,
            "simulationError": null
        }"#;

        let response: SwapResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.last_valid_block_height, 123456789);
        assert!(response.simulation_error.is_none());
        assert!(response.is_valid_at_height(123456789));
        assert!(!response.is_valid_at_height(123456790));
    }

    #[test]
    fn test_swap_response_simulation_error() {
        let json = r#"{"swapTransaction": "AQ==", "simulationError": {"errorCode": "X"}}"#;
        let response: SwapResponse = serde_json::from_str(json).unwrap();
        assert!(response.simulation_error.is_some());
    }
}
