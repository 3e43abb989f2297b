//! Jupiter Quote Types
//!
//! Request and response structures for the swap API's quote endpoint.

use serde::{Deserialize, Serialize};

/// Request parameters for getting a swap quote
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Input token mint address
    pub input_mint: String,
    /// Output token mint address
    pub output_mint: String,
    /// Amount in base units (lamports for SOL)
    pub amount: u64,
    /// Slippage tolerance in basis points (1 = 0.01%)
    pub slippage_bps: u16,
    /// ExactIn or ExactOut
    pub swap_mode: String,
    /// Route only through liquid intermediate tokens
    pub restrict_intermediate_tokens: bool,
}

impl QuoteRequest {
    /// Create an ExactIn quote request
    pub fn new(input_mint: &str, output_mint: &str, amount: u64, slippage_bps: u16) -> Self {
        Self {
            input_mint: input_mint.to_string(),
            output_mint: output_mint.to_string(),
            amount,
            slippage_bps,
            swap_mode: "ExactIn".to_string(),
            restrict_intermediate_tokens: true,
        }
    }

    pub fn with_restrict_intermediate_tokens(mut self, restrict: bool) -> Self {
        self.restrict_intermediate_tokens = restrict;
        self
    }

    /// Query string pairs in the order the API documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("inputMint", self.input_mint.clone()),
            ("outputMint", self.output_mint.clone()),
            ("amount", self.amount.to_string()),
            ("slippageBps", self.slippage_bps.to_string()),
            ("swapMode", self.swap_mode.clone()),
            ("restrictIntermediateTokens", self.restrict_intermediate_tokens.to_string()),
        ]
    }
}

/// Response from the quote API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub input_mint: String,
    pub output_mint: String,
    /// Input amount in base units
    pub in_amount: String,
    /// Output amount in base units
    pub out_amount: String,
    /// Minimum output amount after slippage
    #[serde(default)]
    pub other_amount_threshold: String,
    #[serde(default)]
    pub swap_mode: String,
    #[serde(default)]
    pub slippage_bps: u16,
    #[serde(default)]
    pub price_impact_pct: String,
    #[serde(default)]
    pub route_plan: Vec<serde_json::Value>,
    /// Everything else is passed back verbatim to `/swap`
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

impl QuoteResponse {
    /// Input amount as u64, `None` if unparseable
    pub fn input_amount(&self) -> Option<u64> {
        self.in_amount.parse().ok()
    }

    /// Quoted output amount as u64, `None` if unparseable
    pub fn output_amount(&self) -> Option<u64> {
        self.out_amount.parse().ok()
    }

    pub fn price_impact(&self) -> f64 {
        self.price_impact_pct.parse().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_request_defaults() {
        let req = QuoteRequest::new(
            "So11111111111111111111111111111111111111112",
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            5_000_000,
            500,
        );

        assert_eq!(req.swap_mode, "ExactIn");
        assert!(req.restrict_intermediate_tokens);

        let pairs = req.query_pairs();
        assert!(pairs.contains(&("amount", "5000000".to_string())));
        assert!(pairs.contains(&("restrictIntermediateTokens", "true".to_string())));
    }

    #[test]
    fn test_quote_response_parsing() {
        let json = r#"{
            "inputMint": "So11111111111111111111111111111111111111112",
            "outputMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            "inAmount": "1000000000",
            "outAmount": "150000000",
            "otherAmountThreshold": "142500000",
            "swapMode": "ExactIn",
            "slippageBps": 500,
            "priceImpactPct": "0.12",
            "routePlan": [{"swapInfo": {"label": "Raydium"}, "percent": 100}],
            "contextSlot": 1234
        }"#;

        let quote: QuoteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(quote.input_amount(), Some(1_000_000_000));
        assert_eq!(quote.output_amount(), Some(150_000_000));
        assert!((quote.price_impact() - 0.12).abs() < 0.001);
        assert!(quote.extra.contains_key("contextSlot"));
    }

    #[test]
    fn test_quote_response_passthrough() {
        let json = r#"{"inputMint": "A", "outputMint": "B", "inAmount": "1", "outAmount": "2", "contextSlot": 9}"#;
        let quote: QuoteResponse = serde_json::from_str(json).unwrap();
        let value = serde_json::to_value(&quote).unwrap();
        assert_eq!(value["contextSlot"], 9);
        assert_eq!(value["outAmount"], "2");
    }

    #[test]
    fn test_unparseable_amount() {
        let json = r#"{"inputMint": "A", "outputMint": "B", "inAmount": "", "outAmount": "x"}"#;
        let quote: QuoteResponse = serde_json::from_str(json).unwrap();
        assert!(quote.input_amount().is_none());
        assert!(quote.output_amount().is_none());
    }
}
