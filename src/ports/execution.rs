//! Execution venue port
//!
//! A venue turns "swap X for Y" into a signed, submitted transaction. Ultra,
//! quote/swap and paper venues all implement [`ExecutionVenue`]; the
//! orchestrator never knows which one is active.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::adapters::solana::WalletManager;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("API request failed: {0}")]
    ApiError(String),
    #[error("Venue rejected order: {0}")]
    OrderRejected(String),
    #[error("Malformed venue response: {0}")]
    MalformedResponse(String),
    #[error("Transaction decode failed: {0}")]
    DecodeError(String),
    #[error("Transaction signing failed: {0}")]
    SigningError(String),
    #[error("Transaction execution failed: {0}")]
    ExecutionFailed(String),
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Order request failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

/// Unsigned swap transaction issued by a venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSwapOrder {
    /// Base64 serialized versioned transaction
    pub transaction_b64: String,
    /// Venue request id, required by Ultra's execute call
    pub request_id: Option<String>,
    /// Quoted output amount in raw units, used when the fill is not reported
    pub quoted_out_amount: Option<u64>,
}

impl RawSwapOrder {
    pub fn new(transaction_b64: impl Into<String>) -> Self {
        Self {
            transaction_b64: transaction_b64.into(),
            request_id: None,
            quoted_out_amount: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_quoted_out_amount(mut self, amount: u64) -> Self {
        self.quoted_out_amount = Some(amount);
        self
    }
}

/// Outcome of a successful sign-and-submit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// On-chain signature of the executed swap
    pub signature: Option<String>,
    /// Raw output amount received
    pub output_amount: Option<u64>,
    /// True when `output_amount` is a quote estimate
    pub approximate: bool,
}

impl ExecutionResult {
    pub fn exact(signature: Option<String>, output_amount: u64) -> Self {
        Self {
            signature,
            output_amount: Some(output_amount),
            approximate: false,
        }
    }

    pub fn approximate(signature: Option<String>, output_amount: Option<u64>) -> Self {
        Self {
            signature,
            output_amount,
            approximate: output_amount.is_some(),
        }
    }
}

/// Bounded retry for order requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

#[async_trait]
pub trait ExecutionVenue: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Ask the venue for an unsigned swap transaction
    async fn request_order(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        taker: &str,
    ) -> Result<RawSwapOrder, ExecutionError>;

    /// Sign the order's transaction with `signer` and submit it
    async fn sign_and_submit(
        &self,
        order: &RawSwapOrder,
        signer: &WalletManager,
    ) -> Result<ExecutionResult, ExecutionError>;

    /// `request_order` with a fixed backoff between attempts
    async fn request_order_with_retry(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        taker: &str,
        policy: &RetryPolicy,
    ) -> Result<RawSwapOrder, ExecutionError> {
        let mut last_error = String::new();

        for attempt in 1..=policy.max_attempts {
            match self.request_order(input_mint, output_mint, amount, taker).await {
                Ok(order) => {
                    debug!("{} order issued on attempt {}", self.name(), attempt);
                    return Ok(order);
                }
                Err(e) => {
                    warn!(
                        "{} order attempt {}/{} failed: {}",
                        self.name(),
                        attempt,
                        policy.max_attempts,
                        e
                    );
                    last_error = e.to_string();
                    if attempt < policy.max_attempts && !policy.backoff.is_zero() {
                        tokio::time::sleep(policy.backoff).await;
                    }
                }
            }
        }

        Err(ExecutionError::RetriesExhausted {
            attempts: policy.max_attempts,
            last: last_error,
        })
    }
}
