//! Paper trading venue
//!
//! Simulates fills without touching the network so the monitors can be
//! dry-run against a real parent wallet.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::adapters::solana::WalletManager;
use crate::ports::execution::{ExecutionError, ExecutionResult, ExecutionVenue, RawSwapOrder};

/// A simulated fill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperFill {
    pub id: u64,
    pub input_mint: String,
    pub output_mint: String,
    pub input_amount: u64,
    pub output_amount: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct PaperBook {
    pending: Vec<(String, PaperFill)>,
    fills: Vec<PaperFill>,
    next_id: u64,
}

#[derive(Debug, Clone)]
pub struct PaperVenue {
    /// Output units credited per input unit
    fill_ratio: f64,
    /// Simulated slippage applied to every fill
    slippage_bps: u16,
    book: Arc<Mutex<PaperBook>>,
}

impl Default for PaperVenue {
    fn default() -> Self {
        Self::new(1.0, 0)
    }
}

impl PaperVenue {
    pub fn new(fill_ratio: f64, slippage_bps: u16) -> Self {
        Self {
            fill_ratio: fill_ratio.max(0.0),
            slippage_bps: slippage_bps.min(10_000),
            book: Arc::default(),
        }
    }

    fn simulated_output(&self, amount: u64) -> u64 {
        let gross = amount as f64 * self.fill_ratio;
        let net = gross * (1.0 - self.slippage_bps as f64 / 10_000.0);
        net.round() as u64
    }

    /// Completed fills, oldest first
    pub async fn fills(&self) -> Vec<PaperFill> {
        self.book.lock().await.fills.clone()
    }
}

#[async_trait]
impl ExecutionVenue for PaperVenue {
    fn name(&self) -> &str {
        "paper"
    }

    async fn request_order(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        _taker: &str,
    ) -> Result<RawSwapOrder, ExecutionError> {
        if amount == 0 {
            return Err(ExecutionError::InvalidParameters("amount must be positive".into()));
        }

        let mut book = self.book.lock().await;
        book.next_id += 1;
        let id = book.next_id;
        let request_id = format!("paper-{}", id);
        let output_amount = self.simulated_output(amount);

        book.pending.push((
            request_id.clone(),
            PaperFill {
                id,
                input_mint: input_mint.to_string(),
                output_mint: output_mint.to_string(),
                input_amount: amount,
                output_amount,
                timestamp: Utc::now(),
            },
        ));

        Ok(RawSwapOrder::new(String::new())
            .with_request_id(request_id)
            .with_quoted_out_amount(output_amount))
    }

    async fn sign_and_submit(
        &self,
        order: &RawSwapOrder,
        _signer: &WalletManager,
    ) -> Result<ExecutionResult, ExecutionError> {
        let request_id = order
            .request_id
            .as_deref()
            .ok_or_else(|| ExecutionError::InvalidParameters("paper order has no requestId".into()))?;

        let mut book = self.book.lock().await;
        let index = book
            .pending
            .iter()
            .position(|(id, _)| id == request_id)
            .ok_or_else(|| ExecutionError::ExecutionFailed(format!("unknown paper order {}", request_id)))?;
        let (signature, mut fill) = book.pending.remove(index);
        fill.timestamp = Utc::now();

        info!(
            "[PAPER] {} {} -> {} {}",
            fill.input_amount, fill.input_mint, fill.output_amount, fill.output_mint
        );
        let output_amount = fill.output_amount;
        book.fills.push(fill);

        Ok(ExecutionResult::exact(Some(signature), output_amount))
    }
}
