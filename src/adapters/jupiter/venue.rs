//! Jupiter execution venues
//!
//! `UltraVenue` uses Ultra's order/execute pair and reports the exact fill.
//! `QuoteSwapVenue` builds the transaction through quote/swap, submits it
//! over RPC and can only report the quoted size.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::client::JupiterClient;
use super::quote::QuoteRequest;
use super::swap::SwapRequest;
use super::ultra::{ExecuteRequest, OrderRequest};
use crate::adapters::solana::{decode_transaction, SolanaClient, WalletError, WalletManager};
use crate::ports::execution::{ExecutionError, ExecutionResult, ExecutionVenue, RawSwapOrder};

fn wallet_error(e: WalletError) -> ExecutionError {
    match e {
        WalletError::DecodeError(msg) => ExecutionError::DecodeError(msg),
        other => ExecutionError::SigningError(other.to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct UltraVenue {
    client: JupiterClient,
}

impl UltraVenue {
    pub fn new(client: JupiterClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExecutionVenue for UltraVenue {
    fn name(&self) -> &str {
        "ultra"
    }

    async fn request_order(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        taker: &str,
    ) -> Result<RawSwapOrder, ExecutionError> {
        let request = OrderRequest::new(input_mint, output_mint, amount, taker, self.client.slippage_bps());
        let response = self.client.get_order(&request).await?;
        let order = response.into_order()?;
        debug!(
            "Ultra order {} quoted out={:?}",
            order.request_id.as_deref().unwrap_or_default(),
            order.quoted_out_amount
        );
        Ok(order)
    }

    async fn sign_and_submit(
        &self,
        order: &RawSwapOrder,
        signer: &WalletManager,
    ) -> Result<ExecutionResult, ExecutionError> {
        let request_id = order
            .request_id
            .clone()
            .ok_or_else(|| ExecutionError::InvalidParameters("Ultra order has no requestId".into()))?;

        let (signed_transaction, signed) = signer
            .sign_encoded_transaction(&order.transaction_b64)
            .map_err(wallet_error)?;
        if !signed {
            warn!(
                "Signer {} not among transaction accounts, submitting as issued",
                signer.public_key()
            );
        }

        let response = self
            .client
            .execute(&ExecuteRequest {
                signed_transaction,
                request_id,
            })
            .await?;

        let result = response.into_result(order.quoted_out_amount)?;
        info!(
            "Ultra execute ok: signature={} out={:?}{}",
            result.signature.as_deref().unwrap_or("-"),
            result.output_amount,
            if result.approximate { " (quoted)" } else { "" }
        );
        Ok(result)
    }
}

#[derive(Clone)]
pub struct QuoteSwapVenue {
    client: JupiterClient,
    rpc: SolanaClient,
}

impl QuoteSwapVenue {
    pub fn new(client: JupiterClient, rpc: SolanaClient) -> Self {
        Self { client, rpc }
    }
}

#[async_trait]
impl ExecutionVenue for QuoteSwapVenue {
    fn name(&self) -> &str {
        "quote-swap"
    }

    async fn request_order(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        taker: &str,
    ) -> Result<RawSwapOrder, ExecutionError> {
        let request = QuoteRequest::new(input_mint, output_mint, amount, self.client.slippage_bps());
        let quote = self.client.get_quote(&request).await?;

        if quote.input_amount().is_none() {
            return Err(ExecutionError::MalformedResponse("quote has no inAmount".into()));
        }
        let out_amount = quote
            .output_amount()
            .ok_or_else(|| ExecutionError::MalformedResponse("quote has no outAmount".into()))?;

        let quote_value = serde_json::to_value(&quote)
            .map_err(|e| ExecutionError::InvalidParameters(e.to_string()))?;
        let swap = self
            .client
            .get_swap_transaction(&SwapRequest::new(taker.to_string(), quote_value))
            .await?;

        if let Some(ref simulation_error) = swap.simulation_error {
            warn!("Swap simulation reported an error: {}", simulation_error);
        }
        if swap.swap_transaction.is_empty() {
            return Err(ExecutionError::MalformedResponse("swap has no transaction".into()));
        }

        Ok(RawSwapOrder::new(swap.swap_transaction).with_quoted_out_amount(out_amount))
    }

    async fn sign_and_submit(
        &self,
        order: &RawSwapOrder,
        signer: &WalletManager,
    ) -> Result<ExecutionResult, ExecutionError> {
        let mut transaction = decode_transaction(&order.transaction_b64).map_err(wallet_error)?;
        if !signer.sign_versioned_transaction(&mut transaction).map_err(wallet_error)? {
            warn!(
                "Signer {} not among transaction accounts, submitting as issued",
                signer.public_key()
            );
        }

        let signature = self
            .rpc
            .send_versioned_transaction(&transaction)
            .await
            .map_err(|e| ExecutionError::ExecutionFailed(e.to_string()))?;

        info!("Swap sent: signature={} quoted out={:?}", signature, order.quoted_out_amount);
        Ok(ExecutionResult::approximate(Some(signature), order.quoted_out_amount))
    }
}
