//! Jupiter Ultra Types
//!
//! Request and response structures for the Ultra `order` / `execute` /
//! `holdings` endpoints.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{Snapshot, SOL_MINT};
use crate::ports::execution::{ExecutionError, ExecutionResult, RawSwapOrder};

/// Query parameters for `GET /order`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub input_mint: String,
    pub output_mint: String,
    /// Raw amount, sent as a string
    pub amount: String,
    pub taker: String,
    pub slippage_bps: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl OrderRequest {
    pub fn new(input_mint: &str, output_mint: &str, amount: u64, taker: &str, slippage_bps: u16) -> Self {
        Self {
            input_mint: input_mint.to_string(),
            output_mint: output_mint.to_string(),
            amount: amount.to_string(),
            taker: taker.to_string(),
            slippage_bps,
            mode: Some("swap".to_string()),
        }
    }
}

/// Response from `GET /order`. Error payloads come back on the same shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub out_amount: Option<u64>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub in_amount: Option<u64>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub error_code: Option<Value>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl OrderResponse {
    /// Validate the payload and turn it into an unsigned order
    pub fn into_order(self) -> Result<RawSwapOrder, ExecutionError> {
        if self.error.is_some() || self.error_code.is_some() {
            let message = self
                .error_message
                .or_else(|| self.error.as_ref().map(value_text))
                .or_else(|| self.error_code.as_ref().map(value_text))
                .unwrap_or_default();
            return Err(ExecutionError::OrderRejected(message));
        }

        let transaction = self
            .transaction
            .filter(|tx| !tx.is_empty())
            .ok_or_else(|| ExecutionError::MalformedResponse("order has no transaction".into()))?;
        let request_id = self
            .request_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ExecutionError::MalformedResponse("order has no requestId".into()))?;

        let mut order = RawSwapOrder::new(transaction).with_request_id(request_id);
        if let Some(out_amount) = self.out_amount {
            order = order.with_quoted_out_amount(out_amount);
        }
        Ok(order)
    }
}

/// Body for `POST /execute`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub signed_transaction: String,
    pub request_id: String,
}

/// Response from `POST /execute`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub txid: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub output_amount_result: Option<u64>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl ExecuteResponse {
    /// First present of `signature`, `txid`, `result`
    pub fn execution_signature(&self) -> Option<String> {
        self.signature
            .clone()
            .or_else(|| self.txid.clone())
            .or_else(|| self.result.clone())
    }

    /// Map the venue outcome, falling back to the quoted size when the
    /// executed output is not reported.
    pub fn into_result(self, quoted_out_amount: Option<u64>) -> Result<ExecutionResult, ExecutionError> {
        if let Some(status) = self.status.as_deref() {
            if status != "Success" {
                let detail = self.error.as_ref().map(value_text).unwrap_or_default();
                return Err(ExecutionError::ExecutionFailed(format!(
                    "status {}: {}",
                    status, detail
                )));
            }
        }
        if let Some(error) = self.error.as_ref() {
            return Err(ExecutionError::ExecutionFailed(value_text(error)));
        }

        let signature = self.execution_signature();
        Ok(match self.output_amount_result {
            Some(amount) => ExecutionResult::exact(signature, amount),
            None => ExecutionResult::approximate(signature, quoted_out_amount),
        })
    }
}

/// Response from `GET /holdings/{wallet}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsResponse {
    /// Native SOL balance
    #[serde(default)]
    pub ui_amount: f64,
    #[serde(default)]
    pub tokens: HashMap<String, Vec<TokenAccountHolding>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccountHolding {
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub ui_amount: f64,
    #[serde(default)]
    pub decimals: Option<u8>,
}

impl HoldingsResponse {
    /// Sum token accounts per mint; native SOL is stored under the wSOL mint
    /// and replaces any wrapped SOL entry.
    pub fn into_snapshot(self) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for (mint, accounts) in self.tokens {
            let total: f64 = accounts.iter().map(|a| a.ui_amount).sum();
            snapshot.set(mint, total);
        }
        snapshot.set(SOL_MINT, self.ui_amount);
        snapshot
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Accept amounts encoded as either JSON strings or numbers
fn de_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}
