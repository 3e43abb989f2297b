use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::chain::{ChainError, ConfirmationSource, SignatureStatus, SnapshotSource, TransactionSource};
use super::execution::{ExecutionError, ExecutionResult, ExecutionVenue, RawSwapOrder};
use crate::adapters::solana::WalletManager;
use crate::domain::{Snapshot, TransactionRecord};

/// A recorded `request_order` call
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCall {
    pub input_mint: String,
    pub output_mint: String,
    pub amount: u64,
    pub taker: String,
}

/// Mock venue that records calls and replays scripted responses.
///
/// Orders succeed unless `failing_orders` is set. Submissions pop from the
/// scripted queue and fall back to `default_result` once it is empty.
#[derive(Debug, Clone)]
pub struct MockVenue {
    order_calls: Arc<Mutex<Vec<OrderCall>>>,
    submit_calls: Arc<Mutex<Vec<RawSwapOrder>>>,
    failing_orders: Arc<Mutex<Option<u32>>>,
    submit_responses: Arc<Mutex<VecDeque<Result<ExecutionResult, String>>>>,
    default_result: ExecutionResult,
}

impl Default for MockVenue {
    fn default() -> Self {
        Self {
            order_calls: Arc::default(),
            submit_calls: Arc::default(),
            failing_orders: Arc::default(),
            submit_responses: Arc::default(),
            default_result: ExecutionResult::exact(Some("mock-signature".to_string()), 1),
        }
    }
}

impl MockVenue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every order request fails
    pub fn with_failing_orders(self) -> Self {
        *self.failing_orders.lock().unwrap() = Some(u32::MAX);
        self
    }

    /// The first `count` order requests fail, later ones succeed
    pub fn with_order_failures(self, count: u32) -> Self {
        *self.failing_orders.lock().unwrap() = Some(count);
        self
    }

    /// Queue the result of the next `sign_and_submit`
    pub fn with_submit_response(self, response: Result<ExecutionResult, String>) -> Self {
        self.submit_responses.lock().unwrap().push_back(response);
        self
    }

    pub fn with_default_result(mut self, result: ExecutionResult) -> Self {
        self.default_result = result;
        self
    }

    pub fn get_order_calls(&self) -> Vec<OrderCall> {
        self.order_calls.lock().unwrap().clone()
    }

    pub fn get_submit_calls(&self) -> Vec<RawSwapOrder> {
        self.submit_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionVenue for MockVenue {
    fn name(&self) -> &str {
        "mock"
    }

    async fn request_order(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        taker: &str,
    ) -> Result<RawSwapOrder, ExecutionError> {
        self.order_calls.lock().unwrap().push(OrderCall {
            input_mint: input_mint.to_string(),
            output_mint: output_mint.to_string(),
            amount,
            taker: taker.to_string(),
        });

        let mut failing = self.failing_orders.lock().unwrap();
        if let Some(remaining) = failing.as_mut() {
            if *remaining > 0 {
                *remaining = remaining.saturating_sub(1);
                return Err(ExecutionError::ApiError("HTTP 500: scripted failure".to_string()));
            }
        }

        let call_no = self.order_calls.lock().unwrap().len();
        Ok(RawSwapOrder::new("AQID").with_request_id(format!("mock-request-{call_no}")))
    }

    async fn sign_and_submit(
        &self,
        order: &RawSwapOrder,
        _signer: &WalletManager,
    ) -> Result<ExecutionResult, ExecutionError> {
        self.submit_calls.lock().unwrap().push(order.clone());
        match self.submit_responses.lock().unwrap().pop_front() {
            Some(Ok(result)) => Ok(result),
            Some(Err(e)) => Err(ExecutionError::ExecutionFailed(e)),
            None => Ok(self.default_result.clone()),
        }
    }
}

/// Mock snapshot source replaying a scripted sequence per call.
/// Once the script runs out the last snapshot repeats.
#[derive(Debug, Clone, Default)]
pub struct MockSnapshotSource {
    calls: Arc<Mutex<Vec<String>>>,
    script: Arc<Mutex<VecDeque<Result<Snapshot, String>>>>,
    last: Arc<Mutex<Option<Snapshot>>>,
}

impl MockSnapshotSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(self, snapshot: Snapshot) -> Self {
        self.script.lock().unwrap().push_back(Ok(snapshot));
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        self.script.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotSource for MockSnapshotSource {
    async fn snapshot(&self, wallet: &str) -> Result<Snapshot, ChainError> {
        self.calls.lock().unwrap().push(wallet.to_string());
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(snapshot)) => {
                *self.last.lock().unwrap() = Some(snapshot.clone());
                Ok(snapshot)
            }
            Some(Err(e)) => Err(ChainError::ApiError(e)),
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ChainError::ApiError("No snapshot configured".to_string())),
        }
    }
}

/// Mock transaction lookup keyed by signature
#[derive(Debug, Clone, Default)]
pub struct MockTransactionSource {
    calls: Arc<Mutex<Vec<String>>>,
    records: Arc<Mutex<HashMap<String, TransactionRecord>>>,
}

impl MockTransactionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, record: TransactionRecord) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert(record.signature.clone(), record);
        self
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionSource for MockTransactionSource {
    async fn fetch_transaction(&self, signature: &str) -> Result<Option<TransactionRecord>, ChainError> {
        self.calls.lock().unwrap().push(signature.to_string());
        Ok(self.records.lock().unwrap().get(signature).cloned())
    }
}

/// Mock confirmation source returning a fixed status
#[derive(Debug, Clone)]
pub struct MockConfirmationSource {
    status: SignatureStatus,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockConfirmationSource {
    pub fn new(status: SignatureStatus) -> Self {
        Self {
            status,
            calls: Arc::default(),
        }
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfirmationSource for MockConfirmationSource {
    async fn signature_status(&self, signature: &str) -> Result<SignatureStatus, ChainError> {
        self.calls.lock().unwrap().push(signature.to_string());
        Ok(self.status.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_venue_records_orders() {
        let venue = MockVenue::new();
        let order = venue.request_order("A", "B", 10, "me").await.unwrap();
        assert_eq!(order.request_id.as_deref(), Some("mock-request-1"));

        let calls = venue.get_order_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].amount, 10);
    }

    #[tokio::test]
    async fn test_mock_venue_scripted_failures() {
        let venue = MockVenue::new().with_order_failures(2);
        assert!(venue.request_order("A", "B", 1, "me").await.is_err());
        assert!(venue.request_order("A", "B", 1, "me").await.is_err());
        assert!(venue.request_order("A", "B", 1, "me").await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_venue_submit_queue() {
        let wallet = WalletManager::new_random();
        let venue = MockVenue::new()
            .with_submit_response(Err("boom".to_string()))
            .with_default_result(ExecutionResult::exact(None, 7));

        let order = RawSwapOrder::new("AQID");
        assert!(venue.sign_and_submit(&order, &wallet).await.is_err());
        let result = venue.sign_and_submit(&order, &wallet).await.unwrap();
        assert_eq!(result.output_amount, Some(7));
        assert_eq!(venue.get_submit_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_snapshot_repeats_last() {
        let source = MockSnapshotSource::new()
            .with_snapshot(Snapshot::new().with("A", 1.0))
            .with_failure("down");

        assert_eq!(source.snapshot("w").await.unwrap().get("A"), 1.0);
        assert!(source.snapshot("w").await.is_err());
        assert_eq!(source.snapshot("w").await.unwrap().get("A"), 1.0);
        assert_eq!(source.get_calls().len(), 3);
    }
}
