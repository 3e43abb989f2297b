use async_trait::async_trait;
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_client::rpc_request::RpcRequest;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use solana_transaction_status::{TransactionConfirmationStatus, UiTransactionEncoding};
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::TransactionRecord;
use crate::ports::chain::{ChainError, ConfirmationSource, SignatureStatus, TransactionSource};

/// Wrapper around Solana RPC client with async-compatible methods
#[derive(Clone)]
pub struct SolanaClient {
    client: Arc<RpcClient>,
}

impl SolanaClient {
    /// Create a new Solana RPC client at confirmed commitment
    pub fn new(rpc_url: String) -> Self {
        let client = Arc::new(RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed()));
        Self { client }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }

    /// Get SOL balance (lamports) for a public key
    pub async fn get_balance(&self, pubkey: &str) -> Result<u64, ChainError> {
        let pubkey = Pubkey::from_str(pubkey)
            .map_err(|e| ChainError::InvalidPublicKey(e.to_string()))?;

        // Spawn blocking to make sync RPC call async-compatible
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            client
                .get_balance(&pubkey)
                .map_err(|e| ChainError::RpcError(e.to_string()))
        })
        .await
        .map_err(|e| ChainError::RpcError(format!("Task join error: {}", e)))?
    }

    /// Submit a signed versioned transaction, returning its signature
    pub async fn send_versioned_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<String, ChainError> {
        let tx = transaction.clone();
        let client = Arc::clone(&self.client);

        tokio::task::spawn_blocking(move || {
            client
                .send_transaction(&tx)
                .map(|sig| sig.to_string())
                .map_err(|e| ChainError::TransactionError(e.to_string()))
        })
        .await
        .map_err(|e| ChainError::RpcError(format!("Task join error: {}", e)))?
    }

    /// Fetch a transaction as jsonParsed JSON
    ///
    /// `None` when the node answers `null`, i.e. the transaction is not visible yet.
    pub async fn get_transaction_json(&self, signature_str: &str) -> Result<Option<serde_json::Value>, ChainError> {
        let signature = Signature::from_str(signature_str)
            .map_err(|e| ChainError::InvalidSignature(e.to_string()))?;

        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::JsonParsed),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };
        let params = serde_json::json!([signature.to_string(), config]);

        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            client
                .send::<Option<serde_json::Value>>(RpcRequest::GetTransaction, params)
                .map_err(|e| ChainError::RpcError(e.to_string()))
        })
        .await
        .map_err(|e| ChainError::RpcError(format!("Task join error: {}", e)))?
    }
}

fn record_from_result(signature: &str, result: Option<serde_json::Value>) -> Option<TransactionRecord> {
    result
        .filter(|json| !json.is_null())
        .map(|json| TransactionRecord::from_rpc_json(signature, &json))
}

#[async_trait]
impl TransactionSource for SolanaClient {
    async fn fetch_transaction(&self, signature: &str) -> Result<Option<TransactionRecord>, ChainError> {
        let result = self.get_transaction_json(signature).await?;
        Ok(record_from_result(signature, result))
    }
}

#[async_trait]
impl ConfirmationSource for SolanaClient {
    async fn signature_status(&self, signature_str: &str) -> Result<SignatureStatus, ChainError> {
        let signature = Signature::from_str(signature_str)
            .map_err(|e| ChainError::InvalidSignature(e.to_string()))?;

        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            let response = client
                .get_signature_statuses(&[signature])
                .map_err(|e| ChainError::RpcError(e.to_string()))?;

            let status = match response.value.into_iter().next().flatten() {
                None => SignatureStatus::Pending,
                Some(status) => match (status.err, status.confirmation_status) {
                    (Some(err), _) => SignatureStatus::Failed(err.to_string()),
                    (None, Some(TransactionConfirmationStatus::Finalized)) => SignatureStatus::Finalized,
                    (None, Some(TransactionConfirmationStatus::Confirmed)) => SignatureStatus::Confirmed,
                    (None, _) => SignatureStatus::Pending,
                },
            };
            Ok(status)
        })
        .await
        .map_err(|e| ChainError::RpcError(format!("Task join error: {}", e)))?
    }
}
