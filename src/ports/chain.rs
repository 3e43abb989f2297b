//! Chain-facing ports: holdings snapshots, transaction lookups and
//! signature confirmation.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Snapshot, TransactionRecord};

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC request failed: {0}")]
    RpcError(String),
    #[error("API request failed: {0}")]
    ApiError(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("Failed to parse response: {0}")]
    ParseError(String),
    #[error("Transaction failed: {0}")]
    TransactionError(String),
}

/// Confirmation state of a submitted signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Not yet seen, or seen below confirmed commitment
    Pending,
    Confirmed,
    Finalized,
    Failed(String),
}

impl SignatureStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, SignatureStatus::Pending)
    }
}

/// Point-in-time holdings of a wallet
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self, wallet: &str) -> Result<Snapshot, ChainError>;
}

/// Fetches a parsed transaction by signature
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// `Ok(None)` when the node does not (yet) know the transaction
    async fn fetch_transaction(&self, signature: &str) -> Result<Option<TransactionRecord>, ChainError>;
}

#[async_trait]
pub trait ConfirmationSource: Send + Sync {
    async fn signature_status(&self, signature: &str) -> Result<SignatureStatus, ChainError>;
}
