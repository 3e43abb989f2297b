//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, these traits abstract:
//! - Trade execution (Jupiter Ultra, quote/swap, paper)
//! - Wallet holdings snapshots
//! - Transaction lookups and signature confirmation

pub mod execution;
pub mod chain;
pub mod mocks;

pub use execution::{ExecutionError, ExecutionResult, ExecutionVenue, RawSwapOrder, RetryPolicy};
pub use chain::{ChainError, ConfirmationSource, SignatureStatus, SnapshotSource, TransactionSource};
