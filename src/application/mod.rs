//! Application Layer - Use Cases and Orchestration
//!
//! Wires the domain policy to the ports: one `CopyTradeOrchestrator` per
//! parent wallet, fed either by holdings polling or by the log stream.

pub mod orchestrator;

pub use orchestrator::{
    CopyError, CopyOutcome, CopyTradeOrchestrator, OrchestratorConfig, OrchestratorStatus, StopHandle,
};
