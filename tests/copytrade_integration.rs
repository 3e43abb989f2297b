//! Copy-Trade Integration Tests
//!
//! End-to-end flows through the orchestrator with recorded mocks:
//! 1. Holdings polling -> classification -> buy -> sell
//! 2. Log notifications -> extraction -> buy with per-token cooldown
//! 3. Failure paths that must leave the copy state retryable
//!
//! All tests are deterministic (no real network calls).

use std::sync::Arc;
use std::time::Duration;

use butters_copytrade::adapters::paper::PaperVenue;
use butters_copytrade::adapters::solana::{LogNotification, WalletManager};
use butters_copytrade::application::{CopyOutcome, CopyTradeOrchestrator, OrchestratorConfig};
use butters_copytrade::domain::{
    classify, AssetState, Direction, Snapshot, SwapExtractor, TokenTransfer, TradeEvent, TransactionRecord,
    SOL_MINT,
};
use butters_copytrade::ports::execution::{ExecutionResult, RetryPolicy};
use butters_copytrade::ports::mocks::{MockSnapshotSource, MockTransactionSource, MockVenue};

// ============================================================================
// Test Fixtures
// ============================================================================

const PARENT: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
const TOKEN_X: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

fn test_config() -> OrchestratorConfig {
    OrchestratorConfig {
        retry: RetryPolicy::new(6, Duration::ZERO),
        poll_interval: Duration::ZERO,
        confirmation_timeout: Duration::from_millis(20),
        holdings_timeout: Duration::from_millis(20),
        wait_poll_interval: Duration::from_millis(5),
        ..OrchestratorConfig::for_wallet(PARENT)
    }
}

fn orchestrator_with(venue: Arc<dyn butters_copytrade::ports::ExecutionVenue>) -> CopyTradeOrchestrator {
    CopyTradeOrchestrator::new(test_config(), venue, Arc::new(WalletManager::new_random()))
}

fn jupiter_buy_record(signature: &str, lamports_in: u64, tokens_out: u64) -> TransactionRecord {
    TransactionRecord {
        signature: signature.to_string(),
        transfers: vec![
            TokenTransfer::new(SOL_MINT, lamports_in),
            TokenTransfer::new(TOKEN_X, tokens_out),
        ],
        log_messages: vec!["Program JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4 invoke [1]".to_string()],
        failed: false,
    }
}

fn jupiter_logs() -> Vec<String> {
    vec![
        "Program JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4 invoke [1]".to_string(),
        "Program log: Instruction: Route".to_string(),
    ]
}

// ============================================================================
// Classification scenarios
// ============================================================================

#[test]
fn test_scenario_a_parent_buy_detected() {
    let prev = Snapshot::new().with(SOL_MINT, 10.0);
    let curr = Snapshot::new().with(SOL_MINT, 9.8).with(TOKEN_X, 100.0);

    let event = classify(&prev, &curr, 0.1, 0.0001).expect("buy should be detected");
    assert_eq!(event.asset, TOKEN_X);
    assert_eq!(event.direction, Direction::Acquired);
    assert!((event.base_currency_delta + 0.2).abs() < 1e-9);
}

#[test]
fn test_scenario_b_small_parent_trade_ignored() {
    let prev = Snapshot::new().with(SOL_MINT, 10.0);
    let curr = Snapshot::new().with(SOL_MINT, 9.8).with(TOKEN_X, 100.0);

    assert!(classify(&prev, &curr, 0.5, 0.0001).is_none());
}

// ============================================================================
// Copy policy scenarios
// ============================================================================

#[tokio::test]
async fn test_scenario_c_buy_once() {
    let venue = MockVenue::new().with_default_result(ExecutionResult::exact(Some("buy-sig".into()), 5_000_000));
    let mut orch = orchestrator_with(Arc::new(venue.clone()));

    let first = orch.handle_event(&TradeEvent::acquired(TOKEN_X, 100.0, -0.2)).await;
    assert!(matches!(first, CopyOutcome::Bought { raw_quantity: Some(5_000_000), .. }));
    assert_eq!(orch.tracker().get_position(TOKEN_X), Some(5_000_000));
    assert!(orch.tracker().has_copied(TOKEN_X));

    let second = orch.handle_event(&TradeEvent::acquired(TOKEN_X, 50.0, -0.1)).await;
    assert_eq!(second, CopyOutcome::SkippedAlreadyCopied { asset: TOKEN_X.to_string() });
    assert_eq!(venue.get_order_calls().len(), 1);
}

#[tokio::test]
async fn test_scenario_d_failed_sell_keeps_position() {
    let venue = MockVenue::new()
        .with_submit_response(Ok(ExecutionResult::exact(Some("buy-sig".into()), 5_000_000)))
        .with_submit_response(Err("execute failed: slippage".into()));
    let mut orch = orchestrator_with(Arc::new(venue.clone()));

    orch.handle_event(&TradeEvent::acquired(TOKEN_X, 100.0, -0.2)).await;
    let outcome = orch.handle_event(&TradeEvent::disposed(TOKEN_X, -100.0, 0.3)).await;

    assert!(matches!(outcome, CopyOutcome::SellFailed { .. }));
    assert_eq!(orch.tracker().get_position(TOKEN_X), Some(5_000_000));
    assert_eq!(orch.tracker().state(TOKEN_X), AssetState::BoughtOpen);
    assert_eq!(orch.tracker().copied_count(), 1);

    // The next sell signal tries again
    let outcome = orch.handle_event(&TradeEvent::disposed(TOKEN_X, -100.0, 0.3)).await;
    assert!(matches!(outcome, CopyOutcome::Sold { raw_quantity: 5_000_000, .. }));
    assert_eq!(orch.tracker().state(TOKEN_X), AssetState::Closed);
}

#[tokio::test]
async fn test_scenario_e_order_retries_exhausted() {
    let venue = MockVenue::new().with_failing_orders();
    let mut orch = orchestrator_with(Arc::new(venue.clone()));

    let outcome = orch.handle_event(&TradeEvent::acquired(TOKEN_X, 100.0, -0.2)).await;

    assert!(matches!(outcome, CopyOutcome::BuyFailed { .. }));
    assert_eq!(venue.get_order_calls().len(), 6);
    assert!(venue.get_submit_calls().is_empty());
    assert!(!orch.tracker().has_copied(TOKEN_X));
    assert_eq!(orch.tracker().state(TOKEN_X), AssetState::Untouched);
}

#[tokio::test]
async fn test_transient_order_failures_recover() {
    let venue = MockVenue::new().with_order_failures(3);
    let mut orch = orchestrator_with(Arc::new(venue.clone()));

    let outcome = orch.handle_event(&TradeEvent::acquired(TOKEN_X, 100.0, -0.2)).await;
    assert!(matches!(outcome, CopyOutcome::Bought { .. }));
    assert_eq!(venue.get_order_calls().len(), 4);
}

// ============================================================================
// Polling flow
// ============================================================================

#[tokio::test]
async fn test_polling_buy_then_sell_with_paper_venue() {
    let source = MockSnapshotSource::new()
        .with_snapshot(Snapshot::new().with(SOL_MINT, 10.0))
        .with_snapshot(Snapshot::new().with(SOL_MINT, 9.8).with(TOKEN_X, 100.0))
        .with_snapshot(Snapshot::new().with(SOL_MINT, 9.8).with(TOKEN_X, 100.0))
        .with_snapshot(Snapshot::new().with(SOL_MINT, 10.3));
    let venue = PaperVenue::default();
    let mut orch = orchestrator_with(Arc::new(venue.clone()));
    let mut prev = None;

    // Baseline
    assert!(orch.poll_once(&source, &mut prev).await.is_none());

    let bought = orch.poll_once(&source, &mut prev).await;
    assert!(matches!(bought, Some(CopyOutcome::Bought { raw_quantity: Some(5_000_000), .. })));

    // Unchanged holdings produce nothing
    assert!(orch.poll_once(&source, &mut prev).await.is_none());

    let sold = orch.poll_once(&source, &mut prev).await;
    assert!(matches!(sold, Some(CopyOutcome::Sold { raw_quantity: 5_000_000, .. })));

    let fills = venue.fills().await;
    assert_eq!(fills.len(), 2);
    assert_eq!(fills[0].input_mint, SOL_MINT);
    assert_eq!(fills[1].input_mint, TOKEN_X);
    assert_eq!(fills[1].input_amount, 5_000_000);
    assert_eq!(source.get_calls().len(), 4);
}

#[tokio::test]
async fn test_polling_ignores_dust_changes() {
    let source = MockSnapshotSource::new()
        .with_snapshot(Snapshot::new().with(SOL_MINT, 10.0).with(TOKEN_X, 1.0))
        .with_snapshot(Snapshot::new().with(SOL_MINT, 9.99995).with(TOKEN_X, 1.00005));
    let venue = MockVenue::new();
    let mut orch = orchestrator_with(Arc::new(venue.clone()));
    let mut prev = None;

    orch.poll_once(&source, &mut prev).await;
    assert!(orch.poll_once(&source, &mut prev).await.is_none());
    assert!(venue.get_order_calls().is_empty());
}

// ============================================================================
// Stream flow
// ============================================================================

#[tokio::test]
async fn test_stream_structured_buy() {
    let transactions = MockTransactionSource::new().with_record(jupiter_buy_record("sig-buy", 400_000_000, 1_234));
    let venue = MockVenue::new().with_default_result(ExecutionResult::exact(Some("copy".into()), 999));
    let mut orch = orchestrator_with(Arc::new(venue.clone()));

    let notification = LogNotification {
        signature: "sig-buy".to_string(),
        logs: jupiter_logs(),
    };
    let outcome = orch.process_notification(&notification, &transactions).await;

    assert!(matches!(outcome, Some(CopyOutcome::Bought { raw_quantity: Some(999), .. })));
    assert_eq!(transactions.get_calls(), vec!["sig-buy".to_string()]);
    assert_eq!(venue.get_order_calls()[0].output_mint, TOKEN_X);
}

#[tokio::test]
async fn test_stream_heuristic_skips_fetch() {
    let config = OrchestratorConfig {
        extractor: SwapExtractor::Heuristic,
        ..test_config()
    };
    let venue = MockVenue::new();
    let mut orch = CopyTradeOrchestrator::new(config, Arc::new(venue.clone()), Arc::new(WalletManager::new_random()));
    let transactions = MockTransactionSource::new();

    let notification = LogNotification {
        signature: "sig-scrape".to_string(),
        logs: vec![
            "Program log: Jupiter route".to_string(),
            format!("Program log: inputMint: {}", SOL_MINT),
            format!("Program log: outputMint: {}", TOKEN_X),
        ],
    };
    let outcome = orch.process_notification(&notification, &transactions).await;

    assert!(matches!(outcome, Some(CopyOutcome::Bought { .. })));
    assert!(transactions.get_calls().is_empty());
    assert_eq!(venue.get_order_calls()[0].output_mint, TOKEN_X);
}

#[tokio::test]
async fn test_run_stream_drains_channel() {
    let transactions = Arc::new(
        MockTransactionSource::new()
            .with_record(jupiter_buy_record("a", 400_000_000, 10))
            .with_record(jupiter_buy_record("b", 400_000_000, 10)),
    );
    let venue = MockVenue::new();
    let mut orch = orchestrator_with(Arc::new(venue.clone()));

    let (tx, rx) = tokio::sync::mpsc::channel(8);
    for signature in ["a", "b"] {
        tx.send(LogNotification {
            signature: signature.to_string(),
            logs: jupiter_logs(),
        })
        .await
        .unwrap();
    }
    drop(tx);

    // Returns once the channel is closed and drained
    orch.run_stream(rx, transactions.clone()).await;

    assert_eq!(transactions.get_calls().len(), 2);
    // Second event is inside the cooldown window
    assert_eq!(venue.get_order_calls().len(), 1);
    assert!(orch.tracker().has_copied(TOKEN_X));
}
