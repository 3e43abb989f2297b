//! Copy-Trade Orchestrator
//!
//! One orchestrator per parent wallet. It turns parent trade events into
//! follower buys and sells, owns the EverCopied set and open positions, and
//! drives either the holdings polling loop or the log-stream loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::adapters::jupiter::TokenDirectory;
use crate::adapters::solana::{LogNotification, WalletManager};
use crate::domain::{
    looks_like_swap, ClassifierConfig, DeltaClassifier, Direction, PositionError, PositionTracker, Snapshot,
    SwapExtractor, TradeEvent, TransactionRecord, SOL_MINT,
};
use crate::ports::chain::{ChainError, ConfirmationSource, SignatureStatus, SnapshotSource, TransactionSource};
use crate::ports::execution::{ExecutionError, ExecutionResult, ExecutionVenue, RetryPolicy};

#[derive(Debug, Error)]
pub enum CopyError {
    #[error("Order request failed: {0}")]
    Order(ExecutionError),
    #[error("Submission failed: {0}")]
    Submit(ExecutionError),
    #[error("Position error: {0}")]
    Position(#[from] PositionError),
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),
}

/// Tunables for one monitored wallet
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub parent_wallet: String,
    /// SOL spent per copy-buy, in lamports
    pub copy_amount_lamports: u64,
    /// Minimum |SOL change| of the parent for a trade to count
    pub min_parent_trade_sol: f64,
    /// Per-asset balance changes below this are noise
    pub change_threshold: f64,
    pub retry: RetryPolicy,
    pub poll_interval: Duration,
    /// Minimum spacing between stream events for the same asset and direction
    pub stream_cooldown: Duration,
    /// Upper bound on waiting for buy confirmation
    pub confirmation_timeout: Duration,
    /// Upper bound on waiting for the bought asset to show up in holdings
    pub holdings_timeout: Duration,
    /// Poll spacing inside the two waits above
    pub wait_poll_interval: Duration,
    pub extractor: SwapExtractor,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            parent_wallet: String::new(),
            copy_amount_lamports: 5_000_000,
            min_parent_trade_sol: 0.1,
            change_threshold: 0.0001,
            retry: RetryPolicy::default(),
            poll_interval: Duration::from_secs(1),
            stream_cooldown: Duration::from_secs(2),
            confirmation_timeout: Duration::from_secs(40),
            holdings_timeout: Duration::from_secs(40),
            wait_poll_interval: Duration::from_secs(2),
            extractor: SwapExtractor::Structured,
        }
    }
}

impl OrchestratorConfig {
    pub fn for_wallet(parent_wallet: impl Into<String>) -> Self {
        Self {
            parent_wallet: parent_wallet.into(),
            ..Default::default()
        }
    }
}

/// What happened to one trade event
#[derive(Debug, Clone, PartialEq)]
pub enum CopyOutcome {
    Bought {
        asset: String,
        signature: Option<String>,
        /// `None` when the venue reported no output size
        raw_quantity: Option<u64>,
        approximate: bool,
    },
    BuyFailed { asset: String, reason: String },
    SkippedAlreadyCopied { asset: String },
    Sold {
        asset: String,
        signature: Option<String>,
        raw_quantity: u64,
    },
    SellFailed { asset: String, reason: String },
    NoPosition { asset: String },
    CoolingDown { asset: String },
}

/// Shared stop flag; cloning hands out another handle to the same flag
#[derive(Debug, Clone)]
pub struct StopHandle {
    is_running: Arc<RwLock<bool>>,
}

impl Default for StopHandle {
    fn default() -> Self {
        Self {
            is_running: Arc::new(RwLock::new(true)),
        }
    }
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn stop(&self) {
        *self.is_running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }
}

/// Status snapshot of the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorStatus {
    pub parent_wallet: String,
    pub is_running: bool,
    pub open_positions: usize,
    pub copied_assets: usize,
}

pub struct CopyTradeOrchestrator {
    config: OrchestratorConfig,
    classifier: DeltaClassifier,
    venue: Arc<dyn ExecutionVenue>,
    signer: Arc<WalletManager>,
    tracker: PositionTracker,
    confirmations: Option<Arc<dyn ConfirmationSource>>,
    follower_holdings: Option<Arc<dyn SnapshotSource>>,
    tokens: Option<TokenDirectory>,
    /// Last accepted stream event per (asset, direction)
    cooldowns: HashMap<(String, Direction), Instant>,
    stop: StopHandle,
}

impl CopyTradeOrchestrator {
    pub fn new(config: OrchestratorConfig, venue: Arc<dyn ExecutionVenue>, signer: Arc<WalletManager>) -> Self {
        let classifier = DeltaClassifier::new(ClassifierConfig {
            base_asset: SOL_MINT.to_string(),
            min_base_delta: config.min_parent_trade_sol,
            change_threshold: config.change_threshold,
        });

        Self {
            config,
            classifier,
            venue,
            signer,
            tracker: PositionTracker::new(),
            confirmations: None,
            follower_holdings: None,
            tokens: None,
            cooldowns: HashMap::new(),
            stop: StopHandle::new(),
        }
    }

    /// Wait for on-chain confirmation after each buy
    pub fn with_confirmation_source(mut self, source: Arc<dyn ConfirmationSource>) -> Self {
        self.confirmations = Some(source);
        self
    }

    /// Wait for bought assets to appear in the follower's holdings
    pub fn with_follower_holdings(mut self, source: Arc<dyn SnapshotSource>) -> Self {
        self.follower_holdings = Some(source);
        self
    }

    pub fn with_token_directory(mut self, tokens: TokenDirectory) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Share a stop flag with other monitors
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    /// Stream cooldown entries still tracked
    pub fn cooldown_count(&self) -> usize {
        self.cooldowns.len()
    }

    pub async fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            parent_wallet: self.config.parent_wallet.clone(),
            is_running: self.stop.is_running().await,
            open_positions: self.tracker.open_count(),
            copied_assets: self.tracker.copied_count(),
        }
    }

    /// Apply the buy/sell policy to one parent trade
    pub async fn handle_event(&mut self, event: &TradeEvent) -> CopyOutcome {
        let asset = event.asset.clone();
        info!(
            "[{}] Parent {} {} (magnitude {:.6}, SOL delta {:+.6})",
            short(&self.config.parent_wallet),
            event.direction,
            asset,
            event.magnitude,
            event.base_currency_delta
        );

        match event.direction {
            Direction::Acquired => {
                if self.tracker.has_copied(&asset) {
                    info!("Already copied {}, skipping buy", asset);
                    return CopyOutcome::SkippedAlreadyCopied { asset };
                }
                self.copy_buy(&asset).await
            }
            Direction::Disposed => match self.tracker.get_position(&asset) {
                Some(quantity) => self.copy_sell(&asset, quantity).await,
                None => {
                    debug!("No open position in {}, ignoring sell", asset);
                    CopyOutcome::NoPosition { asset }
                }
            },
        }
    }

    async fn execute_swap(&self, input: &str, output: &str, amount: u64) -> Result<ExecutionResult, CopyError> {
        let taker = self.signer.public_key();
        let order = self
            .venue
            .request_order_with_retry(input, output, amount, &taker, &self.config.retry)
            .await
            .map_err(CopyError::Order)?;

        self.venue
            .sign_and_submit(&order, &self.signer)
            .await
            .map_err(CopyError::Submit)
    }

    async fn copy_buy(&mut self, asset: &str) -> CopyOutcome {
        info!(
            "Copy BUY {} for {} lamports via {}",
            asset,
            self.config.copy_amount_lamports,
            self.venue.name()
        );

        let result = match self
            .execute_swap(SOL_MINT, asset, self.config.copy_amount_lamports)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                error!("Copy BUY {} failed: {}", asset, e);
                return CopyOutcome::BuyFailed {
                    asset: asset.to_string(),
                    reason: e.to_string(),
                };
            }
        };

        self.tracker.record_copied_asset(asset);

        let raw_quantity = match result.output_amount {
            Some(quantity) if quantity > 0 => {
                match self.tracker.open_position(asset, quantity, result.approximate) {
                    Ok(_) => Some(quantity),
                    Err(e) => {
                        error!("Could not open position for {}: {}", asset, e);
                        None
                    }
                }
            }
            _ => {
                warn!("Buy of {} reported no output amount, no position opened", asset);
                None
            }
        };

        if let Some(ref signature) = result.signature {
            self.wait_for_confirmation(signature).await;
        }
        self.wait_for_holdings(asset).await;

        info!(
            "Copy BUY {} done: qty={:?}{} sig={}",
            asset,
            raw_quantity,
            if result.approximate { " (approx)" } else { "" },
            result.signature.as_deref().unwrap_or("-")
        );

        CopyOutcome::Bought {
            asset: asset.to_string(),
            signature: result.signature,
            raw_quantity,
            approximate: result.approximate,
        }
    }

    async fn copy_sell(&mut self, asset: &str, quantity: u64) -> CopyOutcome {
        info!("Copy SELL {} raw units of {} via {}", quantity, asset, self.venue.name());

        let result = match self.execute_swap(asset, SOL_MINT, quantity).await {
            Ok(result) => result,
            Err(e) => {
                error!("Copy SELL {} failed, position kept open: {}", asset, e);
                return CopyOutcome::SellFailed {
                    asset: asset.to_string(),
                    reason: e.to_string(),
                };
            }
        };

        if let Err(e) = self.tracker.close_position(asset) {
            warn!("Sold {} but position was already gone: {}", asset, e);
        }

        info!(
            "Copy SELL {} done: sig={}",
            asset,
            result.signature.as_deref().unwrap_or("-")
        );

        CopyOutcome::Sold {
            asset: asset.to_string(),
            signature: result.signature,
            raw_quantity: quantity,
        }
    }

    /// Bounded wait for the execution signature to settle. Never fails the trade.
    async fn wait_for_confirmation(&self, signature: &str) {
        let Some(source) = self.confirmations.as_ref() else {
            return;
        };

        let poll = self.config.wait_poll_interval;
        let waited = tokio::time::timeout(self.config.confirmation_timeout, async {
            loop {
                match source.signature_status(signature).await {
                    Ok(status) if status.is_settled() => return status,
                    Ok(_) => {}
                    Err(e) => debug!("Status check for {} failed: {}", signature, e),
                }
                tokio::time::sleep(poll).await;
            }
        })
        .await;

        match waited {
            Ok(SignatureStatus::Failed(err)) => warn!("Transaction {} failed on chain: {}", signature, err),
            Ok(status) => info!("Transaction {} {:?}", signature, status),
            Err(_) => warn!(
                "Confirmation of {} not seen within {:?}, continuing",
                signature, self.config.confirmation_timeout
            ),
        }
    }

    /// Bounded wait for the follower's holdings to show `asset`
    async fn wait_for_holdings(&self, asset: &str) {
        let Some(source) = self.follower_holdings.as_ref() else {
            return;
        };

        let follower = self.signer.public_key();
        let poll = self.config.wait_poll_interval;
        let waited = tokio::time::timeout(self.config.holdings_timeout, async {
            loop {
                match source.snapshot(&follower).await {
                    Ok(snapshot) if snapshot.get(asset) > 0.0 => return snapshot.get(asset),
                    Ok(_) => {}
                    Err(e) => debug!("Follower holdings fetch failed: {}", e),
                }
                tokio::time::sleep(poll).await;
            }
        })
        .await;

        match waited {
            Ok(amount) => info!("Follower now holds {} of {}", amount, asset),
            Err(_) => warn!(
                "{} not visible in follower holdings within {:?}, continuing",
                asset, self.config.holdings_timeout
            ),
        }
    }

    /// One polling iteration. `prev` is the last good snapshot; a failed
    /// fetch leaves it untouched. The first good fetch only sets the baseline.
    pub async fn poll_once(&mut self, source: &dyn SnapshotSource, prev: &mut Option<Snapshot>) -> Option<CopyOutcome> {
        let current = match source.snapshot(&self.config.parent_wallet).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("[{}] Holdings fetch failed: {}", short(&self.config.parent_wallet), e);
                return None;
            }
        };

        let Some(previous) = prev.replace(current.clone()) else {
            info!(
                "[{}] Baseline snapshot with {} assets",
                short(&self.config.parent_wallet),
                current.len()
            );
            return None;
        };

        let event = self.classifier.classify(&previous, &current)?;
        Some(self.handle_event(&event).await)
    }

    /// Holdings polling loop, runs until stopped
    pub async fn run_polling(&mut self, source: Arc<dyn SnapshotSource>) {
        info!(
            "Monitoring {} by polling every {:?} (venue: {})",
            self.config.parent_wallet,
            self.config.poll_interval,
            self.venue.name()
        );

        let mut prev: Option<Snapshot> = None;
        while self.stop.is_running().await {
            self.poll_once(source.as_ref(), &mut prev).await;
            tokio::time::sleep(self.config.poll_interval).await;
        }

        info!("Monitor for {} stopped", self.config.parent_wallet);
    }

    /// Handle one log notification from the stream
    pub async fn process_notification(
        &mut self,
        notification: &LogNotification,
        transactions: &dyn TransactionSource,
    ) -> Option<CopyOutcome> {
        if !looks_like_swap(&notification.logs) {
            debug!("{} has no swap hints, skipping", notification.signature);
            return None;
        }

        let record = match self.config.extractor {
            SwapExtractor::Heuristic => {
                TransactionRecord::from_logs(notification.signature.clone(), notification.logs.clone())
            }
            SwapExtractor::Structured => match transactions.fetch_transaction(&notification.signature).await {
                Ok(Some(record)) => record,
                Ok(None) => {
                    debug!("Transaction {} not available yet", notification.signature);
                    return None;
                }
                Err(e) => {
                    warn!("Fetching {} failed: {}", notification.signature, e);
                    return None;
                }
            },
        };

        let swap = self.config.extractor.extract(&record)?;
        self.log_swap(&notification.signature, &swap).await;

        let event = swap
            .to_trade_event(self.config.min_parent_trade_sol)?
            .with_signature(notification.signature.clone());

        let now = Instant::now();
        let window = self.config.stream_cooldown;
        let key = (event.asset.clone(), event.direction);
        if let Some(last) = self.cooldowns.get(&key) {
            if now.duration_since(*last) < window {
                debug!("{} {} still cooling down", event.direction, event.asset);
                return Some(CopyOutcome::CoolingDown { asset: event.asset });
            }
        }
        // Only repeats in the same direction are suppressed; expired entries go
        self.cooldowns.retain(|_, last| now.duration_since(*last) < window);
        self.cooldowns.insert(key, now);

        Some(self.handle_event(&event).await)
    }

    async fn log_swap(&self, signature: &str, swap: &crate::domain::ExtractedSwap) {
        let Some(tokens) = self.tokens.as_ref() else {
            debug!("Swap {}: {} -> {}", signature, swap.input_asset, swap.output_asset);
            return;
        };

        let input = tokens.lookup(&swap.input_asset).await;
        let output = tokens.lookup(&swap.output_asset).await;
        let fmt_amount = |raw: Option<u64>, info: &crate::adapters::jupiter::TokenInfo| match raw {
            Some(raw) => format!("{:.6}", info.ui_amount(raw)),
            None => "?".to_string(),
        };

        info!(
            "Swap {}: {} {} ({}) -> {} {} ({}){}",
            signature,
            fmt_amount(swap.input_raw_amount, &input),
            input.symbol,
            input.name,
            fmt_amount(swap.output_raw_amount, &output),
            output.symbol,
            output.name,
            if swap.best_effort { " [log scrape]" } else { "" }
        );
    }

    /// Event-driven loop over a log notification channel, runs until stopped
    /// or the channel closes
    pub async fn run_stream(
        &mut self,
        mut notifications: mpsc::Receiver<LogNotification>,
        transactions: Arc<dyn TransactionSource>,
    ) {
        info!(
            "Monitoring {} via log stream (extractor: {:?}, venue: {})",
            self.config.parent_wallet,
            self.config.extractor,
            self.venue.name()
        );

        while self.stop.is_running().await {
            tokio::select! {
                received = notifications.recv() => {
                    match received {
                        Some(notification) => {
                            self.process_notification(&notification, transactions.as_ref()).await;
                        }
                        None => {
                            warn!("Log stream closed for {}", self.config.parent_wallet);
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep(Duration::from_secs(1)) => {
                    // Re-check the stop flag
                }
            }
        }

        info!("Stream monitor for {} stopped", self.config.parent_wallet);
    }
}

fn short(address: &str) -> &str {
    address.get(..6).unwrap_or(address)
}
