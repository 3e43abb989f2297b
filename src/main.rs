//! Butters Copytrade - Solana/Jupiter copy-trading bot
//!
//! Mirrors the SOL-funded token buys and sells of one or more parent wallets
//! on a follower wallet.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use butters_copytrade::adapters::cli::{CliApp, Command, HoldingsCmd, RunCmd, StatusCmd, StreamCmd};
use butters_copytrade::adapters::jupiter::{JupiterClient, JupiterConfig, QuoteSwapVenue, TokenDirectory, UltraVenue};
use butters_copytrade::adapters::paper::PaperVenue;
use butters_copytrade::adapters::solana::{LogsSubscriber, SolanaClient, WalletManager};
use butters_copytrade::application::{CopyTradeOrchestrator, StopHandle};
use butters_copytrade::config::{load_config, validate_wallet_address, Config, VenueKind};
use butters_copytrade::domain::{SwapExtractor, LAMPORTS_PER_SOL};
use butters_copytrade::ports::{ExecutionVenue, SnapshotSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();

    match app.command {
        Command::Run(cmd) => run_command(cmd, app.verbose, app.debug).await,
        Command::Stream(cmd) => stream_command(cmd, app.verbose, app.debug).await,
        Command::Holdings(cmd) => holdings_command(cmd, app.verbose, app.debug).await,
        Command::Status(cmd) => status_command(cmd, app.verbose, app.debug).await,
    }
}

/// Flags win; otherwise RUST_LOG, then the configured level
fn init_logging(verbose: bool, debug: bool, configured: Option<&str>) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else {
        EnvFilter::try_new(configured.unwrap_or("warn")).context("Invalid [logging].level")?
    };

    fmt().with_env_filter(filter).init();
    Ok(())
}

/// Everything one monitor needs, shared across parent wallets
struct Runtime {
    config: Config,
    jupiter: JupiterClient,
    solana: SolanaClient,
    wallet: Arc<WalletManager>,
    venue: Arc<dyn ExecutionVenue>,
    paper: bool,
    parents: Vec<String>,
}

/// `--parent` replaces the configured wallets and gets the same address check
fn resolve_parents(config: &Config, parent: Option<String>) -> Result<Vec<String>> {
    match parent {
        Some(parent) => {
            validate_wallet_address(&parent).context("Invalid --parent wallet")?;
            Ok(vec![parent])
        }
        None => Ok(config.parent.wallets.clone()),
    }
}

fn build_runtime(config: Config, paper: bool, venue: Option<VenueKind>, parent: Option<String>) -> Result<Runtime> {
    let parents = resolve_parents(&config, parent)?;
    let jupiter = JupiterClient::with_config(config.jupiter.client_config())
        .context("Failed to create Jupiter client")?;
    let solana = SolanaClient::new(config.solana.get_rpc_url());
    let wallet = Arc::new(load_follower_wallet(&config, paper)?);

    let venue: Arc<dyn ExecutionVenue> = if paper {
        tracing::warn!("PAPER TRADING MODE - no real transactions");
        Arc::new(PaperVenue::default())
    } else {
        match venue.unwrap_or(config.copy.venue) {
            VenueKind::Ultra => Arc::new(UltraVenue::new(jupiter.clone())),
            VenueKind::QuoteSwap => Arc::new(QuoteSwapVenue::new(jupiter.clone(), solana.clone())),
        }
    };

    tracing::info!(
        "Follower {} copying {} parent wallet(s) via {}",
        wallet.public_key(),
        parents.len(),
        venue.name()
    );

    Ok(Runtime {
        config,
        jupiter,
        solana,
        wallet,
        venue,
        paper,
        parents,
    })
}

impl Runtime {
    fn orchestrator(&self, parent: &str, stop: &StopHandle) -> CopyTradeOrchestrator {
        let mut orchestrator = CopyTradeOrchestrator::new(
            self.config.orchestrator_config(parent),
            Arc::clone(&self.venue),
            Arc::clone(&self.wallet),
        )
        .with_stop_handle(stop.clone());

        // Paper fills never land on chain
        if !self.paper {
            if self.config.copy.wait_for_confirmation {
                orchestrator = orchestrator.with_confirmation_source(Arc::new(self.solana.clone()));
            }
            if self.config.copy.wait_for_holdings {
                orchestrator = orchestrator.with_follower_holdings(Arc::new(self.jupiter.clone()));
            }
        }
        orchestrator
    }
}

/// Ctrl+C flips the shared stop flag seen by every monitor
fn install_shutdown(stop: &StopHandle) {
    let stop = stop.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        stop.stop().await;
    });
}

async fn run_command(cmd: RunCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    init_logging(verbose, debug, Some(&config.logging.level))?;
    tracing::info!("Starting Butters copytrade (polling)...");

    let runtime = build_runtime(config, cmd.paper, cmd.venue, cmd.parent)?;
    let stop = StopHandle::new();
    install_shutdown(&stop);

    let mut tasks = Vec::new();
    for parent in &runtime.parents {
        let mut orchestrator = runtime.orchestrator(parent, &stop);
        let source: Arc<dyn SnapshotSource> = Arc::new(runtime.jupiter.clone());
        tasks.push(tokio::spawn(async move {
            orchestrator.run_polling(source).await;
        }));
    }

    for task in tasks {
        if let Err(e) = task.await {
            tracing::error!("Monitor task failed: {}", e);
        }
    }

    tracing::info!("Butters copytrade stopped");
    Ok(())
}

async fn stream_command(cmd: StreamCmd, verbose: bool, debug: bool) -> Result<()> {
    let mut config = load_config(&cmd.config).context("Failed to load configuration")?;
    init_logging(verbose, debug, Some(&config.logging.level))?;
    tracing::info!("Starting Butters copytrade (log stream)...");

    if cmd.heuristic {
        config.stream.extractor = SwapExtractor::Heuristic;
    }
    let ws_url = config.solana.get_ws_url();
    let commitment = config.solana.commitment.clone();
    let buffer = config.stream.buffer;

    let runtime = build_runtime(config, cmd.paper, cmd.venue, cmd.parent)?;
    let tokens = TokenDirectory::new(runtime.jupiter.clone());
    let stop = StopHandle::new();
    install_shutdown(&stop);

    let mut tasks = Vec::new();
    for parent in &runtime.parents {
        let mut orchestrator = runtime
            .orchestrator(parent, &stop)
            .with_token_directory(tokens.clone());
        let (listener, notifications) = LogsSubscriber::new(ws_url.clone(), parent.clone())
            .with_commitment(commitment.clone())
            .spawn(buffer);
        let transactions = Arc::new(runtime.solana.clone());

        tasks.push(tokio::spawn(async move {
            orchestrator.run_stream(notifications, transactions).await;
            listener.abort();
        }));
    }

    for task in tasks {
        if let Err(e) = task.await {
            tracing::error!("Monitor task failed: {}", e);
        }
    }

    tracing::info!("Butters copytrade stopped");
    Ok(())
}

async fn holdings_command(cmd: HoldingsCmd, verbose: bool, debug: bool) -> Result<()> {
    let jupiter_config = match cmd.config {
        Some(ref path) => {
            let config = load_config(path).context("Failed to load configuration")?;
            init_logging(verbose, debug, Some(&config.logging.level))?;
            config.jupiter.client_config()
        }
        None => {
            init_logging(verbose, debug, None)?;
            JupiterConfig::default()
        }
    };

    let jupiter = JupiterClient::with_config(jupiter_config).context("Failed to create Jupiter client")?;
    let snapshot = jupiter
        .snapshot(&cmd.wallet)
        .await
        .context("Failed to fetch holdings")?;
    let tokens = TokenDirectory::new(jupiter);

    let mut rows: Vec<_> = snapshot.iter().map(|(mint, amount)| (mint.clone(), *amount)).collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    println!("Wallet: {}", cmd.wallet);
    for (mint, amount) in rows {
        let info = tokens.lookup(&mint).await;
        println!("  {:<8} {:>20.6}  {}", info.symbol, amount, mint);
    }

    Ok(())
}

async fn status_command(cmd: StatusCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    init_logging(verbose, debug, Some(&config.logging.level))?;

    let solana = SolanaClient::new(config.solana.get_rpc_url());
    let wallet = load_follower_wallet(&config, false)?;

    let balance = solana
        .get_balance(&wallet.public_key())
        .await
        .context("Failed to get balance")?;

    println!("Follower: {}", wallet.public_key());
    println!(
        "Balance: {} lamports ({:.4} SOL)",
        balance,
        balance as f64 / LAMPORTS_PER_SOL
    );
    println!("Parents: {}", config.parent.wallets.join(", "));
    println!(
        "Copy size: {} lamports, min parent trade {} SOL",
        config.copy.amount_lamports, config.copy.min_parent_trade_sol
    );

    Ok(())
}

/// FOLLOWER_PRIVATE_KEY wins over the keypair file. Paper mode falls back to a
/// throwaway wallet when neither is usable.
fn load_follower_wallet(config: &Config, is_paper_mode: bool) -> Result<WalletManager> {
    if let Some(secret) = config.solana.get_private_key() {
        return WalletManager::from_base58(&secret)
            .map_err(|e| anyhow::anyhow!("FOLLOWER_PRIVATE_KEY is not a valid base58 keypair: {}", e));
    }

    // Expand keypair path (handles ~ for home directory)
    let keypair_path = shellexpand::tilde(&config.solana.get_keypair_path()).to_string();

    match load_wallet_with_context(&keypair_path, is_paper_mode) {
        Ok(wallet) => Ok(wallet),
        Err(_) if is_paper_mode => {
            tracing::warn!("Wallet not found at '{}' - using random wallet for paper trading", keypair_path);
            Ok(WalletManager::new_random())
        }
        Err(e) => Err(e),
    }
}

/// Load wallet with helpful error messages
fn load_wallet_with_context(keypair_path: &str, is_paper_mode: bool) -> Result<WalletManager> {
    let path = Path::new(keypair_path);

    // Check if file exists first for a clearer error message
    if !path.exists() {
        let mode_hint = if is_paper_mode {
            "In paper mode, a random wallet will be used instead."
        } else {
            "A follower wallet is required for live copy trading."
        };

        bail!(
            "Wallet file not found: {}\n\n\
             {}\n\n\
             To create a new wallet, run:\n  \
             solana-keygen new --outfile {}\n\n\
             Or set FOLLOWER_PRIVATE_KEY, or update 'keypair_path' in your config",
            keypair_path,
            mode_hint,
            keypair_path
        );
    }

    WalletManager::from_file(keypair_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load wallet from '{}': {}\n\n\
             The file exists but may be corrupted or in the wrong format.\n\
             Expected format: JSON array of bytes (e.g., [1,2,3,...])",
            keypair_path,
            e
        )
    })
}
