//! Stakekeeper — Entry Point
//!
//! Paper-trading bankroll manager for prediction-market bets. One
//! binary covers both surfaces:
//! - `serve` runs the small HTTP API until SIGINT/SIGTERM
//! - every other subcommand is a one-shot CLI operation against the
//!   same ledger document
//!
//! Wiring sequence:
//! 1. Load config.toml + validate (defaults if absent)
//! 2. Init tracing (JSON structured logging for serve, compact for CLI)
//! 3. Create FileLedgerRepository (atomic JSON document + JSONL journal)
//! 4. Build the configured sizing strategy
//! 5. Run the requested operation, or spawn the API server and wait
//!    for SIGINT → graceful shutdown

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::signal;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

mod adapters;
mod config;
mod domain;
mod ports;
mod usecases;

use adapters::http::{self, ApiState};
use adapters::metrics::MetricsRegistry;
use adapters::persistence::FileLedgerRepository;
use config::AppConfig;
use domain::ledger::BetResult;
use ports::repository::LedgerRepository;
use usecases::bankroll::BankrollService;

#[derive(Parser)]
#[command(name = "stakekeeper")]
#[command(about = "Paper-trading bankroll manager for prediction-market bets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve,
    /// Compute a stake plan for the next bet
    Plan {
        /// Decimal odds; the configured default is used when omitted
        #[arg(long)]
        odds: Option<Decimal>,
        /// Compute without storing a pending plan
        #[arg(long)]
        preview: bool,
    },
    /// Apply a realized result (w or l)
    Result {
        /// W or L, case-insensitive
        result: String,
        #[arg(long)]
        odds: Option<Decimal>,
        #[arg(long)]
        stake: Option<Decimal>,
    },
    /// Apply a realized result against the pending plan
    Confirm {
        /// W or L, case-insensitive
        result: String,
    },
    /// Pause staking until an explicit resume
    Pause {
        #[arg(long)]
        reason: Option<String>,
    },
    /// Resume staking
    Resume,
    /// Set the acceptable odds band
    OddsBand { min: Decimal, max: Decimal },
    /// Show the ledger status
    Status,
    /// Show the performance report
    Report,
    /// Replace the ledger with a fresh default document
    Reset {
        /// Confirm the destructive reset
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── 1. Load configuration ───────────────────────────────
    let config = config::loader::load_config(&cli.config)
        .context("Failed to load configuration")?;

    // ── 2. Initialize logging ───────────────────────────────
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.bot.log_level));

    let serving = matches!(cli.command, Commands::Serve);
    if serving {
        // Structured JSON logs for the long-running server
        tracing_subscriber::fmt().with_env_filter(env_filter).json().init();
    } else {
        // Compact human-readable logs on stderr for one-shot commands
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    // ── 3. Wire the repository and service ──────────────────
    let repo: Arc<dyn LedgerRepository> = Arc::new(
        FileLedgerRepository::new(&config.persistence.data_dir, config.staking_config())
            .await
            .context("Failed to initialize ledger storage")?,
    );
    let service = BankrollService::new(Arc::clone(&repo), config.build_sizer());

    match cli.command {
        Commands::Serve => run_server(config, repo, service).await,
        other => run_command(other, &service).await,
    }
}

/// Run the HTTP API until SIGINT/SIGTERM.
async fn run_server(
    config: AppConfig,
    repo: Arc<dyn LedgerRepository>,
    service: BankrollService,
) -> Result<()> {
    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        strategy = service.strategy(),
        address = %config.server.bind_address,
        "Starting stakekeeper API"
    );

    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    let metrics = Arc::new(MetricsRegistry::new().context("Failed to register metrics")?);
    let state = Arc::new(ApiState {
        service: Mutex::new(service),
        repo,
        metrics,
    });

    let server_shutdown = shutdown_tx.subscribe();
    let bind_address = config.server.bind_address.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = http::serve(state, &bind_address, server_shutdown).await {
            tracing::error!(error = %e, "API server failed");
        }
    });

    // ── Wait for SIGINT ─────────────────────────────────────
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
        }
    }

    let _ = shutdown_tx.send(());
    let _ = tokio::time::timeout(std::time::Duration::from_secs(10), server_handle).await;

    info!("Shutdown complete");
    Ok(())
}

/// Execute a one-shot CLI operation and print its JSON outcome.
async fn run_command(command: Commands, service: &BankrollService) -> Result<()> {
    match command {
        Commands::Serve => unreachable!("handled by run_server"),
        Commands::Plan { odds, preview } => {
            if preview {
                print_json(&service.preview_stake(odds).await)?;
            } else {
                let committed = service.plan_stake(odds).await;
                warn_unpersisted(committed.persisted);
                print_json(&committed.value)?;
            }
        }
        Commands::Result { result, odds, stake } => {
            let result = BetResult::parse(&result)?;
            let committed = service.apply_result(result, odds, stake).await;
            warn_unpersisted(committed.persisted);
            print_json(&committed.value.entry)?;
        }
        Commands::Confirm { result } => {
            let result = BetResult::parse(&result)?;
            let committed = service.confirm_pending(result).await?;
            warn_unpersisted(committed.persisted);
            print_json(&committed.value.entry)?;
        }
        Commands::Pause { reason } => {
            let committed = service.pause(reason).await;
            warn_unpersisted(committed.persisted);
            print_json(&committed.value)?;
        }
        Commands::Resume => {
            let committed = service.resume().await;
            warn_unpersisted(committed.persisted);
            print_json(&committed.value)?;
        }
        Commands::OddsBand { min, max } => {
            let committed = service.set_odds_band(min, max).await?;
            warn_unpersisted(committed.persisted);
            print_json(&committed.value)?;
        }
        Commands::Status => {
            let (status, _) = service.status().await;
            print_json(&status)?;
        }
        Commands::Report => {
            print_json(&service.report().await)?;
        }
        Commands::Reset { yes } => {
            anyhow::ensure!(yes, "refusing to reset the ledger without --yes");
            let committed = service.reset().await;
            warn_unpersisted(committed.persisted);
            print_json(&committed.value)?;
        }
    }
    Ok(())
}

fn warn_unpersisted(persisted: bool) {
    if !persisted {
        warn!("Change was applied in memory but could not be persisted");
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
