//! Ledger Store - Atomic JSON Document Persistence
//!
//! Saves the bankroll document to `ledger.json` using atomic writes
//! (write to tmp file, then rename). This guarantees crash safety
//! and prevents partial writes from corrupting state.
//!
//! Loads never fail the caller: a missing file materializes a fresh
//! default ledger, and a corrupt file is set aside as
//! `ledger.json.corrupt` and replaced by defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::domain::ledger::{LedgerState, StakingConfig};
use crate::ports::repository::{LoadedLedger, RecoveryKind, SaveOutcome};

/// Atomic JSON store for the single ledger document.
///
/// State is written to a temporary file first, then atomically
/// renamed to `ledger.json`. The file is always either the old or
/// new version, never a partial write.
pub struct LedgerStore {
    /// Path to ledger.json.
    state_path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
    /// Where a corrupt document is preserved for inspection.
    corrupt_path: PathBuf,
    /// Seed configuration for materializing defaults.
    seed: StakingConfig,
}

impl LedgerStore {
    /// Create a new store in the given data directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub async fn new(data_dir: &str, seed: StakingConfig) -> Result<Self> {
        let dir = Path::new(data_dir);
        fs::create_dir_all(dir)
            .await
            .context("Failed to create data directory")?;

        Ok(Self {
            state_path: dir.join("ledger.json"),
            tmp_path: dir.join("ledger.json.tmp"),
            corrupt_path: dir.join("ledger.json.corrupt"),
            seed,
        })
    }

    /// Load the persisted document, recovering with defaults if it is
    /// absent or unparseable.
    #[instrument(skip(self))]
    pub async fn load(&self) -> LoadedLedger {
        if !self.state_path.exists() {
            info!("No ledger file found, materializing defaults");
            return LoadedLedger {
                ledger: LedgerState::new(self.seed.clone()),
                recovery: RecoveryKind::Fresh,
            };
        }

        let raw = match fs::read_to_string(&self.state_path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Ledger file unreadable, recovering with defaults");
                return LoadedLedger {
                    ledger: LedgerState::new(self.seed.clone()),
                    recovery: RecoveryKind::RecoveredCorrupt,
                };
            }
        };

        match serde_json::from_str::<LedgerState>(&raw) {
            Ok(ledger) => {
                info!(
                    bankroll = %ledger.bankroll,
                    results = ledger.result_history.len(),
                    "Ledger loaded"
                );
                LoadedLedger {
                    ledger,
                    recovery: RecoveryKind::Loaded,
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    preserved = %self.corrupt_path.display(),
                    "Ledger file corrupt, recovering with defaults"
                );
                if let Err(e) = fs::rename(&self.state_path, &self.corrupt_path).await {
                    warn!(error = %e, "Failed to set aside corrupt ledger file");
                }
                LoadedLedger {
                    ledger: LedgerState::new(self.seed.clone()),
                    recovery: RecoveryKind::RecoveredCorrupt,
                }
            }
        }
    }

    /// Save the document atomically (tmp → rename). Best-effort: a
    /// failure is logged and reported through the outcome flag.
    #[instrument(skip(self, ledger))]
    pub async fn save(&self, ledger: &LedgerState) -> SaveOutcome {
        match self.try_save(ledger).await {
            Ok(()) => SaveOutcome { persisted: true },
            Err(e) => {
                warn!(error = %e, "Ledger save failed");
                SaveOutcome { persisted: false }
            }
        }
    }

    async fn try_save(&self, ledger: &LedgerState) -> Result<()> {
        let json = serde_json::to_string_pretty(ledger)
            .context("Failed to serialize ledger")?;

        // Write to tmp file
        fs::write(&self.tmp_path, &json)
            .await
            .context("Failed to write tmp ledger file")?;

        // Atomic rename
        fs::rename(&self.tmp_path, &self.state_path)
            .await
            .context("Failed to rename ledger file")?;

        Ok(())
    }

    /// Check if the state file location is usable.
    pub async fn is_healthy(&self) -> bool {
        if !self.state_path.exists() {
            return true; // First run is OK
        }
        fs::metadata(&self.state_path).await.is_ok()
    }
}
