//! Result Journal - Append-only JSONL Audit Records
//!
//! Persists every applied result to daily JSONL files in the format
//! `results/YYYY-MM-DD.jsonl`. Each line is a self-contained JSON
//! record. The bounded in-ledger history is the operational view; this
//! journal is the unbounded audit trail.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{instrument, warn};

use crate::domain::ledger::ResultEntry;
use crate::ports::repository::SaveOutcome;

/// Append-only JSONL journal with daily file partitioning.
pub struct ResultJournal {
    /// Base directory for daily result files.
    results_dir: PathBuf,
}

impl ResultJournal {
    /// Create a new journal in the given data directory.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let results_dir = Path::new(data_dir).join("results");
        fs::create_dir_all(&results_dir)
            .await
            .context("Failed to create results directory")?;
        Ok(Self { results_dir })
    }

    fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.results_dir.join(format!("{date}.jsonl"))
    }

    /// Append an applied result to its day's JSONL file. Best-effort:
    /// a failure is logged and reported through the outcome flag.
    #[instrument(skip(self, entry), fields(result_id = %entry.id))]
    pub async fn append(&self, entry: &ResultEntry) -> SaveOutcome {
        match self.try_append(entry).await {
            Ok(()) => SaveOutcome { persisted: true },
            Err(e) => {
                warn!(error = %e, "Result journal append failed");
                SaveOutcome { persisted: false }
            }
        }
    }

    async fn try_append(&self, entry: &ResultEntry) -> Result<()> {
        let path = self.day_path(entry.timestamp.date_naive());

        let mut json = serde_json::to_string(entry)
            .context("Failed to serialize result entry")?;
        json.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .context("Failed to open result journal file")?;

        file.write_all(json.as_bytes())
            .await
            .context("Failed to write result entry")?;

        file.flush().await.context("Failed to flush result journal")?;

        Ok(())
    }

    /// Load all entries journaled on the given day. Malformed lines are
    /// skipped with a warning.
    pub async fn load_day(&self, date: NaiveDate) -> Result<Vec<ResultEntry>> {
        let path = self.day_path(date);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        let mut entries = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ResultEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(
                        file = %path.display(),
                        error = %e,
                        "Skipping malformed journal record"
                    );
                }
            }
        }
        Ok(entries)
    }

    /// Check if the journal directory is writable.
    pub async fn is_healthy(&self) -> bool {
        let test_path = self.results_dir.join(".health_check");
        let result = fs::write(&test_path, b"ok").await;
        let _ = fs::remove_file(&test_path).await;
        result.is_ok()
    }
}
