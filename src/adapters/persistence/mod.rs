//! Persistence Adapters - File-backed Ledger Storage
//!
//! Implements the `LedgerRepository` port with plain files: an atomic
//! JSON document for the ledger itself and append-only JSONL files for
//! the result audit journal. No database dependency.
//!
//! This is the hexagonal architecture glue: the domain/usecases layer
//! only knows about the `LedgerRepository` trait, never about files or
//! JSON.

pub mod journal;
pub mod store;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::ledger::{LedgerState, ResultEntry, StakingConfig};
use crate::ports::repository::{
    LedgerRepository, LoadedLedger, SaveOutcome,
};

use journal::ResultJournal;
use store::LedgerStore;

/// Concrete repository adapter combining document and journal storage.
pub struct FileLedgerRepository {
    /// Atomic JSON ledger store.
    store: LedgerStore,
    /// JSONL result journal.
    journal: ResultJournal,
}

impl FileLedgerRepository {
    /// Initialize both stores under the given data directory.
    pub async fn new(data_dir: &str, seed: StakingConfig) -> Result<Self> {
        let store = LedgerStore::new(data_dir, seed).await?;
        let journal = ResultJournal::new(data_dir).await?;
        Ok(Self { store, journal })
    }
}

#[async_trait]
impl LedgerRepository for FileLedgerRepository {
    async fn load(&self) -> LoadedLedger {
        self.store.load().await
    }

    async fn save(&self, ledger: &LedgerState) -> SaveOutcome {
        self.store.save(ledger).await
    }

    async fn append_result(&self, entry: &ResultEntry) -> SaveOutcome {
        self.journal.append(entry).await
    }

    async fn is_healthy(&self) -> bool {
        self.store.is_healthy().await && self.journal.is_healthy().await
    }
}
