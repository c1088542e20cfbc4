//! Repository Port - Ledger Persistence Interface
//!
//! Defines the trait the usecases layer requires for loading and
//! saving the bankroll document. Loads never fail the caller: missing
//! or corrupt input is replaced by a fresh default ledger, with the
//! recovery surfaced as a distinguishable flag. Saves are best-effort:
//! a failed write is logged by the adapter and reported through a
//! status flag, never raised.

use async_trait::async_trait;

use crate::domain::ledger::{LedgerState, ResultEntry};

/// How the ledger document was obtained on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryKind {
  /// No document existed; defaults were materialized.
  Fresh,
  /// The persisted document parsed cleanly.
  Loaded,
  /// The persisted document failed to parse and was replaced by
  /// defaults. The broken file is preserved by the adapter.
  RecoveredCorrupt,
}

/// A loaded ledger plus its provenance.
#[derive(Debug, Clone)]
pub struct LoadedLedger {
  pub ledger: LedgerState,
  pub recovery: RecoveryKind,
}

/// Result of a best-effort durable write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
  /// Whether the write reached durable storage. Callers decide whether
  /// to retry or surface a warning; the in-memory mutation stands
  /// either way.
  pub persisted: bool,
}

/// Trait for ledger persistence providers.
#[async_trait]
pub trait LedgerRepository: Send + Sync + 'static {
  /// Read the persisted document, or materialize defaults if it is
  /// absent or corrupt. Never fails.
  async fn load(&self) -> LoadedLedger;

  /// Durably write the document. Best-effort; never fails.
  async fn save(&self, ledger: &LedgerState) -> SaveOutcome;

  /// Append an applied result to the audit journal. Best-effort.
  async fn append_result(&self, entry: &ResultEntry) -> SaveOutcome;

  /// Check that the backing store is usable (directory writable).
  async fn is_healthy(&self) -> bool;
}
