//! Bankroll Service - Planning, Outcome Application, Policy Controls
//!
//! Orchestrates the domain policy with the repository port. Every
//! operation is a read-modify-write cycle over the single persisted
//! ledger document: load (never fails, may recover with defaults),
//! mutate in memory, then best-effort save. Callers are expected to
//! serialize access; there is no locking here.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::error::PolicyError;
use crate::domain::ledger::{BetResult, LedgerState, StakePlan};
use crate::domain::policy::{self, AppliedResult, ReportView, StatusView};
use crate::domain::sizing::StakeSizer;
use crate::ports::repository::{LedgerRepository, RecoveryKind};

/// A mutation result plus its durability and load provenance.
///
/// `persisted = false` means the in-memory change stands but the write
/// did not reach disk; `recovery` reports whether the load had to fall
/// back to defaults.
#[derive(Debug, Clone)]
pub struct Committed<T> {
  pub value: T,
  pub persisted: bool,
  pub recovery: RecoveryKind,
}

/// Application service over the bankroll ledger.
pub struct BankrollService {
  repo: Arc<dyn LedgerRepository>,
  sizer: Box<dyn StakeSizer>,
}

impl BankrollService {
  pub fn new(repo: Arc<dyn LedgerRepository>, sizer: Box<dyn StakeSizer>) -> Self {
    Self { repo, sizer }
  }

  /// Name of the active sizing strategy.
  pub fn strategy(&self) -> &'static str {
    self.sizer.name()
  }

  async fn load(&self) -> (LedgerState, RecoveryKind) {
    let loaded = self.repo.load().await;
    if loaded.recovery == RecoveryKind::RecoveredCorrupt {
      warn!("Ledger was recovered from a corrupt document");
    }
    (loaded.ledger, loaded.recovery)
  }

  async fn commit<T>(
    &self,
    ledger: &LedgerState,
    recovery: RecoveryKind,
    value: T,
  ) -> Committed<T> {
    let saved = self.repo.save(ledger).await;
    if !saved.persisted {
      warn!("Ledger save failed; in-memory state stands");
    }
    Committed {
      value,
      persisted: saved.persisted,
      recovery,
    }
  }

  /// Compute a stake plan and store it as the pending plan.
  ///
  /// Refusal plans (sticky pause or exhausted daily cap) are returned
  /// but never stored as pending.
  pub async fn plan_stake(&self, odds: Option<Decimal>) -> Committed<StakePlan> {
    let (mut ledger, recovery) = self.load().await;
    let plan = policy::plan_stake(
      &mut ledger,
      self.sizer.as_ref(),
      odds,
      Utc::now().date_naive(),
    );

    if plan.paused {
      info!(reason = ?plan.reason, "Stake plan refused");
      return self.commit(&ledger, recovery, plan).await;
    }

    info!(
      stake = %plan.stake,
      fraction = %plan.fraction,
      wins_in_window = plan.wins_in_window,
      strategy = self.sizer.name(),
      "Stake plan computed"
    );
    ledger.pending_plan = Some(plan.clone());
    self.commit(&ledger, recovery, plan).await
  }

  /// Compute a stake plan without mutating the durable ledger.
  pub async fn preview_stake(&self, odds: Option<Decimal>) -> StakePlan {
    let (ledger, _) = self.load().await;
    let mut scratch = ledger;
    policy::plan_stake(
      &mut scratch,
      self.sizer.as_ref(),
      odds,
      Utc::now().date_naive(),
    )
  }

  /// Apply a realized result, consuming any pending plan.
  pub async fn apply_result(
    &self,
    result: BetResult,
    odds: Option<Decimal>,
    stake: Option<Decimal>,
  ) -> Committed<AppliedResult> {
    let (mut ledger, recovery) = self.load().await;
    let applied = policy::apply_result(&mut ledger, result, odds, stake, Utc::now());

    if applied.entry.fallback_stake {
      warn!(
        stake = %applied.entry.stake,
        "No pending plan or explicit stake; fallback unit stake used"
      );
    }
    if applied.auto_paused {
      warn!(reason = %ledger.pause_reason, "Drawdown auto-pause latched");
    }
    info!(
      result = %applied.entry.result,
      pnl = %applied.entry.pnl,
      bankroll = %ledger.bankroll,
      "Result applied"
    );

    let journaled = self.repo.append_result(&applied.entry).await;
    if !journaled.persisted {
      warn!("Result journal append failed");
    }

    self.commit(&ledger, recovery, applied).await
  }

  /// Apply a realized result against the pending plan specifically.
  ///
  /// Fails with `NothingPlanned` when no pending plan exists; no
  /// mutation occurs in that case.
  pub async fn confirm_pending(
    &self,
    result: BetResult,
  ) -> Result<Committed<AppliedResult>, PolicyError> {
    let (ledger, _) = self.load().await;
    if ledger.pending_plan.is_none() {
      return Err(PolicyError::NothingPlanned);
    }
    Ok(self.apply_result(result, None, None).await)
  }

  /// Set the sticky pause flag. Idempotent.
  pub async fn pause(&self, reason: Option<String>) -> Committed<StatusView> {
    let (mut ledger, recovery) = self.load().await;
    ledger.pause(reason.as_deref());
    info!(reason = %ledger.pause_reason, "Ledger paused");
    let status = policy::build_status(&ledger);
    self.commit(&ledger, recovery, status).await
  }

  /// Clear the pause flag. Idempotent.
  pub async fn resume(&self) -> Committed<StatusView> {
    let (mut ledger, recovery) = self.load().await;
    ledger.resume();
    info!("Ledger resumed");
    let status = policy::build_status(&ledger);
    self.commit(&ledger, recovery, status).await
  }

  /// Replace the odds band after validation.
  pub async fn set_odds_band(
    &self,
    min: Decimal,
    max: Decimal,
  ) -> Result<Committed<StatusView>, PolicyError> {
    let (mut ledger, recovery) = self.load().await;
    ledger.set_odds_band(min, max)?;
    info!(min = %min, max = %max, "Odds band updated");
    let status = policy::build_status(&ledger);
    Ok(self.commit(&ledger, recovery, status).await)
  }

  /// Read-only status projection.
  pub async fn status(&self) -> (StatusView, RecoveryKind) {
    let (ledger, recovery) = self.load().await;
    (policy::build_status(&ledger), recovery)
  }

  /// Read-only performance report.
  pub async fn report(&self) -> ReportView {
    let (ledger, _) = self.load().await;
    policy::build_report(&ledger)
  }

  /// Replace the document with a fresh default ledger, keeping the
  /// persisted staking configuration.
  pub async fn reset(&self) -> Committed<StatusView> {
    let (ledger, recovery) = self.load().await;
    let fresh = LedgerState::new(ledger.config);
    warn!(bankroll = %fresh.bankroll, "Ledger reset to defaults");
    let status = policy::build_status(&fresh);
    self.commit(&fresh, recovery, status).await
  }
}
