//! Planning and outcome application over a ledger snapshot.
//!
//! `plan_stake` proposes the next stake without committing anything
//! durable (its only in-memory mutation is the lazy daily exposure
//! rollover). `apply_result` applies a realized win/loss and enforces
//! the safety invariants: zero-floor bankroll, high-water update,
//! bounded history, and the sticky drawdown auto-pause. The caller owns
//! persistence.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use uuid::Uuid;

use super::ledger::{
    round_money, round_odds, BetResult, LedgerState, OddsBand, ResultEntry,
    StakePlan, Stats,
};
use super::sizing::StakeSizer;

/// Plan refusal reason when the daily exposure allowance is exhausted.
/// Ephemeral: reported on the plan, never latched onto the ledger.
pub const DAILY_CAP_REASON: &str = "Daily exposure cap hit.";

/// Reference baseline for the daily exposure cap: the bankroll level
/// that would trigger the drawdown auto-pause. The cap is a fraction of
/// this baseline, so allowed exposure shrinks together with the pause
/// boundary rather than tracking the raw bankroll.
pub fn exposure_baseline(ledger: &LedgerState) -> Decimal {
    ledger.high_water_mark * (Decimal::ONE - ledger.config.drawdown_pause_threshold)
}

/// Compute the recommended stake for the next bet.
///
/// Pause short-circuit first, then lazy exposure rollover, then the
/// sizing strategy, then the daily exposure cap. Stakes are rounded to
/// 2 dp; a stake that would exceed the remaining daily allowance is
/// truncated to the allowance, and an exhausted allowance yields an
/// ephemeral refusal.
pub fn plan_stake(
    ledger: &mut LedgerState,
    sizer: &dyn StakeSizer,
    odds: Option<Decimal>,
    today: NaiveDate,
) -> StakePlan {
    let odds = round_odds(odds.unwrap_or(ledger.config.default_odds));

    if ledger.paused {
        let reason = if ledger.pause_reason.is_empty() {
            "Paused".to_string()
        } else {
            ledger.pause_reason.clone()
        };
        return StakePlan::refusal(reason, odds);
    }

    ledger.roll_exposure_day(today);

    let sized = sizer.fraction(ledger, odds);

    let cap = exposure_baseline(ledger) * ledger.config.daily_exposure_cap;
    let remaining = (cap - ledger.exposure_today).max(Decimal::ZERO);

    let mut stake = round_money(ledger.bankroll * sized.fraction);
    if stake > remaining {
        if remaining <= Decimal::ZERO {
            return StakePlan::refusal(DAILY_CAP_REASON, odds);
        }
        stake = remaining.round_dp_with_strategy(2, RoundingStrategy::ToZero);
    }
    stake = stake.max(Decimal::ZERO);

    let fraction = if ledger.bankroll > Decimal::ZERO {
        (stake / ledger.bankroll).round_dp(4)
    } else {
        Decimal::ZERO
    };

    StakePlan {
        paused: false,
        stake,
        fraction,
        wins_in_window: sized.wins_in_window,
        pure_streak: sized.pure_streak,
        applied_multiplier: sized.applied_multiplier,
        odds,
        reason: None,
        created_at: Utc::now(),
    }
}

/// Outcome of applying a realized result.
#[derive(Debug, Clone)]
pub struct AppliedResult {
    pub entry: ResultEntry,
    pub stats: Stats,
    /// Whether this application latched the drawdown auto-pause.
    pub auto_paused: bool,
}

/// Apply a realized win/loss to the ledger.
///
/// Resolution order: odds come from the explicit argument, then the
/// pending plan, then the configured default; the stake comes from the
/// pending plan, then the explicit argument, then the configured
/// fallback unit (recorded on the entry). The pending plan is consumed
/// either way.
pub fn apply_result(
    ledger: &mut LedgerState,
    result: BetResult,
    odds: Option<Decimal>,
    stake: Option<Decimal>,
    now: DateTime<Utc>,
) -> AppliedResult {
    ledger.roll_exposure_day(now.date_naive());

    let pending = ledger.pending_plan.take();

    let odds = round_odds(
        odds.or_else(|| pending.as_ref().map(|p| p.odds))
            .unwrap_or(ledger.config.default_odds),
    );

    let (stake, fallback_stake) = match (&pending, stake) {
        (Some(plan), _) => (plan.stake, false),
        (None, Some(explicit)) => (round_money(explicit), false),
        (None, None) => (round_money(ledger.config.fallback_stake), true),
    };

    let pnl = match result {
        BetResult::Win => round_money(stake * (odds - Decimal::ONE)),
        BetResult::Loss => -stake,
    };

    ledger.exposure_today += stake;
    // Safety floor: a loss stake larger than the bankroll clamps to zero
    // instead of going negative.
    ledger.bankroll = round_money(ledger.bankroll + pnl).max(Decimal::ZERO);
    ledger.update_high_water();

    let entry = ResultEntry {
        id: Uuid::new_v4(),
        timestamp: now,
        result,
        stake,
        odds,
        pnl,
        bankroll_after: ledger.bankroll,
        fallback_stake,
    };
    ledger.record(entry.clone());

    match result {
        BetResult::Win => ledger.stats.wins += 1,
        BetResult::Loss => ledger.stats.losses += 1,
    }

    let was_paused = ledger.paused;
    let drawdown = ledger.drawdown();
    if drawdown >= ledger.config.drawdown_pause_threshold {
        // Sticky: only an explicit resume clears this.
        let pct = (drawdown * dec!(100)).round();
        ledger.paused = true;
        ledger.pause_reason = format!("Drawdown {pct}%");
    }

    AppliedResult {
        entry,
        stats: ledger.stats,
        auto_paused: !was_paused && ledger.paused,
    }
}

/// Read-only status projection for the HTTP API and CLI.
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub bankroll: Decimal,
    pub high_water: Decimal,
    pub paused: bool,
    pub pause_reason: String,
    pub odds_band: OddsBand,
    pub pending_plan: Option<StakePlan>,
    pub recent_results: Vec<ResultEntry>,
    pub stats: Stats,
    pub streak: i64,
    pub currency: String,
}

/// Read-only performance report projection.
#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub bankroll: Decimal,
    pub high_water: Decimal,
    pub total_bets: u64,
    pub wins: u64,
    pub losses: u64,
    pub winrate_pct: Decimal,
    pub cumulative_pnl: Decimal,
    pub recent_results: Vec<ResultEntry>,
}

/// Build the status projection (recent results capped at 10).
pub fn build_status(ledger: &LedgerState) -> StatusView {
    StatusView {
        bankroll: ledger.bankroll,
        high_water: ledger.high_water_mark,
        paused: ledger.paused,
        pause_reason: ledger.pause_reason.clone(),
        odds_band: ledger.odds_band,
        pending_plan: ledger.pending_plan.clone(),
        recent_results: ledger.result_history.iter().take(10).cloned().collect(),
        stats: ledger.stats,
        streak: ledger.streak(),
        currency: ledger.config.currency.clone(),
    }
}

/// Build the report projection (recent results capped at 20).
///
/// Cumulative PnL is measured against the seed bankroll so it stays
/// exact even after the bounded history drops old entries.
pub fn build_report(ledger: &LedgerState) -> ReportView {
    ReportView {
        bankroll: ledger.bankroll,
        high_water: ledger.high_water_mark,
        total_bets: ledger.stats.total(),
        wins: ledger.stats.wins,
        losses: ledger.stats.losses,
        winrate_pct: ledger.stats.winrate_pct(),
        cumulative_pnl: round_money(ledger.bankroll - ledger.config.bankroll_seed),
        recent_results: ledger.result_history.iter().take(20).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::StakingConfig;
    use crate::domain::sizing::StreakTableSizer;

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn fresh_ledger() -> LedgerState {
        LedgerState::new(StakingConfig::default())
    }

    #[test]
    fn test_plan_pause_short_circuit() {
        let mut ledger = fresh_ledger();
        ledger.pause(Some("manual stop"));
        let before = ledger.clone();

        let plan = plan_stake(&mut ledger, &StreakTableSizer, Some(dec!(1.9)), today());

        assert!(plan.paused);
        assert_eq!(plan.stake, Decimal::ZERO);
        assert_eq!(plan.fraction, Decimal::ZERO);
        assert_eq!(plan.reason.as_deref(), Some("manual stop"));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_plan_fresh_ledger_scenario() {
        // bankroll 1000, base 0.07, empty history → table row 0 (0.5)
        let mut ledger = fresh_ledger();
        let plan = plan_stake(&mut ledger, &StreakTableSizer, Some(dec!(1.9)), today());

        assert!(!plan.paused);
        assert_eq!(plan.wins_in_window, 0);
        assert_eq!(plan.applied_multiplier, dec!(0.5));
        assert_eq!(plan.stake, dec!(35.00));
        assert_eq!(plan.fraction, dec!(0.035));
        assert!(plan.fraction >= ledger.config.min_fraction);
        assert!(plan.fraction <= ledger.config.max_fraction);
        assert_eq!(plan.odds, dec!(1.9));
    }

    #[test]
    fn test_plan_defaults_odds_from_config() {
        let mut ledger = fresh_ledger();
        let plan = plan_stake(&mut ledger, &StreakTableSizer, None, today());
        assert_eq!(plan.odds, ledger.config.default_odds);
    }

    #[test]
    fn test_plan_resets_exposure_after_day_boundary() {
        let mut ledger = fresh_ledger();
        ledger.exposure_today = dec!(500);
        ledger.exposure_day_anchor = today().pred_opt().unwrap();

        let plan = plan_stake(&mut ledger, &StreakTableSizer, None, today());

        assert_eq!(ledger.exposure_day_anchor, today());
        // stale exposure was discarded, so the full stake fits the cap
        assert_eq!(plan.stake, dec!(35.00));
        assert_eq!(ledger.exposure_today, Decimal::ZERO);
    }

    #[test]
    fn test_plan_truncates_to_remaining_allowance() {
        let mut ledger = fresh_ledger();
        // baseline = 1000 * 0.85 = 850, cap = 170; leave 10% of it
        ledger.exposure_today = dec!(153);

        let plan = plan_stake(&mut ledger, &StreakTableSizer, None, today());

        assert!(!plan.paused);
        assert_eq!(plan.stake, dec!(17.00));
        assert_eq!(plan.fraction, dec!(0.017));
    }

    #[test]
    fn test_plan_refuses_when_allowance_exhausted() {
        let mut ledger = fresh_ledger();
        ledger.exposure_today = dec!(170);

        let plan = plan_stake(&mut ledger, &StreakTableSizer, None, today());

        assert!(plan.paused);
        assert_eq!(plan.stake, Decimal::ZERO);
        assert_eq!(plan.reason.as_deref(), Some(DAILY_CAP_REASON));
        // the refusal is ephemeral: the ledger flag is untouched
        assert!(!ledger.paused);
    }

    #[test]
    fn test_apply_win_updates_bankroll_and_high_water() {
        let mut ledger = fresh_ledger();
        let applied = apply_result(
            &mut ledger,
            BetResult::Win,
            Some(dec!(2.0)),
            Some(dec!(50)),
            Utc::now(),
        );

        assert_eq!(applied.entry.pnl, dec!(50.00));
        assert_eq!(ledger.bankroll, dec!(1050.00));
        assert_eq!(ledger.high_water_mark, dec!(1050.00));
        assert_eq!(ledger.stats.wins, 1);
        assert_eq!(ledger.exposure_today, dec!(50));
        assert!(!applied.auto_paused);
    }

    #[test]
    fn test_apply_loss_keeps_high_water() {
        let mut ledger = fresh_ledger();
        apply_result(
            &mut ledger,
            BetResult::Loss,
            None,
            Some(dec!(50)),
            Utc::now(),
        );

        assert_eq!(ledger.bankroll, dec!(950.00));
        assert_eq!(ledger.high_water_mark, dec!(1000));
        assert_eq!(ledger.stats.losses, 1);
    }

    #[test]
    fn test_apply_bankroll_floor_never_negative() {
        let mut ledger = fresh_ledger();
        ledger.bankroll = dec!(30);
        apply_result(
            &mut ledger,
            BetResult::Loss,
            None,
            Some(dec!(100)),
            Utc::now(),
        );
        assert_eq!(ledger.bankroll, Decimal::ZERO);
    }

    #[test]
    fn test_apply_drawdown_auto_pause_with_percent_reason() {
        let mut ledger = fresh_ledger();
        ledger.bankroll = dec!(100);
        ledger.high_water_mark = dec!(100);

        // 100 → 84 = 16% drawdown, over the 0.15 threshold
        let applied = apply_result(
            &mut ledger,
            BetResult::Loss,
            None,
            Some(dec!(16)),
            Utc::now(),
        );

        assert!(applied.auto_paused);
        assert!(ledger.paused);
        assert!(
            ledger.pause_reason.contains("16%"),
            "reason was '{}'",
            ledger.pause_reason
        );

        // sticky: a later win does not clear the pause
        apply_result(&mut ledger, BetResult::Win, None, Some(dec!(5)), Utc::now());
        assert!(ledger.paused);

        ledger.resume();
        assert!(!ledger.paused);
    }

    #[test]
    fn test_apply_uses_pending_plan_then_clears_it() {
        let mut ledger = fresh_ledger();
        let plan = plan_stake(&mut ledger, &StreakTableSizer, Some(dec!(2.5)), today());
        ledger.pending_plan = Some(plan.clone());

        let applied = apply_result(&mut ledger, BetResult::Win, None, None, Utc::now());

        assert_eq!(applied.entry.stake, plan.stake);
        assert_eq!(applied.entry.odds, dec!(2.5));
        assert!(!applied.entry.fallback_stake);
        assert!(ledger.pending_plan.is_none());
    }

    #[test]
    fn test_apply_pending_stake_wins_over_explicit() {
        let mut ledger = fresh_ledger();
        let plan = plan_stake(&mut ledger, &StreakTableSizer, None, today());
        ledger.pending_plan = Some(plan.clone());

        let applied = apply_result(
            &mut ledger,
            BetResult::Loss,
            None,
            Some(dec!(999)),
            Utc::now(),
        );
        assert_eq!(applied.entry.stake, plan.stake);
    }

    #[test]
    fn test_apply_explicit_odds_win_over_pending() {
        let mut ledger = fresh_ledger();
        let plan = plan_stake(&mut ledger, &StreakTableSizer, Some(dec!(2.0)), today());
        ledger.pending_plan = Some(plan);

        let applied = apply_result(
            &mut ledger,
            BetResult::Win,
            Some(dec!(3.0)),
            None,
            Utc::now(),
        );
        assert_eq!(applied.entry.odds, dec!(3.0));
    }

    #[test]
    fn test_apply_fallback_stake_is_recorded() {
        let mut ledger = fresh_ledger();
        let applied = apply_result(&mut ledger, BetResult::Loss, None, None, Utc::now());

        assert!(applied.entry.fallback_stake);
        assert_eq!(applied.entry.stake, ledger.config.fallback_stake);
        assert_eq!(applied.entry.pnl, -ledger.config.fallback_stake);
    }

    #[test]
    fn test_status_and_report_projections() {
        let mut ledger = fresh_ledger();
        for _ in 0..25 {
            apply_result(&mut ledger, BetResult::Win, None, Some(dec!(1)), Utc::now());
        }
        apply_result(&mut ledger, BetResult::Loss, None, Some(dec!(1)), Utc::now());

        let status = build_status(&ledger);
        assert_eq!(status.recent_results.len(), 10);
        assert_eq!(status.streak, -1);
        assert_eq!(status.stats.wins, 25);

        let report = build_report(&ledger);
        assert_eq!(report.recent_results.len(), 20);
        assert_eq!(report.total_bets, 26);
        assert_eq!(report.winrate_pct, dec!(96.2));
        assert_eq!(
            report.cumulative_pnl,
            ledger.bankroll - ledger.config.bankroll_seed
        );
    }
}
