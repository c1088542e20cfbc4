//! Stake sizing strategies.
//!
//! Sizing is pluggable: both strategies turn a ledger snapshot and an
//! odds value into a risk fraction of bankroll, clamped to the ledger's
//! `[min_fraction, max_fraction]` band. Pure computation — the planner
//! applies exposure caps and rounding on top.
//!
//! Two strategies are provided:
//! - [`StreakTableSizer`]: aggression-table model keyed by wins in the
//!   streak window, with a hot bonus on a pure win streak.
//! - [`FractionalKellySizer`]: fractional Kelly `f* = (b*p - q) / b`
//!   with hot/cold streak multipliers.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::ledger::LedgerState;

/// A sized risk fraction plus the breakdown that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionPlan {
    /// Fraction of bankroll to stake, within the configured clamp band.
    pub fraction: Decimal,
    /// Consecutive wins at the front of the window.
    pub wins_in_window: u32,
    /// Whether every result in the window was a win.
    pub pure_streak: bool,
    /// Combined multiplier applied on top of the base fraction.
    pub applied_multiplier: Decimal,
}

/// A replaceable stake sizing rule.
pub trait StakeSizer: Send + Sync {
    /// Strategy name for logging and status output.
    fn name(&self) -> &'static str;

    /// Compute the risk fraction for the next bet.
    fn fraction(&self, ledger: &LedgerState, odds: Decimal) -> FractionPlan;
}

/// Streak-multiplier table sizing.
///
/// `raw = base_fraction * aggression_by_wins[wins] * hot_bonus`, clamped
/// to the ledger's fraction band. Missing table entries default to 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreakTableSizer;

impl StakeSizer for StreakTableSizer {
    fn name(&self) -> &'static str {
        "streak-table"
    }

    fn fraction(&self, ledger: &LedgerState, _odds: Decimal) -> FractionPlan {
        let cfg = &ledger.config;
        let wins = ledger.wins_in_window();
        let idx = wins.min(cfg.streak_window) as usize;

        let multiplier = cfg
            .aggression_by_wins
            .get(idx)
            .copied()
            .unwrap_or(Decimal::ONE);

        let pure_streak = wins == cfg.streak_window;
        let hot_bonus = if pure_streak {
            cfg.hot_bonus_on_pure_streak
        } else {
            Decimal::ONE
        };

        let raw = cfg.base_fraction * multiplier * hot_bonus;

        FractionPlan {
            fraction: raw.clamp(cfg.min_fraction, cfg.max_fraction),
            wins_in_window: wins,
            pure_streak,
            applied_multiplier: multiplier * hot_bonus,
        }
    }
}

/// Tunables for the fractional-Kelly strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KellyParams {
    /// Fractional Kelly multiplier (0.25 = quarter-Kelly).
    pub kelly_fraction: Decimal,
    /// Assumed edge over the odds-implied probability.
    pub edge: Decimal,
    /// Consecutive wins required for the hot boost.
    pub hot_streak_wins: u32,
    /// Multiplier applied on a hot streak.
    pub hot_boost: Decimal,
    /// Consecutive losses required for the cold cut.
    pub cold_streak_losses: u32,
    /// Multiplier applied on a cold streak.
    pub cold_cut: Decimal,
}

impl Default for KellyParams {
    /// Quarter-Kelly with a 3% assumed edge and 3-streak adjustments.
    fn default() -> Self {
        Self {
            kelly_fraction: dec!(0.25),
            edge: dec!(0.03),
            hot_streak_wins: 3,
            hot_boost: dec!(1.25),
            cold_streak_losses: 3,
            cold_cut: dec!(0.5),
        }
    }
}

/// Fractional-Kelly sizing with streak adjustments.
///
/// Win probability is derived from the decimal odds plus a configured
/// edge: `p = clamp(1/odds + edge, 0.01, 0.99)`. A non-positive Kelly
/// fraction (no edge at these odds) falls through to the clamp band's
/// floor rather than refusing the bet.
#[derive(Debug, Clone, Copy)]
pub struct FractionalKellySizer {
    params: KellyParams,
}

impl FractionalKellySizer {
    pub fn new(params: KellyParams) -> Self {
        Self { params }
    }

    /// Full Kelly fraction `(b*p - q) / b` for the given odds, before
    /// the fractional multiplier. Zero when odds offer no payout.
    fn full_kelly(&self, odds: Decimal) -> Decimal {
        let b = odds - Decimal::ONE;
        if b <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let implied = Decimal::ONE / odds;
        let p = (implied + self.params.edge).clamp(dec!(0.01), dec!(0.99));
        let q = Decimal::ONE - p;
        ((b * p - q) / b).max(Decimal::ZERO)
    }
}

impl StakeSizer for FractionalKellySizer {
    fn name(&self) -> &'static str {
        "fractional-kelly"
    }

    fn fraction(&self, ledger: &LedgerState, odds: Decimal) -> FractionPlan {
        let cfg = &ledger.config;
        let wins = ledger.wins_in_window();
        let pure_streak = wins == cfg.streak_window;

        let streak = ledger.streak();
        let multiplier = if streak >= i64::from(self.params.hot_streak_wins) {
            self.params.hot_boost
        } else if streak <= -i64::from(self.params.cold_streak_losses) {
            self.params.cold_cut
        } else {
            Decimal::ONE
        };

        let raw = self.full_kelly(odds) * self.params.kelly_fraction * multiplier;

        FractionPlan {
            fraction: raw.clamp(cfg.min_fraction, cfg.max_fraction),
            wins_in_window: wins,
            pure_streak,
            applied_multiplier: multiplier,
        }
    }
}
