//! Bankroll ledger — the single persisted state document.
//!
//! One `LedgerState` instance exists per deployment. Every operation
//! (planning, outcome application, policy controls) is a read-modify-write
//! cycle over this document. Money is `Decimal` rounded to 2 dp at
//! mutation points; odds are rounded to 3 dp.

use std::collections::VecDeque;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::PolicyError;

/// Maximum retained result history entries. Oldest entries are dropped.
pub const HISTORY_CAP: usize = 5000;

/// Round a money amount to currency-minor-unit granularity (2 dp).
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp(2)
}

/// Round an odds or probability value to 3 dp.
pub fn round_odds(value: Decimal) -> Decimal {
    value.round_dp(3)
}

/// Realized outcome of a settled bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
}

impl BetResult {
    /// Parse an operator-supplied result token.
    ///
    /// Accepts `W` / `L` case-insensitively, normalized to uppercase.
    /// Anything else is an `InvalidResult` and causes no mutation.
    pub fn parse(raw: &str) -> Result<Self, PolicyError> {
        match raw.trim() {
            r if r.eq_ignore_ascii_case("w") => Ok(Self::Win),
            r if r.eq_ignore_ascii_case("l") => Ok(Self::Loss),
            other => Err(PolicyError::InvalidResult(other.to_string())),
        }
    }
}

impl std::fmt::Display for BetResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Win => write!(f, "W"),
            Self::Loss => write!(f, "L"),
        }
    }
}

/// Acceptable decimal-odds range for planning.
///
/// Advisory: callers use it to filter opportunities; sizing itself does
/// not enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OddsBand {
    pub min: Decimal,
    pub max: Decimal,
}

impl OddsBand {
    /// Validate operator-supplied bounds: `min >= 1.01` and `max > min`.
    pub fn validated(min: Decimal, max: Decimal) -> Result<Self, PolicyError> {
        if min < dec!(1.01) {
            return Err(PolicyError::InvalidRange(format!(
                "min {min} must be >= 1.01"
            )));
        }
        if max <= min {
            return Err(PolicyError::InvalidRange(format!(
                "max {max} must be > min {min}"
            )));
        }
        Ok(Self {
            min: round_odds(min),
            max: round_odds(max),
        })
    }

    pub fn midpoint(&self) -> Decimal {
        round_odds((self.min + self.max) / Decimal::TWO)
    }
}

impl Default for OddsBand {
    fn default() -> Self {
        Self {
            min: dec!(1.30),
            max: dec!(3.50),
        }
    }
}

/// Staking policy configuration.
///
/// Immutable per ledger unless explicitly changed by an operator.
/// Seeded from `config.toml` when a fresh ledger is materialized; the
/// persisted copy wins on subsequent loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakingConfig {
    /// Starting bankroll for a fresh ledger.
    pub bankroll_seed: Decimal,
    /// Base risk fraction of bankroll per bet.
    pub base_fraction: Decimal,
    /// Odds used when the caller supplies none.
    pub default_odds: Decimal,
    /// How many most-recent results define the streak window.
    pub streak_window: u32,
    /// Multiplier per win-count-in-window, indexed by wins (0..=window).
    /// Missing entries default to 1.0.
    pub aggression_by_wins: Vec<Decimal>,
    /// Hard upper bound on the staked fraction of bankroll.
    pub max_fraction: Decimal,
    /// Hard lower bound on the staked fraction of bankroll.
    pub min_fraction: Decimal,
    /// Extra boost when every result in the window is a win.
    pub hot_bonus_on_pure_streak: Decimal,
    /// Drawdown fraction that triggers the sticky auto-pause.
    pub drawdown_pause_threshold: Decimal,
    /// Cap on cumulative same-day stake, as a fraction of the exposure
    /// baseline (the bankroll level that would trigger auto-pause).
    pub daily_exposure_cap: Decimal,
    /// Stake used when neither a pending plan nor an explicit stake is
    /// available. Its use is recorded on the result entry.
    pub fallback_stake: Decimal,
    /// Display currency.
    pub currency: String,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            bankroll_seed: dec!(1000),
            base_fraction: dec!(0.07),
            default_odds: dec!(1.90),
            streak_window: 3,
            aggression_by_wins: vec![dec!(0.5), dec!(0.75), dec!(1.0), dec!(1.25)],
            max_fraction: dec!(0.13),
            min_fraction: dec!(0.01),
            hot_bonus_on_pure_streak: dec!(1.2),
            drawdown_pause_threshold: dec!(0.15),
            daily_exposure_cap: dec!(0.20),
            fallback_stake: dec!(10),
            currency: "USD".to_string(),
        }
    }
}

/// A computed, not-yet-applied stake recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakePlan {
    /// True when planning refused to size a stake (sticky pause or
    /// exhausted daily cap). A refusal never mutates the ledger flag.
    pub paused: bool,
    pub stake: Decimal,
    pub fraction: Decimal,
    pub wins_in_window: u32,
    pub pure_streak: bool,
    pub applied_multiplier: Decimal,
    pub odds: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StakePlan {
    /// A zero-stake refusal plan (pause short-circuit or exhausted cap).
    pub fn refusal(reason: impl Into<String>, odds: Decimal) -> Self {
        Self {
            paused: true,
            stake: Decimal::ZERO,
            fraction: Decimal::ZERO,
            wins_in_window: 0,
            pure_streak: false,
            applied_multiplier: Decimal::ZERO,
            odds: round_odds(odds),
            reason: Some(reason.into()),
            created_at: Utc::now(),
        }
    }
}

/// An applied bet outcome. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub result: BetResult,
    pub stake: Decimal,
    pub odds: Decimal,
    pub pnl: Decimal,
    pub bankroll_after: Decimal,
    /// True when the configured fallback unit stake was used because
    /// neither a pending plan nor an explicit stake was supplied.
    #[serde(default)]
    pub fallback_stake: bool,
}

/// Lifetime win/loss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub wins: u64,
    pub losses: u64,
}

impl Stats {
    pub fn total(&self) -> u64 {
        self.wins + self.losses
    }

    /// Win rate in percent, rounded to 1 dp. Zero when no bets settled.
    pub fn winrate_pct(&self) -> Decimal {
        if self.total() == 0 {
            return Decimal::ZERO;
        }
        (Decimal::from(self.wins) / Decimal::from(self.total()) * dec!(100)).round_dp(1)
    }
}

/// The persisted bankroll document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    pub bankroll: Decimal,
    /// Maximum bankroll ever observed. Updated to `max(hwm, bankroll)`
    /// immediately after any bankroll change, so `hwm >= bankroll` holds
    /// after every mutation.
    pub high_water_mark: Decimal,
    pub paused: bool,
    #[serde(default)]
    pub pause_reason: String,
    pub odds_band: OddsBand,
    pub config: StakingConfig,
    pub exposure_today: Decimal,
    pub exposure_day_anchor: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_plan: Option<StakePlan>,
    /// Most-recent-first, bounded at [`HISTORY_CAP`].
    #[serde(default)]
    pub result_history: VecDeque<ResultEntry>,
    #[serde(default)]
    pub stats: Stats,
}

impl LedgerState {
    /// Materialize a fresh ledger from seed configuration.
    pub fn new(config: StakingConfig) -> Self {
        let seed = round_money(config.bankroll_seed);
        Self {
            bankroll: seed,
            high_water_mark: seed,
            paused: false,
            pause_reason: String::new(),
            odds_band: OddsBand::default(),
            config,
            exposure_today: Decimal::ZERO,
            exposure_day_anchor: Utc::now().date_naive(),
            pending_plan: None,
            result_history: VecDeque::new(),
            stats: Stats::default(),
        }
    }

    /// Lazily reset the daily exposure bucket.
    ///
    /// Idempotent: a second call on the same day is a no-op. Returns
    /// whether a reset happened.
    pub fn roll_exposure_day(&mut self, today: NaiveDate) -> bool {
        if self.exposure_day_anchor == today {
            return false;
        }
        self.exposure_day_anchor = today;
        self.exposure_today = Decimal::ZERO;
        true
    }

    /// Consecutive wins at the front of the history, scanning at most
    /// `streak_window` entries and stopping at the first loss.
    pub fn wins_in_window(&self) -> u32 {
        let window = self.config.streak_window as usize;
        self.result_history
            .iter()
            .take(window)
            .take_while(|e| e.result == BetResult::Win)
            .count() as u32
    }

    /// Signed consecutive same-result run at the front of the history.
    ///
    /// Positive for a wins-run, negative for a losses-run, zero when
    /// the history is empty.
    pub fn streak(&self) -> i64 {
        let Some(first) = self.result_history.front() else {
            return 0;
        };
        let run = self
            .result_history
            .iter()
            .take_while(|e| e.result == first.result)
            .count() as i64;
        match first.result {
            BetResult::Win => run,
            BetResult::Loss => -run,
        }
    }

    /// Prepend a result entry, truncating to the history cap.
    pub fn record(&mut self, entry: ResultEntry) {
        self.result_history.push_front(entry);
        self.result_history.truncate(HISTORY_CAP);
    }

    /// Relative decline of bankroll from the high-water mark.
    /// Zero when the high-water mark is zero.
    pub fn drawdown(&self) -> Decimal {
        if self.high_water_mark.is_zero() {
            return Decimal::ZERO;
        }
        (self.high_water_mark - self.bankroll) / self.high_water_mark
    }

    /// Raise the high-water mark to the current bankroll if exceeded.
    pub fn update_high_water(&mut self) {
        if self.bankroll > self.high_water_mark {
            self.high_water_mark = self.bankroll;
        }
    }

    /// Set the sticky pause flag. Idempotent.
    pub fn pause(&mut self, reason: Option<&str>) {
        self.paused = true;
        self.pause_reason = reason.unwrap_or("Paused by user").to_string();
    }

    /// Clear the pause flag. Idempotent; exposure and streak state are
    /// left untouched.
    pub fn resume(&mut self) {
        self.paused = false;
        self.pause_reason.clear();
    }

    /// Replace the odds band after validating the bounds.
    pub fn set_odds_band(&mut self, min: Decimal, max: Decimal) -> Result<(), PolicyError> {
        self.odds_band = OddsBand::validated(min, max)?;
        Ok(())
    }
}
