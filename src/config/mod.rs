//! Configuration Module - TOML-based Configuration
//!
//! Loads and validates configuration from `config.toml`. Staking
//! policy parameters seed the ledger document on first materialization;
//! after that the persisted copy wins, and changes go through the
//! operator controls.

pub mod loader;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::ledger::StakingConfig;
use crate::domain::sizing::{
  FractionalKellySizer, KellyParams, StakeSizer, StreakTableSizer,
};

/// Top-level configuration.
///
/// Every section and field has a default, so an absent `config.toml`
/// yields a runnable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// Identity and logging.
  pub bot: BotConfig,
  /// Staking policy seed parameters.
  pub staking: StakingSection,
  /// Sizing strategy selection and Kelly-variant knobs.
  pub sizing: SizingConfig,
  /// HTTP API server.
  pub server: ServerConfig,
  /// Persistence configuration.
  pub persistence: PersistenceConfig,
}

impl AppConfig {
  /// Staking policy seed for a fresh ledger document.
  pub fn staking_config(&self) -> StakingConfig {
    StakingConfig {
      bankroll_seed: self.staking.bankroll_seed,
      base_fraction: self.staking.base_fraction,
      default_odds: self.staking.default_odds,
      streak_window: self.staking.streak_window,
      aggression_by_wins: self.staking.aggression_by_wins.clone(),
      max_fraction: self.staking.max_fraction,
      min_fraction: self.staking.min_fraction,
      hot_bonus_on_pure_streak: self.staking.hot_bonus_on_pure_streak,
      drawdown_pause_threshold: self.staking.drawdown_pause_threshold,
      daily_exposure_cap: self.staking.daily_exposure_cap,
      fallback_stake: self.staking.fallback_stake,
      currency: self.staking.currency.clone(),
    }
  }

  /// Build the configured sizing strategy.
  pub fn build_sizer(&self) -> Box<dyn StakeSizer> {
    match self.sizing.strategy {
      SizingStrategy::StreakTable => Box::new(StreakTableSizer),
      SizingStrategy::FractionalKelly => {
        Box::new(FractionalKellySizer::new(KellyParams {
          kelly_fraction: self.sizing.kelly_fraction,
          edge: self.sizing.edge,
          hot_streak_wins: self.sizing.hot_streak_wins,
          hot_boost: self.sizing.hot_boost,
          cold_streak_losses: self.sizing.cold_streak_losses,
          cold_cut: self.sizing.cold_cut,
        }))
      }
    }
  }
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
  /// Human-readable instance name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  pub log_level: String,
}

impl Default for BotConfig {
  fn default() -> Self {
    Self {
      name: "stakekeeper".to_string(),
      log_level: default_log_level(),
    }
  }
}

/// Staking policy seed parameters (`[staking]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StakingSection {
  /// Starting bankroll for a fresh ledger.
  pub bankroll_seed: Decimal,
  /// Base risk fraction of bankroll per bet.
  pub base_fraction: Decimal,
  /// Odds assumed when the caller supplies none.
  pub default_odds: Decimal,
  /// Number of most-recent results in the streak window.
  pub streak_window: u32,
  /// Multiplier per win-count-in-window, indexed by wins.
  pub aggression_by_wins: Vec<Decimal>,
  /// Hard upper bound on the staked fraction.
  pub max_fraction: Decimal,
  /// Hard lower bound on the staked fraction.
  pub min_fraction: Decimal,
  /// Extra boost when the whole window is wins.
  pub hot_bonus_on_pure_streak: Decimal,
  /// Drawdown fraction that latches the auto-pause.
  pub drawdown_pause_threshold: Decimal,
  /// Daily exposure cap as a fraction of the exposure baseline.
  pub daily_exposure_cap: Decimal,
  /// Stake used when neither a plan nor an explicit stake exists.
  pub fallback_stake: Decimal,
  /// Display currency.
  pub currency: String,
}

impl Default for StakingSection {
  fn default() -> Self {
    let seed = StakingConfig::default();
    Self {
      bankroll_seed: seed.bankroll_seed,
      base_fraction: seed.base_fraction,
      default_odds: seed.default_odds,
      streak_window: seed.streak_window,
      aggression_by_wins: seed.aggression_by_wins,
      max_fraction: seed.max_fraction,
      min_fraction: seed.min_fraction,
      hot_bonus_on_pure_streak: seed.hot_bonus_on_pure_streak,
      drawdown_pause_threshold: seed.drawdown_pause_threshold,
      daily_exposure_cap: seed.daily_exposure_cap,
      fallback_stake: seed.fallback_stake,
      currency: seed.currency,
    }
  }
}

/// Which sizing strategy plans stakes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizingStrategy {
  /// Aggression-table model keyed by wins in the window.
  #[default]
  StreakTable,
  /// Fractional Kelly with hot/cold streak multipliers.
  FractionalKelly,
}

/// Sizing strategy configuration (`[sizing]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
  pub strategy: SizingStrategy,
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

impl Default for SizingConfig {
  fn default() -> Self {
    let params = KellyParams::default();
    Self {
      strategy: SizingStrategy::default(),
      kelly_fraction: params.kelly_fraction,
      edge: params.edge,
      hot_streak_wins: params.hot_streak_wins,
      hot_boost: params.hot_boost,
      cold_streak_losses: params.cold_streak_losses,
      cold_cut: params.cold_cut,
    }
  }
}

/// HTTP API server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  /// API server bind address.
  pub bind_address: String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      bind_address: default_bind_address(),
    }
  }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
  /// Directory for the ledger document and result journal.
  pub data_dir: String,
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_bind_address() -> String {
  "127.0.0.1:8080".to_string()
}

fn default_data_dir() -> String {
  "data".to_string()
}
