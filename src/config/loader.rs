//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters, and
//! providing clear error messages for misconfiguration. A missing file
//! is not an error: the defaults describe a runnable paper ledger.

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - The file exists but can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  if !path.exists() {
    info!(path = %path.display(), "No config file found, using defaults");
    let config = AppConfig::default();
    validate_config(&config)?;
    return Ok(config);
  }

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config: AppConfig = toml::from_str(&content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  info!(
    strategy = ?config.sizing.strategy,
    bankroll_seed = %config.staking.bankroll_seed,
    base_fraction = %config.staking.base_fraction,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Positive seeds and stakes
/// - Fractions and thresholds inside their valid intervals
/// - A coherent `[min_fraction, max_fraction]` clamp band
/// - Odds that offer a payout
fn validate_config(config: &AppConfig) -> Result<()> {
  let staking = &config.staking;

  anyhow::ensure!(
    staking.bankroll_seed > Decimal::ZERO,
    "bankroll_seed must be positive, got {}",
    staking.bankroll_seed
  );
  anyhow::ensure!(
    staking.base_fraction > Decimal::ZERO && staking.base_fraction <= Decimal::ONE,
    "base_fraction must be in (0, 1], got {}",
    staking.base_fraction
  );
  anyhow::ensure!(
    staking.default_odds >= dec!(1.01),
    "default_odds must be >= 1.01, got {}",
    staking.default_odds
  );
  anyhow::ensure!(
    staking.streak_window >= 1,
    "streak_window must be >= 1, got {}",
    staking.streak_window
  );
  for (i, mult) in staking.aggression_by_wins.iter().enumerate() {
    anyhow::ensure!(
      *mult > Decimal::ZERO,
      "aggression_by_wins[{i}] must be positive, got {mult}"
    );
  }
  anyhow::ensure!(
    staking.min_fraction > Decimal::ZERO,
    "min_fraction must be positive, got {}",
    staking.min_fraction
  );
  anyhow::ensure!(
    staking.max_fraction >= staking.min_fraction
      && staking.max_fraction <= Decimal::ONE,
    "max_fraction must be in [min_fraction, 1], got {}",
    staking.max_fraction
  );
  anyhow::ensure!(
    staking.hot_bonus_on_pure_streak > Decimal::ZERO,
    "hot_bonus_on_pure_streak must be positive, got {}",
    staking.hot_bonus_on_pure_streak
  );
  anyhow::ensure!(
    staking.drawdown_pause_threshold > Decimal::ZERO
      && staking.drawdown_pause_threshold < Decimal::ONE,
    "drawdown_pause_threshold must be in (0, 1), got {}",
    staking.drawdown_pause_threshold
  );
  anyhow::ensure!(
    staking.daily_exposure_cap > Decimal::ZERO
      && staking.daily_exposure_cap < Decimal::ONE,
    "daily_exposure_cap must be in (0, 1), got {}",
    staking.daily_exposure_cap
  );
  anyhow::ensure!(
    staking.fallback_stake > Decimal::ZERO,
    "fallback_stake must be positive, got {}",
    staking.fallback_stake
  );

  let sizing = &config.sizing;
  anyhow::ensure!(
    sizing.kelly_fraction > Decimal::ZERO && sizing.kelly_fraction <= Decimal::ONE,
    "kelly_fraction must be in (0, 1], got {}",
    sizing.kelly_fraction
  );
  anyhow::ensure!(
    sizing.edge >= Decimal::ZERO && sizing.edge < Decimal::ONE,
    "edge must be in [0, 1), got {}",
    sizing.edge
  );
  anyhow::ensure!(
    sizing.hot_boost > Decimal::ZERO,
    "hot_boost must be positive, got {}",
    sizing.hot_boost
  );
  anyhow::ensure!(
    sizing.cold_cut > Decimal::ZERO && sizing.cold_cut <= Decimal::ONE,
    "cold_cut must be in (0, 1], got {}",
    sizing.cold_cut
  );

  anyhow::ensure!(
    !config.server.bind_address.is_empty(),
    "server bind_address must not be empty"
  );
  anyhow::ensure!(
    !config.persistence.data_dir.is_empty(),
    "persistence data_dir must not be empty"
  );

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_missing_file_yields_valid_defaults() {
    let config = load_config("nonexistent.toml").unwrap();
    assert_eq!(config.staking.streak_window, 3);
    assert_eq!(config.server.bind_address, "127.0.0.1:8080");
  }

  #[test]
  fn test_defaults_pass_validation() {
    assert!(validate_config(&AppConfig::default()).is_ok());
  }

  #[test]
  fn test_rejects_inverted_clamp_band() {
    let mut config = AppConfig::default();
    config.staking.min_fraction = dec!(0.2);
    config.staking.max_fraction = dec!(0.1);
    assert!(validate_config(&config).is_err());
  }

  #[test]
  fn test_rejects_out_of_range_threshold() {
    let mut config = AppConfig::default();
    config.staking.drawdown_pause_threshold = dec!(1.5);
    assert!(validate_config(&config).is_err());
  }

  #[test]
  fn test_rejects_zero_streak_window() {
    let mut config = AppConfig::default();
    config.staking.streak_window = 0;
    assert!(validate_config(&config).is_err());
  }

  #[test]
  fn test_parses_partial_toml_with_defaults() {
    let config: AppConfig = toml::from_str(
      r#"
      [staking]
      bankroll_seed = 500.0
      base_fraction = 0.05

      [sizing]
      strategy = "fractional-kelly"
      "#,
    )
    .unwrap();

    assert_eq!(config.staking.bankroll_seed, dec!(500));
    assert_eq!(config.staking.base_fraction, dec!(0.05));
    assert_eq!(config.sizing.strategy, super::super::SizingStrategy::FractionalKelly);
    // untouched sections keep defaults
    assert_eq!(config.persistence.data_dir, "data");
  }
}
