//! Prometheus Metrics Registry - Ledger Observability
//!
//! Registers and exposes Prometheus metrics for the bankroll manager.
//! Covers plan/result throughput, persistence health, and the current
//! ledger posture (bankroll, drawdown, pause flag). Rendered by the
//! HTTP adapter on `/metrics`.

use prometheus::{
    Encoder, Gauge, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use rust_decimal::prelude::ToPrimitive;

use crate::domain::policy::StatusView;

/// Centralized Prometheus metrics for the bankroll manager.
///
/// All metrics follow the naming convention `stakekeeper_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Stake plans computed, labelled by outcome (planned / refused).
    pub plans_computed: IntCounterVec,
    /// Results applied, labelled by result (W / L).
    pub results_applied: IntCounterVec,
    /// Best-effort persistence writes that failed.
    pub persistence_failures: IntCounter,
    /// Loads that recovered a corrupt document with defaults.
    pub state_recoveries: IntCounter,
    /// Current bankroll gauge.
    pub bankroll: Gauge,
    /// Current drawdown fraction gauge.
    pub drawdown: Gauge,
    /// Sticky pause flag gauge (1 = paused).
    pub paused: Gauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let plans_computed = IntCounterVec::new(
            Opts::new("stakekeeper_plans_computed_total", "Stake plans computed"),
            &["outcome"],
        )?;

        let results_applied = IntCounterVec::new(
            Opts::new("stakekeeper_results_applied_total", "Results applied"),
            &["result"],
        )?;

        let persistence_failures = IntCounter::new(
            "stakekeeper_persistence_failures_total",
            "Best-effort ledger writes that failed",
        )?;

        let state_recoveries = IntCounter::new(
            "stakekeeper_state_recoveries_total",
            "Corrupt ledger documents recovered with defaults",
        )?;

        let bankroll = Gauge::new("stakekeeper_bankroll", "Current bankroll")?;

        let drawdown = Gauge::new(
            "stakekeeper_drawdown",
            "Current drawdown fraction from the high-water mark",
        )?;

        let paused = Gauge::new(
            "stakekeeper_paused",
            "Whether the sticky pause flag is set (1=yes, 0=no)",
        )?;

        // Register all metrics
        registry.register(Box::new(plans_computed.clone()))?;
        registry.register(Box::new(results_applied.clone()))?;
        registry.register(Box::new(persistence_failures.clone()))?;
        registry.register(Box::new(state_recoveries.clone()))?;
        registry.register(Box::new(bankroll.clone()))?;
        registry.register(Box::new(drawdown.clone()))?;
        registry.register(Box::new(paused.clone()))?;

        Ok(Self {
            registry,
            plans_computed,
            results_applied,
            persistence_failures,
            state_recoveries,
            bankroll,
            drawdown,
            paused,
        })
    }

    /// Refresh the posture gauges from a status projection.
    pub fn observe_status(&self, status: &StatusView) {
        self.bankroll
            .set(status.bankroll.to_f64().unwrap_or(0.0));

        let drawdown = if status.high_water.is_zero() {
            rust_decimal::Decimal::ZERO
        } else {
            (status.high_water - status.bankroll) / status.high_water
        };
        self.drawdown.set(drawdown.to_f64().unwrap_or(0.0));

        self.paused.set(if status.paused { 1.0 } else { 0.0 });
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
