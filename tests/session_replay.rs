//! Session Replay - Deterministic Policy Simulation
//!
//! Replays scripted win/loss sequences through full plan → apply
//! cycles to validate the staking policy, exposure caps, and the
//! drawdown auto-pause over long sessions, without any I/O.

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use stakekeeper::domain::ledger::{BetResult, LedgerState, StakingConfig};
use stakekeeper::domain::policy;
use stakekeeper::domain::sizing::{
    FractionalKellySizer, KellyParams, StakeSizer, StreakTableSizer,
};

/// One scripted betting day.
#[derive(Debug, Clone)]
struct ScriptedBet {
    /// Decimal odds offered.
    odds: Decimal,
    /// Scripted outcome.
    result: BetResult,
}

/// Replay summary.
#[derive(Debug)]
struct SessionResult {
    /// Bets actually placed (plans that were not refused).
    bets_placed: usize,
    /// Plans refused by the pause flag or daily cap.
    plans_refused: usize,
    /// Final bankroll.
    final_bankroll: Decimal,
    /// Maximum drawdown observed.
    max_drawdown: Decimal,
    /// Whether the auto-pause latched at any point.
    auto_paused: bool,
}

/// A scripted hot-then-cold session: eight wins followed by a losing
/// run long enough to cross the drawdown threshold.
fn hot_then_cold() -> Vec<ScriptedBet> {
    let mut bets = Vec::new();
    for _ in 0..8 {
        bets.push(ScriptedBet {
            odds: dec!(1.80),
            result: BetResult::Win,
        });
    }
    for _ in 0..20 {
        bets.push(ScriptedBet {
            odds: dec!(1.80),
            result: BetResult::Loss,
        });
    }
    bets
}

/// Replay a scripted session through plan → apply cycles, one bet
/// per simulated day so the daily exposure bucket rolls over between
/// bets.
fn run_session(sizer: &dyn StakeSizer, bets: &[ScriptedBet]) -> SessionResult {
    let mut ledger = LedgerState::new(StakingConfig::default());
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();

    let mut bets_placed = 0usize;
    let mut plans_refused = 0usize;
    let mut max_drawdown = Decimal::ZERO;
    let mut auto_paused = false;

    for (day, bet) in bets.iter().enumerate() {
        let now = base + Duration::days(day as i64);
        let plan =
            policy::plan_stake(&mut ledger, sizer, Some(bet.odds), now.date_naive());

        if plan.paused {
            plans_refused += 1;
            continue;
        }

        ledger.pending_plan = Some(plan);
        bets_placed += 1;

        let applied = policy::apply_result(&mut ledger, bet.result, None, None, now);
        auto_paused |= applied.auto_paused;

        let drawdown = ledger.drawdown();
        if drawdown > max_drawdown {
            max_drawdown = drawdown;
        }
    }

    SessionResult {
        bets_placed,
        plans_refused,
        final_bankroll: ledger.bankroll,
        max_drawdown,
        auto_paused,
    }
}

#[test]
fn test_hot_then_cold_latches_auto_pause() {
    let result = run_session(&StreakTableSizer, &hot_then_cold());

    assert!(result.bets_placed > 0, "session should place bets");
    assert!(
        result.auto_paused,
        "a 20-loss run must cross the 15% drawdown threshold"
    );
    assert!(
        result.plans_refused > 0,
        "plans after the auto-pause must be refused"
    );
    assert!(result.max_drawdown >= dec!(0.15));
    assert!(result.final_bankroll >= Decimal::ZERO);

    println!("=== Session Replay (streak-table) ===");
    println!("Bets placed: {}", result.bets_placed);
    println!("Plans refused: {}", result.plans_refused);
    println!("Final bankroll: {}", result.final_bankroll);
    println!("Max drawdown: {}", result.max_drawdown);
}

#[test]
fn test_pause_stops_all_further_bets() {
    // once the pause latches, every remaining plan must be refused
    let mut bets = hot_then_cold();
    for _ in 0..10 {
        bets.push(ScriptedBet {
            odds: dec!(2.00),
            result: BetResult::Win,
        });
    }

    let result = run_session(&StreakTableSizer, &bets);
    let total = result.bets_placed + result.plans_refused;
    assert_eq!(total, bets.len());
    assert!(result.auto_paused);
    // the trailing scripted wins were never bet
    assert!(result.plans_refused >= 10);
}

#[test]
fn test_kelly_session_stays_within_floor() {
    let sizer = FractionalKellySizer::new(KellyParams {
        edge: dec!(0.05),
        ..KellyParams::default()
    });
    let result = run_session(&sizer, &hot_then_cold());

    assert!(result.final_bankroll >= Decimal::ZERO);
    assert!(result.bets_placed > 0);
}

#[test]
fn test_winning_session_never_pauses() {
    let bets: Vec<ScriptedBet> = (0..30)
        .map(|_| ScriptedBet {
            odds: dec!(1.60),
            result: BetResult::Win,
        })
        .collect();

    let result = run_session(&StreakTableSizer, &bets);
    assert!(!result.auto_paused);
    assert_eq!(result.max_drawdown, Decimal::ZERO);
    assert!(result.final_bankroll > dec!(1000));
}
