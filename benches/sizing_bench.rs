//! Sizing Benchmarks — Hot-Path Performance Validation
//!
//! Benchmarks the domain functions that run on every plan request:
//! both sizing strategies and the full planning step.
//!
//! Run with: cargo bench --bench sizing_bench

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal_macros::dec;

use stakekeeper::domain::ledger::{BetResult, LedgerState, StakingConfig};
use stakekeeper::domain::policy;
use stakekeeper::domain::sizing::{
    FractionalKellySizer, KellyParams, StakeSizer, StreakTableSizer,
};

/// A ledger with a mixed 50-entry history, the realistic steady state.
fn seeded_ledger() -> LedgerState {
    let mut ledger = LedgerState::new(StakingConfig::default());
    for i in 0..50 {
        let result = if i % 3 == 0 {
            BetResult::Loss
        } else {
            BetResult::Win
        };
        policy::apply_result(&mut ledger, result, None, Some(dec!(5)), Utc::now());
    }
    ledger.resume();
    ledger
}

/// Benchmark the streak-table fraction computation.
fn bench_streak_table_fraction(c: &mut Criterion) {
    let ledger = seeded_ledger();

    c.bench_function("streak_table_fraction", |b| {
        b.iter(|| {
            let _sized = StreakTableSizer.fraction(&ledger, black_box(dec!(1.90)));
        });
    });
}

/// Benchmark the fractional-Kelly fraction computation.
fn bench_kelly_fraction(c: &mut Criterion) {
    let ledger = seeded_ledger();
    let sizer = FractionalKellySizer::new(KellyParams::default());

    c.bench_function("fractional_kelly_fraction", |b| {
        b.iter(|| {
            let _sized = sizer.fraction(&ledger, black_box(dec!(1.90)));
        });
    });
}

/// Benchmark a full planning step including the exposure cap.
fn bench_plan_stake(c: &mut Criterion) {
    let ledger = seeded_ledger();
    let today = Utc::now().date_naive();

    c.bench_function("plan_stake_full", |b| {
        b.iter(|| {
            let mut scratch = ledger.clone();
            let _plan = policy::plan_stake(
                &mut scratch,
                &StreakTableSizer,
                black_box(Some(dec!(1.90))),
                today,
            );
        });
    });
}

/// Benchmark the streak scan over a full 5000-entry history.
fn bench_streak_scan(c: &mut Criterion) {
    let mut ledger = LedgerState::new(StakingConfig::default());
    for _ in 0..5000 {
        policy::apply_result(&mut ledger, BetResult::Win, None, Some(dec!(1)), Utc::now());
    }

    c.bench_function("streak_scan_full_history", |b| {
        b.iter(|| {
            let _streak = black_box(&ledger).streak();
        });
    });
}

criterion_group!(
    benches,
    bench_streak_table_fraction,
    bench_kelly_fraction,
    bench_plan_stake,
    bench_streak_scan,
);
criterion_main!(benches);
