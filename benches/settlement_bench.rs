//! Settlement Benchmarks - Hot-Path Performance Validation
//!
//! Benchmarks the pool math every swap runs, residual route resolution,
//! and one full settlement session against the simulated venue seeded
//! from the shipped `config.toml`.
//!
//! Run with: cargo bench --bench settlement_bench

use std::sync::Arc;

use alloy::primitives::{Address, I256, U256};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use claim_arb_engine::adapters::simulated::SimulatedWorld;
use claim_arb_engine::config::loader::load_config;
use claim_arb_engine::domain::amm::{ConstantProductPool, WAD};
use claim_arb_engine::domain::ledger::PositionLedger;
use claim_arb_engine::domain::registry::RouteRegistry;
use claim_arb_engine::domain::route::{CanonicalRoutes, Route};
use claim_arb_engine::usecases::SettlementEngine;

fn reserve() -> U256 {
    U256::from(1_000_000u64) * WAD
}

/// Exact-input quote on a deep pool.
fn bench_quote_exact_in(c: &mut Criterion) {
    let pool = ConstantProductPool::new(reserve(), reserve(), 3000);

    c.bench_function("amm_quote_exact_in", |b| {
        b.iter(|| pool.quote_exact_in(black_box(true), black_box(U256::from(10u64) * WAD)));
    });
}

/// Exact-output swap including the reserve update.
fn bench_swap_exact_out(c: &mut Criterion) {
    let amount = I256::try_from(U256::from(10u64) * WAD).unwrap();

    c.bench_function("amm_swap_exact_out", |b| {
        b.iter(|| {
            let mut pool = ConstantProductPool::new(reserve(), reserve(), 3000);
            pool.swap(black_box(false), black_box(amount))
        });
    });
}

/// Residual route resolution through the fallback chain.
fn bench_residual_route(c: &mut Criterion) {
    let a = Address::repeat_byte;
    let mut registry = RouteRegistry::new();
    registry.set_canonical_routes(CanonicalRoutes {
        pivot: Route::new(a(1), a(2), 3000, 60),
        profit: Route::new(a(3), a(4), 500, 10),
        slippage_cover: Route::new(a(1), a(3), 500, 10),
        pivot_is_asset0: true,
    });

    c.bench_function("registry_residual_route_fallback", |b| {
        b.iter(|| registry.residual_route(black_box(a(1))));
    });
}

/// Ledger updates for a typical nine-stage session.
fn bench_ledger(c: &mut Criterion) {
    let who = Address::repeat_byte(0xE0);
    let delta = I256::try_from(1_000_000_000u64).unwrap();

    c.bench_function("ledger_apply_20", |b| {
        b.iter(|| {
            let mut ledger = PositionLedger::new();
            for i in 0..20u8 {
                let _ = ledger.apply(who, Address::repeat_byte(i % 6), black_box(delta));
            }
            ledger.is_settled()
        });
    });
}

/// One full session: seed world, execute, commit.
fn bench_full_session(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let config = load_config(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml")).unwrap();
    let canonical = config.registry.canonical.canonical();
    let params = config.execution.params(canonical.pivot_is_asset0).unwrap();
    let config = &config;

    c.bench_function("settlement_full_session", |b| {
        b.to_async(&rt).iter(|| async move {
            let world = SimulatedWorld::from_config(&config.simulation, config.execution.decimals)
                .await
                .unwrap();
            let engine = SettlementEngine::new(
                config.engine.address,
                config.engine.owner,
                Arc::clone(&world.venue),
                Arc::clone(&world.yield_source),
                Arc::clone(&world.chain),
                config.registry.registry(),
            );
            engine.execute(config.execution.caller, params).await
        });
    });
}

criterion_group!(
    benches,
    bench_quote_exact_in,
    bench_swap_exact_out,
    bench_residual_route,
    bench_ledger,
    bench_full_session,
);
criterion_main!(benches);
