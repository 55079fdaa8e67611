//! Claim-Arbitrage Settlement Engine - Entry Point
//!
//! Runs one settlement against the in-memory venue described in
//! `config.toml` (or the path given as the first argument).
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Seed the simulated chain, venue and yield source
//! 4. Restore the persisted registry, or seed it from config
//! 5. Wire the engine, registry store and metrics recorder
//! 6. Preflight coverage check
//! 7. Execute once and report the receipt
//! 8. Drain events into metrics and log the exposition

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use claim_arb_engine::adapters::metrics::EngineMetrics;
use claim_arb_engine::adapters::persistence::JsonRegistryStore;
use claim_arb_engine::adapters::simulated::SimulatedWorld;
use claim_arb_engine::config;
use claim_arb_engine::ports::registry_store::RegistryStore;
use claim_arb_engine::usecases::SettlementEngine;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = config::loader::load_config(&path).context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.engine.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.engine.name,
        version = env!("CARGO_PKG_VERSION"),
        engine = %config.engine.address,
        config = %path,
        "Starting claim-arbitrage settlement engine"
    );

    // ── 3. Simulated world ──────────────────────────────────
    let world = SimulatedWorld::from_config(&config.simulation, config.execution.decimals)
        .await
        .context("Failed to seed simulated world")?;

    // ── 4. Registry: persisted snapshot or config seed ──────
    let store: Option<Arc<dyn RegistryStore>> = if config.engine.persist_registry {
        Some(Arc::new(
            JsonRegistryStore::new(&config.engine.state_dir)
                .await
                .context("Failed to open registry store")?,
        ))
    } else {
        None
    };
    let registry = match &store {
        Some(store) => match store.load().await.context("Failed to load registry")? {
            Some(registry) => registry,
            None => {
                let seeded = config.registry.registry();
                store
                    .save(&seeded)
                    .await
                    .context("Failed to save seeded registry")?;
                seeded
            }
        },
        None => config.registry.registry(),
    };
    let canonical = registry
        .canonical()
        .copied()
        .context("Registry has no canonical routes")?;

    // ── 5. Engine + metrics ─────────────────────────────────
    let mut engine = SettlementEngine::new(
        config.engine.address,
        config.engine.owner,
        Arc::clone(&world.venue),
        Arc::clone(&world.yield_source),
        Arc::clone(&world.chain),
        registry,
    );
    if let Some(store) = store {
        engine = engine.with_store(store);
    }
    let metrics = Arc::new(EngineMetrics::new().context("Failed to register metrics")?);
    let recorder = Arc::clone(&metrics).spawn_recorder(engine.subscribe());

    // ── 6. Preflight coverage ───────────────────────────────
    engine
        .validate_coverage()
        .await
        .context("Coverage preflight failed")?;

    // ── 7. Execute ──────────────────────────────────────────
    let params = config.execution.params(canonical.pivot_is_asset0)?;
    match engine.execute(config.execution.caller, params).await {
        Ok(receipt) => info!(
            id = %receipt.id,
            caller = %receipt.caller,
            base_asset = %receipt.outcome.base_asset,
            profit = %receipt.outcome.profit,
            payment_surplus = %receipt.outcome.payment_surplus,
            "Settlement committed"
        ),
        Err(e) if e.is_no_profit() => warn!(reason = %e, "No opportunity, nothing executed"),
        Err(e) => return Err(e).context("Settlement failed"),
    }

    // ── 8. Metrics ──────────────────────────────────────────
    drop(engine);
    recorder.await.context("Metrics recorder panicked")?;
    info!(exposition = %metrics.render()?, "Final metrics");

    info!("Shutdown complete");
    Ok(())
}
