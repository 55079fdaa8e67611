//! Simulated World - Chain, Venue and Yield Source Wired Together
//!
//! Builds the in-memory adapters from `[simulation]` config so the binary
//! can run a full settlement without any external node.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{PRICE_DECIMALS, SimulationConfig};
use crate::domain::units::to_base_units;

use super::chain::SimulatedChain;
use super::venue::SimulatedVenue;
use super::yield_source::{PriceGate, SimulatedYieldSource, YieldSourceSettings};

/// Shared handles to every simulated adapter.
pub struct SimulatedWorld {
    pub chain: Arc<SimulatedChain>,
    pub venue: Arc<SimulatedVenue>,
    pub yield_source: Arc<SimulatedYieldSource>,
}

impl SimulatedWorld {
    /// Seed pools, balances and accrued yield from config.
    pub async fn from_config(config: &SimulationConfig, decimals: u32) -> Result<Self> {
        let chain = Arc::new(SimulatedChain::new());
        let venue = Arc::new(SimulatedVenue::new(config.venue, Arc::clone(&chain)));

        for pool in &config.pools {
            let route = pool.route.route();
            // Reserves are given for the normalized orientation.
            venue
                .add_pool(
                    route,
                    to_base_units(pool.reserve0, decimals)?,
                    to_base_units(pool.reserve1, decimals)?,
                )
                .await
                .with_context(|| format!("Failed to seed pool {route}"))?;
        }

        for balance in &config.balances {
            chain
                .mint(
                    balance.asset,
                    balance.holder,
                    to_base_units(balance.amount, decimals)?,
                )
                .await
                .with_context(|| format!("Failed to seed balance of {}", balance.holder))?;
        }

        let source = &config.yield_source;
        let gate = match &source.gate {
            Some(gate) => Some(PriceGate {
                route: gate.route.route(),
                target: gate.target,
                threshold: to_base_units(gate.min_price, PRICE_DECIMALS)?,
            }),
            None => None,
        };
        let yield_source = Arc::new(SimulatedYieldSource::new(
            source.address,
            Arc::clone(&chain),
            YieldSourceSettings {
                payment_asset: source.payment_asset,
                price: to_base_units(source.price, decimals)?,
                strategies: source
                    .strategies
                    .iter()
                    .map(|strategy| (strategy.id, strategy.asset))
                    .collect(),
                gate,
            },
        ));
        for strategy in &source.strategies {
            let accrued = to_base_units(strategy.accrued, decimals)?;
            if !accrued.is_zero() {
                yield_source
                    .accrue(strategy.asset, accrued)
                    .await
                    .with_context(|| format!("Failed to accrue yield for {}", strategy.id))?;
            }
        }

        info!(
            pools = config.pools.len(),
            balances = config.balances.len(),
            strategies = source.strategies.len(),
            "Simulated world seeded"
        );

        Ok(Self {
            chain,
            venue,
            yield_source,
        })
    }
}
