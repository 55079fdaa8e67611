//! Simulated Yield Source - Price-Gated Basket Sale
//!
//! The accrued basket is simply whatever strategy assets the source's
//! address holds on the simulated chain. A claim checks the gate price on
//! a pool, pulls the payment from the claimant and pushes the whole
//! basket out. Since every effect is a chain balance change, a rolled
//! back session also un-claims the basket.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::error::{TokenError, YieldSourceError};
use crate::domain::route::{AssetId, Route};
use crate::ports::token_bank::TokenBank;
use crate::ports::yield_source::{ClaimReceipt, StrategyId, YieldSource};

use super::chain::SimulatedChain;

/// Claim is only allowed once `target` trades at or above `threshold`
/// (WAD, quoted in the route's other asset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceGate {
    pub route: Route,
    pub target: AssetId,
    pub threshold: U256,
}

/// Mutable yield source settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YieldSourceSettings {
    pub payment_asset: AssetId,
    /// Payment pulled per claim, in payment-asset base units.
    pub price: U256,
    /// Registered strategies and the asset each distributes.
    pub strategies: Vec<(StrategyId, AssetId)>,
    pub gate: Option<PriceGate>,
}

/// In-memory yield accumulator.
pub struct SimulatedYieldSource {
    address: Address,
    chain: Arc<SimulatedChain>,
    settings: RwLock<YieldSourceSettings>,
}

impl SimulatedYieldSource {
    pub fn new(address: Address, chain: Arc<SimulatedChain>, settings: YieldSourceSettings) -> Self {
        Self {
            address,
            chain,
            settings: RwLock::new(settings),
        }
    }

    /// Credit accrued yield in `asset` to the source.
    pub async fn accrue(&self, asset: AssetId, amount: U256) -> Result<(), TokenError> {
        self.chain.mint(asset, self.address, amount).await
    }

    pub async fn set_payment_asset(&self, asset: AssetId) {
        self.settings.write().await.payment_asset = asset;
    }

    pub async fn set_price(&self, price: U256) {
        self.settings.write().await.price = price;
    }

    pub async fn register_strategy(&self, id: StrategyId, asset: AssetId) {
        let mut settings = self.settings.write().await;
        settings.strategies.retain(|(existing, _)| *existing != id);
        settings.strategies.push((id, asset));
    }

    async fn check_gate(&self, gate: &PriceGate) -> Result<(), YieldSourceError> {
        let price = self
            .chain
            .spot_price(&gate.route, gate.target)
            .await
            .ok_or_else(|| {
                YieldSourceError::Unavailable(format!("no gate pool for {}", gate.route))
            })?;
        if price < gate.threshold {
            return Err(YieldSourceError::PriceGateUnmet {
                price,
                threshold: gate.threshold,
            });
        }
        debug!(price = %price, threshold = %gate.threshold, "Price gate cleared");
        Ok(())
    }
}

#[async_trait]
impl YieldSource for SimulatedYieldSource {
    fn address(&self) -> Address {
        self.address
    }

    async fn current_payment_asset(&self) -> Result<AssetId, YieldSourceError> {
        Ok(self.settings.read().await.payment_asset)
    }

    async fn registered_strategies(&self) -> Result<Vec<StrategyId>, YieldSourceError> {
        Ok(self
            .settings
            .read()
            .await
            .strategies
            .iter()
            .map(|(id, _)| *id)
            .collect())
    }

    async fn strategy_asset(&self, id: StrategyId) -> Result<AssetId, YieldSourceError> {
        self.settings
            .read()
            .await
            .strategies
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, asset)| *asset)
            .ok_or(YieldSourceError::UnknownStrategy(id))
    }

    async fn claim(&self, claimant: Address) -> Result<ClaimReceipt, YieldSourceError> {
        let settings = self.settings.read().await.clone();
        if let Some(gate) = &settings.gate {
            self.check_gate(gate).await?;
        }

        // Snapshot the basket before the payment lands, in case the
        // payment asset is itself a strategy asset.
        let mut basket: Vec<(AssetId, U256)> = Vec::new();
        for (_, asset) in &settings.strategies {
            if basket.iter().any(|(held, _)| held == asset) {
                continue;
            }
            let balance = self.chain.balance_of(*asset, self.address).await?;
            if !balance.is_zero() {
                basket.push((*asset, balance));
            }
        }

        self.chain
            .transfer(settings.payment_asset, claimant, self.address, settings.price)
            .await
            .map_err(|err| match err {
                TokenError::InsufficientBalance { .. } => YieldSourceError::InsufficientPayment {
                    asset: settings.payment_asset,
                    required: settings.price,
                },
                other => other.into(),
            })?;

        for (asset, amount) in &basket {
            self.chain
                .transfer(*asset, self.address, claimant, *amount)
                .await?;
        }

        info!(
            claimant = %claimant,
            paid = %settings.price,
            basket_assets = basket.len(),
            "Basket claimed"
        );
        Ok(ClaimReceipt {
            payment_asset: settings.payment_asset,
            paid: settings.price,
            basket,
        })
    }
}
