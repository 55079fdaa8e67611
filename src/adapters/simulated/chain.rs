//! Simulated Chain - In-Memory Token Balances and Pools
//!
//! Holds every real balance plus the constant-product pools backing the
//! simulated venue. The whole state is one clonable value, so a venue
//! session can snapshot it on open and restore it on abort.

use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::amm::ConstantProductPool;
use crate::domain::error::TokenError;
use crate::domain::route::{AssetId, Route};
use crate::ports::token_bank::TokenBank;

/// Everything a session may touch.
#[derive(Debug, Clone, Default)]
pub struct ChainState {
    balances: HashMap<(AssetId, Address), U256>,
    pools: HashMap<Route, ConstantProductPool>,
}

impl ChainState {
    pub fn balance_of(&self, asset: AssetId, holder: Address) -> U256 {
        self.balances
            .get(&(asset, holder))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    pub fn mint(&mut self, asset: AssetId, holder: Address, amount: U256) -> Result<(), TokenError> {
        let balance = self.balances.entry((asset, holder)).or_insert(U256::ZERO);
        *balance = balance
            .checked_add(amount)
            .ok_or(TokenError::Overflow { asset, holder })?;
        Ok(())
    }

    pub fn transfer(
        &mut self,
        asset: AssetId,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                asset,
                holder: from,
                available,
                required: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        // Credit first so an overflow leaves the sender untouched.
        self.mint(asset, to, amount)?;
        self.balances.insert((asset, from), available - amount);
        Ok(())
    }

    pub fn pool(&self, route: &Route) -> Option<&ConstantProductPool> {
        self.pools.get(route)
    }

    pub fn pool_mut(&mut self, route: &Route) -> Option<&mut ConstantProductPool> {
        self.pools.get_mut(route)
    }
}

/// Shared in-memory ledger of real balances and pools.
#[derive(Debug, Default)]
pub struct SimulatedChain {
    state: RwLock<ChainState>,
}

impl SimulatedChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` out of thin air.
    pub async fn mint(&self, asset: AssetId, holder: Address, amount: U256) -> Result<(), TokenError> {
        self.state.write().await.mint(asset, holder, amount)
    }

    /// Create a pool and credit its reserves to `custodian`.
    pub async fn add_pool(
        &self,
        route: Route,
        reserve0: U256,
        reserve1: U256,
        custodian: Address,
    ) -> Result<(), TokenError> {
        let mut state = self.state.write().await;
        state.mint(route.asset0, custodian, reserve0)?;
        state.mint(route.asset1, custodian, reserve1)?;
        state
            .pools
            .insert(route, ConstantProductPool::new(reserve0, reserve1, route.fee_pips));
        debug!(route = %route, reserve0 = %reserve0, reserve1 = %reserve1, "Pool added");
        Ok(())
    }

    pub async fn pool(&self, route: &Route) -> Option<ConstantProductPool> {
        self.state.read().await.pool(route).copied()
    }

    /// WAD price of `asset` quoted in the route's other asset.
    pub async fn spot_price(&self, route: &Route, asset: AssetId) -> Option<U256> {
        let pool = self.pool(route).await?;
        if asset == route.asset0 {
            pool.price0_wad().ok()
        } else if asset == route.asset1 {
            pool.price1_wad().ok()
        } else {
            None
        }
    }

    pub(crate) async fn snapshot(&self) -> ChainState {
        self.state.read().await.clone()
    }

    pub(crate) async fn restore(&self, state: ChainState) {
        *self.state.write().await = state;
    }

    /// Run `f` against the state under the write lock.
    pub(crate) async fn with_state<R>(&self, f: impl FnOnce(&mut ChainState) -> R + Send) -> R {
        let mut state = self.state.write().await;
        f(&mut state)
    }
}

#[async_trait]
impl TokenBank for SimulatedChain {
    async fn balance_of(&self, asset: AssetId, holder: Address) -> Result<U256, TokenError> {
        Ok(self.state.read().await.balance_of(asset, holder))
    }

    async fn transfer(
        &self,
        asset: AssetId,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        self.state.write().await.transfer(asset, from, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transfer_moves_balance() {
        let chain = SimulatedChain::new();
        let (asset, alice, bob) = (
            Address::repeat_byte(1),
            Address::repeat_byte(0xA),
            Address::repeat_byte(0xB),
        );
        chain.mint(asset, alice, U256::from(100)).await.unwrap();
        chain.transfer(asset, alice, bob, U256::from(40)).await.unwrap();

        assert_eq!(chain.balance_of(asset, alice).await.unwrap(), U256::from(60));
        assert_eq!(chain.balance_of(asset, bob).await.unwrap(), U256::from(40));
    }

    #[tokio::test]
    async fn test_overdraft_rejected() {
        let chain = SimulatedChain::new();
        let err = chain
            .transfer(
                Address::repeat_byte(1),
                Address::repeat_byte(0xA),
                Address::repeat_byte(0xB),
                U256::from(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::InsufficientBalance { .. }));
    }

    #[tokio::test]
    async fn test_snapshot_restore() {
        let chain = SimulatedChain::new();
        let (asset, holder) = (Address::repeat_byte(1), Address::repeat_byte(0xA));
        let snapshot = chain.snapshot().await;
        chain.mint(asset, holder, U256::from(5)).await.unwrap();
        chain.restore(snapshot).await;
        assert_eq!(chain.balance_of(asset, holder).await.unwrap(), U256::ZERO);
    }

    #[tokio::test]
    async fn test_pool_reserves_held_by_custodian() {
        let chain = SimulatedChain::new();
        let route = Route::new(Address::repeat_byte(1), Address::repeat_byte(2), 0, 1);
        let venue = Address::repeat_byte(0xEE);
        chain
            .add_pool(route, U256::from(1000), U256::from(2000), venue)
            .await
            .unwrap();
        assert_eq!(
            chain.balance_of(route.asset1, venue).await.unwrap(),
            U256::from(2000)
        );
        assert_eq!(
            chain.spot_price(&route, route.asset0).await,
            Some(U256::from(2) * crate::domain::amm::WAD)
        );
    }
}
