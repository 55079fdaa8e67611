//! Yield Source Port - Price-Gated Claim Interface
//!
//! The yield accumulator sells its accrued basket at a discount once the
//! target asset's price clears a gate. The engine only needs the current
//! payment asset, the strategy list and the claim itself.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::domain::error::YieldSourceError;
use crate::domain::route::AssetId;

/// Strategy identifier (strategy contract address).
pub type StrategyId = Address;

/// Real transfers performed by a successful claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimReceipt {
  /// Payment asset pulled from the claimant.
  pub payment_asset: AssetId,
  /// Amount pulled.
  pub paid: U256,
  /// Assets pushed to the claimant.
  pub basket: Vec<(AssetId, U256)>,
}

/// Trait for the yield source being arbitraged.
#[async_trait]
pub trait YieldSource: Send + Sync + 'static {
  /// Address the claim payment is sent to.
  fn address(&self) -> Address;

  /// Asset currently accepted as claim payment.
  async fn current_payment_asset(&self) -> Result<AssetId, YieldSourceError>;

  /// Every registered strategy, in registration order.
  async fn registered_strategies(&self) -> Result<Vec<StrategyId>, YieldSourceError>;

  /// Asset distributed by one strategy.
  async fn strategy_asset(&self, id: StrategyId) -> Result<AssetId, YieldSourceError>;

  /// Pull the payment from `claimant` and push the basket to it.
  ///
  /// # Errors
  /// Fails if the price gate is unmet or the payment is short.
  async fn claim(&self, claimant: Address) -> Result<ClaimReceipt, YieldSourceError>;
}
