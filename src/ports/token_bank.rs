//! Token Bank Port - Real Asset Balances
//!
//! ERC-20 style balance queries and transfers. Used to find the claimed
//! basket's balances and by the operator's rescue path.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::domain::error::TokenError;
use crate::domain::route::AssetId;

/// Trait for real (irreversible outside a session) token balances.
#[async_trait]
pub trait TokenBank: Send + Sync + 'static {
  /// Balance of `holder` in `asset`.
  async fn balance_of(&self, asset: AssetId, holder: Address) -> Result<U256, TokenError>;

  /// Move `amount` of `asset` from `from` to `to`.
  async fn transfer(
    &self,
    asset: AssetId,
    from: Address,
    to: Address,
    amount: U256,
  ) -> Result<(), TokenError>;
}
