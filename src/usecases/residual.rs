//! Residual Settlement - Leftover Pivot/Target Positions
//!
//! After the basket is converted, the target and pivot assets may still
//! carry a small nonzero position (pool fees and rounding on the pump and
//! unwind legs). Positive positions are sold off; negative ones are bought
//! back exactly, at whatever price the route gives. That cost lands in the
//! final profit figure rather than failing the session.

use alloy::primitives::{Address, U256};
use tracing::debug;

use crate::domain::error::EngineError;
use crate::domain::execution::unbounded_limit;
use crate::domain::registry::{RouteRegistry, RouteSource};
use crate::domain::route::{AssetId, Route};
use crate::domain::units::{to_debit, to_signed};
use crate::ports::venue::{SwapRequest, VenueSession};

/// What residual settlement did for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidualAction {
  /// Position was already zero.
  Flat,
  /// Positive position in the payment asset, left for profit extraction.
  KeptAsPayment,
  /// Positive position sold through `route`.
  Sold { source: RouteSource, route: Route, amount: U256 },
  /// Negative position bought back through `route`.
  Covered { source: RouteSource, route: Route, amount: U256 },
}

/// Settles one asset's residual position inside an open session.
pub struct ResidualSettlement<'a> {
  registry: &'a RouteRegistry,
  engine: Address,
  payment_asset: AssetId,
}

impl<'a> ResidualSettlement<'a> {
  pub fn new(registry: &'a RouteRegistry, engine: Address, payment_asset: AssetId) -> Self {
    Self {
      registry,
      engine,
      payment_asset,
    }
  }

  /// Bring `asset`'s position to zero (or leave it for stage 9 if it is payment).
  pub async fn settle(
    &self,
    session: &mut dyn VenueSession,
    asset: AssetId,
  ) -> Result<ResidualAction, EngineError> {
    let position = session.position(self.engine, asset).await?;

    if position.is_zero() {
      return Ok(ResidualAction::Flat);
    }
    if position.is_positive() && asset == self.payment_asset {
      debug!(asset = %asset, position = %position, "Residual is payment asset, kept");
      return Ok(ResidualAction::KeptAsPayment);
    }

    let (source, route) = self
      .registry
      .residual_route(asset)
      .ok_or(EngineError::UnresolvedResidual(asset))?;
    let amount = position.unsigned_abs();

    if position.is_positive() {
      let zero_for_one = route
        .sell_direction(asset)
        .ok_or(EngineError::InvalidRoute { asset, route })?;
      session
        .swap(&SwapRequest {
          route,
          zero_for_one,
          amount_specified: to_debit(amount)?,
          price_limit: unbounded_limit(zero_for_one),
        })
        .await?;
      debug!(asset = %asset, amount = %amount, ?source, "Residual credit sold");
      Ok(ResidualAction::Sold { source, route, amount })
    } else {
      let zero_for_one = route
        .buy_direction(asset)
        .ok_or(EngineError::InvalidRoute { asset, route })?;
      session
        .swap(&SwapRequest {
          route,
          zero_for_one,
          amount_specified: to_signed(amount)?,
          price_limit: unbounded_limit(zero_for_one),
        })
        .await?;
      debug!(asset = %asset, amount = %amount, ?source, "Residual debt covered");
      Ok(ResidualAction::Covered { source, route, amount })
    }
  }
}
