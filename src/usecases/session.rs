//! Session Orchestrator - Nine-Stage Settlement Pipeline
//!
//! Runs inside a venue session on behalf of the engine:
//! 1. Cache the yield source's payment asset
//! 2. Validate strategy coverage
//! 3. Pump the target asset's price with pivot liquidity
//! 4. Borrow the claim payment from the venue
//! 5. Claim the basket
//! 6. Unwind the pump
//! 7. Deposit and convert the basket into the payment asset
//! 8. Settle residual target/pivot positions
//! 9. Convert the payment surplus to the base asset and pay the caller
//!
//! Each stage consumes the previous state and produces the next one, so
//! data cached early (payment asset, pumped amount) is carried forward
//! explicitly. The first failure short-circuits the loop; the venue then
//! discards every effect of the session.

use alloy::primitives::{Address, I256, U256};
use tracing::{debug, info, instrument};

use crate::domain::error::EngineError;
use crate::domain::execution::{SessionOutcome, SessionPayload, unbounded_limit};
use crate::domain::registry::RouteRegistry;
use crate::domain::route::{AssetId, CanonicalRoutes};
use crate::domain::units::to_debit;
use crate::ports::token_bank::TokenBank;
use crate::ports::venue::{SwapRequest, VenueSession};
use crate::ports::yield_source::YieldSource;

use super::coverage::CoverageValidator;
use super::residual::ResidualSettlement;

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  SnapshotPaymentAsset,
  ValidateCoverage,
  Pump,
  Borrow,
  Claim,
  Unwind,
  ConvertBasket,
  ResolveResiduals,
  ExtractProfit,
}

impl Stage {
  /// Stable name for logs.
  pub fn name(self) -> &'static str {
    match self {
      Self::SnapshotPaymentAsset => "snapshot_payment_asset",
      Self::ValidateCoverage => "validate_coverage",
      Self::Pump => "pump",
      Self::Borrow => "borrow",
      Self::Claim => "claim",
      Self::Unwind => "unwind",
      Self::ConvertBasket => "convert_basket",
      Self::ResolveResiduals => "resolve_residuals",
      Self::ExtractProfit => "extract_profit",
    }
  }
}

/// Assets fixed at the start of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cached {
  payment_asset: AssetId,
  base_asset: AssetId,
}

/// State between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
  Opened,
  PaymentCached(Cached),
  Covered(Cached),
  Pumped { cached: Cached, target_acquired: U256 },
  Borrowed { cached: Cached, target_acquired: U256 },
  Claimed { cached: Cached, target_acquired: U256 },
  Unwound(Cached),
  Converted(Cached),
  Resolved(Cached),
  Settled(SessionOutcome),
}

impl SessionState {
  /// Stage that consumes this state, `None` once settled.
  fn next_stage(&self) -> Option<Stage> {
    match self {
      Self::Opened => Some(Stage::SnapshotPaymentAsset),
      Self::PaymentCached(_) => Some(Stage::ValidateCoverage),
      Self::Covered(_) => Some(Stage::Pump),
      Self::Pumped { .. } => Some(Stage::Borrow),
      Self::Borrowed { .. } => Some(Stage::Claim),
      Self::Claimed { .. } => Some(Stage::Unwind),
      Self::Unwound(_) => Some(Stage::ConvertBasket),
      Self::Converted(_) => Some(Stage::ResolveResiduals),
      Self::Resolved(_) => Some(Stage::ExtractProfit),
      Self::Settled(_) => None,
    }
  }
}

/// Positive part of a signed delta.
fn credit(delta: I256) -> U256 {
  if delta.is_positive() {
    delta.unsigned_abs()
  } else {
    U256::ZERO
  }
}

/// Drives one session from open to settled.
pub struct SessionOrchestrator<'a, Y: YieldSource, T: TokenBank> {
  engine: Address,
  yield_source: &'a Y,
  tokens: &'a T,
  coverage: &'a CoverageValidator<Y>,
  registry: &'a RouteRegistry,
  canonical: CanonicalRoutes,
  payload: SessionPayload,
}

impl<'a, Y: YieldSource, T: TokenBank> SessionOrchestrator<'a, Y, T> {
  /// Bind the collaborators and this session's registry snapshot.
  pub fn new(
    engine: Address,
    yield_source: &'a Y,
    tokens: &'a T,
    coverage: &'a CoverageValidator<Y>,
    registry: &'a RouteRegistry,
    canonical: CanonicalRoutes,
    payload: SessionPayload,
  ) -> Self {
    Self {
      engine,
      yield_source,
      tokens,
      coverage,
      registry,
      canonical,
      payload,
    }
  }

  /// Run every stage in order; the first error aborts the session.
  #[instrument(skip_all, fields(caller = %self.payload.caller))]
  pub async fn run(&self, session: &mut dyn VenueSession) -> Result<SessionOutcome, EngineError> {
    let mut state = SessionState::Opened;
    loop {
      if let SessionState::Settled(outcome) = state {
        info!(
          base_asset = %outcome.base_asset,
          profit = %outcome.profit,
          payment_surplus = %outcome.payment_surplus,
          "Session settled"
        );
        return Ok(outcome);
      }
      if let Some(stage) = state.next_stage() {
        debug!(stage = stage.name(), "Entering stage");
      }
      state = self.advance(state, session).await?;
    }
  }

  async fn advance(
    &self,
    state: SessionState,
    session: &mut dyn VenueSession,
  ) -> Result<SessionState, EngineError> {
    let next = match state {
      SessionState::Opened => SessionState::PaymentCached(self.snapshot_payment_asset().await?),
      SessionState::PaymentCached(cached) => {
        self.coverage.validate(self.registry.known_assets()).await?;
        SessionState::Covered(cached)
      }
      SessionState::Covered(cached) => SessionState::Pumped {
        cached,
        target_acquired: self.pump(session).await?,
      },
      SessionState::Pumped {
        cached,
        target_acquired,
      } => {
        self.borrow(session, cached.payment_asset).await?;
        SessionState::Borrowed {
          cached,
          target_acquired,
        }
      }
      SessionState::Borrowed {
        cached,
        target_acquired,
      } => {
        self.claim(session, cached.payment_asset).await?;
        SessionState::Claimed {
          cached,
          target_acquired,
        }
      }
      SessionState::Claimed {
        cached,
        target_acquired,
      } => {
        self.unwind(session, target_acquired).await?;
        SessionState::Unwound(cached)
      }
      SessionState::Unwound(cached) => {
        self.convert_basket(session, cached.payment_asset).await?;
        SessionState::Converted(cached)
      }
      SessionState::Converted(cached) => {
        self.resolve_residuals(session, cached.payment_asset).await?;
        SessionState::Resolved(cached)
      }
      SessionState::Resolved(cached) => {
        SessionState::Settled(self.extract_profit(session, cached).await?)
      }
      settled @ SessionState::Settled(_) => settled,
    };
    Ok(next)
  }

  /// Stage 1: the payment asset may change between sessions, never within one.
  async fn snapshot_payment_asset(&self) -> Result<Cached, EngineError> {
    let payment_asset = self.yield_source.current_payment_asset().await?;
    let base_asset = self
      .canonical
      .base_asset(payment_asset)
      .ok_or(EngineError::ProfitRouteMismatch { payment_asset })?;
    debug!(payment_asset = %payment_asset, base_asset = %base_asset, "Payment asset cached");
    Ok(Cached {
      payment_asset,
      base_asset,
    })
  }

  /// Stage 3: exact-input pivot -> target swap; returns target received.
  async fn pump(&self, session: &mut dyn VenueSession) -> Result<U256, EngineError> {
    let route = self.canonical.pivot;
    let delta = session
      .swap(&SwapRequest {
        route,
        zero_for_one: self.canonical.pivot_is_asset0,
        amount_specified: to_debit(self.payload.params.pump_amount)?,
        price_limit: self.payload.params.pump_price_limit,
      })
      .await?;
    let acquired = credit(delta.for_asset(&route, self.canonical.target_asset()));
    debug!(pumped = %self.payload.params.pump_amount, acquired = %acquired, "Pump leg filled");
    Ok(acquired)
  }

  /// Stage 4: withdraw the payment from the venue on credit.
  async fn borrow(
    &self,
    session: &mut dyn VenueSession,
    payment_asset: AssetId,
  ) -> Result<(), EngineError> {
    let amount = self.payload.params.payment_amount;
    session.withdraw(payment_asset, self.engine, amount).await?;
    debug!(asset = %payment_asset, amount = %amount, "Payment borrowed");
    Ok(())
  }

  /// Stage 5: claim the basket while the price gate is lifted.
  ///
  /// Any part of the borrowed payment the claim did not pull is
  /// deposited straight back against the debt.
  async fn claim(
    &self,
    session: &mut dyn VenueSession,
    payment_asset: AssetId,
  ) -> Result<(), EngineError> {
    let receipt = self.yield_source.claim(self.engine).await?;
    debug!(
      paid = %receipt.paid,
      basket_assets = receipt.basket.len(),
      "Basket claimed"
    );

    let unspent = self
      .payload
      .params
      .payment_amount
      .saturating_sub(receipt.paid);
    if !unspent.is_zero() {
      session.deposit(payment_asset, unspent).await?;
      debug!(asset = %payment_asset, amount = %unspent, "Unspent payment returned");
    }
    Ok(())
  }

  /// Stage 6: sell the acquired target back into pivot.
  async fn unwind(
    &self,
    session: &mut dyn VenueSession,
    target_acquired: U256,
  ) -> Result<(), EngineError> {
    if target_acquired.is_zero() {
      debug!("Nothing acquired by the pump, unwind skipped");
      return Ok(());
    }
    session
      .swap(&SwapRequest {
        route: self.canonical.pivot,
        zero_for_one: !self.canonical.pivot_is_asset0,
        amount_specified: to_debit(target_acquired)?,
        price_limit: self.payload.params.unwind_price_limit,
      })
      .await?;
    debug!(sold = %target_acquired, "Pump unwound");
    Ok(())
  }

  /// Stage 7: deposit every known asset held and swap non-payment assets.
  async fn convert_basket(
    &self,
    session: &mut dyn VenueSession,
    payment_asset: AssetId,
  ) -> Result<(), EngineError> {
    for &asset in self.registry.known_assets() {
      let balance = self.tokens.balance_of(asset, self.engine).await?;
      if balance.is_zero() {
        continue;
      }

      let credited = session.deposit(asset, balance).await?;
      if asset == payment_asset {
        debug!(asset = %asset, amount = %credited, "Payment asset deposited as-is");
        continue;
      }

      let route = self
        .registry
        .route_for(asset)
        .copied()
        .ok_or(EngineError::MissingRoute(asset))?;
      let zero_for_one = route
        .sell_direction(asset)
        .ok_or(EngineError::InvalidRoute { asset, route })?;
      if credited.is_zero() {
        continue;
      }
      session
        .swap(&SwapRequest {
          route,
          zero_for_one,
          amount_specified: to_debit(credited)?,
          price_limit: unbounded_limit(zero_for_one),
        })
        .await?;
      debug!(asset = %asset, amount = %credited, route = %route, "Basket asset converted");
    }
    Ok(())
  }

  /// Stage 8: target first (its settlement may move pivot), then pivot.
  async fn resolve_residuals(
    &self,
    session: &mut dyn VenueSession,
    payment_asset: AssetId,
  ) -> Result<(), EngineError> {
    let settlement = ResidualSettlement::new(self.registry, self.engine, payment_asset);
    for asset in [self.canonical.target_asset(), self.canonical.pivot_asset()] {
      let action = settlement.settle(session, asset).await?;
      debug!(asset = %asset, ?action, "Residual resolved");
    }
    Ok(())
  }

  /// Stage 9: payment surplus -> base asset -> caller.
  async fn extract_profit(
    &self,
    session: &mut dyn VenueSession,
    cached: Cached,
  ) -> Result<SessionOutcome, EngineError> {
    let Cached {
      payment_asset,
      base_asset,
    } = cached;

    let payment_position = session.position(self.engine, payment_asset).await?;
    if !payment_position.is_positive() {
      return Err(EngineError::NoProfit {
        asset: payment_asset,
        position: payment_position,
      });
    }
    let payment_surplus = payment_position.unsigned_abs();

    let route = self.canonical.profit;
    let zero_for_one = route
      .sell_direction(payment_asset)
      .ok_or(EngineError::ProfitRouteMismatch { payment_asset })?;
    session
      .swap(&SwapRequest {
        route,
        zero_for_one,
        amount_specified: to_debit(payment_surplus)?,
        price_limit: unbounded_limit(zero_for_one),
      })
      .await?;

    let base_position = session.position(self.engine, base_asset).await?;
    if !base_position.is_positive() {
      return Err(EngineError::NoProfit {
        asset: base_asset,
        position: base_position,
      });
    }
    let profit = base_position.unsigned_abs();
    session
      .withdraw(base_asset, self.payload.caller, profit)
      .await?;

    Ok(SessionOutcome {
      payment_asset,
      payment_surplus,
      base_asset,
      profit,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_stages_follow_pipeline_order() {
    let cached = Cached {
      payment_asset: Address::repeat_byte(3),
      base_asset: Address::repeat_byte(4),
    };
    let states = [
      SessionState::Opened,
      SessionState::PaymentCached(cached),
      SessionState::Covered(cached),
      SessionState::Pumped {
        cached,
        target_acquired: U256::ZERO,
      },
      SessionState::Borrowed {
        cached,
        target_acquired: U256::ZERO,
      },
      SessionState::Claimed {
        cached,
        target_acquired: U256::ZERO,
      },
      SessionState::Unwound(cached),
      SessionState::Converted(cached),
      SessionState::Resolved(cached),
    ];
    let stages: Vec<_> = states.iter().filter_map(SessionState::next_stage).collect();
    assert_eq!(
      stages,
      vec![
        Stage::SnapshotPaymentAsset,
        Stage::ValidateCoverage,
        Stage::Pump,
        Stage::Borrow,
        Stage::Claim,
        Stage::Unwind,
        Stage::ConvertBasket,
        Stage::ResolveResiduals,
        Stage::ExtractProfit,
      ]
    );
  }

  #[test]
  fn test_credit_ignores_debits() {
    assert_eq!(credit(I256::try_from(-5).unwrap()), U256::ZERO);
    assert_eq!(credit(I256::try_from(5).unwrap()), U256::from(5));
  }
}
