//! Venue Port - Deferred-Settlement Liquidity Venue Interface
//!
//! The venue owns the per-session position ledger. A session is opened
//! with `Venue::open_session`, which hands the engine's handler a
//! `VenueSession` context; every swap, deposit and withdrawal goes
//! through that context. When the handler returns, the venue checks that
//! every position is back to zero and commits, or discards every effect
//! of the session.

use alloy::primitives::{Address, I256, U256};
use async_trait::async_trait;

use crate::domain::error::{EngineError, VenueError};
use crate::domain::execution::{SessionOutcome, SessionPayload};
use crate::domain::route::{AssetId, Route};

/// Signed per-asset amounts produced by a swap, from the caller's side.
///
/// Positive means the venue owes the caller; negative means the caller
/// owes the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceDelta {
  /// Change in `route.asset0`.
  pub amount0: I256,
  /// Change in `route.asset1`.
  pub amount1: I256,
}

impl BalanceDelta {
  /// Signed change for `asset` on `route` (zero if not an endpoint).
  pub fn for_asset(&self, route: &Route, asset: AssetId) -> I256 {
    if asset == route.asset0 {
      self.amount0
    } else if asset == route.asset1 {
      self.amount1
    } else {
      I256::ZERO
    }
  }
}

/// A single swap against one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapRequest {
  /// Pool to trade against.
  pub route: Route,
  /// `true` sells asset0 for asset1.
  pub zero_for_one: bool,
  /// Negative = exact input, positive = exact output.
  pub amount_specified: I256,
  /// WAD price bound on asset0 in asset1 after the swap.
  pub price_limit: U256,
}

/// Session context threaded through every orchestration stage.
#[async_trait]
pub trait VenueSession: Send {
  /// Swap against a route; credits/debits the ledger by the returned delta.
  async fn swap(&mut self, request: &SwapRequest) -> Result<BalanceDelta, VenueError>;

  /// Move real tokens from the participant into the venue.
  ///
  /// Credits the ledger by the amount actually received, which is returned.
  async fn deposit(&mut self, asset: AssetId, amount: U256) -> Result<U256, VenueError>;

  /// Move real tokens out of the venue to `recipient`, debiting the ledger.
  async fn withdraw(
    &mut self,
    asset: AssetId,
    recipient: Address,
    amount: U256,
  ) -> Result<(), VenueError>;

  /// Net position of `participant` in `asset`.
  async fn position(&self, participant: Address, asset: AssetId) -> Result<I256, VenueError>;
}

/// Callback the venue invokes once the session is open.
#[async_trait]
pub trait SessionHandler: Send + Sync {
  /// Run the session body.
  ///
  /// `origin` is the identity invoking the callback; handlers must reject
  /// anything other than their venue.
  async fn on_session(
    &self,
    origin: Address,
    session: &mut dyn VenueSession,
    payload: SessionPayload,
  ) -> Result<SessionOutcome, EngineError>;
}

/// Trait for the venue's atomic session primitive.
#[async_trait]
pub trait Venue: Send + Sync + 'static {
  /// Identity the venue presents to session handlers.
  fn address(&self) -> Address;

  /// Open a session for `participant`, run `handler`, enforce closure.
  ///
  /// Sessions are serialized against the venue's global state. Any error
  /// from the handler, or any nonzero position at close, rolls back every
  /// effect of the session.
  async fn open_session(
    &self,
    participant: Address,
    payload: SessionPayload,
    handler: &dyn SessionHandler,
  ) -> Result<SessionOutcome, EngineError>;
}
