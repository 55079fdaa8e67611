//! Operator Administration - Registry Setters and Fund Rescue
//!
//! Every mutation is restricted to the operator, persisted, applied to
//! the live registry, then announced as an `EngineEvent`. Sessions
//! already in flight keep the snapshot they started with.

use alloy::primitives::{Address, U256};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::error::EngineError;
use crate::domain::registry::RouteRegistry;
use crate::domain::route::{AssetId, CanonicalRoutes, Route};
use crate::ports::token_bank::TokenBank;
use crate::ports::venue::Venue;
use crate::ports::yield_source::YieldSource;

use super::engine::{ConfigChange, EngineEvent, SettlementEngine};

impl<V: Venue, Y: YieldSource, T: TokenBank> SettlementEngine<V, Y, T> {
  async fn ensure_owner(&self, caller: Address) -> Result<(), EngineError> {
    if caller != *self.owner.read().await {
      warn!(caller = %caller, "Rejected operator call");
      return Err(EngineError::Unauthorized(caller));
    }
    Ok(())
  }

  async fn persist(&self, registry: &RouteRegistry) -> Result<(), EngineError> {
    if let Some(store) = &self.store {
      store
        .save(registry)
        .await
        .map_err(|e| EngineError::Persistence(format!("{e:#}")))?;
    }
    Ok(())
  }

  /// Apply `mutate` to a copy of the registry, persist the copy, then
  /// swap it in. The write lock is held across the save; a failed save
  /// leaves the live registry untouched.
  async fn mutate_registry<R>(
    &self,
    mutate: impl FnOnce(&mut RouteRegistry) -> R + Send,
  ) -> Result<R, EngineError> {
    let mut registry = self.registry.write().await;
    let mut staged = registry.clone();
    let result = mutate(&mut staged);
    self.persist(&staged).await?;
    *registry = staged;
    Ok(result)
  }

  /// Set (or overwrite) the conversion route for `asset`.
  ///
  /// The route is not checked against `asset` here; a route that cannot
  /// trade the asset fails the session that uses it.
  #[instrument(skip(self), fields(asset = %asset, route = %route))]
  pub async fn set_route(
    &self,
    caller: Address,
    asset: AssetId,
    route: Route,
  ) -> Result<(), EngineError> {
    self.ensure_owner(caller).await?;
    let previous = self
      .mutate_registry(|registry| registry.set_route(asset, route))
      .await?;
    info!(replaced = previous.is_some(), "Route set");
    self.emit(EngineEvent::ConfigChanged(ConfigChange::RouteSet { asset, route }));
    Ok(())
  }

  /// Append `asset` to the known-assets list. Returns `false` if already known.
  #[instrument(skip(self), fields(asset = %asset))]
  pub async fn add_known_asset(&self, caller: Address, asset: AssetId) -> Result<bool, EngineError> {
    self.ensure_owner(caller).await?;
    let added = self
      .mutate_registry(|registry| registry.add_known_asset(asset))
      .await?;
    if added {
      info!("Known asset added");
      self.emit(EngineEvent::ConfigChanged(ConfigChange::KnownAssetAdded(asset)));
    }
    Ok(added)
  }

  /// Remove `asset` from the known-assets list. Returns `false` if absent.
  #[instrument(skip(self), fields(asset = %asset))]
  pub async fn remove_known_asset(
    &self,
    caller: Address,
    asset: AssetId,
  ) -> Result<bool, EngineError> {
    self.ensure_owner(caller).await?;
    let removed = self
      .mutate_registry(|registry| registry.remove_known_asset(asset))
      .await?;
    if removed {
      info!("Known asset removed");
      self.emit(EngineEvent::ConfigChanged(ConfigChange::KnownAssetRemoved(asset)));
    }
    Ok(removed)
  }

  /// Replace the pivot, profit and slippage-cover routes.
  #[instrument(skip(self, canonical), fields(pivot = %canonical.pivot, profit = %canonical.profit))]
  pub async fn set_canonical_routes(
    &self,
    caller: Address,
    canonical: CanonicalRoutes,
  ) -> Result<(), EngineError> {
    self.ensure_owner(caller).await?;
    self
      .mutate_registry(|registry| registry.set_canonical_routes(canonical))
      .await?;
    info!(
      slippage_cover = %canonical.slippage_cover,
      pivot_is_asset0 = canonical.pivot_is_asset0,
      "Canonical routes set"
    );
    self.emit(EngineEvent::ConfigChanged(ConfigChange::CanonicalRoutesSet(
      canonical,
    )));
    Ok(())
  }

  /// Hand the operator role to `new_owner`.
  #[instrument(skip(self), fields(new_owner = %new_owner))]
  pub async fn transfer_ownership(
    &self,
    caller: Address,
    new_owner: Address,
  ) -> Result<(), EngineError> {
    self.ensure_owner(caller).await?;
    if new_owner.is_zero() {
      return Err(EngineError::InvalidRecipient);
    }
    let previous = std::mem::replace(&mut *self.owner.write().await, new_owner);
    info!(previous = %previous, "Ownership transferred");
    self.emit(EngineEvent::OwnershipTransferred {
      previous,
      current: new_owner,
    });
    Ok(())
  }

  /// Transfer `amount` of any asset the engine holds to `recipient`.
  ///
  /// The engine holds nothing between sessions, so anything found here
  /// was sent to it by mistake.
  #[instrument(skip(self), fields(asset = %asset, recipient = %recipient, amount = %amount))]
  pub async fn rescue(
    &self,
    caller: Address,
    asset: AssetId,
    recipient: Address,
    amount: U256,
  ) -> Result<(), EngineError> {
    self.ensure_owner(caller).await?;
    if recipient.is_zero() {
      return Err(EngineError::InvalidRecipient);
    }
    self
      .tokens
      .transfer(asset, self.address, recipient, amount)
      .await?;
    info!("Funds rescued");
    self.emit(EngineEvent::Rescued {
      id: Uuid::new_v4(),
      asset,
      recipient,
      amount,
    });
    Ok(())
  }
}
