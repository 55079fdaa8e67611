//! Settlement Engine - Entry Point and Session Handler
//!
//! Owns the route registry and the collaborators, opens one venue session
//! per `execute` call and runs the nine-stage pipeline inside it. Every
//! outcome is published on a broadcast channel; metrics and log sinks
//! subscribe to it.

use std::sync::Arc;
use std::time::Instant;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, broadcast};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::error::{EngineError, ErrorClass};
use crate::domain::execution::{ExecutionParams, ExecutionReceipt, SessionOutcome, SessionPayload};
use crate::domain::registry::RouteRegistry;
use crate::domain::route::{AssetId, CanonicalRoutes, Route};
use crate::ports::registry_store::RegistryStore;
use crate::ports::token_bank::TokenBank;
use crate::ports::venue::{SessionHandler, Venue, VenueSession};
use crate::ports::yield_source::YieldSource;

use super::coverage::CoverageValidator;
use super::session::SessionOrchestrator;

/// Event channel capacity.
const EVENT_CAPACITY: usize = 256;

/// Registry mutation applied by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
  RouteSet { asset: AssetId, route: Route },
  KnownAssetAdded(AssetId),
  KnownAssetRemoved(AssetId),
  CanonicalRoutesSet(CanonicalRoutes),
}

/// Observable engine event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
  /// A session committed and paid the caller.
  Executed {
    receipt: ExecutionReceipt,
    elapsed_us: u64,
  },
  /// A session aborted; nothing was committed.
  Aborted {
    caller: Address,
    class: ErrorClass,
    reason: String,
    elapsed_us: u64,
    at: DateTime<Utc>,
  },
  /// Operator changed the registry.
  ConfigChanged(ConfigChange),
  /// Operator moved stray funds out of the engine.
  Rescued {
    id: Uuid,
    asset: AssetId,
    recipient: Address,
    amount: U256,
  },
  /// Operator role moved to a new address.
  OwnershipTransferred { previous: Address, current: Address },
}

/// Atomic claim-arbitrage settlement engine.
pub struct SettlementEngine<V: Venue, Y: YieldSource, T: TokenBank> {
  /// Identity the engine trades and holds balances under.
  pub(super) address: Address,
  /// Operator allowed to mutate configuration.
  pub(super) owner: RwLock<Address>,
  pub(super) venue: Arc<V>,
  pub(super) yield_source: Arc<Y>,
  pub(super) tokens: Arc<T>,
  pub(super) coverage: CoverageValidator<Y>,
  /// Persistent configuration; sessions work on a snapshot.
  pub(super) registry: RwLock<RouteRegistry>,
  pub(super) store: Option<Arc<dyn RegistryStore>>,
  pub(super) events: broadcast::Sender<EngineEvent>,
}

impl<V: Venue, Y: YieldSource, T: TokenBank> SettlementEngine<V, Y, T> {
  /// Create an engine with an initial registry.
  pub fn new(
    address: Address,
    owner: Address,
    venue: Arc<V>,
    yield_source: Arc<Y>,
    tokens: Arc<T>,
    registry: RouteRegistry,
  ) -> Self {
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    Self {
      address,
      owner: RwLock::new(owner),
      venue,
      coverage: CoverageValidator::new(Arc::clone(&yield_source)),
      yield_source,
      tokens,
      registry: RwLock::new(registry),
      store: None,
      events,
    }
  }

  /// Persist the registry through `store` after every operator change.
  pub fn with_store(mut self, store: Arc<dyn RegistryStore>) -> Self {
    self.store = Some(store);
    self
  }

  /// Engine address.
  pub fn address(&self) -> Address {
    self.address
  }

  /// Current operator.
  pub async fn owner(&self) -> Address {
    *self.owner.read().await
  }

  /// Subscribe to engine events.
  pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
    self.events.subscribe()
  }

  pub(super) fn emit(&self, event: EngineEvent) {
    // No subscribers is fine
    let _ = self.events.send(event);
  }

  /// Run one atomic settlement session and pay the profit to `caller`.
  ///
  /// Any caller may trigger this. On error nothing is committed; a
  /// `NoProfit` error means the opportunity was absent or already taken.
  #[instrument(skip(self, params), fields(caller = %caller))]
  pub async fn execute(
    &self,
    caller: Address,
    params: ExecutionParams,
  ) -> Result<ExecutionReceipt, EngineError> {
    let start = Instant::now();
    let payload = SessionPayload { caller, params };
    let result = self
      .venue
      .open_session(self.address, payload, self)
      .await;
    let elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

    match result {
      Ok(outcome) => {
        let receipt = ExecutionReceipt::new(caller, outcome);
        info!(
          id = %receipt.id,
          base_asset = %outcome.base_asset,
          profit = %outcome.profit,
          elapsed_us,
          "Execution committed"
        );
        self.emit(EngineEvent::Executed {
          receipt: receipt.clone(),
          elapsed_us,
        });
        Ok(receipt)
      }
      Err(err) => {
        if err.is_no_profit() {
          info!(reason = %err, elapsed_us, "Execution aborted: no profit");
        } else {
          warn!(reason = %err, class = err.class().label(), elapsed_us, "Execution aborted");
        }
        self.emit(EngineEvent::Aborted {
          caller,
          class: err.class(),
          reason: err.to_string(),
          elapsed_us,
          at: Utc::now(),
        });
        Err(err)
      }
    }
  }

  /// Standalone coverage check against the current registry.
  pub async fn validate_coverage(&self) -> Result<(), EngineError> {
    let known = self.registry.read().await.known_assets().to_vec();
    self.coverage.validate(&known).await
  }

  /// Known-assets list, in conversion order.
  pub async fn known_assets(&self) -> Vec<AssetId> {
    self.registry.read().await.known_assets().to_vec()
  }

  /// Route configured for `asset`.
  pub async fn route_for(&self, asset: AssetId) -> Option<Route> {
    self.registry.read().await.route_for(asset).copied()
  }

  /// Canonical routes, if set.
  pub async fn canonical_routes(&self) -> Option<CanonicalRoutes> {
    self.registry.read().await.canonical().copied()
  }

  /// Copy of the whole registry.
  pub async fn registry_snapshot(&self) -> RouteRegistry {
    self.registry.read().await.clone()
  }
}

#[async_trait]
impl<V: Venue, Y: YieldSource, T: TokenBank> SessionHandler for SettlementEngine<V, Y, T> {
  #[instrument(skip(self, session, payload), fields(origin = %origin))]
  async fn on_session(
    &self,
    origin: Address,
    session: &mut dyn VenueSession,
    payload: SessionPayload,
  ) -> Result<SessionOutcome, EngineError> {
    if origin != self.venue.address() {
      warn!(origin = %origin, "Rejected session callback from foreign origin");
      return Err(EngineError::UnauthorizedCallback(origin));
    }

    let registry = self.registry.read().await.clone();
    let canonical = registry
      .canonical()
      .copied()
      .ok_or(EngineError::CanonicalRoutesUnset)?;

    SessionOrchestrator::new(
      self.address,
      self.yield_source.as_ref(),
      self.tokens.as_ref(),
      &self.coverage,
      &registry,
      canonical,
      payload,
    )
    .run(session)
    .await
  }
}
