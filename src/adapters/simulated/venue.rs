//! Simulated Venue - Deferred-Settlement Sessions Over In-Memory Pools
//!
//! Sessions are serialized by a mutex. On open the chain state is
//! snapshotted; swaps move pool reserves and record signed deltas in a
//! per-session `PositionLedger`, while deposits and withdrawals move real
//! balances between the participant and the venue's custody address.
//! At close every position must be zero, otherwise (or if the handler
//! failed) the snapshot is restored and nothing the session did survives.

use std::sync::Arc;

use alloy::primitives::{Address, I256, U256};
use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};

use crate::domain::error::{EngineError, PoolError, VenueError};
use crate::domain::execution::{SessionOutcome, SessionPayload, within_limit};
use crate::domain::ledger::PositionLedger;
use crate::domain::route::{AssetId, Route};
use crate::ports::token_bank::TokenBank;
use crate::ports::venue::{BalanceDelta, SessionHandler, SwapRequest, Venue, VenueSession};

use super::chain::SimulatedChain;

/// One committed swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRecord {
    pub participant: Address,
    pub request: SwapRequest,
    pub delta: BalanceDelta,
}

fn signed(amount: U256) -> Result<I256, VenueError> {
    I256::try_from(amount).map_err(|_| VenueError::Pool(PoolError::Overflow))
}

/// In-memory venue with atomic sessions.
pub struct SimulatedVenue {
    address: Address,
    chain: Arc<SimulatedChain>,
    session_lock: Mutex<()>,
    swap_log: RwLock<Vec<SwapRecord>>,
}

impl SimulatedVenue {
    /// Create a venue custodying pool reserves at `address`.
    pub fn new(address: Address, chain: Arc<SimulatedChain>) -> Self {
        Self {
            address,
            chain,
            session_lock: Mutex::new(()),
            swap_log: RwLock::new(Vec::new()),
        }
    }

    /// Seed a pool whose reserves the venue custodies.
    pub async fn add_pool(&self, route: Route, reserve0: U256, reserve1: U256) -> Result<(), VenueError> {
        self.chain
            .add_pool(route, reserve0, reserve1, self.address)
            .await?;
        Ok(())
    }

    /// Swaps from committed sessions, in execution order.
    pub async fn swap_log(&self) -> Vec<SwapRecord> {
        self.swap_log.read().await.clone()
    }
}

/// Live session context handed to the handler.
struct LedgerSession<'a> {
    chain: &'a SimulatedChain,
    venue: Address,
    participant: Address,
    ledger: PositionLedger,
    swaps: Vec<SwapRecord>,
}

impl<'a> LedgerSession<'a> {
    fn new(chain: &'a SimulatedChain, venue: Address, participant: Address) -> Self {
        Self {
            chain,
            venue,
            participant,
            ledger: PositionLedger::new(),
            swaps: Vec::new(),
        }
    }

    /// Fail on the first nonzero position.
    fn close(&self) -> Result<(), VenueError> {
        match self.ledger.unsettled().first() {
            Some(&(_, asset, position)) => Err(VenueError::UnsettledPosition { asset, position }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl VenueSession for LedgerSession<'_> {
    async fn swap(&mut self, request: &SwapRequest) -> Result<BalanceDelta, VenueError> {
        let request = *request;
        let route = request.route;

        let delta = self
            .chain
            .with_state(move |state| -> Result<BalanceDelta, VenueError> {
                let pool = state
                    .pool_mut(&route)
                    .ok_or(VenueError::UnknownRoute(route))?;
                let mut next = *pool;
                let amounts = next.swap(request.zero_for_one, request.amount_specified)?;
                let price = next.price0_wad()?;
                if !within_limit(request.zero_for_one, price, request.price_limit) {
                    return Err(VenueError::PriceLimitExceeded {
                        route,
                        price,
                        limit: request.price_limit,
                    });
                }
                *pool = next;

                let paid = -signed(amounts.amount_in)?;
                let received = signed(amounts.amount_out)?;
                Ok(if request.zero_for_one {
                    BalanceDelta {
                        amount0: paid,
                        amount1: received,
                    }
                } else {
                    BalanceDelta {
                        amount0: received,
                        amount1: paid,
                    }
                })
            })
            .await?;

        self.ledger.apply(self.participant, route.asset0, delta.amount0)?;
        self.ledger.apply(self.participant, route.asset1, delta.amount1)?;
        self.swaps.push(SwapRecord {
            participant: self.participant,
            request,
            delta,
        });
        debug!(
            route = %route,
            amount0 = %delta.amount0,
            amount1 = %delta.amount1,
            "Swap applied"
        );
        Ok(delta)
    }

    async fn deposit(&mut self, asset: AssetId, amount: U256) -> Result<U256, VenueError> {
        let before = self.chain.balance_of(asset, self.venue).await?;
        self.chain
            .transfer(asset, self.participant, self.venue, amount)
            .await?;
        let after = self.chain.balance_of(asset, self.venue).await?;
        let received = after.saturating_sub(before);
        self.ledger.apply(self.participant, asset, signed(received)?)?;
        Ok(received)
    }

    async fn withdraw(
        &mut self,
        asset: AssetId,
        recipient: Address,
        amount: U256,
    ) -> Result<(), VenueError> {
        self.chain
            .transfer(asset, self.venue, recipient, amount)
            .await?;
        self.ledger.apply(self.participant, asset, -signed(amount)?)?;
        Ok(())
    }

    async fn position(&self, participant: Address, asset: AssetId) -> Result<I256, VenueError> {
        Ok(self.ledger.position(participant, asset))
    }
}

#[async_trait]
impl Venue for SimulatedVenue {
    fn address(&self) -> Address {
        self.address
    }

    #[instrument(skip(self, payload, handler), fields(participant = %participant))]
    async fn open_session(
        &self,
        participant: Address,
        payload: SessionPayload,
        handler: &dyn SessionHandler,
    ) -> Result<SessionOutcome, EngineError> {
        let _guard = self.session_lock.lock().await;
        let snapshot = self.chain.snapshot().await;

        let mut session = LedgerSession::new(&self.chain, self.address, participant);
        let result = handler
            .on_session(self.address, &mut session, payload)
            .await
            .and_then(|outcome| {
                session.close()?;
                Ok(outcome)
            });

        match result {
            Ok(outcome) => {
                let committed = session.swaps.len();
                self.swap_log.write().await.extend(session.swaps);
                debug!(swaps = committed, "Session committed");
                Ok(outcome)
            }
            Err(err) => {
                self.chain.restore(snapshot).await;
                warn!(reason = %err, "Session rolled back");
                Err(err)
            }
        }
    }
}
