//! Integration Tests - Engine Against Mocked Ports
//!
//! Tests the interaction between usecases and ports with mockall
//! mocks for the yield source, token bank and venue session, plus the
//! simulated venue where a real session is needed.

use std::sync::Arc;

use alloy::primitives::{Address, I256, U256};
use mockall::mock;
use mockall::predicate::*;

use claim_arb_engine::adapters::simulated::{SimulatedChain, SimulatedVenue};
use claim_arb_engine::domain::error::{EngineError, TokenError, VenueError, YieldSourceError};
use claim_arb_engine::domain::execution::{ExecutionParams, SessionPayload};
use claim_arb_engine::domain::registry::RouteRegistry;
use claim_arb_engine::domain::route::{AssetId, CanonicalRoutes, Route};
use claim_arb_engine::ports::venue::{BalanceDelta, SessionHandler, SwapRequest, VenueSession};
use claim_arb_engine::ports::yield_source::{ClaimReceipt, StrategyId};
use claim_arb_engine::usecases::{CoverageValidator, SettlementEngine};

// ---- Mock Definitions ----

mock! {
    pub Source {}

    #[async_trait::async_trait]
    impl claim_arb_engine::ports::yield_source::YieldSource for Source {
        fn address(&self) -> Address;
        async fn current_payment_asset(&self) -> Result<AssetId, YieldSourceError>;
        async fn registered_strategies(&self) -> Result<Vec<StrategyId>, YieldSourceError>;
        async fn strategy_asset(&self, id: StrategyId) -> Result<AssetId, YieldSourceError>;
        async fn claim(&self, claimant: Address) -> Result<ClaimReceipt, YieldSourceError>;
    }
}

mock! {
    pub Bank {}

    #[async_trait::async_trait]
    impl claim_arb_engine::ports::token_bank::TokenBank for Bank {
        async fn balance_of(&self, asset: AssetId, holder: Address) -> Result<U256, TokenError>;
        async fn transfer(
            &self,
            asset: AssetId,
            from: Address,
            to: Address,
            amount: U256,
        ) -> Result<(), TokenError>;
    }
}

mock! {
    pub Session {}

    #[async_trait::async_trait]
    impl VenueSession for Session {
        async fn swap(&mut self, request: &SwapRequest) -> Result<BalanceDelta, VenueError>;
        async fn deposit(&mut self, asset: AssetId, amount: U256) -> Result<U256, VenueError>;
        async fn withdraw(
            &mut self,
            asset: AssetId,
            recipient: Address,
            amount: U256,
        ) -> Result<(), VenueError>;
        async fn position(&self, participant: Address, asset: AssetId) -> Result<I256, VenueError>;
    }
}

// ---- Helpers ----

fn a(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

const PIVOT: u8 = 0x10;
const TARGET: u8 = 0x20;
const PAY: u8 = 0x30;
const BASE: u8 = 0x40;

fn canonical() -> CanonicalRoutes {
    CanonicalRoutes {
        pivot: Route::new(a(PIVOT), a(TARGET), 3000, 60),
        profit: Route::new(a(PAY), a(BASE), 500, 10),
        slippage_cover: Route::new(a(PIVOT), a(PAY), 500, 10),
        pivot_is_asset0: true,
    }
}

/// Yield source whose strategies distribute `assets`, one per strategy.
fn source_with(assets: Vec<AssetId>) -> MockSource {
    let mut source = MockSource::new();
    let ids: Vec<StrategyId> = (0..assets.len()).map(|i| a(0x90 + i as u8)).collect();
    let lookup: Vec<(StrategyId, AssetId)> = ids.iter().copied().zip(assets).collect();

    source.expect_address().return_const(a(0x77));
    source
        .expect_current_payment_asset()
        .returning(|| Ok(a(PAY)));
    source
        .expect_registered_strategies()
        .returning(move || Ok(ids.clone()));
    source.expect_strategy_asset().returning(move |id| {
        lookup
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, asset)| *asset)
            .ok_or(YieldSourceError::UnknownStrategy(id))
    });
    source
}

fn registry(known: &[AssetId]) -> RouteRegistry {
    let mut registry = RouteRegistry::new();
    for asset in known {
        registry.add_known_asset(*asset);
    }
    registry.set_canonical_routes(canonical());
    registry
}

fn engine(
    source: MockSource,
    bank: MockBank,
    registry: RouteRegistry,
) -> SettlementEngine<SimulatedVenue, MockSource, MockBank> {
    let venue = SimulatedVenue::new(a(0xEE), Arc::new(SimulatedChain::new()));
    SettlementEngine::new(
        a(0xE0),
        a(0xA0),
        Arc::new(venue),
        Arc::new(source),
        Arc::new(bank),
        registry,
    )
}

fn params() -> ExecutionParams {
    ExecutionParams::unbounded(U256::from(10), U256::from(90), true)
}

// ---- Coverage ----

#[tokio::test]
async fn test_coverage_superset_passes() {
    let (x, y, z) = (a(0x50), a(0x60), a(0x70));
    let validator = CoverageValidator::new(Arc::new(source_with(vec![x, y])));

    tokio_test::assert_ok!(validator.validate(&[x, y, z]).await);
    assert_eq!(validator.strategy_assets().await.unwrap(), vec![x, y]);
}

#[tokio::test]
async fn test_coverage_names_missing_asset() {
    let (x, y, w) = (a(0x50), a(0x60), a(0x80));
    let engine = engine(source_with(vec![x, y, w]), MockBank::new(), registry(&[x, y]));

    let err = tokio_test::assert_err!(engine.validate_coverage().await);
    assert_eq!(err, EngineError::MissingCoverage(w));
}

#[tokio::test]
async fn test_unknown_strategy_propagates() {
    let mut source = MockSource::new();
    source
        .expect_registered_strategies()
        .returning(|| Ok(vec![a(0x99)]));
    source
        .expect_strategy_asset()
        .with(eq(a(0x99)))
        .returning(|id| Err(YieldSourceError::UnknownStrategy(id)));
    let validator = CoverageValidator::new(Arc::new(source));

    let err = validator.validate(&[]).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::YieldSource(YieldSourceError::UnknownStrategy(a(0x99)))
    );
}

// ---- Session Handler ----

#[tokio::test]
async fn test_foreign_callback_rejected_without_side_effects() {
    let engine = engine(source_with(vec![]), MockBank::new(), registry(&[]));
    let mut session = MockSession::new();
    session.expect_swap().never();
    session.expect_withdraw().never();
    session.expect_deposit().never();

    let intruder = a(0xBD);
    let payload = SessionPayload {
        caller: a(0xCA),
        params: params(),
    };
    let err = engine
        .on_session(intruder, &mut session, payload)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::UnauthorizedCallback(intruder));
}

#[tokio::test]
async fn test_unset_canonical_routes_abort() {
    let engine = engine(source_with(vec![]), MockBank::new(), RouteRegistry::new());

    let err = engine.execute(a(0xCA), params()).await.unwrap_err();
    assert_eq!(err, EngineError::CanonicalRoutesUnset);
}

#[tokio::test]
async fn test_stages_run_in_order_against_mocked_session() {
    let x = a(0x50);
    let engine_addr = a(0xE0);
    let caller = a(0xCA);

    let mut source = source_with(vec![x]);
    source.expect_claim().times(1).returning(move |_| {
        Ok(ClaimReceipt {
            payment_asset: a(PAY),
            paid: U256::from(90),
            basket: vec![(x, U256::from(100))],
        })
    });
    let mut bank = MockBank::new();
    bank.expect_balance_of()
        .with(eq(x), eq(engine_addr))
        .returning(|_, _| Ok(U256::from(100)));

    let mut reg = registry(&[x]);
    let x_route = Route::new(x, a(PAY), 500, 10);
    reg.set_route(x, x_route);
    let engine = engine(source, bank, reg);

    let mut seq = mockall::Sequence::new();
    let mut session = MockSession::new();
    let pivot = canonical().pivot;
    let profit = canonical().profit;

    // 3. pump: exact-in 10 PIVOT
    session
        .expect_swap()
        .withf(move |r| r.route == pivot && r.zero_for_one && r.amount_specified == I256::try_from(-10).unwrap())
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(BalanceDelta {
                amount0: I256::try_from(-10).unwrap(),
                amount1: I256::try_from(9).unwrap(),
            })
        });
    // 4. borrow
    session
        .expect_withdraw()
        .with(eq(a(PAY)), eq(engine_addr), eq(U256::from(90)))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(()));
    // 6. unwind the 9 TARGET acquired
    session
        .expect_swap()
        .withf(move |r| r.route == pivot && !r.zero_for_one && r.amount_specified == I256::try_from(-9).unwrap())
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(BalanceDelta::default()));
    // 7. deposit and convert X
    session
        .expect_deposit()
        .with(eq(x), eq(U256::from(100)))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, amount| Ok(amount));
    session
        .expect_swap()
        .withf(move |r| r.route == x_route && r.amount_specified == I256::try_from(-100).unwrap())
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(BalanceDelta::default()));
    // 8. residuals flat; 9. payment +8, base +7 after conversion
    session
        .expect_position()
        .returning(move |_, asset| {
            Ok(if asset == a(PAY) {
                I256::try_from(8).unwrap()
            } else if asset == a(BASE) {
                I256::try_from(7).unwrap()
            } else {
                I256::ZERO
            })
        });
    session
        .expect_swap()
        .withf(move |r| r.route == profit && r.zero_for_one && r.amount_specified == I256::try_from(-8).unwrap())
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(BalanceDelta::default()));
    session
        .expect_withdraw()
        .with(eq(a(BASE)), eq(caller), eq(U256::from(7)))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(()));

    let outcome = engine
        .on_session(
            a(0xEE),
            &mut session,
            SessionPayload {
                caller,
                params: params(),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.payment_surplus, U256::from(8));
    assert_eq!(outcome.profit, U256::from(7));
    assert_eq!(outcome.base_asset, a(BASE));
}

#[tokio::test]
async fn test_zero_base_after_conversion_is_no_profit() {
    let mut source = source_with(vec![]);
    source.expect_claim().returning(|_| {
        Ok(ClaimReceipt {
            payment_asset: a(PAY),
            paid: U256::from(90),
            basket: vec![],
        })
    });
    let engine = engine(source, MockBank::new(), registry(&[]));

    let mut session = MockSession::new();
    session.expect_swap().returning(|r| {
        // Pump fills 1 TARGET; everything else is a no-op fill.
        if r.amount_specified == I256::try_from(-10).unwrap() {
            Ok(BalanceDelta {
                amount0: I256::try_from(-10).unwrap(),
                amount1: I256::ONE,
            })
        } else {
            Ok(BalanceDelta::default())
        }
    });
    session.expect_withdraw().returning(|_, _, _| Ok(()));
    session.expect_position().returning(|_, asset| {
        Ok(if asset == a(PAY) { I256::ONE } else { I256::ZERO })
    });

    let err = engine
        .on_session(
            a(0xEE),
            &mut session,
            SessionPayload {
                caller: a(0xCA),
                params: params(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::NoProfit {
            asset: a(BASE),
            position: I256::ZERO,
        }
    );
}
