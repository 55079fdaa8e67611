//! Execution parameters and session records.
//!
//! Parameters are calibrated off-chain and supplied per call; the engine
//! never derives them itself.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::route::AssetId;

/// Caller-supplied inputs for one execution.
///
/// Price limits are WAD-scaled prices of the pivot route's `asset0`
/// quoted in `asset1`. A swap that sells asset0 treats its limit as a
/// floor; a swap that sells asset1 treats it as a ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Pivot asset swapped into the target asset to lift its price.
    pub pump_amount: U256,
    /// Payment asset borrowed from the venue to pay the claim.
    pub payment_amount: U256,
    /// Worst acceptable price after the pump leg.
    pub pump_price_limit: U256,
    /// Worst acceptable price after the unwind leg.
    pub unwind_price_limit: U256,
}

impl ExecutionParams {
    /// Parameters with price limits that never bind.
    pub fn unbounded(pump_amount: U256, payment_amount: U256, pivot_is_asset0: bool) -> Self {
        Self {
            pump_amount,
            payment_amount,
            pump_price_limit: unbounded_limit(pivot_is_asset0),
            unwind_price_limit: unbounded_limit(!pivot_is_asset0),
        }
    }
}

/// Price limit that never binds for a swap in the given direction.
pub fn unbounded_limit(zero_for_one: bool) -> U256 {
    if zero_for_one { U256::ZERO } else { U256::MAX }
}

/// Whether a post-swap price respects the limit for that direction.
pub fn within_limit(zero_for_one: bool, price: U256, limit: U256) -> bool {
    if zero_for_one {
        price >= limit
    } else {
        price <= limit
    }
}

/// Data carried through the venue into the session callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPayload {
    /// The external caller who receives the profit.
    pub caller: Address,
    /// Off-chain calibrated inputs.
    pub params: ExecutionParams,
}

/// Result returned by a committed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// Payment asset cached at session start.
    pub payment_asset: AssetId,
    /// Payment-asset credit before conversion to base.
    pub payment_surplus: U256,
    /// Asset the profit was paid in.
    pub base_asset: AssetId,
    /// Base-asset amount withdrawn to the caller.
    pub profit: U256,
}

/// Record of a completed execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    /// Unique execution ID.
    pub id: Uuid,
    /// Caller who triggered and received the profit.
    pub caller: Address,
    /// Session result.
    pub outcome: SessionOutcome,
    /// Completion time.
    pub completed_at: DateTime<Utc>,
}

impl ExecutionReceipt {
    /// Build a receipt stamped with the current time.
    pub fn new(caller: Address, outcome: SessionOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            caller,
            outcome,
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::amm::WAD;

    #[test]
    fn test_limit_direction() {
        assert!(within_limit(true, WAD, WAD));
        assert!(!within_limit(true, WAD - U256::from(1), WAD));
        assert!(within_limit(false, WAD - U256::from(1), WAD));
        assert!(!within_limit(false, WAD + U256::from(1), WAD));
    }

    #[test]
    fn test_unbounded_limits_never_bind() {
        assert!(within_limit(true, U256::ZERO, unbounded_limit(true)));
        assert!(within_limit(false, U256::MAX, unbounded_limit(false)));
    }

    #[test]
    fn test_unbounded_params_follow_orientation() {
        let params = ExecutionParams::unbounded(U256::from(1), U256::from(2), true);
        assert_eq!(params.pump_price_limit, U256::ZERO);
        assert_eq!(params.unwind_price_limit, U256::MAX);
    }
}
