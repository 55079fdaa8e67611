//! Position Ledger - Per-Session Signed Balances
//!
//! Tracks the net position of each (participant, asset) pair during one
//! venue session. Positive means the venue owes the participant, negative
//! means the participant owes the venue. The ledger starts empty (every
//! position implicitly zero) and is dropped when the session ends.

use std::collections::BTreeMap;

use alloy::primitives::{Address, I256};

use super::error::LedgerError;
use super::route::AssetId;

/// Signed per-session position map.
#[derive(Debug, Clone, Default)]
pub struct PositionLedger {
    deltas: BTreeMap<(Address, AssetId), I256>,
}

impl PositionLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to the participant's position and return the new value.
    pub fn apply(
        &mut self,
        participant: Address,
        asset: AssetId,
        delta: I256,
    ) -> Result<I256, LedgerError> {
        let entry = self.deltas.entry((participant, asset)).or_insert(I256::ZERO);
        let updated = entry
            .checked_add(delta)
            .ok_or(LedgerError::Overflow { participant, asset })?;
        *entry = updated;
        Ok(updated)
    }

    /// Current position (zero if never touched).
    pub fn position(&self, participant: Address, asset: AssetId) -> I256 {
        self.deltas
            .get(&(participant, asset))
            .copied()
            .unwrap_or(I256::ZERO)
    }

    /// Every nonzero position, ordered by participant then asset.
    pub fn unsettled(&self) -> Vec<(Address, AssetId, I256)> {
        self.deltas
            .iter()
            .filter(|(_, delta)| !delta.is_zero())
            .map(|((participant, asset), delta)| (*participant, *asset, *delta))
            .collect()
    }

    /// Whether every position has returned to zero.
    pub fn is_settled(&self) -> bool {
        self.deltas.values().all(|delta| delta.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_position_is_zero() {
        let ledger = PositionLedger::new();
        assert_eq!(
            ledger.position(Address::repeat_byte(1), Address::repeat_byte(2)),
            I256::ZERO
        );
        assert!(ledger.is_settled());
    }

    #[test]
    fn test_apply_accumulates_and_settles() {
        let mut ledger = PositionLedger::new();
        let who = Address::repeat_byte(1);
        let asset = Address::repeat_byte(2);

        ledger.apply(who, asset, I256::try_from(-90).unwrap()).unwrap();
        assert!(!ledger.is_settled());
        assert_eq!(ledger.unsettled().len(), 1);

        let after = ledger.apply(who, asset, I256::try_from(90).unwrap()).unwrap();
        assert_eq!(after, I256::ZERO);
        assert!(ledger.is_settled());
        assert!(ledger.unsettled().is_empty());
    }

    #[test]
    fn test_overflow_is_reported() {
        let mut ledger = PositionLedger::new();
        let who = Address::repeat_byte(1);
        let asset = Address::repeat_byte(2);
        ledger.apply(who, asset, I256::MAX).unwrap();
        assert!(ledger.apply(who, asset, I256::ONE).is_err());
    }
}
