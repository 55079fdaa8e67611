//! Coverage check between strategy assets and the known-assets list.

use super::error::EngineError;
use super::route::AssetId;

/// Confirm every strategy asset appears in `known`.
///
/// Strategy assets are checked in order; the first uncovered one is
/// reported.
pub fn check_coverage(strategy_assets: &[AssetId], known: &[AssetId]) -> Result<(), EngineError> {
    match strategy_assets.iter().find(|asset| !known.contains(asset)) {
        Some(missing) => Err(EngineError::MissingCoverage(*missing)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Address;

    use super::*;

    #[test]
    fn test_superset_passes() {
        let x = Address::repeat_byte(1);
        let y = Address::repeat_byte(2);
        let z = Address::repeat_byte(3);
        assert!(check_coverage(&[x, y], &[z, y, x]).is_ok());
    }

    #[test]
    fn test_reports_first_uncovered() {
        let x = Address::repeat_byte(1);
        let y = Address::repeat_byte(2);
        let z = Address::repeat_byte(3);
        assert_eq!(
            check_coverage(&[x, y, z], &[x]),
            Err(EngineError::MissingCoverage(y))
        );
    }

    #[test]
    fn test_no_strategies_always_covered() {
        assert!(check_coverage(&[], &[]).is_ok());
    }
}
