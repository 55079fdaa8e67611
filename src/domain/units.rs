//! Unit conversions between human amounts, base units and signed positions.

use alloy::primitives::{I256, U256};
use rust_decimal::Decimal;

use super::error::EngineError;

/// Convert a human-unit decimal (e.g. `10.5`) into integer base units.
///
/// Digits beyond `decimals` are truncated. Negative amounts are rejected.
pub fn to_base_units(amount: Decimal, decimals: u32) -> anyhow::Result<U256> {
    anyhow::ensure!(
        !amount.is_sign_negative(),
        "amount must be non-negative, got {amount}"
    );
    anyhow::ensure!(decimals <= 36, "decimals must be <= 36, got {decimals}");

    let mantissa = U256::from(amount.mantissa().unsigned_abs());
    let scale = amount.scale();

    let value = if decimals >= scale {
        let factor = U256::from(10u64).pow(U256::from(decimals - scale));
        mantissa
            .checked_mul(factor)
            .ok_or_else(|| anyhow::anyhow!("amount {amount} overflows 256 bits"))?
    } else {
        mantissa / U256::from(10u64).pow(U256::from(scale - decimals))
    };
    Ok(value)
}

/// Credit an unsigned amount as a signed position.
pub fn to_signed(amount: U256) -> Result<I256, EngineError> {
    I256::try_from(amount).map_err(|_| EngineError::AmountOverflow(amount))
}

/// Negative signed amount (a debit, or an exact-input swap amount).
pub fn to_debit(amount: U256) -> Result<I256, EngineError> {
    to_signed(amount)?
        .checked_neg()
        .ok_or(EngineError::AmountOverflow(amount))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_whole_units() {
        let wei = to_base_units(dec!(10), 18).unwrap();
        assert_eq!(wei, U256::from(10u64) * U256::from(10u64).pow(U256::from(18)));
    }

    #[test]
    fn test_fractional_units() {
        assert_eq!(to_base_units(dec!(1.5), 6).unwrap(), U256::from(1_500_000u64));
    }

    #[test]
    fn test_truncates_excess_precision() {
        assert_eq!(to_base_units(dec!(0.1234567), 6).unwrap(), U256::from(123_456u64));
    }

    #[test]
    fn test_negative_rejected() {
        assert!(to_base_units(dec!(-1), 18).is_err());
    }

    #[test]
    fn test_signed_helpers() {
        assert_eq!(to_debit(U256::from(5)).unwrap(), I256::try_from(-5).unwrap());
        assert!(matches!(to_signed(U256::MAX), Err(EngineError::AmountOverflow(_))));
    }
}
