//! Constant-product pool math.
//!
//! Backs the in-memory venue. Amount conventions follow the venue's swap
//! primitive: a negative `amount_specified` is an exact-input swap, a
//! positive one is exact-output. Prices are WAD-scaled (1e18) and quote
//! `asset0` in units of `asset1`.
//!
//! Rounding always favours the pool: outputs round down, required inputs
//! round up.

use alloy::primitives::{I256, U256};

use super::error::PoolError;

/// Fee denominator: fees are expressed in pips (1e-6).
pub const FEE_DENOMINATOR: u32 = 1_000_000;

/// 1e18 fixed-point unit.
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Amounts moved by one swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapAmounts {
    /// Gross amount paid into the pool (fee included).
    pub amount_in: U256,
    /// Amount paid out of the pool.
    pub amount_out: U256,
}

/// x·y=k pool with a flat input fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantProductPool {
    pub reserve0: U256,
    pub reserve1: U256,
    pub fee_pips: u32,
}

impl ConstantProductPool {
    pub fn new(reserve0: U256, reserve1: U256, fee_pips: u32) -> Self {
        Self {
            reserve0,
            reserve1,
            fee_pips,
        }
    }

    /// Spot price of asset0 in asset1, WAD-scaled.
    pub fn price0_wad(&self) -> Result<U256, PoolError> {
        mul_div(self.reserve1, WAD, self.reserve0)
    }

    /// Spot price of asset1 in asset0, WAD-scaled.
    pub fn price1_wad(&self) -> Result<U256, PoolError> {
        mul_div(self.reserve0, WAD, self.reserve1)
    }

    fn reserves(&self, zero_for_one: bool) -> (U256, U256) {
        if zero_for_one {
            (self.reserve0, self.reserve1)
        } else {
            (self.reserve1, self.reserve0)
        }
    }

    fn fee_complement(&self) -> Result<U256, PoolError> {
        FEE_DENOMINATOR
            .checked_sub(self.fee_pips)
            .filter(|complement| *complement > 0)
            .map(U256::from)
            .ok_or(PoolError::InvalidFee(self.fee_pips))
    }

    /// Output for an exact input, without mutating the pool.
    pub fn quote_exact_in(&self, zero_for_one: bool, amount_in: U256) -> Result<U256, PoolError> {
        if amount_in.is_zero() {
            return Err(PoolError::ZeroAmount);
        }
        let (reserve_in, reserve_out) = self.reserves(zero_for_one);
        let net_in = mul_div(amount_in, self.fee_complement()?, U256::from(FEE_DENOMINATOR))?;
        let denominator = reserve_in.checked_add(net_in).ok_or(PoolError::Overflow)?;
        if denominator.is_zero() || reserve_out.is_zero() {
            return Err(PoolError::InsufficientLiquidity {
                requested: amount_in,
                reserve: reserve_out,
            });
        }
        mul_div(reserve_out, net_in, denominator)
    }

    /// Gross input needed for an exact output, without mutating the pool.
    pub fn quote_exact_out(&self, zero_for_one: bool, amount_out: U256) -> Result<U256, PoolError> {
        if amount_out.is_zero() {
            return Err(PoolError::ZeroAmount);
        }
        let (reserve_in, reserve_out) = self.reserves(zero_for_one);
        if amount_out >= reserve_out {
            return Err(PoolError::InsufficientLiquidity {
                requested: amount_out,
                reserve: reserve_out,
            });
        }
        let net_in = mul_div_up(reserve_in, amount_out, reserve_out - amount_out)?;
        mul_div_up(net_in, U256::from(FEE_DENOMINATOR), self.fee_complement()?)
    }

    /// Execute a swap and update reserves.
    pub fn swap(
        &mut self,
        zero_for_one: bool,
        amount_specified: I256,
    ) -> Result<SwapAmounts, PoolError> {
        let magnitude = amount_specified.unsigned_abs();
        let amounts = if amount_specified.is_negative() {
            SwapAmounts {
                amount_in: magnitude,
                amount_out: self.quote_exact_in(zero_for_one, magnitude)?,
            }
        } else {
            SwapAmounts {
                amount_in: self.quote_exact_out(zero_for_one, magnitude)?,
                amount_out: magnitude,
            }
        };

        let (reserve_in, reserve_out) = if zero_for_one {
            (&mut self.reserve0, &mut self.reserve1)
        } else {
            (&mut self.reserve1, &mut self.reserve0)
        };
        *reserve_in = reserve_in
            .checked_add(amounts.amount_in)
            .ok_or(PoolError::Overflow)?;
        *reserve_out = reserve_out
            .checked_sub(amounts.amount_out)
            .ok_or(PoolError::Overflow)?;

        Ok(amounts)
    }
}

/// floor(a * b / d)
pub fn mul_div(a: U256, b: U256, d: U256) -> Result<U256, PoolError> {
    if d.is_zero() {
        return Err(PoolError::Overflow);
    }
    Ok(a.checked_mul(b).ok_or(PoolError::Overflow)? / d)
}

/// ceil(a * b / d)
pub fn mul_div_up(a: U256, b: U256, d: U256) -> Result<U256, PoolError> {
    if d.is_zero() {
        return Err(PoolError::Overflow);
    }
    let product = a.checked_mul(b).ok_or(PoolError::Overflow)?;
    let quotient = product / d;
    if (product % d).is_zero() {
        Ok(quotient)
    } else {
        quotient.checked_add(U256::from(1)).ok_or(PoolError::Overflow)
    }
}
