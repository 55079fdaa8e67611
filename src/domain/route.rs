//! Conversion routes and the canonical route set.
//!
//! A `Route` is the venue's pool key: an ordered asset pair plus the
//! trading parameters that identify one pool. Routes are always stored
//! normalized (`asset0 < asset1`) so two descriptions of the same pool
//! compare equal.

use std::fmt;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Asset identifier (token contract address).
pub type AssetId = Address;

/// Conversion path between two assets on the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Route {
    /// Lower-ordered asset of the pair.
    pub asset0: AssetId,
    /// Higher-ordered asset of the pair.
    pub asset1: AssetId,
    /// Pool fee in hundredths of a basis point (1_000_000 = 100%).
    pub fee_pips: u32,
    /// Venue tick spacing.
    pub tick_spacing: i32,
    /// Hook contract attached to the pool (zero for none).
    #[serde(default)]
    pub hooks: Address,
}

impl Route {
    /// Build a route from an unordered pair, normalizing asset order.
    pub fn new(a: AssetId, b: AssetId, fee_pips: u32, tick_spacing: i32) -> Self {
        let (asset0, asset1) = if a <= b { (a, b) } else { (b, a) };
        Self {
            asset0,
            asset1,
            fee_pips,
            tick_spacing,
            hooks: Address::ZERO,
        }
    }

    /// Attach a hook contract.
    pub fn with_hooks(mut self, hooks: Address) -> Self {
        self.hooks = hooks;
        self
    }

    /// Whether `asset` is one of the two endpoints.
    pub fn contains(&self, asset: AssetId) -> bool {
        self.asset0 == asset || self.asset1 == asset
    }

    /// The endpoint opposite `asset`, or `None` if `asset` is not an endpoint.
    pub fn other(&self, asset: AssetId) -> Option<AssetId> {
        if asset == self.asset0 {
            Some(self.asset1)
        } else if asset == self.asset1 {
            Some(self.asset0)
        } else {
            None
        }
    }

    /// Swap direction when selling `asset` into this route.
    ///
    /// Returns `Some(true)` for asset0 → asset1.
    pub fn sell_direction(&self, asset: AssetId) -> Option<bool> {
        if asset == self.asset0 {
            Some(true)
        } else if asset == self.asset1 {
            Some(false)
        } else {
            None
        }
    }

    /// Swap direction when buying `asset` out of this route.
    pub fn buy_direction(&self, asset: AssetId) -> Option<bool> {
        self.sell_direction(asset).map(|zero_for_one| !zero_for_one)
    }

    /// Whether both endpoints are the same asset (a self-referential route).
    pub fn is_degenerate(&self) -> bool {
        self.asset0 == self.asset1
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.asset0, self.asset1, self.fee_pips)
    }
}

/// The three canonical routes plus the pivot-route ordering flag.
///
/// The pivot route pairs the target asset with the pivot asset;
/// `pivot_is_asset0` says which side of that pair is the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRoutes {
    /// Target ↔ pivot route used to pump and unwind.
    pub pivot: Route,
    /// Payment asset ↔ base asset route used to realize profit.
    pub profit: Route,
    /// Route that covers pivot-asset shortfalls.
    pub slippage_cover: Route,
    /// Whether the pivot asset is `pivot.asset0`.
    pub pivot_is_asset0: bool,
}

impl CanonicalRoutes {
    /// Pivot asset of the pivot route.
    pub fn pivot_asset(&self) -> AssetId {
        if self.pivot_is_asset0 {
            self.pivot.asset0
        } else {
            self.pivot.asset1
        }
    }

    /// Target asset of the pivot route (the one pushed above the price gate).
    pub fn target_asset(&self) -> AssetId {
        if self.pivot_is_asset0 {
            self.pivot.asset1
        } else {
            self.pivot.asset0
        }
    }

    /// Base asset for a given payment asset: the other end of the profit route.
    pub fn base_asset(&self, payment_asset: AssetId) -> Option<AssetId> {
        self.profit.other(payment_asset)
    }
}
