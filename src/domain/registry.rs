//! Route Registry - Operator-Maintained Conversion Routes
//!
//! Holds the asset → route map, the ordered known-assets list and the
//! canonical routes. Entries are overwrite-only and carry no economic
//! validation; that belongs to the operator and off-chain calibration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::route::{AssetId, CanonicalRoutes, Route};

/// Where a residual-settlement route came from.
///
/// The fallback chain is fixed and enumerable: the asset's own route,
/// then the pivot route (target asset only), then the slippage-cover
/// route (pivot asset only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    /// The asset's own configured route.
    Configured,
    /// The canonical pivot route.
    Pivot,
    /// The canonical slippage-cover route.
    SlippageCover,
}

impl RouteSource {
    /// Resolution order for residual settlement.
    pub const CHAIN: [Self; 3] = [Self::Configured, Self::Pivot, Self::SlippageCover];
}

/// Persisted registry state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRegistry {
    /// Asset → conversion route.
    routes: BTreeMap<AssetId, Route>,
    /// Every asset the yield source might distribute, in operator order.
    known_assets: Vec<AssetId>,
    /// Canonical routes, unset until the operator configures them.
    canonical: Option<CanonicalRoutes>,
}

impl RouteRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the route for `asset`. Returns the previous route.
    pub fn set_route(&mut self, asset: AssetId, route: Route) -> Option<Route> {
        self.routes.insert(asset, route)
    }

    /// Configured route for `asset`.
    pub fn route_for(&self, asset: AssetId) -> Option<&Route> {
        self.routes.get(&asset)
    }

    /// All configured routes, ordered by asset.
    pub fn routes(&self) -> impl Iterator<Item = (&AssetId, &Route)> {
        self.routes.iter()
    }

    /// Append `asset` to the known-assets list. No-op if already present.
    pub fn add_known_asset(&mut self, asset: AssetId) -> bool {
        if self.is_known(asset) {
            return false;
        }
        self.known_assets.push(asset);
        true
    }

    /// Remove `asset` by swapping it with the last element.
    ///
    /// Order of the remaining assets is not preserved. Absent assets are a no-op.
    pub fn remove_known_asset(&mut self, asset: AssetId) -> bool {
        match self.known_assets.iter().position(|known| *known == asset) {
            Some(index) => {
                self.known_assets.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether `asset` is in the known-assets list.
    pub fn is_known(&self, asset: AssetId) -> bool {
        self.known_assets.contains(&asset)
    }

    /// Known assets in list order.
    pub fn known_assets(&self) -> &[AssetId] {
        &self.known_assets
    }

    /// Replace the canonical routes.
    pub fn set_canonical_routes(&mut self, canonical: CanonicalRoutes) {
        self.canonical = Some(canonical);
    }

    /// Canonical routes, if configured.
    pub fn canonical(&self) -> Option<&CanonicalRoutes> {
        self.canonical.as_ref()
    }

    /// Candidate route from a single link of the fallback chain.
    pub fn route_from(&self, source: RouteSource, asset: AssetId) -> Option<Route> {
        match source {
            RouteSource::Configured => self.routes.get(&asset).copied(),
            RouteSource::Pivot => self
                .canonical
                .filter(|c| c.target_asset() == asset)
                .map(|c| c.pivot),
            RouteSource::SlippageCover => self
                .canonical
                .filter(|c| c.pivot_asset() == asset && c.slippage_cover.contains(asset))
                .map(|c| c.slippage_cover),
        }
    }

    /// Walk the fallback chain and return the first route able to settle `asset`.
    pub fn residual_route(&self, asset: AssetId) -> Option<(RouteSource, Route)> {
        RouteSource::CHAIN.iter().find_map(|source| {
            self.route_from(*source, asset)
                .filter(|route| route.contains(asset) && !route.is_degenerate())
                .map(|route| (*source, route))
        })
    }
}
