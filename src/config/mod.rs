//! Configuration Module - TOML-based Engine Configuration
//!
//! Loads and validates configuration from `config.toml`. Every address,
//! route and amount is externalized here; nothing is hardcoded in the
//! domain layer. Human amounts are `Decimal` and converted to base units
//! with the configured decimals.

pub mod loader;

use alloy::primitives::{Address, U256};
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::execution::{ExecutionParams, unbounded_limit};
use crate::domain::registry::RouteRegistry;
use crate::domain::route::{CanonicalRoutes, Route};
use crate::domain::units::to_base_units;

/// Decimals of WAD-scaled prices.
pub const PRICE_DECIMALS: u32 = 18;

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Engine identity and runtime settings.
  pub engine: EngineConfig,
  /// Initial route registry (used when no snapshot is persisted).
  pub registry: RegistryConfig,
  /// Parameters for the execution run by the binary.
  pub execution: ExecutionConfig,
  /// In-memory venue, balances and yield source.
  pub simulation: SimulationConfig,
}

/// Engine identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
  /// Human-readable engine name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Address the engine trades under.
  pub address: Address,
  /// Initial operator.
  pub owner: Address,
  /// Directory holding `registry.json`.
  #[serde(default = "default_state_dir")]
  pub state_dir: String,
  /// Persist the registry after operator changes.
  #[serde(default = "default_true")]
  pub persist_registry: bool,
}

/// Route between two assets as written in config.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RouteConfig {
  pub asset_a: Address,
  pub asset_b: Address,
  /// Pool fee in pips (1e-6).
  pub fee_pips: u32,
  #[serde(default = "default_tick_spacing")]
  pub tick_spacing: i32,
  #[serde(default)]
  pub hooks: Option<Address>,
}

impl RouteConfig {
  /// Normalized domain route.
  pub fn route(&self) -> Route {
    let route = Route::new(self.asset_a, self.asset_b, self.fee_pips, self.tick_spacing);
    match self.hooks {
      Some(hooks) => route.with_hooks(hooks),
      None => route,
    }
  }
}

/// Conversion route for one asset.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AssetRouteConfig {
  pub asset: Address,
  #[serde(flatten)]
  pub route: RouteConfig,
}

/// Pivot, profit and slippage-cover routes.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CanonicalConfig {
  pub pivot: RouteConfig,
  pub profit: RouteConfig,
  pub slippage_cover: RouteConfig,
  /// Whether the pivot asset is `asset0` of the normalized pivot route.
  pub pivot_is_asset0: bool,
}

impl CanonicalConfig {
  pub fn canonical(&self) -> CanonicalRoutes {
    CanonicalRoutes {
      pivot: self.pivot.route(),
      profit: self.profit.route(),
      slippage_cover: self.slippage_cover.route(),
      pivot_is_asset0: self.pivot_is_asset0,
    }
  }
}

/// Initial registry contents.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
  /// Assets converted in stage 7, in order.
  #[serde(default)]
  pub known_assets: Vec<Address>,
  #[serde(default)]
  pub routes: Vec<AssetRouteConfig>,
  pub canonical: CanonicalConfig,
}

impl RegistryConfig {
  /// Build the domain registry.
  pub fn registry(&self) -> RouteRegistry {
    let mut registry = RouteRegistry::new();
    for asset in &self.known_assets {
      registry.add_known_asset(*asset);
    }
    for entry in &self.routes {
      registry.set_route(entry.asset, entry.route.route());
    }
    registry.set_canonical_routes(self.canonical.canonical());
    registry
  }
}

/// Execution inputs in human units.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
  /// Who triggers the execution and receives the profit.
  pub caller: Address,
  /// Decimals shared by every simulated asset.
  #[serde(default = "default_decimals")]
  pub decimals: u32,
  /// Pivot amount used to lift the target price.
  pub pump_amount: Decimal,
  /// Payment borrowed for the claim.
  pub payment_amount: Decimal,
  /// Worst pivot-route price after the pump (asset0 in asset1). Unbounded if absent.
  #[serde(default)]
  pub pump_price_limit: Option<Decimal>,
  /// Worst pivot-route price after the unwind. Unbounded if absent.
  #[serde(default)]
  pub unwind_price_limit: Option<Decimal>,
}

impl ExecutionConfig {
  /// Base-unit amount for a human amount.
  pub fn units(&self, amount: Decimal) -> Result<U256> {
    to_base_units(amount, self.decimals)
  }

  /// Execution parameters in base units and WAD prices.
  pub fn params(&self, pivot_is_asset0: bool) -> Result<ExecutionParams> {
    let limit = |price: Option<Decimal>, zero_for_one: bool| -> Result<U256> {
      match price {
        Some(price) => to_base_units(price, PRICE_DECIMALS),
        None => Ok(unbounded_limit(zero_for_one)),
      }
    };
    Ok(ExecutionParams {
      pump_amount: self.units(self.pump_amount)?,
      payment_amount: self.units(self.payment_amount)?,
      pump_price_limit: limit(self.pump_price_limit, pivot_is_asset0)?,
      unwind_price_limit: limit(self.unwind_price_limit, !pivot_is_asset0)?,
    })
  }
}

/// Seeded pool.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PoolConfig {
  #[serde(flatten)]
  pub route: RouteConfig,
  /// Reserve of the normalized route's asset0.
  pub reserve0: Decimal,
  /// Reserve of the normalized route's asset1.
  pub reserve1: Decimal,
}

/// Seeded balance.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BalanceConfig {
  pub asset: Address,
  pub holder: Address,
  pub amount: Decimal,
}

/// Registered strategy.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StrategyConfig {
  pub id: Address,
  pub asset: Address,
  /// Yield already accrued for this strategy.
  #[serde(default)]
  pub accrued: Decimal,
}

/// Claim price gate.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GateConfig {
  #[serde(flatten)]
  pub route: RouteConfig,
  /// Asset whose price is gated.
  pub target: Address,
  /// Minimum price of `target` in the route's other asset.
  pub min_price: Decimal,
}

/// Simulated yield source.
#[derive(Debug, Clone, Deserialize)]
pub struct YieldSourceConfig {
  pub address: Address,
  pub payment_asset: Address,
  /// Payment required per claim.
  pub price: Decimal,
  #[serde(default)]
  pub strategies: Vec<StrategyConfig>,
  #[serde(default)]
  pub gate: Option<GateConfig>,
}

/// In-memory world the binary runs against.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
  /// Venue custody address.
  pub venue: Address,
  #[serde(default)]
  pub pools: Vec<PoolConfig>,
  #[serde(default)]
  pub balances: Vec<BalanceConfig>,
  pub yield_source: YieldSourceConfig,
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_state_dir() -> String {
  "data".to_string()
}

fn default_true() -> bool {
  true
}

fn default_tick_spacing() -> i32 {
  1
}

fn default_decimals() -> u32 {
  18
}
