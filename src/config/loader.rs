//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::{AppConfig, RouteConfig};
use crate::domain::amm::FEE_DENOMINATOR;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
  let path = path.as_ref();

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    engine = %config.engine.name,
    known_assets = config.registry.known_assets.len(),
    routes = config.registry.routes.len(),
    pools = config.simulation.pools.len(),
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).context("Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

fn validate_route(name: &str, route: &RouteConfig) -> Result<()> {
  anyhow::ensure!(
    route.asset_a != route.asset_b,
    "Route {name} joins {} to itself",
    route.asset_a
  );
  anyhow::ensure!(
    route.fee_pips < FEE_DENOMINATOR,
    "Route {name} fee must be below {FEE_DENOMINATOR} pips, got {}",
    route.fee_pips
  );
  anyhow::ensure!(
    route.tick_spacing > 0,
    "Route {name} tick_spacing must be positive, got {}",
    route.tick_spacing
  );
  Ok(())
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-zero engine, owner and caller addresses
/// - Well-formed routes (distinct assets, fee below 100%)
/// - Canonical routes that agree with each other
/// - Positive execution amounts
fn validate_config(config: &AppConfig) -> Result<()> {
  // Engine validation
  anyhow::ensure!(!config.engine.name.is_empty(), "Engine name must not be empty");
  anyhow::ensure!(
    !config.engine.address.is_zero(),
    "Engine address must be non-zero"
  );
  anyhow::ensure!(!config.engine.owner.is_zero(), "Engine owner must be non-zero");

  // Registry validation
  for entry in &config.registry.routes {
    validate_route(&format!("for {}", entry.asset), &entry.route)?;
  }
  let canonical = &config.registry.canonical;
  validate_route("pivot", &canonical.pivot)?;
  validate_route("profit", &canonical.profit)?;
  validate_route("slippage_cover", &canonical.slippage_cover)?;

  let routes = canonical.canonical();
  anyhow::ensure!(
    routes.slippage_cover.contains(routes.pivot_asset()),
    "slippage_cover route must contain the pivot asset {}",
    routes.pivot_asset()
  );
  anyhow::ensure!(
    routes
      .base_asset(config.simulation.yield_source.payment_asset)
      .is_some(),
    "profit route must contain the payment asset {}",
    config.simulation.yield_source.payment_asset
  );

  // Execution validation
  let execution = &config.execution;
  anyhow::ensure!(!execution.caller.is_zero(), "Execution caller must be non-zero");
  anyhow::ensure!(
    execution.decimals <= 36,
    "decimals must be <= 36, got {}",
    execution.decimals
  );
  anyhow::ensure!(
    execution.pump_amount.is_sign_positive() && !execution.pump_amount.is_zero(),
    "pump_amount must be positive, got {}",
    execution.pump_amount
  );
  anyhow::ensure!(
    execution.payment_amount.is_sign_positive() && !execution.payment_amount.is_zero(),
    "payment_amount must be positive, got {}",
    execution.payment_amount
  );

  // Simulation validation
  anyhow::ensure!(
    !config.simulation.venue.is_zero(),
    "Simulation venue address must be non-zero"
  );
  for pool in &config.simulation.pools {
    validate_route("in simulation.pools", &pool.route)?;
  }
  if let Some(gate) = &config.simulation.yield_source.gate {
    anyhow::ensure!(
      gate.route.asset_a == gate.target || gate.route.asset_b == gate.target,
      "Gate route must contain the gated asset {}",
      gate.target
    );
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use alloy::primitives::Address;

  use super::*;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_shipped_config_is_valid() {
    let config = load_config(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml")).unwrap();
    let registry = config.registry.registry();
    assert!(registry.canonical().is_some());
    assert!(!registry.known_assets().is_empty());

    let params = config
      .execution
      .params(config.registry.canonical.pivot_is_asset0)
      .unwrap();
    assert!(!params.pump_amount.is_zero());
  }

  #[test]
  fn test_cover_route_without_pivot_rejected() {
    let content = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml"))
      .unwrap();
    let mut config: AppConfig = toml::from_str(&content).unwrap();
    config.registry.canonical.slippage_cover.asset_a = Address::repeat_byte(0xF1);
    config.registry.canonical.slippage_cover.asset_b = Address::repeat_byte(0xF2);

    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("slippage_cover"));
  }
}
