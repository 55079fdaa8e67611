//! Coverage Validator - Strategy Assets vs Known Assets
//!
//! Every asset the yield source currently distributes must be in the
//! known-assets list, otherwise the claimed basket could contain an asset
//! the engine never converts and the session could not close. Runs as the
//! second stage of every session and standalone so bots can skip a
//! doomed execution.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::coverage::check_coverage;
use crate::domain::error::EngineError;
use crate::domain::route::AssetId;
use crate::ports::yield_source::YieldSource;

/// Checks the coverage invariant against a live yield source.
pub struct CoverageValidator<Y: YieldSource> {
  source: Arc<Y>,
}

impl<Y: YieldSource> CoverageValidator<Y> {
  /// Create a validator over the given yield source.
  pub fn new(source: Arc<Y>) -> Self {
    Self { source }
  }

  /// Resolve the distributed asset of every registered strategy, in order.
  pub async fn strategy_assets(&self) -> Result<Vec<AssetId>, EngineError> {
    let strategies = self.source.registered_strategies().await?;
    let mut assets = Vec::with_capacity(strategies.len());
    for id in strategies {
      assets.push(self.source.strategy_asset(id).await?);
    }
    Ok(assets)
  }

  /// Fail with `MissingCoverage` naming the first uncovered strategy asset.
  #[instrument(skip_all, fields(known = known.len()))]
  pub async fn validate(&self, known: &[AssetId]) -> Result<(), EngineError> {
    let assets = self.strategy_assets().await?;
    check_coverage(&assets, known)?;
    debug!(strategies = assets.len(), "Coverage invariant holds");
    Ok(())
  }
}
