//! Registry Store Port - Persisted Route Registry
//!
//! Only the route registry, the known-assets list and the canonical
//! routes outlive a session. Stores keep the latest snapshot.

use async_trait::async_trait;

use crate::domain::registry::RouteRegistry;

/// Trait for registry persistence providers.
#[async_trait]
pub trait RegistryStore: Send + Sync + 'static {
  /// Load the most recent snapshot, if any was saved.
  async fn load(&self) -> anyhow::Result<Option<RouteRegistry>>;

  /// Replace the stored snapshot.
  async fn save(&self, registry: &RouteRegistry) -> anyhow::Result<()>;
}
