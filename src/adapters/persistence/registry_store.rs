//! Registry Store - Atomic JSON Registry Persistence
//!
//! Saves the route registry to `registry.json` using atomic writes
//! (write to tmp file, then rename), so a crash mid-write leaves the
//! previous snapshot intact.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::{info, instrument};

use crate::domain::registry::RouteRegistry;
use crate::ports::registry_store::RegistryStore;

/// File-backed registry store.
pub struct JsonRegistryStore {
    /// Path to registry.json.
    path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
}

impl JsonRegistryStore {
    /// Create a store in `state_dir`, creating the directory if needed.
    pub async fn new(state_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = state_dir.as_ref();
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create state directory {}", dir.display()))?;

        Ok(Self {
            path: dir.join("registry.json"),
            tmp_path: dir.join("registry.json.tmp"),
        })
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RegistryStore for JsonRegistryStore {
    #[instrument(skip(self))]
    async fn load(&self) -> Result<Option<RouteRegistry>> {
        if !fs::try_exists(&self.path)
            .await
            .context("Failed to stat registry file")?
        {
            info!(path = %self.path.display(), "No registry snapshot found, starting fresh");
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)
            .await
            .context("Failed to read registry file")?;
        let registry: RouteRegistry =
            serde_json::from_str(&json).context("Failed to parse registry JSON")?;

        info!(
            known_assets = registry.known_assets().len(),
            routes = registry.routes().count(),
            canonical = registry.canonical().is_some(),
            "Registry snapshot loaded"
        );
        Ok(Some(registry))
    }

    #[instrument(skip(self, registry))]
    async fn save(&self, registry: &RouteRegistry) -> Result<()> {
        let json =
            serde_json::to_string_pretty(registry).context("Failed to serialize registry")?;

        fs::write(&self.tmp_path, &json)
            .await
            .context("Failed to write tmp registry file")?;
        fs::rename(&self.tmp_path, &self.path)
            .await
            .context("Failed to rename registry file")?;

        info!(path = %self.path.display(), "Registry snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Address;

    use super::*;
    use crate::domain::route::Route;

    #[tokio::test]
    async fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRegistryStore::new(dir.path()).await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_restores_registry() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRegistryStore::new(dir.path().join("nested")).await.unwrap();

        let mut registry = RouteRegistry::new();
        let asset = Address::repeat_byte(5);
        registry.add_known_asset(asset);
        registry.set_route(asset, Route::new(asset, Address::repeat_byte(3), 3000, 60));

        store.save(&registry).await.unwrap();
        assert!(!dir.path().join("nested/registry.json.tmp").exists());
        assert_eq!(store.load().await.unwrap(), Some(registry));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRegistryStore::new(dir.path()).await.unwrap();
        fs::write(store.path(), "{not json").await.unwrap();
        assert!(store.load().await.is_err());
    }
}
