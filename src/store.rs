// Copyright (c) 2025 - Cowboy AI, Inc.
//! Model Snapshot Store
//!
//! Models are addressable by version. A store holds one lineage of
//! snapshots: every save names the version it was derived from and fails
//! unless that is still the latest stored version. Two edits made against
//! the same snapshot therefore cannot both be saved, however far each one
//! advanced the version.
//!
//! ```text
//! save(model-v1, expected None)      ok
//! save(model-v2, expected model-v1)  ok
//! save(model-v3, expected model-v1)  Err(Store)   model-v2 was saved first
//! ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{CanonicalModel, VersionId};
use crate::errors::{SyncError, SyncResult};

/// Persistence boundary for model snapshots
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Snapshot stored under `version`, if any
    async fn load(&self, version: VersionId) -> SyncResult<Option<CanonicalModel>>;

    /// Snapshot with the highest version, if any
    async fn latest(&self) -> SyncResult<Option<CanonicalModel>>;

    /// Store a snapshot under its own version
    ///
    /// `expected_version` is the snapshot the model was derived from, `None`
    /// for the first model of an empty store.
    ///
    /// # Errors
    ///
    /// [`SyncError::Store`] if `expected_version` is not the latest stored
    /// version, or if the model's version does not advance past it.
    async fn save(
        &self,
        model: CanonicalModel,
        expected_version: Option<VersionId>,
    ) -> SyncResult<()>;
}

/// Process-local [`ModelStore`]
#[derive(Debug, Default)]
pub struct InMemoryModelStore {
    snapshots: RwLock<BTreeMap<u64, CanonicalModel>>,
}

impl InMemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots held
    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }
}

#[async_trait]
impl ModelStore for InMemoryModelStore {
    async fn load(&self, version: VersionId) -> SyncResult<Option<CanonicalModel>> {
        Ok(self.snapshots.read().await.get(&version.number()).cloned())
    }

    async fn latest(&self) -> SyncResult<Option<CanonicalModel>> {
        Ok(self
            .snapshots
            .read()
            .await
            .last_key_value()
            .map(|(_, model)| model.clone()))
    }

    async fn save(
        &self,
        model: CanonicalModel,
        expected_version: Option<VersionId>,
    ) -> SyncResult<()> {
        let mut snapshots = self.snapshots.write().await;
        let version = model.version_id();
        let latest = snapshots.keys().next_back().copied();

        if latest != expected_version.map(|v| v.number()) {
            return Err(SyncError::Store(format!(
                "cannot save {}: derived from {}, latest stored is {}",
                version,
                expected_version.map_or_else(|| "nothing".to_string(), |v| v.to_string()),
                latest.map_or_else(|| "nothing".to_string(), |n| format!("model-v{}", n)),
            )));
        }
        if latest.is_some_and(|n| version.number() <= n) {
            return Err(SyncError::Store(format!(
                "cannot save {}: version does not advance",
                version
            )));
        }

        debug!(%version, "Saving model snapshot");
        snapshots.insert(version.number(), model);
        Ok(())
    }
}
