use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pricetrail_core::{MergeOutcome, Observation, UniqueId, resolve_identity};
use pricetrail_storage::{StorageBackend, StorageError};
use pricetrail_storage::traits::ProductStore;

use crate::{IngestConfig, KeyGuard, KeyedLocks, ServiceError};

/// The only write path for product records.
///
/// Merges of one identity are serialized in-process through [`KeyedLocks`]
/// on top of the store's own transactional guarantee, so concurrent callers
/// see their observations applied in lock-acquisition order.
///
/// The key stays locked until the store call itself finishes. A merge that
/// times out is reported to its caller, but the next merge of the same
/// identity still waits for the abandoned store call.
pub struct MergeService<S = StorageBackend> {
    storage: Arc<S>,
    locks: Arc<KeyedLocks>,
    config: IngestConfig,
}

impl<S> Clone for MergeService<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            locks: Arc::clone(&self.locks),
            config: self.config,
        }
    }
}

impl<S> MergeService<S>
where
    S: ProductStore + 'static,
{
    #[must_use]
    pub fn new(storage: Arc<S>, config: IngestConfig) -> Self {
        Self { storage, locks: Arc::new(KeyedLocks::new()), config }
    }

    #[must_use]
    pub const fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Merge one observation into its product record.
    pub async fn merge(&self, obs: &Observation) -> Result<MergeOutcome, ServiceError> {
        let unique_id = resolve_identity(obs)?;
        let guard = self.locks.lock(unique_id.as_str()).await;
        self.merge_locked(&unique_id, obs, guard).await
    }

    async fn merge_locked(
        &self,
        unique_id: &UniqueId,
        obs: &Observation,
        guard: KeyGuard,
    ) -> Result<MergeOutcome, ServiceError> {
        let storage = Arc::clone(&self.storage);
        let obs = obs.clone();
        let now = Utc::now();
        let store_call = tokio::spawn(async move {
            let _guard = guard;
            storage.merge_observation(&obs, now).await
        });

        let after: Duration = self.config.storage_timeout;
        match tokio::time::timeout(after, store_call).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(join_err)) => Err(StorageError::from(join_err).into()),
            Err(_elapsed) => {
                tracing::warn!(unique_id = %unique_id, ?after, "Storage merge timed out");
                Err(ServiceError::Timeout { unique_id: unique_id.to_string(), after })
            },
        }
    }

    pub(crate) fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}
