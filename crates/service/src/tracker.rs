//! Entry point wiring storage, merge orchestration and queries together.

use std::sync::Arc;

use pricetrail_core::{MergeOutcome, Observation};
use pricetrail_storage::traits::{MaintenanceStore, ProductQueryStore, ProductStore};
use pricetrail_storage::{StorageBackend, StorageSettings};

use crate::{BulkSummary, IngestConfig, MergeService, QueryService, ServiceError};

pub struct PriceTracker<S = StorageBackend> {
    merges: MergeService<S>,
    queries: QueryService<S>,
}

impl PriceTracker<StorageBackend> {
    /// Open storage and build the services.
    ///
    /// Any failure to reach or migrate storage is returned here, before a
    /// single observation can be submitted.
    pub async fn connect(
        settings: &StorageSettings,
        config: IngestConfig,
    ) -> Result<Self, ServiceError> {
        let storage = StorageBackend::connect(settings).await?;
        tracing::info!(
            backend = storage.backend_name(),
            workers = config.workers,
            storage_timeout = ?config.storage_timeout,
            "Price tracker ready"
        );
        Ok(Self::with_storage(Arc::new(storage), config))
    }

    /// [`connect`](Self::connect) with settings and config read from the environment.
    pub async fn from_env() -> Result<Self, ServiceError> {
        let settings = StorageSettings::from_env()?;
        Self::connect(&settings, IngestConfig::from_env()).await
    }
}

impl<S> PriceTracker<S>
where
    S: ProductStore + ProductQueryStore + MaintenanceStore + 'static,
{
    #[must_use]
    pub fn with_storage(storage: Arc<S>, config: IngestConfig) -> Self {
        Self {
            merges: MergeService::new(Arc::clone(&storage), config),
            queries: QueryService::new(storage),
        }
    }

    #[must_use]
    pub const fn merges(&self) -> &MergeService<S> {
        &self.merges
    }

    #[must_use]
    pub const fn queries(&self) -> &QueryService<S> {
        &self.queries
    }

    pub async fn ingest(&self, obs: &Observation) -> Result<MergeOutcome, ServiceError> {
        self.merges.merge(obs).await
    }

    pub async fn ingest_batch(&self, observations: Vec<Observation>) -> BulkSummary {
        self.merges.ingest_batch(observations).await
    }

    /// Total stored records.
    pub async fn count_products(&self) -> Result<u64, ServiceError> {
        Ok(self.merges.storage().count_products().await?)
    }

    /// External maintenance: drop records that never carried a price.
    pub async fn purge_unpriced(&self) -> Result<u64, ServiceError> {
        Ok(self.merges.storage().purge_unpriced().await?)
    }

    /// External maintenance: delete every stored record.
    pub async fn purge_all(&self) -> Result<u64, ServiceError> {
        Ok(self.merges.storage().purge_all().await?)
    }
}
