use std::time::Duration;

use pricetrail_core::{DEFAULT_INGEST_WORKERS, DEFAULT_STORAGE_TIMEOUT_SECS, env_parse_with_default};

/// Tuning for merge orchestration and bulk ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestConfig {
    /// Upper bound on identities merged concurrently by one batch. At least 1.
    pub workers: usize,
    /// Deadline for a single storage merge call.
    pub storage_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_INGEST_WORKERS,
            storage_timeout: Duration::from_secs(DEFAULT_STORAGE_TIMEOUT_SECS),
        }
    }
}

impl IngestConfig {
    /// Read `PRICETRAIL_INGEST_WORKERS` and `PRICETRAIL_STORAGE_TIMEOUT_SECS`.
    #[must_use]
    pub fn from_env() -> Self {
        let workers = env_parse_with_default("PRICETRAIL_INGEST_WORKERS", DEFAULT_INGEST_WORKERS);
        let timeout_secs =
            env_parse_with_default("PRICETRAIL_STORAGE_TIMEOUT_SECS", DEFAULT_STORAGE_TIMEOUT_SECS);
        Self::default()
            .with_workers(workers)
            .with_storage_timeout(Duration::from_secs(timeout_secs))
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[must_use]
    pub const fn with_storage_timeout(mut self, storage_timeout: Duration) -> Self {
        self.storage_timeout = storage_timeout;
        self
    }
}
