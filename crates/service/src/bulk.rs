//! Bulk ingestion: fail-soft per item, parallel across identities.
//!
//! Observations are grouped by identity in arrival order. Each group runs as
//! one task that merges its items sequentially, so appends for one record are
//! never reordered. Groups run concurrently up to `IngestConfig::workers`.

use std::collections::HashMap;
use std::sync::Arc;

use pricetrail_core::{MergeAction, MergeOutcome, Observation, UniqueId, resolve_identity};
use pricetrail_storage::traits::ProductStore;
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::{MergeService, ServiceError};

/// One input item that did not produce a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Position in the submitted batch.
    pub index: usize,
    /// `None` when the item had no usable identity.
    pub unique_id: Option<String>,
    pub reason: String,
}

/// Outcome counts of a batch. `inserted + updated + errors` equals the batch size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkSummary {
    pub inserted: usize,
    pub updated: usize,
    pub errors: usize,
    /// Sorted by `index`, one entry per counted error.
    pub failures: Vec<ItemFailure>,
}

impl BulkSummary {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.inserted + self.updated + self.errors
    }

    fn record_success(&mut self, outcome: &MergeOutcome) {
        match outcome.action {
            MergeAction::Inserted => self.inserted += 1,
            MergeAction::Updated => self.updated += 1,
        }
    }

    fn record_failure(&mut self, index: usize, unique_id: Option<&UniqueId>, reason: String) {
        self.errors += 1;
        self.failures.push(ItemFailure {
            index,
            unique_id: unique_id.map(ToString::to_string),
            reason,
        });
    }
}

type ItemResult = (usize, Result<MergeOutcome, ServiceError>);

impl<S> MergeService<S>
where
    S: ProductStore + 'static,
{
    /// Merge every observation, counting failures instead of aborting.
    pub async fn ingest_batch(&self, observations: Vec<Observation>) -> BulkSummary {
        let batch_size = observations.len();
        let mut summary = BulkSummary::default();

        let mut groups: Vec<(UniqueId, Vec<(usize, Observation)>)> = Vec::new();
        let mut group_of: HashMap<UniqueId, usize> = HashMap::new();
        for (index, obs) in observations.into_iter().enumerate() {
            match resolve_identity(&obs) {
                Ok(unique_id) => {
                    let slot = *group_of.entry(unique_id.clone()).or_insert_with(|| {
                        groups.push((unique_id, Vec::new()));
                        groups.len() - 1
                    });
                    if let Some((_, items)) = groups.get_mut(slot) {
                        items.push((index, obs));
                    }
                },
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping observation without identity");
                    summary.record_failure(index, None, e.to_string());
                },
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.config().workers.max(1)));
        let mut handles = Vec::with_capacity(groups.len());
        for (unique_id, items) in groups {
            let indices: Vec<usize> = items.iter().map(|(index, _)| *index).collect();
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                for index in indices {
                    summary.record_failure(index, Some(&unique_id), "worker pool closed".into());
                }
                continue;
            };
            let service = self.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                service.merge_group(items).await
            });
            handles.push((unique_id, indices, handle));
        }

        for (unique_id, indices, handle) in handles {
            match handle.await {
                Ok(results) => {
                    for (index, result) in results {
                        match result {
                            Ok(outcome) => summary.record_success(&outcome),
                            Err(e) => {
                                tracing::warn!(
                                    index,
                                    unique_id = %unique_id,
                                    error = %e,
                                    "Merge failed"
                                );
                                summary.record_failure(index, Some(&unique_id), e.to_string());
                            },
                        }
                    }
                },
                Err(join_err) => {
                    tracing::warn!(
                        unique_id = %unique_id,
                        error = %join_err,
                        "Merge worker failed"
                    );
                    for index in indices {
                        summary.record_failure(
                            index,
                            Some(&unique_id),
                            format!("merge worker failed: {join_err}"),
                        );
                    }
                },
            }
        }

        summary.failures.sort_by_key(|f| f.index);
        debug_assert_eq!(summary.total(), batch_size);
        tracing::info!(
            batch_size,
            inserted = summary.inserted,
            updated = summary.updated,
            errors = summary.errors,
            "Bulk ingestion finished"
        );
        summary
    }

    async fn merge_group(&self, items: Vec<(usize, Observation)>) -> Vec<ItemResult> {
        let mut results = Vec::with_capacity(items.len());
        for (index, obs) in items {
            results.push((index, self.merge(&obs).await));
        }
        results
    }
}
