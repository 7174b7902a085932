//! Rebuilding a search index from the store.
//!
//! The index is written outside the store transaction, so a failed index
//! write leaves the two out of step. Reindexing closes the gap: it clears the
//! documents of one record type and mirrors every stored record again, one
//! store page at a time.

use bench_domain::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{EntityStore, SearchIndex};
use crate::error::StorageResult;
use crate::types::PageRequest;

/// Default number of records read per store page.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Outcome of reindexing one record type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReindexReport {
    /// The record type.
    pub entity_type: String,
    /// Documents removed before re-mirroring, when the index reports it.
    pub removed: u64,
    /// Records found in the store.
    pub total: u64,
    /// Records written to the index.
    pub indexed: u64,
    /// Records that could not be indexed.
    pub errors: Vec<ReindexFailure>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub completed_at: DateTime<Utc>,
}

/// A record that could not be indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReindexFailure {
    /// Record id.
    pub id: EntityId,
    /// Error message.
    pub error: String,
}

impl ReindexReport {
    /// Returns true if every stored record was indexed.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty() && self.indexed == self.total
    }
}

/// Clears the index for `entity_type` and mirrors every stored record into it.
///
/// Failures on individual records are collected in the report; failures to
/// read the store or clear the index abort the run.
pub async fn reindex_type<S, I>(
    store: &S,
    index: &I,
    entity_type: &str,
    batch_size: usize,
) -> StorageResult<ReindexReport>
where
    S: EntityStore + ?Sized,
    I: SearchIndex + ?Sized,
{
    let started_at = Utc::now();
    let removed = index.clear(entity_type).await?;

    let mut report = ReindexReport {
        entity_type: entity_type.to_string(),
        removed,
        total: 0,
        indexed: 0,
        errors: Vec::new(),
        started_at,
        completed_at: started_at,
    };

    let size = u32::try_from(batch_size.max(1)).unwrap_or(u32::MAX);
    let mut request = PageRequest::new(0, size);
    loop {
        let page = store.find_page(entity_type, &[], &request).await?;
        report.total += page.content.len() as u64;

        for stored in &page.content {
            match index.index(stored).await {
                Ok(()) => report.indexed += 1,
                Err(e) => {
                    warn!(entity_type, id = stored.id(), error = %e, "Failed to reindex record");
                    report.errors.push(ReindexFailure {
                        id: stored.id(),
                        error: e.to_string(),
                    });
                }
            }
        }
        debug!(
            entity_type,
            page = request.page,
            indexed = report.indexed,
            "Reindexed batch"
        );

        if page.content.is_empty() || !page.has_next() {
            break;
        }
        request = request.next();
    }

    report.completed_at = Utc::now();
    info!(
        entity_type,
        total = report.total,
        indexed = report.indexed,
        failed = report.errors.len(),
        "Reindex finished"
    );
    Ok(report)
}
