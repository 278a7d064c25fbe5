//! Catch-up and rebuild sync between (A) and (B) (component D, SPEC_FULL
//! §4.4). Both modes drive the same idempotent upsert path, so a sync run
//! interrupted partway through is safe to re-run from the start.
pub mod error;

use std::sync::Arc;

use memex_capture::Embedder;
use memex_index::{IndexMetadata, VectorIndex};
use memex_store::RecordStore;
use tracing::warn;

pub use error::{exit_code, SyncError};

/// Outcome of a catch-up or rebuild run (SPEC_FULL §4.4).
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SyncReport {
    pub scanned: usize,
    pub added: usize,
    pub skipped_empty: usize,
    pub skipped_existing: usize,
    pub errors: usize,
}

pub struct Sync {
    store: Arc<RecordStore>,
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl Sync {
    pub fn new(store: Arc<RecordStore>, index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, index, embedder }
    }

    /// Enumerate (A); for every id not already present in (B), upsert it.
    /// Records with empty text are skipped, matching the capture pipeline's
    /// own threshold policy.
    pub fn catch_up(&self) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();

        for record in self.store.iter(memex_store::RecordFilter::default())? {
            report.scanned += 1;

            if self.index.contains(&record.id)? {
                report.skipped_existing += 1;
                continue;
            }
            if record.is_empty_text() {
                report.skipped_empty += 1;
                continue;
            }
            match self.upsert(&record) {
                Ok(()) => report.added += 1,
                Err(e) => {
                    warn!(id = %record.id, error = %e, "sync: upsert failed during catch-up");
                    report.errors += 1;
                }
            }
        }
        Ok(report)
    }

    /// Clear (B) and reinsert every non-empty record from (A). Callers are
    /// expected to have obtained explicit confirmation before calling this;
    /// it is destructive to (B) (not (A)).
    pub fn rebuild(&self, confirmed: bool) -> Result<SyncReport, SyncError> {
        if !confirmed {
            return Err(SyncError::InvalidArgument {
                field: "confirmed".to_string(),
                message: "rebuild requires explicit confirmation".to_string(),
            });
        }

        self.index.clear()?;

        let mut report = SyncReport::default();
        for record in self.store.iter(memex_store::RecordFilter::default())? {
            report.scanned += 1;
            if record.is_empty_text() {
                report.skipped_empty += 1;
                continue;
            }
            match self.upsert(&record) {
                Ok(()) => report.added += 1,
                Err(e) => {
                    warn!(id = %record.id, error = %e, "sync: upsert failed during rebuild");
                    report.errors += 1;
                }
            }
        }
        Ok(report)
    }

    fn upsert(&self, record: &memex_store::CaptureRecord) -> Result<(), SyncError> {
        let embedding = self
            .embedder
            .embed(&record.text)
            .map_err(|e| SyncError::InvalidArgument {
                field: "text".to_string(),
                message: e.to_string(),
            })?;
        let metadata = IndexMetadata {
            timestamp: record.timestamp,
            timestamp_iso: record.timestamp_iso.clone(),
            screen_name: record.screen_name.clone(),
            text_length: record.text_length,
            word_count: record.word_count,
            data_type: record.data_type.clone(),
            source: record.source.clone(),
        };
        let document = format!("{} {}", record.screen_name, record.text);
        self.index.upsert(&record.id, &embedding, metadata, document)?;
        Ok(())
    }
}
