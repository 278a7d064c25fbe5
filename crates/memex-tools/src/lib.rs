//! The eight retrieval tools (component E, SPEC_FULL §4.5), independent of
//! any transport. `memex-server` wraps [`ToolService`]'s methods in
//! `#[tool]`-routed RPC handlers; the algorithms here know nothing about
//! MCP, stdio, or HTTP.
pub mod activity;
pub mod error;
pub mod sampling;
pub mod search;
pub mod stats;
pub mod types;

use std::sync::Arc;
use std::time::Instant;

use memex_capture::Embedder;
use memex_core::error::{Classify, ErrorKind};
use memex_index::{IndexError, VectorIndex};
use memex_store::RecordStore;

pub use error::ToolError;

/// Holds the read-only views every tool queries: (A) always, (B) when
/// configured. `index: None` and a runtime `Unavailable` from a configured
/// (B) are treated the same way by callers — both mean "fall back or
/// surface" per SPEC_FULL §4.2's failure semantics.
#[derive(Clone)]
pub struct ToolService {
    store: Arc<RecordStore>,
    index: Option<Arc<VectorIndex>>,
    embedder: Arc<dyn Embedder>,
}

impl ToolService {
    pub fn new(store: Arc<RecordStore>, index: Option<Arc<VectorIndex>>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, index, embedder }
    }

    fn require_index(&self) -> Result<&Arc<VectorIndex>, ToolError> {
        self.index
            .as_ref()
            .ok_or_else(|| IndexError::Unavailable("vector index not configured".to_string()).into())
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ToolError> {
        self.embedder.embed(text).map_err(|e| ToolError::InvalidArgument {
            field: "query".to_string(),
            message: e.to_string(),
        })
    }

    /// Run `f` and report its latency and outcome kind to the installed
    /// [`memex_core::metrics::ToolMetrics`] hook, if any.
    pub fn observe<T>(&self, tool: &str, f: impl FnOnce() -> Result<T, ToolError>) -> Result<T, ToolError> {
        let start = Instant::now();
        let result = f();
        if let Some(metrics) = memex_core::metrics::tool_metrics() {
            let outcome: Result<(), ErrorKind> = match &result {
                Ok(_) => Ok(()),
                Err(e) => Err(e.kind()),
            };
            metrics.record_tool_call(tool, start.elapsed(), outcome);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memex_capture::FakeEmbedder;
    use memex_index::{BackendConfig, IndexConfig};
    use memex_store::CaptureRecord;
    use tempfile::TempDir;

    fn service() -> (TempDir, ToolService) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RecordStore::open(dir.path()).unwrap());
        let index = Arc::new(VectorIndex::open(IndexConfig::new(4).with_backend(BackendConfig::InMemory)).unwrap());
        let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(4));
        (dir, ToolService::new(store, Some(index), embedder))
    }

    #[test]
    fn search_screenshots_uses_vector_mode_when_index_present() {
        use crate::types::{SearchMode, SearchScreenshotsRequest};

        let (_dir, svc) = service();
        svc.store
            .put(&CaptureRecord::new(1_700_000_000_000, "Display_1", "quarterly invoice review".into(), "capture-v1"))
            .unwrap();
        svc.index
            .as_ref()
            .unwrap()
            .upsert(
                "x",
                &svc.embedder.embed("quarterly invoice review").unwrap(),
                memex_index::IndexMetadata {
                    timestamp: 1_700_000_000_000,
                    timestamp_iso: "2023-11-14T22-13-20".into(),
                    screen_name: "Display_1".into(),
                    text_length: 24,
                    word_count: 3,
                    data_type: "ocr".into(),
                    source: "capture-v1".into(),
                },
                "Display_1 quarterly invoice review".into(),
            )
            .unwrap();

        let resp = svc
            .search_screenshots(SearchScreenshotsRequest {
                query: "quarterly invoice review".into(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(resp.mode, SearchMode::VectorIndex);
        assert_eq!(resp.hits.len(), 1);
    }

    #[test]
    fn search_screenshots_falls_back_to_file_scan_without_index() {
        use crate::types::{SearchMode, SearchScreenshotsRequest};

        let dir = TempDir::new().unwrap();
        let store = Arc::new(RecordStore::open(dir.path()).unwrap());
        let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(4));
        let svc = ToolService::new(store, None, embedder);

        svc.store
            .put(&CaptureRecord::new(1, "Display_1", "an invoice arrived".into(), "capture-v1"))
            .unwrap();
        svc.store
            .put(&CaptureRecord::new(2, "Display_1", "nothing relevant".into(), "capture-v1"))
            .unwrap();

        let resp = svc
            .search_screenshots(SearchScreenshotsRequest {
                query: "invoice".into(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(resp.mode, SearchMode::FileScanFallback);
        assert_eq!(resp.hits.len(), 1);
        assert!(resp.hits[0].text.to_lowercase().contains("invoice"));
    }
}
