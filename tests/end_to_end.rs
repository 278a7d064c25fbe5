//! Multi-component scenarios spanning the record store, vector index, the
//! capture pipeline, sync, and the tool-service algorithms, against a real
//! on-disk (A) + embedded (B) pair in a `TempDir` — the six scenarios of
//! SPEC_FULL §8, in the spirit of the teacher's `tests/pipeline_integration.rs`.
use std::sync::Arc;

use memex_capture::{CapturePipeline, Embedder, FakeEmbedder, FakeScreenCapture, FakeTextExtractor, PendingQueue};
use memex_index::{BackendConfig, IndexConfig, VectorIndex};
use memex_store::{CaptureRecord, RecordStore};
use memex_sync::Sync;
use memex_tools::types::{
    ActivityGraphRequest, ActivityGrouping, ActivityPeriod, GetStatsResponse, SampleTimeRangeRequest,
    SearchRecentRelevantRequest, SearchScreenshotsRequest, SearchMode,
};
use memex_tools::ToolService;
use tempfile::TempDir;

const DIM: usize = 4;

struct Harness {
    _dir: TempDir,
    store: Arc<RecordStore>,
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(RecordStore::open(dir.path().join("records")).unwrap());
    let index = Arc::new(VectorIndex::open(IndexConfig::new(DIM).with_backend(BackendConfig::InMemory)).unwrap());
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(DIM));
    Harness { _dir: dir, store, index, embedder }
}

impl Harness {
    fn tools(&self) -> ToolService {
        ToolService::new(self.store.clone(), Some(self.index.clone()), self.embedder.clone())
    }
}

/// Scenario 1: basic capture and recall. Three ticks over two screens
/// should leave six records in (A) and six entries in (B), and `get-stats`
/// should agree with both counts.
#[tokio::test]
async fn basic_capture_and_recall() {
    let h = harness();
    let pending = PendingQueue::open(h.store_dir()).unwrap();
    let pipeline = CapturePipeline::new(
        Arc::new(FakeScreenCapture::new(["Display_1", "Display_2"])),
        Arc::new(FakeTextExtractor),
        h.embedder.clone(),
        h.store.clone(),
        h.index.clone(),
        pending,
    );

    for _ in 0..3 {
        let report = pipeline.run_tick().await.unwrap();
        assert_eq!(report.screens.len(), 2);
    }

    assert_eq!(h.store.count().unwrap(), 6);
    assert_eq!(h.index.count().unwrap(), 6);

    let stats: GetStatsResponse = h.tools().get_stats().unwrap();
    assert_eq!(stats.record_count_on_disk, 6);
    assert_eq!(stats.index_count, Some(6));
    assert!(stats.index_available);
}

/// Scenario 2: index outage falls back to a file scan. Every hit must
/// contain the literal query substring and the response must flag its mode.
#[test]
fn fallback_on_index_outage() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(RecordStore::open(dir.path()).unwrap());
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(DIM));

    for i in 0..10 {
        let text = if i % 3 == 0 { "an overdue invoice arrived" } else { "nothing notable happened" };
        store.put(&CaptureRecord::new(1_700_000_000_000 + i * 60_000, "Display_1", text.into(), "capture-v1")).unwrap();
    }

    // No index configured at all: (B) is unreachable by construction.
    let tools = ToolService::new(store, None, embedder);
    let resp = tools
        .search_screenshots(SearchScreenshotsRequest {
            query: "invoice".into(),
            limit: Some(5),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(resp.mode, SearchMode::FileScanFallback);
    assert!(resp.hits.len() <= 5);
    assert!(resp.hits.iter().all(|h| h.text.to_lowercase().contains("invoice")));
    assert!(resp.hits.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
}

/// Scenario 3: sparse records in two one-hour windows of a 24h day should
/// produce exactly two non-empty samples among 24, in chronological order.
#[test]
fn sampling_sparsity_reports_empty_windows_without_interpolating() {
    let h = harness();
    let day_start = memex_core::time::from_millis(1_700_000_000_000 / 86_400_000 * 86_400_000).unwrap();

    h.store
        .put(&CaptureRecord::new((day_start + chrono::Duration::hours(9)).timestamp_millis(), "Display_1", "morning standup".into(), "capture-v1"))
        .unwrap();
    h.store
        .put(&CaptureRecord::new((day_start + chrono::Duration::hours(15)).timestamp_millis(), "Display_1", "afternoon review".into(), "capture-v1"))
        .unwrap();

    let resp = h
        .tools()
        .sample_time_range(SampleTimeRangeRequest {
            start: day_start.to_rfc3339(),
            end: (day_start + chrono::Duration::days(1)).to_rfc3339(),
            max_samples: Some(24),
            min_window_minutes: Some(1),
            include_text: Some(true),
        })
        .unwrap();

    assert_eq!(resp.samples.len(), 24);
    let non_empty = resp.samples.iter().filter(|s| s.record.is_some()).count();
    assert_eq!(non_empty, 2);
    assert_eq!(resp.samples.iter().filter(|s| s.record.is_none()).count(), 22);
    assert!(resp.samples.windows(2).all(|w| w[0].window_start <= w[1].window_start));
}

/// Scenario 4: a strongly relevant but old record should surface once the
/// expanding window reaches it, with the reported window covering it.
#[test]
fn recency_weighted_expansion_finds_old_relevant_record() {
    let h = harness();
    let now = memex_core::time::now_millis();

    // Recent but irrelevant noise, all within the initial 7-day window.
    for i in 0..3 {
        let record = CaptureRecord::new(now - i * 3_600_000, "Display_1", "unrelated scratch notes".into(), "capture-v1");
        h.store.put(&record).unwrap();
        h.index
            .upsert(&record.id, &h.embedder.embed("unrelated scratch notes").unwrap(), meta(&record), "unrelated scratch notes".into())
            .unwrap();
    }

    // Strongly relevant, 60 days old.
    let old_ts = now - 60 * 86_400_000;
    let old_record = CaptureRecord::new(old_ts, "Display_2", "quarterly budget review".into(), "capture-v1");
    h.store.put(&old_record).unwrap();
    h.index
        .upsert(
            &old_record.id,
            &h.embedder.embed("quarterly budget review").unwrap(),
            meta(&old_record),
            "quarterly budget review".into(),
        )
        .unwrap();

    let resp = h
        .tools()
        .search_recent_relevant(SearchRecentRelevantRequest {
            query: "quarterly budget review".into(),
            limit: Some(5),
            initial_days: Some(7),
            max_days: Some(90),
            recency_weight: Some(0.3),
            min_score: Some(0.5),
        })
        .unwrap();

    assert!(resp.window_days_used >= 60);
    assert!(resp.hits.iter().any(|h| h.id == old_record.id));
}

/// Scenario 5: activity-graph is dense and deterministic across two runs
/// of the same query.
#[test]
fn activity_graph_is_dense_and_deterministic() {
    let h = harness();
    let now = memex_core::time::now_millis();
    for i in 0..5 {
        h.store
            .put(&CaptureRecord::new(now - i * 3_600_000, "Display_1", "note".into(), "capture-v1"))
            .unwrap();
    }

    let req = || ActivityGraphRequest { period: ActivityPeriod::Day, grouping: ActivityGrouping::Hour };
    let first = h.tools().activity_graph(req()).unwrap();
    let second = h.tools().activity_graph(req()).unwrap();

    assert_eq!(first.buckets.len(), 24);
    assert_eq!(first.buckets.len(), second.buckets.len());
    for (a, b) in first.buckets.iter().zip(second.buckets.iter()) {
        assert_eq!(a.bucket_start, b.bucket_start);
        assert_eq!(a.record_count, b.record_count);
        assert_eq!(a.distinct_screens, b.distinct_screens);
    }
}

/// Scenario 6: sync is idempotent — deleting entries from (B) and
/// re-running catch-up restores exactly the deleted count, and a second
/// run adds nothing.
#[test]
fn sync_catch_up_is_idempotent_after_partial_index_loss() {
    let h = harness();
    let sync = Sync::new(h.store.clone(), h.index.clone(), h.embedder.clone());

    let mut ids = Vec::new();
    for i in 0..10 {
        let record = CaptureRecord::new(1_700_000_000_000 + i * 1_000, "Display_1", format!("entry {i}"), "capture-v1");
        h.store.put(&record).unwrap();
        ids.push(record.id.clone());
        sync.catch_up().unwrap();
    }
    assert_eq!(h.index.count().unwrap(), 10);

    // Drop entries for a fixed subset rather than a random sample, so the
    // expectation below is exact rather than merely probable.
    let deleted = &ids[..3];
    let fresh_index = VectorIndex::open(IndexConfig::new(DIM).with_backend(BackendConfig::InMemory)).unwrap();
    for (i, record_id) in ids.iter().enumerate() {
        if deleted.contains(record_id) {
            continue;
        }
        let text = format!("entry {i}");
        fresh_index
            .upsert(record_id, &h.embedder.embed(&text).unwrap(), meta(&CaptureRecord::new(1_700_000_000_000 + i as i64 * 1_000, "Display_1", text.clone(), "capture-v1")), text)
            .unwrap();
    }
    let sync = Sync::new(h.store.clone(), Arc::new(fresh_index), h.embedder.clone());

    let report = sync.catch_up().unwrap();
    assert_eq!(report.added, deleted.len());
    assert_eq!(report.skipped_existing, ids.len() - deleted.len());

    let second = sync.catch_up().unwrap();
    assert_eq!(second.added, 0);
    assert_eq!(second.skipped_existing, ids.len());
}

fn meta(record: &CaptureRecord) -> memex_index::IndexMetadata {
    memex_index::IndexMetadata {
        timestamp: record.timestamp,
        timestamp_iso: record.timestamp_iso.clone(),
        screen_name: record.screen_name.clone(),
        text_length: record.text_length,
        word_count: record.word_count,
        data_type: record.data_type.clone(),
        source: record.source.clone(),
    }
}

impl Harness {
    fn store_dir(&self) -> std::path::PathBuf {
        self._dir.path().join("records")
    }
}
