//! The periodic capture tick (SPEC_FULL §4.3/§4.6): enumerate displays,
//! capture + OCR concurrently, then persist to (A) and upsert to (B)
//! serially through this task to preserve id monotonicity and keep the
//! pending queue simple.
use std::sync::Arc;
use std::time::{Duration, Instant};

use memex_core::time::{now_millis, EpochMillis};
use memex_store::{CaptureRecord, RecordStore};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::CaptureError;
use crate::pending::PendingQueue;
use crate::traits::{Embedder, ScreenCapture, TextExtractor};

/// Stage a tick is in, mirrored into tracing spans and [`TickReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickState {
    Idle,
    Capturing,
    Ocr,
    Persisting,
    Indexing,
    IndexingDeferred,
}

#[derive(Debug, Clone)]
pub struct ScreenTickResult {
    pub screen_name: String,
    pub record_id: String,
    pub text_length: usize,
    pub final_state: TickState,
}

#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick_timestamp: EpochMillis,
    pub screens: Vec<ScreenTickResult>,
    pub pending_drained: usize,
    pub pending_remaining: usize,
}

const SOURCE_TAG: &str = "capture-v1";

pub struct CapturePipeline {
    screens: Arc<dyn ScreenCapture>,
    ocr: Arc<dyn TextExtractor>,
    embedder: Arc<dyn Embedder>,
    store: Arc<RecordStore>,
    index: Arc<memex_index::VectorIndex>,
    pending: PendingQueue,
}

impl CapturePipeline {
    pub fn new(
        screens: Arc<dyn ScreenCapture>,
        ocr: Arc<dyn TextExtractor>,
        embedder: Arc<dyn Embedder>,
        store: Arc<RecordStore>,
        index: Arc<memex_index::VectorIndex>,
        pending: PendingQueue,
    ) -> Self {
        Self { screens, ocr, embedder, store, index, pending }
    }

    /// Run one tick. The interval/overrun policy lives in [`run_forever`];
    /// this method does exactly one pass of drain-pending + capture-all.
    pub async fn run_tick(&self) -> Result<TickReport, CaptureError> {
        let tick_timestamp = now_millis();

        let pending_ids = self.pending.drain()?;
        let pending_drained = pending_ids.len();
        let mut remaining = Vec::new();
        for id in pending_ids {
            match self.retry_pending_upsert(&id) {
                Ok(true) => {}
                Ok(false) => remaining.push(id),
                Err(e) => {
                    warn!(id = %id, error = %e, "capture: pending upsert retry failed, re-queuing");
                    remaining.push(id);
                }
            }
        }
        for id in &remaining {
            self.pending.push(id)?;
        }

        let displays = self.screens.displays()?;
        let mut join_set: JoinSet<(String, Result<(Vec<u8>, String), CaptureError>)> = JoinSet::new();

        for display in displays {
            let screens = self.screens.clone();
            let ocr = self.ocr.clone();
            join_set.spawn_blocking(move || {
                let outcome = screens.capture(&display).and_then(|image| {
                    let text = ocr.extract_text(&image)?;
                    Ok((image, text))
                });
                (display, outcome)
            });
        }

        let mut captured = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((display, Ok((_image, text)))) => captured.push((display, text)),
                Ok((display, Err(e))) => {
                    warn!(display = %display, error = %e, "capture: display capture/ocr failed, skipping this tick");
                }
                Err(join_err) => {
                    warn!(error = %join_err, "capture: capture task panicked");
                }
            }
        }
        captured.sort_by(|a, b| a.0.cmp(&b.0));

        let mut results = Vec::with_capacity(captured.len());
        for (screen_name, text) in captured {
            let trimmed_empty = text.trim().is_empty();
            let record = CaptureRecord::new(tick_timestamp, &screen_name, text.clone(), SOURCE_TAG);
            let record_id = record.id.clone();

            self.store.put(&record)?;

            let final_state = if trimmed_empty {
                TickState::Persisting
            } else {
                match self.upsert_record(&record) {
                    Ok(()) => TickState::Indexing,
                    Err(e) => {
                        warn!(id = %record_id, error = %e, "capture: upsert to index unavailable, deferring");
                        self.pending.push(&record_id)?;
                        TickState::IndexingDeferred
                    }
                }
            };

            results.push(ScreenTickResult {
                screen_name,
                record_id,
                text_length: record.text_length,
                final_state,
            });
        }

        let pending_remaining = self.pending.len()?;
        if let Some(metrics) = memex_core::metrics::capture_metrics() {
            metrics.record_pending_queue_depth(pending_remaining);
        }

        Ok(TickReport {
            tick_timestamp,
            screens: results,
            pending_drained,
            pending_remaining,
        })
    }

    /// Retry a deferred upsert. Returns `Ok(true)` on success, `Ok(false)`
    /// if the backing record is gone (nothing to retry), propagates the
    /// error if (B) is still unavailable so the caller re-queues it.
    fn retry_pending_upsert(&self, id: &str) -> Result<bool, CaptureError> {
        match self.store.read(id) {
            Ok(record) => {
                self.upsert_record(&record)?;
                Ok(true)
            }
            Err(memex_store::StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn upsert_record(&self, record: &CaptureRecord) -> Result<(), CaptureError> {
        let embedding = self.embedder.embed(&record.text)?;
        let metadata = memex_index::IndexMetadata {
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

    /// Drive ticks forever on the given interval. A tick that overruns the
    /// interval is never preempted; the next tick starts immediately after
    /// the current one finishes (SPEC_FULL §4.3's overrun policy).
    pub async fn run_forever(self: Arc<Self>, interval: Duration) {
        loop {
            let started = Instant::now();
            let result = self.run_tick().await;
            let elapsed = started.elapsed();

            match &result {
                Ok(report) => info!(
                    screens = report.screens.len(),
                    pending_remaining = report.pending_remaining,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "capture: tick complete"
                ),
                Err(e) => warn!(error = %e, "capture: tick failed"),
            }

            if let Some(metrics) = memex_core::metrics::capture_metrics() {
                let screens = result.as_ref().map(|r| r.screens.len()).unwrap_or(0);
                let outcome = result.as_ref().map(|_| ()).map_err(|e| e.kind());
                metrics.record_tick(elapsed, screens, outcome);
            }

            if elapsed < interval {
                tokio::time::sleep(interval - elapsed).await;
            }
        }
    }
}
