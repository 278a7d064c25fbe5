//! Global, install-once observability hooks shared by the capture loop and
//! the tool service. Mirrors the teacher's `set_pipeline_metrics`/
//! `OnceLock<RwLock<Option<Arc<dyn Trait>>>>` pattern: a recorder is
//! optional, installed once at startup, and cheap to query from hot paths
//! when absent.
use std::sync::{Arc, OnceLock, RwLock};
use std::time::Duration;

use crate::error::ErrorKind;

/// Observer for capture-tick outcomes (SPEC_FULL §4.3/§4.6).
pub trait CaptureMetrics: Send + Sync {
    fn record_tick(&self, latency: Duration, screens_captured: usize, result: Result<(), ErrorKind>);
    fn record_pending_queue_depth(&self, depth: usize);
}

/// Observer for tool-service call outcomes (SPEC_FULL §4.5).
pub trait ToolMetrics: Send + Sync {
    fn record_tool_call(&self, tool: &str, latency: Duration, result: Result<(), ErrorKind>);
}

pub fn set_capture_metrics(recorder: Option<Arc<dyn CaptureMetrics>>) {
    let mut guard = capture_lock().write().expect("capture metrics lock poisoned");
    *guard = recorder;
}

pub fn capture_metrics() -> Option<Arc<dyn CaptureMetrics>> {
    capture_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

fn capture_lock() -> &'static RwLock<Option<Arc<dyn CaptureMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn CaptureMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub fn set_tool_metrics(recorder: Option<Arc<dyn ToolMetrics>>) {
    let mut guard = tool_lock().write().expect("tool metrics lock poisoned");
    *guard = recorder;
}

pub fn tool_metrics() -> Option<Arc<dyn ToolMetrics>> {
    tool_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

fn tool_lock() -> &'static RwLock<Option<Arc<dyn ToolMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn ToolMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    static TEST_LOCK: Mutex<()> = Mutex::new(());

    struct CountingCaptureMetrics {
        ticks: AtomicUsize,
    }

    impl CaptureMetrics for CountingCaptureMetrics {
        fn record_tick(&self, _latency: Duration, _screens: usize, _result: Result<(), ErrorKind>) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }
        fn record_pending_queue_depth(&self, _depth: usize) {}
    }

    #[test]
    fn install_and_clear_capture_metrics() {
        let _guard = TEST_LOCK.lock().unwrap();
        assert!(capture_metrics().is_none());

        let recorder = Arc::new(CountingCaptureMetrics { ticks: AtomicUsize::new(0) });
        set_capture_metrics(Some(recorder.clone()));
        capture_metrics().unwrap().record_tick(Duration::from_millis(1), 2, Ok(()));
        assert_eq!(recorder.ticks.load(Ordering::SeqCst), 1);

        set_capture_metrics(None);
        assert!(capture_metrics().is_none());
    }
}
