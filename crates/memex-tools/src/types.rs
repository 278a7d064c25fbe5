//! Request/response types for the eight tools (SPEC_FULL §4.5). Each
//! response is the typed payload `memex-server` will wrap into its RPC
//! envelope; these types carry no transport concerns of their own.
use memex_core::time::EpochMillis;
use serde::{Deserialize, Serialize};

/// Which code path produced a `search-screenshots` response (SPEC_FULL
/// §4.5.1's "the response must declare which mode produced it").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    VectorIndex,
    FileScanFallback,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchScreenshotsRequest {
    pub query: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<usize>,
    pub data_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub screen_name: String,
    pub timestamp: EpochMillis,
    pub timestamp_iso: String,
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchScreenshotsResponse {
    pub mode: SearchMode,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorSearchWindowedRequest {
    pub query: String,
    pub hours_back: u32,
    pub limit: Option<usize>,
    pub min_relevance: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WindowedHit {
    pub id: String,
    pub timestamp: EpochMillis,
    pub relevance: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct VectorSearchWindowedResponse {
    pub windows_searched: u32,
    pub hits: Vec<WindowedHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRecentRelevantRequest {
    pub query: String,
    pub limit: Option<usize>,
    pub initial_days: Option<u32>,
    pub max_days: Option<u32>,
    pub recency_weight: Option<f32>,
    pub min_score: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredHit {
    pub id: String,
    pub timestamp: EpochMillis,
    pub relevance: f32,
    pub recency: f32,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchRecentRelevantResponse {
    pub window_days_used: u32,
    pub hits: Vec<ScoredHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleTimeRangeRequest {
    pub start: String,
    pub end: String,
    pub max_samples: Option<usize>,
    pub min_window_minutes: Option<i64>,
    pub include_text: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeSample {
    pub window_start: EpochMillis,
    pub window_end: EpochMillis,
    pub record: Option<SampledRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampledRecord {
    pub id: String,
    pub screen_name: String,
    pub timestamp: EpochMillis,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleTimeRangeResponse {
    pub samples: Vec<TimeSample>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeRangeSummaryRequest {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeRangeSummaryResponse {
    pub samples: Vec<TimeSample>,
    pub total_records: usize,
    pub empty_windows: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailySummaryRequest {
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreenCount {
    pub screen_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyPeriod {
    pub period_start: EpochMillis,
    pub period_end: EpochMillis,
    pub record_count: usize,
    pub top_screens: Vec<ScreenCount>,
    pub samples: Vec<TimeSample>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySummaryResponse {
    pub periods: Vec<DailyPeriod>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityPeriod {
    Day,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityGrouping {
    Hour,
    Day,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityGraphRequest {
    pub period: ActivityPeriod,
    pub grouping: ActivityGrouping,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityBucket {
    pub bucket_start: EpochMillis,
    pub record_count: usize,
    pub distinct_screens: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityGraphResponse {
    pub buckets: Vec<ActivityBucket>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetStatsResponse {
    pub record_count_on_disk: usize,
    pub index_count: Option<usize>,
    pub first_timestamp: Option<EpochMillis>,
    pub last_timestamp: Option<EpochMillis>,
    pub distinct_screens: usize,
    pub index_available: bool,
}
