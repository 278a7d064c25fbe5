//! The eight tools of SPEC_FULL §4.5 routed as MCP tool calls. Grounded on
//! the `obsidian-memory` MCP server's `#[tool_router]`/`#[tool]` shape: one
//! `Params` struct per tool (owns the `JsonSchema` derive so `memex-tools`
//! stays transport-agnostic), a thin mapping into the matching
//! `memex_tools::types::*Request`, and a blocking call into [`ToolService`]
//! since its methods are synchronous file/redb I/O.
use std::sync::Arc;

use memex_tools::types::{
    ActivityGraphRequest, ActivityGrouping as ToolGrouping, ActivityPeriod as ToolPeriod,
    DailySummaryRequest, SampleTimeRangeRequest, SearchRecentRelevantRequest,
    SearchScreenshotsRequest, TimeRangeSummaryRequest, VectorSearchWindowedRequest,
};
use memex_tools::{ToolError, ToolService};
use rmcp::handler::server::{router::tool::ToolRouter, wrapper::Parameters};
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchScreenshotsParams {
    /// Free-text query to match against OCR'd screen text.
    pub query: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub data_type: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VectorSearchWindowedParams {
    pub query: String,
    pub hours_back: u32,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub min_relevance: Option<f32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchRecentRelevantParams {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub initial_days: Option<u32>,
    #[serde(default)]
    pub max_days: Option<u32>,
    #[serde(default)]
    pub recency_weight: Option<f32>,
    #[serde(default)]
    pub min_score: Option<f32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SampleTimeRangeParams {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub max_samples: Option<usize>,
    #[serde(default)]
    pub min_window_minutes: Option<i64>,
    #[serde(default)]
    pub include_text: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TimeRangeSummaryParams {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DailySummaryParams {
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityPeriodParam {
    Day,
    Week,
    Month,
}

impl From<ActivityPeriodParam> for ToolPeriod {
    fn from(value: ActivityPeriodParam) -> Self {
        match value {
            ActivityPeriodParam::Day => ToolPeriod::Day,
            ActivityPeriodParam::Week => ToolPeriod::Week,
            ActivityPeriodParam::Month => ToolPeriod::Month,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityGroupingParam {
    Hour,
    Day,
}

impl From<ActivityGroupingParam> for ToolGrouping {
    fn from(value: ActivityGroupingParam) -> Self {
        match value {
            ActivityGroupingParam::Hour => ToolGrouping::Hour,
            ActivityGroupingParam::Day => ToolGrouping::Day,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ActivityGraphParams {
    pub period: ActivityPeriodParam,
    pub grouping: ActivityGroupingParam,
}

/// Runs a synchronous [`ToolService`] call on a blocking thread and reports
/// its outcome to the installed tool-metrics hook via `observe`.
async fn run_blocking<T, F>(tools: Arc<ToolService>, name: &'static str, f: F) -> Result<CallToolResult, ErrorData>
where
    T: Serialize + Send + 'static,
    F: FnOnce(&ToolService) -> Result<T, ToolError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || {
        let tools = tools;
        tools.observe(name, || f(&tools))
    })
    .await
    .map_err(|e| ErrorData::internal_error(format!("tool task panicked: {e}"), None))?;

    Ok(crate::error::to_call_tool_result(result))
}

/// The MCP-routed wrapper around [`ToolService`]. Cheap to clone: every
/// field is an `Arc`, so the HTTP transport's per-session factory can hand
/// out an independent `McpToolServer` per connection without re-opening (A)
/// or (B).
#[derive(Clone)]
pub struct McpToolServer {
    tools: Arc<ToolService>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl McpToolServer {
    pub fn new(tools: ToolService) -> Self {
        Self {
            tools: Arc::new(tools),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(name = "search-screenshots", description = "Search captured screen text by similarity, with optional date range, result limit, and data-type filter. Falls back to a substring file scan if the vector index is unreachable.")]
    async fn search_screenshots(&self, params: Parameters<SearchScreenshotsParams>) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        run_blocking(self.tools.clone(), "search-screenshots", move |tools| {
            tools.search_screenshots(SearchScreenshotsRequest {
                query: p.query,
                start_date: p.start_date,
                end_date: p.end_date,
                limit: p.limit,
                data_type: p.data_type,
            })
        })
        .await
    }

    #[tool(name = "vector-search-windowed", description = "Partition the last `hours_back` hours into contiguous windows and return the single best-matching capture per window above `min_relevance`, so one hot span of time can't dominate a broad query.")]
    async fn vector_search_windowed(&self, params: Parameters<VectorSearchWindowedParams>) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        run_blocking(self.tools.clone(), "vector-search-windowed", move |tools| {
            tools.vector_search_windowed(VectorSearchWindowedRequest {
                query: p.query,
                hours_back: p.hours_back,
                limit: p.limit,
                min_relevance: p.min_relevance,
            })
        })
        .await
    }

    #[tool(name = "search-recent-relevant", description = "Recency-weighted similarity search that starts with a narrow lookback window and doubles it (bounded by `max_days`) until enough results clear `min_score`.")]
    async fn search_recent_relevant(&self, params: Parameters<SearchRecentRelevantParams>) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        run_blocking(self.tools.clone(), "search-recent-relevant", move |tools| {
            tools.search_recent_relevant(SearchRecentRelevantRequest {
                query: p.query,
                limit: p.limit,
                initial_days: p.initial_days,
                max_days: p.max_days,
                recency_weight: p.recency_weight,
                min_score: p.min_score,
            })
        })
        .await
    }

    #[tool(name = "sample-time-range", description = "Partition a time range into equal windows and return the earliest capture in each; empty windows are reported explicitly rather than interpolated.")]
    async fn sample_time_range(&self, params: Parameters<SampleTimeRangeParams>) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        run_blocking(self.tools.clone(), "sample-time-range", move |tools| {
            tools.sample_time_range(SampleTimeRangeRequest {
                start: p.start,
                end: p.end,
                max_samples: p.max_samples,
                min_window_minutes: p.min_window_minutes,
                include_text: p.include_text,
            })
        })
        .await
    }

    #[tool(name = "time-range-summary", description = "Summarize a date range as 24 evenly-spaced samples plus aggregate counts (total records, empty windows).")]
    async fn time_range_summary(&self, params: Parameters<TimeRangeSummaryParams>) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        run_blocking(self.tools.clone(), "time-range-summary", move |tools| {
            tools.time_range_summary(TimeRangeSummaryRequest {
                start_date: p.start_date,
                end_date: p.end_date,
            })
        })
        .await
    }

    #[tool(name = "daily-summary", description = "Summarize one day as six fixed 4-hour periods, each with a record count, top 3 screens, and up to 5 samples.")]
    async fn daily_summary(&self, params: Parameters<DailySummaryParams>) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        run_blocking(self.tools.clone(), "daily-summary", move |tools| {
            tools.daily_summary(DailySummaryRequest { date: p.date })
        })
        .await
    }

    #[tool(name = "activity-graph", description = "Return a dense, zero-filled activity histogram over the requested period (day/week/month) at the requested resolution (hour/day).")]
    async fn activity_graph(&self, params: Parameters<ActivityGraphParams>) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        run_blocking(self.tools.clone(), "activity-graph", move |tools| {
            tools.activity_graph(ActivityGraphRequest {
                period: p.period.into(),
                grouping: p.grouping.into(),
            })
        })
        .await
    }

    #[tool(name = "get-stats", description = "Report record counts on disk and in the vector index, the timestamp span, and distinct screen count. Index fields degrade to null/unavailable rather than failing the call.")]
    async fn get_stats(&self) -> Result<CallToolResult, ErrorData> {
        run_blocking(self.tools.clone(), "get-stats", |tools| tools.get_stats()).await
    }
}

#[tool_handler]
impl ServerHandler for McpToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "memex".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Retrieval tools over a personal screen-capture history: search, windowed sampling, activity timelines, and statistics.".into(),
            ),
        }
    }
}
