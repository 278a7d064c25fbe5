//! `search-screenshots`, `vector-search-windowed`, `search-recent-relevant`
//! (SPEC_FULL §4.5.1-4.5.3). Grounded on the teacher's
//! `crates/matcher/src/engine.rs` score-then-sort-then-truncate idiom.
use std::cmp::Ordering;

use memex_core::error::{Classify, ErrorKind};
use memex_core::time::{now_millis, parse_date_end, parse_date_start};
use memex_index::ann::relevance_from_distance;
use memex_index::{EqField, MetadataWhere};
use memex_store::RecordFilter;

use crate::error::ToolError;
use crate::types::{
    ScoredHit, SearchHit, SearchMode, SearchRecentRelevantRequest, SearchRecentRelevantResponse,
    SearchScreenshotsRequest, SearchScreenshotsResponse, VectorSearchWindowedRequest,
    VectorSearchWindowedResponse, WindowedHit,
};
use crate::ToolService;

impl ToolService {
    pub fn search_screenshots(
        &self,
        req: SearchScreenshotsRequest,
    ) -> Result<SearchScreenshotsResponse, ToolError> {
        let limit = req.limit.unwrap_or(10).max(1);
        let start = req
            .start_date
            .as_deref()
            .map(|s| parse_date_start("start_date", s))
            .transpose()?;
        let end = req
            .end_date
            .as_deref()
            .map(|s| parse_date_end("end_date", s))
            .transpose()?;

        if let Some(index) = &self.index {
            let mut where_clause =
                MetadataWhere::new().timestamp_range(start.map(|d| d.timestamp_millis()), end.map(|d| d.timestamp_millis()));
            if let Some(data_type) = &req.data_type {
                where_clause = where_clause.eq(EqField::DataType, data_type.clone());
            }

            let embedding = self.embed(&req.query)?;
            match index.query(&embedding, limit, &where_clause) {
                Ok(hits) => {
                    let hits = hits
                        .into_iter()
                        .map(|h| SearchHit {
                            id: h.id,
                            screen_name: h.metadata.screen_name,
                            timestamp: h.metadata.timestamp,
                            timestamp_iso: h.metadata.timestamp_iso,
                            text: h.document,
                            score: relevance_from_distance(h.distance),
                        })
                        .collect();
                    return Ok(SearchScreenshotsResponse {
                        mode: SearchMode::VectorIndex,
                        hits,
                    });
                }
                Err(e) if e.kind() == ErrorKind::Unavailable => {}
                Err(e) => return Err(e.into()),
            }
        }

        self.search_screenshots_fallback(&req, limit, start, end)
    }

    fn search_screenshots_fallback(
        &self,
        req: &SearchScreenshotsRequest,
        limit: usize,
        start: Option<chrono::DateTime<chrono::Utc>>,
        end: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<SearchScreenshotsResponse, ToolError> {
        let query_lower = req.query.to_lowercase();
        let filter = RecordFilter {
            start,
            end,
            screen_name: None,
        };

        let mut scored: Vec<(usize, SearchHit)> = self
            .store
            .iter(filter)?
            .filter_map(|r| {
                let freq = r.text.to_lowercase().matches(&query_lower).count();
                if freq == 0 {
                    return None;
                }
                Some((
                    freq,
                    SearchHit {
                        id: r.id,
                        screen_name: r.screen_name,
                        timestamp: r.timestamp,
                        timestamp_iso: r.timestamp_iso,
                        text: r.text,
                        score: freq as f32,
                    },
                ))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.timestamp.cmp(&a.1.timestamp)));
        scored.truncate(limit);

        Ok(SearchScreenshotsResponse {
            mode: SearchMode::FileScanFallback,
            hits: scored.into_iter().map(|(_, hit)| hit).collect(),
        })
    }

    /// Partitions `[now - hours_back, now]` into `clamp(hours_back, 4, 48)`
    /// windows and keeps the single best hit per window above
    /// `min_relevance`, so a broad query can't be dominated by one hot span
    /// of time.
    pub fn vector_search_windowed(
        &self,
        req: VectorSearchWindowedRequest,
    ) -> Result<VectorSearchWindowedResponse, ToolError> {
        let index = self.require_index()?;
        let limit = req.limit.unwrap_or(10).max(1);
        let min_relevance = req.min_relevance.unwrap_or(0.5);
        if req.hours_back == 0 {
            return Err(ToolError::InvalidArgument {
                field: "hours_back".to_string(),
                message: "must be > 0".to_string(),
            });
        }
        let hours_back = req.hours_back;
        let windows = hours_back.clamp(4, 48);

        let now = now_millis();
        let t_start = now - (hours_back as i64) * 3_600_000;
        let window_ms = ((now - t_start) / windows as i64).max(1);

        let embedding = self.embed(&req.query)?;
        let mut hits = Vec::new();
        for i in 0..windows {
            let win_start = t_start + window_ms * i as i64;
            let win_end = if i + 1 == windows { now } else { win_start + window_ms };
            let where_clause = MetadataWhere::new().timestamp_range(Some(win_start), Some(win_end));

            let top = index.query(&embedding, 1, &where_clause)?;
            if let Some(hit) = top.into_iter().next() {
                let relevance = relevance_from_distance(hit.distance);
                if relevance >= min_relevance {
                    hits.push(WindowedHit {
                        id: hit.id,
                        timestamp: hit.metadata.timestamp,
                        relevance,
                    });
                }
            }
        }

        hits.sort_by_key(|h| h.timestamp);
        hits.truncate(limit);

        Ok(VectorSearchWindowedResponse {
            windows_searched: windows,
            hits,
        })
    }

    /// Expanding-window recency-weighted search: start narrow, double the
    /// lookback window (bounded by `max_days`) until enough results clear
    /// `min_score`.
    pub fn search_recent_relevant(
        &self,
        req: SearchRecentRelevantRequest,
    ) -> Result<SearchRecentRelevantResponse, ToolError> {
        let index = self.require_index()?;
        let limit = req.limit.unwrap_or(10).max(1);
        let initial_days = req.initial_days.unwrap_or(7).max(1);
        let max_days = req.max_days.unwrap_or(90).max(initial_days);
        let recency_weight = req.recency_weight.unwrap_or(0.5).clamp(0.0, 1.0);
        let min_score = req.min_score.unwrap_or(0.6);

        let embedding = self.embed(&req.query)?;
        let now = now_millis();
        let mut window_days = initial_days;

        loop {
            let t_start = now - (window_days as i64) * 86_400_000;
            let where_clause = MetadataWhere::new().timestamp_range(Some(t_start), None);
            let candidates = index.query(&embedding, limit * 4, &where_clause)?;

            let mut scored: Vec<ScoredHit> = candidates
                .into_iter()
                .map(|hit| {
                    let relevance = relevance_from_distance(hit.distance);
                    let age_days = (now - hit.metadata.timestamp) as f32 / 86_400_000.0;
                    let recency = 1.0 - (age_days / max_days as f32).min(1.0).max(0.0);
                    let score = (1.0 - recency_weight) * relevance + recency_weight * recency;
                    ScoredHit {
                        id: hit.id,
                        timestamp: hit.metadata.timestamp,
                        relevance,
                        recency,
                        score,
                    }
                })
                .filter(|s| s.score >= min_score)
                .collect();

            scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
            scored.truncate(limit);

            if scored.len() >= limit || window_days >= max_days {
                return Ok(SearchRecentRelevantResponse {
                    window_days_used: window_days,
                    hits: scored,
                });
            }
            window_days = (window_days * 2).min(max_days);
        }
    }
}
