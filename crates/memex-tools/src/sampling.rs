//! `sample-time-range`, `time-range-summary`, `daily-summary` (SPEC_FULL
//! §4.5.4-4.5.6). All three bottom out in [`ToolService::earliest_per_window`],
//! a single ascending pass over (A) that never interpolates: a window with
//! no record gets an explicit empty marker rather than a guess.
use chrono::{DateTime, Duration, TimeZone, Utc};
use memex_core::time::{parse_date_end, parse_date_start};
use memex_store::RecordFilter;

use crate::error::ToolError;
use crate::types::{
    DailyPeriod, DailySummaryRequest, DailySummaryResponse, SampleTimeRangeRequest,
    SampleTimeRangeResponse, SampledRecord, ScreenCount, TimeRangeSummaryRequest,
    TimeRangeSummaryResponse, TimeSample,
};
use crate::ToolService;
use std::collections::HashMap;

impl ToolService {
    pub fn sample_time_range(
        &self,
        req: SampleTimeRangeRequest,
    ) -> Result<SampleTimeRangeResponse, ToolError> {
        let start = parse_date_start("start", &req.start)?;
        let end = parse_date_end("end", &req.end)?;
        let max_samples = req.max_samples.unwrap_or(24).max(1);
        let min_window_minutes = req.min_window_minutes.unwrap_or(15).max(1);
        let include_text = req.include_text.unwrap_or(true);

        let span_ms = (end.timestamp_millis() - start.timestamp_millis()).max(0);
        let min_window_ms = min_window_minutes * 60_000;
        let num_windows = max_samples.min(((span_ms / min_window_ms) as usize).max(1)).max(1);

        let samples = self.earliest_per_window(start, end, num_windows, include_text)?;
        Ok(SampleTimeRangeResponse { samples })
    }

    pub fn time_range_summary(
        &self,
        req: TimeRangeSummaryRequest,
    ) -> Result<TimeRangeSummaryResponse, ToolError> {
        let start = parse_date_start("start_date", &req.start_date)?;
        let end = parse_date_end("end_date", &req.end_date)?;

        let samples = self.earliest_per_window(start, end, 24, true)?;
        let empty_windows = samples.iter().filter(|s| s.record.is_none()).count();
        let total_records = self.store.iter(RecordFilter::date_range(start, end))?.count();

        Ok(TimeRangeSummaryResponse {
            samples,
            total_records,
            empty_windows,
        })
    }

    pub fn daily_summary(&self, req: DailySummaryRequest) -> Result<DailySummaryResponse, ToolError> {
        let date = match &req.date {
            Some(d) => chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|_| {
                ToolError::InvalidArgument {
                    field: "date".to_string(),
                    message: format!("`{d}` is not a valid YYYY-MM-DD date"),
                }
            })?,
            None => Utc::now().date_naive(),
        };
        let day_start = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap());

        let mut periods = Vec::with_capacity(6);
        for period_idx in 0..6_i64 {
            let period_start = day_start + Duration::hours(period_idx * 4);
            let period_end = period_start + Duration::hours(4);

            let records: Vec<_> = self.store.iter(RecordFilter::date_range(period_start, period_end))?.collect();
            let record_count = records.len();

            let mut counts: HashMap<String, usize> = HashMap::new();
            for r in &records {
                *counts.entry(r.screen_name.clone()).or_insert(0) += 1;
            }
            let mut top_screens: Vec<ScreenCount> = counts
                .into_iter()
                .map(|(screen_name, count)| ScreenCount { screen_name, count })
                .collect();
            top_screens.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.screen_name.cmp(&b.screen_name)));
            top_screens.truncate(3);

            let samples = self.earliest_per_window(period_start, period_end, 5, true)?;

            periods.push(DailyPeriod {
                period_start: period_start.timestamp_millis(),
                period_end: period_end.timestamp_millis(),
                record_count,
                top_screens,
                samples,
            });
        }

        Ok(DailySummaryResponse { periods })
    }

    /// Partition `[start, end)` into `num_windows` equal windows and return
    /// the earliest record in each, relying on the record store's
    /// filename-sorted iteration order so the whole scan is a single
    /// ascending pass rather than one scan per window.
    fn earliest_per_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        num_windows: usize,
        include_text: bool,
    ) -> Result<Vec<TimeSample>, ToolError> {
        let start_ms = start.timestamp_millis();
        let end_ms = end.timestamp_millis();
        let span_ms = (end_ms - start_ms).max(0);
        let window_ms = (span_ms / num_windows as i64).max(1);

        let mut records = self.store.iter(RecordFilter::date_range(start, end))?.peekable();
        let mut samples = Vec::with_capacity(num_windows);

        for i in 0..num_windows {
            let window_start = start_ms + window_ms * i as i64;
            let window_end = if i + 1 == num_windows { end_ms } else { window_start + window_ms };

            while records.peek().map(|r| r.timestamp < window_start).unwrap_or(false) {
                records.next();
            }
            let record = if records.peek().map(|r| r.timestamp < window_end).unwrap_or(false) {
                records.next()
            } else {
                None
            };

            samples.push(TimeSample {
                window_start,
                window_end,
                record: record.map(|r| SampledRecord {
                    id: r.id,
                    screen_name: r.screen_name,
                    timestamp: r.timestamp,
                    text: if include_text { Some(r.text) } else { None },
                }),
            });
        }

        Ok(samples)
    }
}
