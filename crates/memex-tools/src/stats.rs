//! `get-stats` (SPEC_FULL §4.5.8): always answers from (A); (B)'s count is
//! best-effort and degrades to `null`/`index_available: false` rather than
//! failing the whole call.
use std::collections::HashSet;

use memex_store::RecordFilter;

use crate::error::ToolError;
use crate::types::GetStatsResponse;
use crate::ToolService;

impl ToolService {
    pub fn get_stats(&self) -> Result<GetStatsResponse, ToolError> {
        let mut record_count_on_disk = 0usize;
        let mut first_timestamp = None;
        let mut last_timestamp = None;
        let mut screens = HashSet::new();

        for record in self.store.iter(RecordFilter::default())? {
            record_count_on_disk += 1;
            first_timestamp = Some(first_timestamp.map_or(record.timestamp, |f: i64| f.min(record.timestamp)));
            last_timestamp = Some(last_timestamp.map_or(record.timestamp, |l: i64| l.max(record.timestamp)));
            screens.insert(record.screen_name.clone());
        }

        let (index_count, index_available) = match &self.index {
            Some(index) => match index.count() {
                Ok(count) => (Some(count), true),
                Err(_) => (None, false),
            },
            None => (None, false),
        };

        Ok(GetStatsResponse {
            record_count_on_disk,
            index_count,
            first_timestamp,
            last_timestamp,
            distinct_screens: screens.len(),
            index_available,
        })
    }
}
