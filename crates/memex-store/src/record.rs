//! The capture record type (SPEC_FULL §3.1) and its filename codec
//! (SPEC_FULL §6.1).
use memex_core::time::{from_filename_safe_iso, to_filename_safe_iso, EpochMillis};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// The atomic unit of stored history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureRecord {
    pub id: String,
    /// Epoch milliseconds, matches the id's timestamp component.
    pub timestamp: EpochMillis,
    /// ISO-8601 form of `timestamp`, for display.
    pub timestamp_iso: String,
    pub screen_name: String,
    pub text: String,
    pub text_length: usize,
    pub word_count: usize,
    pub source: String,
    pub data_type: String,
}

impl CaptureRecord {
    /// Build a record from its essential fields, deriving `id`,
    /// `timestamp_iso`, `text_length`, and `word_count`.
    pub fn new(timestamp: EpochMillis, screen_name: &str, text: String, source: &str) -> Self {
        let timestamp_iso = memex_core::time::from_millis(timestamp)
            .map(to_filename_safe_iso)
            .unwrap_or_else(|| timestamp.to_string());
        let id = format!("{timestamp_iso}_{screen_name}");
        let text_length = text.chars().count();
        let word_count = text.split_whitespace().count();
        Self {
            id,
            timestamp,
            timestamp_iso,
            screen_name: screen_name.to_string(),
            text,
            text_length,
            word_count,
            source: source.to_string(),
            data_type: "ocr".to_string(),
        }
    }

    /// Parse the `{timestamp}_{screen_name}` components back out of `id`,
    /// used by the universal invariant check in SPEC_FULL §8 that
    /// `parse(r.id).timestamp == r.timestamp`.
    pub fn parse_id(id: &str) -> Result<(EpochMillis, String), StoreError> {
        let (ts_part, screen) = id
            .rsplit_once('_')
            .ok_or_else(|| StoreError::MalformedRecord(format!("id `{id}` has no `_` separator")))?;
        let ts = from_filename_safe_iso(ts_part)
            .ok_or_else(|| StoreError::MalformedRecord(format!("unparseable timestamp in id `{id}`")))?;
        Ok((ts.timestamp_millis(), screen.to_string()))
    }

    pub fn filename(&self) -> String {
        format!("{}.json", self.id)
    }

    pub fn is_empty_text(&self) -> bool {
        self.text.trim().is_empty()
    }
}
