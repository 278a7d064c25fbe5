//! Typed index metadata and the closed predicate set the adapter accepts
//! for `where` clauses (SPEC_FULL §3.3, resolving the Open Question about
//! opaque-vs-typed metadata).
use memex_core::time::EpochMillis;
use serde::{Deserialize, Serialize};

/// Metadata schema, SPEC_FULL §6.2. `timestamp` is the only field range
/// predicates may target; the predicate type below makes that a compile
/// time guarantee rather than a convention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexMetadata {
    pub timestamp: EpochMillis,
    pub timestamp_iso: String,
    pub screen_name: String,
    pub text_length: usize,
    pub word_count: usize,
    pub data_type: String,
    pub source: String,
}

/// A single field eligible for equality matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqField {
    ScreenName,
    DataType,
    Source,
}

/// A conjunction of metadata predicates. Equality on strings, numeric
/// range on `timestamp` only — the adapter never compares against
/// `timestamp_iso` (SPEC_FULL §9's timestamp-normalization note).
#[derive(Debug, Clone, Default)]
pub struct MetadataWhere {
    eq: Vec<(EqField, String)>,
    timestamp_low: Option<EpochMillis>,
    timestamp_high: Option<EpochMillis>,
}

impl MetadataWhere {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: EqField, value: impl Into<String>) -> Self {
        self.eq.push((field, value.into()));
        self
    }

    /// Restrict to `[low, high)`.
    pub fn timestamp_range(mut self, low: Option<EpochMillis>, high: Option<EpochMillis>) -> Self {
        self.timestamp_low = low;
        self.timestamp_high = high;
        self
    }

    pub fn matches(&self, meta: &IndexMetadata) -> bool {
        for (field, value) in &self.eq {
            let actual = match field {
                EqField::ScreenName => &meta.screen_name,
                EqField::DataType => &meta.data_type,
                EqField::Source => &meta.source,
            };
            if actual != value {
                return false;
            }
        }
        if let Some(low) = self.timestamp_low {
            if meta.timestamp < low {
                return false;
            }
        }
        if let Some(high) = self.timestamp_high {
            if meta.timestamp >= high {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(ts: EpochMillis, screen: &str) -> IndexMetadata {
        IndexMetadata {
            timestamp: ts,
            timestamp_iso: ts.to_string(),
            screen_name: screen.to_string(),
            text_length: 0,
            word_count: 0,
            data_type: "ocr".to_string(),
            source: "capture-v1".to_string(),
        }
    }

    #[test]
    fn empty_where_matches_everything() {
        let w = MetadataWhere::new();
        assert!(w.matches(&meta(10, "Display_1")));
    }

    #[test]
    fn eq_filters_by_screen_name() {
        let w = MetadataWhere::new().eq(EqField::ScreenName, "Display_1");
        assert!(w.matches(&meta(10, "Display_1")));
        assert!(!w.matches(&meta(10, "Display_2")));
    }

    #[test]
    fn timestamp_range_is_half_open() {
        let w = MetadataWhere::new().timestamp_range(Some(10), Some(20));
        assert!(!w.matches(&meta(9, "Display_1")));
        assert!(w.matches(&meta(10, "Display_1")));
        assert!(w.matches(&meta(19, "Display_1")));
        assert!(!w.matches(&meta(20, "Display_1")));
    }
}
