//! Date/time parsing shared by the record store, the index adapter, and
//! every tool that accepts `start_date`/`end_date` arguments.
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::error::CoreError;

/// Epoch milliseconds. The index metadata schema (SPEC_FULL §6.2) fixes
/// the unit to milliseconds so it never needs to change once chosen.
pub type EpochMillis = i64;

pub fn now_millis() -> EpochMillis {
    Utc::now().timestamp_millis()
}

pub fn to_millis(dt: DateTime<Utc>) -> EpochMillis {
    dt.timestamp_millis()
}

pub fn from_millis(ms: EpochMillis) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Parse a date argument that is either `YYYY-MM-DD` (whole day, start of
/// day) or a full ISO-8601 instant. Used for `start_date`-style inputs
/// where the caller means "from the start of this day" unless more
/// precision is given.
pub fn parse_date_start(field: &str, value: &str) -> Result<DateTime<Utc>, CoreError> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()));
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| CoreError::InvalidArgument {
            field: field.to_string(),
            message: format!("`{value}` is neither YYYY-MM-DD nor a valid ISO-8601 instant"),
        })
}

/// Parse a date argument that is either `YYYY-MM-DD` (whole day, **end**
/// of day inclusive) or a full ISO-8601 instant. `end_date` predicates are
/// half-open with the end inclusive at end-of-day (SPEC_FULL §8).
pub fn parse_date_end(field: &str, value: &str) -> Result<DateTime<Utc>, CoreError> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let next = date.succ_opt().unwrap_or(date);
        return Ok(Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0).unwrap()));
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| CoreError::InvalidArgument {
            field: field.to_string(),
            message: format!("`{value}` is neither YYYY-MM-DD nor a valid ISO-8601 instant"),
        })
}

/// Format an instant as the `timestamp_iso`/filename-safe form used by the
/// record store: colons and dots replaced by hyphens.
pub fn to_filename_safe_iso(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H-%M-%S%.f")
        .to_string()
        .trim_end_matches('0')
        .trim_end_matches('.')
        .replace('.', "-")
}

/// Parse the filename-safe ISO form back into an instant. Tolerant of the
/// trailing fractional-second stripping done by [`to_filename_safe_iso`].
pub fn from_filename_safe_iso(s: &str) -> Option<DateTime<Utc>> {
    // Restore to a parseable RFC3339-ish form: `...T..-..-..` -> `...T..:..:..`
    let mut parts = s.splitn(2, 'T');
    let date_part = parts.next()?;
    let time_part = parts.next()?;
    let mut time_fields: Vec<&str> = time_part.split('-').collect();
    if time_fields.len() < 3 {
        return None;
    }
    let frac = if time_fields.len() > 3 {
        time_fields.split_off(3).join(".")
    } else {
        String::new()
    };
    let time_str = time_fields.join(":");
    let combined = if frac.is_empty() {
        format!("{date_part}T{time_str}Z")
    } else {
        format!("{date_part}T{time_str}.{frac}Z")
    };
    DateTime::parse_from_rfc3339(&combined)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_whole_day_start_and_end() {
        let start = parse_date_start("start_date", "2026-01-05").unwrap();
        let end = parse_date_end("end_date", "2026-01-05").unwrap();
        assert_eq!(start.format("%H:%M:%S").to_string(), "00:00:00");
        // end is exclusive-as-stored (start of next day), i.e. inclusive of 2026-01-05 23:59:59.
        assert!(end > start);
        assert_eq!((end - start).num_hours(), 24);
    }

    #[test]
    fn parse_full_instant() {
        let dt = parse_date_start("start_date", "2026-01-05T10:30:00Z").unwrap();
        assert_eq!(dt.format("%H:%M:%S").to_string(), "10:30:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_date_start("start_date", "not-a-date").is_err());
    }

    #[test]
    fn filename_safe_roundtrip() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 4, 12, 5, 9).unwrap();
        let safe = to_filename_safe_iso(dt);
        assert!(!safe.contains(':'));
        let back = from_filename_safe_iso(&safe).expect("roundtrip parse");
        assert_eq!(back.timestamp(), dt.timestamp());
    }
}
