//! Durable append-only record store (component A, SPEC_FULL §4.1).
//!
//! A directory of flat files, one per capture record, written atomically
//! (write-to-temp-then-rename) and named `{timestamp_iso}_{screen_name}.json`.
pub mod error;
pub mod record;

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use tracing::warn;

pub use error::StoreError;
pub use record::CaptureRecord;

/// Predicates applied to filenames before a file is opened, per
/// SPEC_FULL §4.1's "filter applied by parsing the filename" contract.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub screen_name: Option<String>,
}

impl RecordFilter {
    pub fn date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            screen_name: None,
        }
    }

    fn matches(&self, timestamp: memex_core::time::EpochMillis, screen: &str) -> bool {
        if let Some(start) = self.start {
            if timestamp < start.timestamp_millis() {
                return false;
            }
        }
        if let Some(end) = self.end {
            if timestamp >= end.timestamp_millis() {
                return false;
            }
        }
        if let Some(ref want) = self.screen_name {
            if want != screen {
                return false;
            }
        }
        true
    }
}

/// The record store: a directory of self-describing JSON files.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    /// Open (creating if necessary) a record store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, record: &CaptureRecord) -> PathBuf {
        self.dir.join(record.filename())
    }

    /// Write a new record. Fails with `DuplicateId` if a file for `id`
    /// already exists. The write is atomic: a temp file is created in the
    /// same directory and renamed into place, so a reader never observes a
    /// partially written file.
    pub fn put(&self, record: &CaptureRecord) -> Result<(), StoreError> {
        let dest = self.path_for(record);
        if dest.exists() {
            return Err(StoreError::DuplicateId(record.id.clone()));
        }

        let body = serde_json::to_vec(record).map_err(|e| StoreError::MalformedRecord(e.to_string()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        {
            use std::io::Write;
            tmp.write_all(&body)?;
            tmp.write_all(b"\n")?;
            tmp.flush()?;
        }

        // Re-check for a racing writer before the rename; `put` into (A) is
        // single-writer in practice (the capture loop), but this keeps the
        // duplicate-id contract hard even if that assumption is violated.
        if dest.exists() {
            return Err(StoreError::DuplicateId(record.id.clone()));
        }
        tmp.persist(&dest)
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    /// Read a single record by id.
    pub fn read(&self, id: &str) -> Result<CaptureRecord, StoreError> {
        let path = self.dir.join(format!("{id}.json"));
        let body = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(id.to_string())
            } else {
                StoreError::Io(e)
            }
        })?;
        serde_json::from_str(&body).map_err(|e| StoreError::MalformedRecord(e.to_string()))
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.iter(RecordFilter::default())?.count())
    }

    /// A lazy sequence of records matching `filter`. Malformed files (bad
    /// JSON, unparseable filename) are skipped and logged rather than
    /// aborting the scan; [`RecordIter::malformed_count`] reports how many
    /// were skipped once the iterator is exhausted.
    pub fn iter(&self, filter: RecordFilter) -> Result<RecordIter, StoreError> {
        let mut entries: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        entries.sort();
        Ok(RecordIter {
            entries: entries.into_iter(),
            filter,
            malformed: Rc::new(Cell::new(0)),
        })
    }
}

/// Lazy iterator over [`RecordStore::iter`].
pub struct RecordIter {
    entries: std::vec::IntoIter<PathBuf>,
    filter: RecordFilter,
    malformed: Rc<Cell<usize>>,
}

impl RecordIter {
    pub fn malformed_count(&self) -> usize {
        self.malformed.get()
    }
}

impl Iterator for RecordIter {
    type Item = CaptureRecord;

    fn next(&mut self) -> Option<CaptureRecord> {
        for path in self.entries.by_ref() {
            let stem = match path.file_stem().and_then(|s| s.to_str()) {
                Some(s) => s,
                None => {
                    self.malformed.set(self.malformed.get() + 1);
                    warn!(path = %path.display(), "record store: non-UTF8 filename, skipping");
                    continue;
                }
            };

            let (timestamp, screen_name) = match CaptureRecord::parse_id(stem) {
                Ok(v) => v,
                Err(e) => {
                    self.malformed.set(self.malformed.get() + 1);
                    warn!(path = %path.display(), error = %e, "record store: unparseable filename, skipping");
                    continue;
                }
            };

            if !self.filter.matches(timestamp, &screen_name) {
                continue;
            }

            let body = match fs::read_to_string(&path) {
                Ok(b) => b,
                Err(e) => {
                    self.malformed.set(self.malformed.get() + 1);
                    warn!(path = %path.display(), error = %e, "record store: read failed, skipping");
                    continue;
                }
            };

            match serde_json::from_str::<CaptureRecord>(&body) {
                Ok(record) => return Some(record),
                Err(e) => {
                    self.malformed.set(self.malformed.get() + 1);
                    warn!(path = %path.display(), error = %e, "record store: malformed json, skipping");
                    continue;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memex_core::time::now_millis;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, RecordStore) {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn put_then_read_roundtrips() {
        let (_dir, store) = temp_store();
        let r = CaptureRecord::new(now_millis(), "Display_1", "hello".into(), "capture-v1");
        store.put(&r).unwrap();
        let back = store.read(&r.id).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let (_dir, store) = temp_store();
        let r = CaptureRecord::new(42, "Display_1", "hello".into(), "capture-v1");
        store.put(&r).unwrap();
        let err = store.put(&r).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(_)));
    }

    #[test]
    fn read_missing_is_not_found() {
        let (_dir, store) = temp_store();
        let err = store.read("missing-id").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn iter_filters_by_screen_name() {
        let (_dir, store) = temp_store();
        store
            .put(&CaptureRecord::new(1, "Display_1", "a".into(), "capture-v1"))
            .unwrap();
        store
            .put(&CaptureRecord::new(2, "Display_2", "b".into(), "capture-v1"))
            .unwrap();

        let filter = RecordFilter {
            screen_name: Some("Display_1".to_string()),
            ..Default::default()
        };
        let found: Vec<_> = store.iter(filter).unwrap().collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].screen_name, "Display_1");
    }

    #[test]
    fn iter_skips_malformed_files_and_counts_them() {
        let (dir, store) = temp_store();
        store
            .put(&CaptureRecord::new(1, "Display_1", "a".into(), "capture-v1"))
            .unwrap();
        fs::write(dir.path().join("garbage.json"), b"not json at all").unwrap();

        let mut iter = store.iter(RecordFilter::default()).unwrap();
        let found: Vec<_> = iter.by_ref().collect();
        assert_eq!(found.len(), 1);
        assert_eq!(iter.malformed_count(), 1);
    }

    #[test]
    fn count_matches_number_of_records() {
        let (_dir, store) = temp_store();
        for i in 0..5 {
            store
                .put(&CaptureRecord::new(i, "Display_1", "x".into(), "capture-v1"))
                .unwrap();
        }
        assert_eq!(store.count().unwrap(), 5);
    }
}
