//! Pending-upsert queue: ids that failed to reach (B) and must be retried
//! before new capture work starts (SPEC_FULL §4.3). A small append-only
//! newline-delimited file alongside the record directory, rewritten
//! atomically with the same temp-then-rename discipline as (A).
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::CaptureError;

const PENDING_FILE_NAME: &str = "pending_upserts.txt";

pub struct PendingQueue {
    path: PathBuf,
}

impl PendingQueue {
    pub fn open(record_dir: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = record_dir.as_ref().join(PENDING_FILE_NAME);
        if !path.exists() {
            fs::write(&path, b"")?;
        }
        Ok(Self { path })
    }

    pub fn push(&self, id: &str) -> Result<(), CaptureError> {
        let mut ids = self.load()?;
        if ids.iter().any(|existing| existing == id) {
            return Ok(());
        }
        ids.push(id.to_string());
        self.write_all(&ids)
    }

    pub fn drain(&self) -> Result<Vec<String>, CaptureError> {
        let ids = self.load()?;
        self.write_all(&[])?;
        Ok(ids)
    }

    pub fn len(&self) -> Result<usize, CaptureError> {
        Ok(self.load()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CaptureError> {
        Ok(self.len()? == 0)
    }

    fn load(&self) -> Result<Vec<String>, CaptureError> {
        let body = fs::read_to_string(&self.path)?;
        Ok(body.lines().filter(|l| !l.is_empty()).map(str::to_string).collect())
    }

    fn write_all(&self, ids: &[String]) -> Result<(), CaptureError> {
        let dir = self.path.parent().expect("pending queue path has a parent");
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        for id in ids {
            tmp.write_all(id.as_bytes())?;
            tmp.write_all(b"\n")?;
        }
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| CaptureError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn push_then_drain_returns_ids_in_order() {
        let dir = TempDir::new().unwrap();
        let queue = PendingQueue::open(dir.path()).unwrap();
        queue.push("a").unwrap();
        queue.push("b").unwrap();
        assert_eq!(queue.len().unwrap(), 2);

        let drained = queue.drain().unwrap();
        assert_eq!(drained, vec!["a".to_string(), "b".to_string()]);
        assert!(queue.is_empty().unwrap());
    }

    #[test]
    fn push_is_idempotent_for_duplicate_ids() {
        let dir = TempDir::new().unwrap();
        let queue = PendingQueue::open(dir.path()).unwrap();
        queue.push("a").unwrap();
        queue.push("a").unwrap();
        assert_eq!(queue.len().unwrap(), 1);
    }

    #[test]
    fn reopen_preserves_existing_entries() {
        let dir = TempDir::new().unwrap();
        {
            let queue = PendingQueue::open(dir.path()).unwrap();
            queue.push("a").unwrap();
        }
        let queue = PendingQueue::open(dir.path()).unwrap();
        assert_eq!(queue.len().unwrap(), 1);
    }
}
