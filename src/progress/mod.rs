//! Durable crawl progress
//!
//! The progress file is the single source of truth for resumability: a JSON
//! mapping from jurisdiction code to the last date whose window was fully
//! paginated. It is read once at scheduler start and rewritten after each
//! completed window. All writes funnel through one mutex so concurrent
//! workers never interleave read-modify-write cycles.

use crate::{HarvestError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// In-memory form of the persisted progress mapping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressRecord(HashMap<String, String>);

impl ProgressRecord {
    /// Last fully-crawled date for a court, if recorded and well-formed
    pub fn last_date(&self, code: &str) -> Option<NaiveDate> {
        let raw = self.0.get(code)?;
        match raw.parse() {
            Ok(date) => Some(date),
            Err(_) => {
                tracing::warn!("Ignoring malformed progress date for {}: {}", code, raw);
                None
            }
        }
    }

    /// Moves a court's date forward; returns false (and changes nothing) if
    /// the recorded date is already at or past the new one
    pub fn advance(&mut self, code: &str, date: NaiveDate) -> bool {
        if let Some(existing) = self.last_date(code) {
            if existing >= date {
                return false;
            }
        }
        self.0.insert(code.to_string(), date.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Serialized access to the persisted progress mapping
pub struct ProgressTracker {
    path: PathBuf,
    /// Single critical section for every read-modify-write; write volume is
    /// one update per completed window, so finer locking buys nothing.
    lock: Mutex<()>,
}

impl ProgressTracker {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Loads the mapping; a missing file is an empty record
    pub async fn load(&self) -> Result<ProgressRecord> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    /// Replaces the persisted mapping wholesale
    pub async fn save(&self, record: &ProgressRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write_unlocked(record).await
    }

    /// Advances one court's date under the tracker's critical section
    ///
    /// The stored date only ever moves forward; a stale update (from a
    /// re-crawled historical window) is dropped silently.
    pub async fn update(&self, code: &str, date: NaiveDate) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut record = self.read_unlocked().await?;
        if record.advance(code, date) {
            self.write_unlocked(&record).await?;
            tracing::info!("Progress for {} advanced to {}", code, date);
        } else {
            tracing::debug!("Progress for {} already at or past {}", code, date);
        }
        Ok(())
    }

    async fn read_unlocked(&self) -> Result<ProgressRecord> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                HarvestError::Progress(format!(
                    "Corrupt progress file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ProgressRecord::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_unlocked(&self, record: &ProgressRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        // Write-then-rename keeps the file parseable under interruption.
        let tmp = self.path.with_extension("tmp");
        let json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tracker_in(dir: &tempfile::TempDir) -> ProgressTracker {
        ProgressTracker::new(dir.path().join("track.json"))
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_in(&dir);
        let record = tracker.load().await.unwrap();
        assert!(record.is_empty());
    }

    #[tokio::test]
    async fn test_update_persists() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_in(&dir);

        tracker.update("9~13", date(2008, 1, 5)).await.unwrap();

        let record = tracker.load().await.unwrap();
        assert_eq!(record.last_date("9~13"), Some(date(2008, 1, 5)));
    }

    #[tokio::test]
    async fn test_update_is_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_in(&dir);

        tracker.update("9~13", date(2008, 1, 10)).await.unwrap();
        // A re-crawl of an old window must not move progress backwards.
        tracker.update("9~13", date(2008, 1, 5)).await.unwrap();

        let record = tracker.load().await.unwrap();
        assert_eq!(record.last_date("9~13"), Some(date(2008, 1, 10)));
    }

    #[tokio::test]
    async fn test_concurrent_updates_keep_both_courts() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(tracker_in(&dir));

        let mut handles = Vec::new();
        for (code, day) in [("9~13", 5u32), ("27~1", 9)] {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                tracker.update(code, date(2008, 1, day)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let record = tracker.load().await.unwrap();
        assert_eq!(record.last_date("9~13"), Some(date(2008, 1, 5)));
        assert_eq!(record.last_date("27~1"), Some(date(2008, 1, 9)));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.json");
        std::fs::write(&path, "not json").unwrap();

        let tracker = ProgressTracker::new(path);
        let err = tracker.load().await.unwrap_err();
        assert!(matches!(err, HarvestError::Progress(_)));
    }

    #[test]
    fn test_record_ignores_malformed_dates() {
        let record: ProgressRecord =
            serde_json::from_str(r#"{"9~13": "not-a-date"}"#).unwrap();
        assert_eq!(record.last_date("9~13"), None);
    }
}
