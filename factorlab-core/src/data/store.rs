//! Parquet-backed columnar store.
//!
//! Layout: `{root}/{sub_directory}/{key}.parquet`, one file per symbol per
//! dataset, plus an optional `{key}.meta.json` attribution sidecar.
//!
//! Writes are atomic (write to .tmp, rename into place) and wholesale: a
//! rewrite replaces the prior artifact entirely. A failed write never leaves
//! a truncated file visible to readers.

use super::provider::FetchOutcome;
use chrono::Utc;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Attribution metadata stored alongside an artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub symbol: String,
    /// RFC 3339 timestamp of when the payload was received.
    pub received_at: String,
    pub rows: usize,
    /// blake3 hash of the parquet bytes, for integrity checks.
    pub data_hash: String,
}

impl ArtifactMeta {
    /// Attribution for a freshly fetched outcome. The hash is filled in by
    /// the store once the parquet bytes exist.
    pub fn received_now(outcome: &FetchOutcome) -> Self {
        Self {
            symbol: outcome.symbol.clone(),
            received_at: Utc::now().to_rfc3339(),
            rows: outcome.frame.height(),
            data_hash: String::new(),
        }
    }
}

/// One artifact read back from disk.
#[derive(Debug)]
pub struct StoredArtifact {
    pub frame: DataFrame,
    pub meta: Option<ArtifactMeta>,
}

/// Everything found in one dataset directory, plus universe drift.
#[derive(Debug, Default)]
pub struct DirectorySnapshot {
    /// Artifacts keyed by file stem (normally the symbol).
    pub artifacts: BTreeMap<String, StoredArtifact>,
    /// Symbols expected but not present on disk.
    pub missing: Vec<String>,
    /// File stems present on disk but not in the expected universe.
    pub extra: Vec<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("artifact not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("store I/O error: {0}")]
    Io(String),

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("metadata error: {0}")]
    Meta(String),
}

/// Durable key/value persistence of columnar tables.
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_path(&self, sub_directory: &str, key: &str) -> PathBuf {
        self.root.join(sub_directory).join(format!("{key}.parquet"))
    }

    fn meta_path(&self, sub_directory: &str, key: &str) -> PathBuf {
        self.root
            .join(sub_directory)
            .join(format!("{key}.meta.json"))
    }

    /// Write one artifact, replacing any prior file for the same key.
    ///
    /// The parquet lands via tmp+rename so a crash mid-write leaves the prior
    /// artifact untouched. The sidecar is written after the rename; a missing
    /// sidecar is tolerated on read.
    pub fn write(
        &self,
        sub_directory: &str,
        key: &str,
        frame: &DataFrame,
        meta: Option<ArtifactMeta>,
    ) -> Result<(), StoreError> {
        let path = self.artifact_path(sub_directory, key);
        let parent = path.parent().expect("artifact path always has a parent");
        fs::create_dir_all(parent).map_err(|e| StoreError::Io(format!("create dir: {e}")))?;

        let tmp_path = path.with_extension("parquet.tmp");
        let file = fs::File::create(&tmp_path)
            .map_err(|e| StoreError::Io(format!("create temp file: {e}")))?;
        ParquetWriter::new(file)
            .finish(&mut frame.clone())
            .map_err(|e| {
                let _ = fs::remove_file(&tmp_path);
                StoreError::Parquet(format!("write: {e}"))
            })?;

        let data_hash = fs::read(&tmp_path)
            .map(|bytes| blake3::hash(&bytes).to_hex().to_string())
            .map_err(|e| StoreError::Io(format!("hash temp file: {e}")))?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::Io(format!("atomic rename: {e}"))
        })?;

        if let Some(mut meta) = meta {
            meta.data_hash = data_hash;
            let json = serde_json::to_string_pretty(&meta)
                .map_err(|e| StoreError::Meta(format!("serialize: {e}")))?;
            fs::write(self.meta_path(sub_directory, key), json)
                .map_err(|e| StoreError::Meta(format!("write sidecar: {e}")))?;
        }

        tracing::info!(sub_directory, key, rows = frame.height(), "stored artifact");
        Ok(())
    }

    /// Read one artifact. Absence is `NotFound`, which is distinct from an
    /// artifact holding an empty table.
    pub fn read(&self, sub_directory: &str, key: &str) -> Result<DataFrame, StoreError> {
        let path = self.artifact_path(sub_directory, key);
        if !path.exists() {
            return Err(StoreError::NotFound { path });
        }
        let file = fs::File::open(&path).map_err(|e| StoreError::Io(format!("open: {e}")))?;
        ParquetReader::new(file)
            .finish()
            .map_err(|e| StoreError::Parquet(format!("read: {e}")))
    }

    /// Read the attribution sidecar for an artifact, if one exists.
    pub fn read_meta(&self, sub_directory: &str, key: &str) -> Option<ArtifactMeta> {
        let content = fs::read_to_string(self.meta_path(sub_directory, key)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Read every artifact in a dataset directory and report drift against
    /// the expected symbol universe.
    ///
    /// A missing directory or an empty one yields an empty snapshot (with the
    /// whole universe reported missing), never an error. Unreadable files are
    /// logged and skipped. Drift is an informational diagnostic only.
    pub fn read_all(
        &self,
        sub_directory: &str,
        expected: &[String],
    ) -> Result<DirectorySnapshot, StoreError> {
        let dir = self.root.join(sub_directory);
        let mut snapshot = DirectorySnapshot::default();

        if dir.is_dir() {
            let entries =
                fs::read_dir(&dir).map_err(|e| StoreError::Io(format!("read dir: {e}")))?;
            for entry in entries {
                let entry = entry.map_err(|e| StoreError::Io(format!("dir entry: {e}")))?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("parquet") {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };

                match self.read(sub_directory, stem) {
                    Ok(frame) => {
                        let meta = self.read_meta(sub_directory, stem);
                        snapshot
                            .artifacts
                            .insert(stem.to_string(), StoredArtifact { frame, meta });
                    }
                    Err(e) => {
                        tracing::error!(sub_directory, key = stem, error = %e, "skipping unreadable artifact");
                    }
                }
            }
        }

        snapshot.missing = expected
            .iter()
            .filter(|s| !snapshot.artifacts.contains_key(*s))
            .cloned()
            .collect();
        snapshot.extra = snapshot
            .artifacts
            .keys()
            .filter(|k| !expected.iter().any(|s| s == *k))
            .cloned()
            .collect();

        if !snapshot.missing.is_empty() {
            tracing::warn!(sub_directory, missing = ?snapshot.missing, "universe files missing");
        }
        if !snapshot.extra.is_empty() {
            tracing::warn!(sub_directory, extra = ?snapshot.extra, "files outside the expected universe");
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::FetchOutcome;

    fn sample_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("date".into(), vec![19724i32, 19725])
                .cast(&DataType::Date)
                .unwrap(),
            Column::new("adjClose".into(), vec![101.5f64, 102.25]),
        ])
        .unwrap()
    }

    #[test]
    fn write_and_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());

        store.write("prices", "AAPL", &sample_frame(), None).unwrap();
        let frame = store.read("prices", "AAPL").unwrap();

        assert_eq!(frame.height(), 2);
        assert_eq!(
            frame.column("adjClose").unwrap().f64().unwrap().get(0),
            Some(101.5)
        );
    }

    #[test]
    fn read_absent_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());

        let err = store.read("prices", "NONE").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn meta_sidecar_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());

        let outcome = FetchOutcome {
            symbol: "AAPL".into(),
            frame: sample_frame(),
        };
        let meta = ArtifactMeta::received_now(&outcome);
        store
            .write("prices", "AAPL", &outcome.frame, Some(meta))
            .unwrap();

        let meta = store.read_meta("prices", "AAPL").unwrap();
        assert_eq!(meta.symbol, "AAPL");
        assert_eq!(meta.rows, 2);
        assert!(!meta.data_hash.is_empty());
    }

    #[test]
    fn rewrite_replaces_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());

        store.write("prices", "AAPL", &sample_frame(), None).unwrap();
        let single = DataFrame::new(vec![
            Column::new("date".into(), vec![19726i32])
                .cast(&DataType::Date)
                .unwrap(),
            Column::new("adjClose".into(), vec![99.0f64]),
        ])
        .unwrap();
        store.write("prices", "AAPL", &single, None).unwrap();

        assert_eq!(store.read("prices", "AAPL").unwrap().height(), 1);
    }

    #[test]
    fn no_tmp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        store.write("prices", "AAPL", &sample_frame(), None).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path().join("prices"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn read_all_reports_universe_drift() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());

        store.write("prices", "AAPL", &sample_frame(), None).unwrap();
        store.write("prices", "MSFT", &sample_frame(), None).unwrap();
        store.write("prices", "DELISTED", &sample_frame(), None).unwrap();

        let universe = vec!["AAPL".to_string(), "MSFT".to_string(), "GOOGL".to_string()];
        let snapshot = store.read_all("prices", &universe).unwrap();

        assert_eq!(snapshot.artifacts.len(), 3);
        assert_eq!(snapshot.missing, vec!["GOOGL".to_string()]);
        assert_eq!(snapshot.extra, vec!["DELISTED".to_string()]);
    }

    #[test]
    fn read_all_tolerates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());

        let universe = vec!["AAPL".to_string()];
        let snapshot = store.read_all("prices", &universe).unwrap();

        assert!(snapshot.artifacts.is_empty());
        assert_eq!(snapshot.missing, universe);
    }
}
