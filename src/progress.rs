//! Reading-progress persistence: one JSON file holding a record per
//! document, keyed by content hash so progress follows a file across renames
//! and moves.
//!
//! The store is a collaborator of the reading core, not part of it: the core
//! only consumes a restored `(page_index, total_pages)` pair and emits a
//! final [`Position`].

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::Position;
use crate::util::time_now_secs;

/// A persisted reading position for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub file_hash: String,
    pub file_name: String,
    pub page_index: usize,
    /// Page count at the time of the last read. Restoration compares this
    /// against the fresh pagination and rescales when they differ.
    pub total_pages: usize,
    pub chapter_index: usize,
    pub percent: f64,
    pub last_read_epoch: u64,
}

impl ProgressRecord {
    pub fn new(
        file_hash: impl Into<String>,
        file_name: impl Into<String>,
        position: Position,
        total_pages: usize,
    ) -> Self {
        Self {
            file_hash: file_hash.into(),
            file_name: file_name.into(),
            page_index: position.page,
            total_pages,
            chapter_index: position.chapter,
            percent: position.percent,
            last_read_epoch: time_now_secs(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressFile {
    documents: Vec<ProgressRecord>,
}

/// On-disk JSON progress store.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default store location: `$FOLIO_DATA_DIR/progress.json`, falling back
    /// to `~/.folio/progress.json`.
    pub fn default_path() -> PathBuf {
        if let Ok(dir) = std::env::var("FOLIO_DATA_DIR") {
            return PathBuf::from(dir).join("progress.json");
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        PathBuf::from(home).join(".folio").join("progress.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record for a document, if one was saved. A missing or unreadable store
    /// is treated as no saved progress.
    pub fn load(&self, file_hash: &str) -> Option<ProgressRecord> {
        let data = self.read_file()?;
        data.documents
            .into_iter()
            .find(|record| record.file_hash == file_hash)
    }

    /// Insert or replace the record for `record.file_hash`.
    pub fn save(&self, record: ProgressRecord) -> Result<()> {
        let mut data = self.read_file().unwrap_or_default();

        match data
            .documents
            .iter_mut()
            .find(|existing| existing.file_hash == record.file_hash)
        {
            Some(existing) => *existing = record,
            None => data.documents.push(record),
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&data)?)?;
        Ok(())
    }

    /// All saved records, most recently read first.
    pub fn all(&self) -> Vec<ProgressRecord> {
        let mut records = self.read_file().map(|d| d.documents).unwrap_or_default();
        records.sort_by(|a, b| b.last_read_epoch.cmp(&a.last_read_epoch));
        records
    }

    /// Delete every saved record.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn read_file(&self) -> Option<ProgressFile> {
        let text = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&text) {
            Ok(data) => Some(data),
            Err(e) => {
                log::warn!("ignoring malformed progress file {}: {e}", self.path.display());
                None
            }
        }
    }
}

/// SHA-1 of a file's contents: identifies a document independently of its
/// path.
pub fn file_hash(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut sha = sha1_smol::Sha1::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        sha.update(&buf[..n]);
    }
    Ok(sha.digest().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hash: &str, page: usize) -> ProgressRecord {
        ProgressRecord::new(
            hash,
            "book.epub",
            Position {
                page,
                chapter: 0,
                percent: 0.0,
            },
            100,
        )
    }

    #[test]
    fn test_missing_store_is_no_progress() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("progress.json"));
        assert!(store.load("abc").is_none());
        assert!(store.all().is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("progress.json"));

        store.save(record("abc", 7)).unwrap();
        store.save(record("def", 3)).unwrap();

        let loaded = store.load("abc").unwrap();
        assert_eq!(loaded.page_index, 7);
        assert_eq!(loaded.total_pages, 100);
        assert_eq!(store.all().len(), 2);
    }

    #[test]
    fn test_save_replaces_existing_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("progress.json"));

        store.save(record("abc", 7)).unwrap();
        store.save(record("abc", 42)).unwrap();

        assert_eq!(store.load("abc").unwrap().page_index, 42);
        assert_eq!(store.all().len(), 1);
    }

    #[test]
    fn test_clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("progress.json"));

        store.save(record("abc", 7)).unwrap();
        store.clear().unwrap();
        assert!(store.load("abc").is_none());
        // Clearing an already-empty store is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_malformed_store_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, "{not json").unwrap();

        let store = ProgressStore::new(&path);
        assert!(store.load("abc").is_none());
        // Saving over a malformed file starts fresh rather than failing.
        store.save(record("abc", 1)).unwrap();
        assert_eq!(store.load("abc").unwrap().page_index, 1);
    }

    #[test]
    fn test_file_hash_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        fs::write(&path, "hello").unwrap();

        let first = file_hash(&path).unwrap();
        let second = file_hash(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 40);

        fs::write(&path, "changed").unwrap();
        assert_ne!(file_hash(&path).unwrap(), first);
    }
}
