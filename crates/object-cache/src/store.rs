use crate::error::Result;
use crate::fingerprint::ContentFingerprint;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Metadata record for one indexed file.
///
/// Owned exclusively by the object store: created or overwritten whole
/// on every (re)index, deleted when the file goes away or the object is
/// found orphaned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub size: u64,
    pub sha256: String,
    pub xxhash: String,
}

impl FileRecord {
    #[must_use]
    pub fn new(path: &Path, fingerprint: &ContentFingerprint) -> Self {
        Self {
            path: path.to_string_lossy().to_string(),
            size: fingerprint.size,
            sha256: fingerprint.sha256.clone(),
            xxhash: fingerprint.xxhash.clone(),
        }
    }

    /// Stand-in for a record that could not be loaded. Matches no
    /// fingerprint, so the file is always reindexed.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            path: String::new(),
            size: 0,
            sha256: String::new(),
            xxhash: String::new(),
        }
    }

    /// Dedup fast path: unchanged only when size and both digests match.
    #[must_use]
    pub fn matches(&self, fingerprint: &ContentFingerprint) -> bool {
        self.size == fingerprint.size
            && self.sha256 == fingerprint.sha256
            && self.xxhash == fingerprint.xxhash
    }
}

/// Durable storage of file records, one JSON document per object
/// identifier.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    dir: PathBuf,
}

impl ObjectStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a record, overwriting any prior record at the identifier.
    pub async fn write(&self, id: &str, record: &FileRecord) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let bytes = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(self.object_path(id), bytes).await?;
        Ok(())
    }

    /// Read a record. Missing, unreadable, and corrupt records all come
    /// back as `None`; callers treat them identically and reindex.
    pub async fn read(&self, id: &str) -> Option<FileRecord> {
        let path = self.object_path(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("Could not read object {}: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Corrupt object record {}: {e}", path.display());
                None
            }
        }
    }

    /// Delete a persisted record; no-op if absent.
    pub async fn remove(&self, id: &str) -> Result<()> {
        match tokio::fs::remove_file(self.object_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Enumerate every persisted object identifier.
    pub async fn list_all(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                ids.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        Ok(ids)
    }

    fn object_path(&self, id: &str) -> PathBuf {
        self.dir.join(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn record(path: &str) -> FileRecord {
        FileRecord::new(
            Path::new(path),
            &ContentFingerprint::of_bytes(b"x=1\n"),
        )
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = ObjectStore::new(dir.path().join("objects"));

        let rec = record("/project/a.py");
        store.write("abc", &rec).await.unwrap();

        assert_eq!(store.read("abc").await, Some(rec));
    }

    #[tokio::test]
    async fn missing_record_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = ObjectStore::new(dir.path().join("objects"));
        assert_eq!(store.read("nope").await, None);
    }

    #[tokio::test]
    async fn corrupt_record_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = ObjectStore::new(dir.path());
        tokio::fs::write(dir.path().join("bad"), b"{not json")
            .await
            .unwrap();
        assert_eq!(store.read("bad").await, None);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = ObjectStore::new(dir.path().join("objects"));

        store.write("abc", &record("/project/a.py")).await.unwrap();
        store.remove("abc").await.unwrap();
        store.remove("abc").await.unwrap();
        assert_eq!(store.read("abc").await, None);
    }

    #[tokio::test]
    async fn list_all_enumerates_objects() {
        let dir = TempDir::new().unwrap();
        let store = ObjectStore::new(dir.path().join("objects"));

        assert!(store.list_all().await.unwrap().is_empty());

        store.write("one", &record("/project/a.py")).await.unwrap();
        store.write("two", &record("/project/b.py")).await.unwrap();

        let mut ids = store.list_all().await.unwrap();
        ids.sort();
        assert_eq!(ids, vec!["one".to_string(), "two".to_string()]);
    }
}
