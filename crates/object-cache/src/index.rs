use crate::error::Result;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

/// In-memory map from absolute file path to object identifier, persisted
/// as a single JSON document.
///
/// Invariant (bidirectional completeness): every entry has a record in
/// the object store at its identifier, and every stored record has an
/// entry here. Crashes can break this transiently; reconciliation
/// repairs it on the next startup, so violations are expected, not
/// fatal.
///
/// Keys are kept in a `BTreeMap` so a no-op save is byte-identical to
/// the previous document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectIndex {
    entries: BTreeMap<String, String>,
}

impl ObjectIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the persisted index. A missing or corrupt document yields an
    /// empty index with a warning; loading never fails.
    pub async fn load(path: &Path) -> Self {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Self::new(),
            Err(e) => {
                log::warn!(
                    "Could not read index document {}: {e}; starting empty",
                    path.display()
                );
                return Self::new();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(entries) => Self { entries },
            Err(e) => {
                log::warn!(
                    "Corrupt index document {}: {e}; starting empty",
                    path.display()
                );
                Self::new()
            }
        }
    }

    /// Overwrite the persisted index document. Write-to-temp then rename
    /// keeps a crash mid-save from truncating the previous document.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(&self.entries)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    pub fn insert(&mut self, path: &Path, id: String) {
        self.entries.insert(path.to_string_lossy().to_string(), id);
    }

    pub fn remove(&mut self, path: &Path) -> Option<String> {
        self.entries.remove(&*path.to_string_lossy())
    }

    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&str> {
        self.entries
            .get(&*path.to_string_lossy())
            .map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &String)> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
