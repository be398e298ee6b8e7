use crate::error::{CacheError, Result};
use crate::fingerprint::{object_id, ContentFingerprint};
use crate::ignore::IgnorePolicy;
use crate::index::ObjectIndex;
use crate::store::{FileRecord, ObjectStore};
use crate::sync::{Delivery, SyncClient};
use crate::watcher::{FileEvent, FileEventKind};
use grepplus_tokenizer::{is_tokenizable, Tokenizer};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

pub const CACHE_DIR_NAME: &str = ".grep++";
pub const OBJECT_CACHE_DIR_NAME: &str = "object_cache";
pub const OBJECTS_DIR_NAME: &str = "objects";
pub const INDEX_FILE_NAME: &str = "index.json";

/// Result of the shared indexing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// A fresh record was written and an update notification sent.
    Indexed,
    /// Content matched the previous record; nothing written, nothing sent.
    Unchanged,
    /// File missing or unreadable; any stale object was removed.
    NotIndexable,
}

/// Counters for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub orphans_removed: usize,
    pub revalidated: usize,
    pub reindexed: usize,
    pub dropped: usize,
    pub discovered: usize,
}

/// The file-synchronization core: object store, object index, ignore
/// policy, and the remote sync client, behind one owner.
///
/// All mutation goes through `reconcile` (startup) or `apply_event`
/// (live watcher), both driven from a single task, so index and store
/// never race.
pub struct ObjectCache {
    project_dir: PathBuf,
    index_path: PathBuf,
    store: ObjectStore,
    index: ObjectIndex,
    ignore: IgnorePolicy,
    sync: Arc<dyn SyncClient>,
    tokenizer: Tokenizer,
}

impl ObjectCache {
    /// Open (or create) the cache under `<project>/.grep++/object_cache`.
    ///
    /// Fatal only when the cache directories cannot be created or the
    /// grammar fails to load; a missing or corrupt index document just
    /// starts empty.
    pub async fn open(project_dir: impl AsRef<Path>, sync: Arc<dyn SyncClient>) -> Result<Self> {
        let project_dir = tokio::fs::canonicalize(project_dir.as_ref())
            .await
            .map_err(|e| {
                CacheError::InvalidPath(format!(
                    "{}: {e}",
                    project_dir.as_ref().display()
                ))
            })?;

        let cache_root = project_dir.join(CACHE_DIR_NAME);
        let cache_dir = cache_root.join(OBJECT_CACHE_DIR_NAME);
        let objects_dir = cache_dir.join(OBJECTS_DIR_NAME);
        tokio::fs::create_dir_all(&objects_dir).await?;

        let index_path = cache_dir.join(INDEX_FILE_NAME);
        let ignore = IgnorePolicy::load(&project_dir, &cache_root).await;
        let index = ObjectIndex::load(&index_path).await;

        Ok(Self {
            project_dir,
            index_path,
            store: ObjectStore::new(objects_dir),
            index,
            ignore,
            sync,
            tokenizer: Tokenizer::new()?,
        })
    }

    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    #[must_use]
    pub fn index(&self) -> &ObjectIndex {
        &self.index
    }

    #[must_use]
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// Persist the index document.
    pub async fn flush(&self) -> Result<()> {
        self.index.save(&self.index_path).await
    }

    /// Startup pass restoring consistency between disk, the object store,
    /// and the index. Idempotent: a second run with no filesystem changes
    /// writes nothing, notifies nothing, and leaves the persisted index
    /// byte-identical.
    pub async fn reconcile(&mut self) -> Result<ReconcileStats> {
        info!("Reconciling object cache for {}", self.project_dir.display());
        let mut stats = ReconcileStats::default();

        self.sweep_orphans(&mut stats).await;
        self.revalidate_entries(&mut stats).await;
        self.discover_new_files(&mut stats).await;

        self.flush().await?;
        info!("Reconciliation finished: {stats:?}");
        Ok(stats)
    }

    /// Apply one live filesystem event. Events for ignored paths or
    /// non-tracked extensions are dropped without side effects.
    pub async fn apply_event(&mut self, event: FileEvent) {
        let FileEvent { kind, path } = event;
        if !is_tokenizable(&path) || self.ignore.is_ignored(&path) {
            return;
        }

        match kind {
            FileEventKind::Created => {
                debug!("File created: {}", path.display());
                if let IndexOutcome::Indexed = self.index_file(None, &path).await {
                    self.index.insert(&path, object_id(&path));
                }
            }
            FileEventKind::Modified => {
                debug!("File modified: {}", path.display());
                let previous = match self.index.get(&path) {
                    Some(id) => Some(self.store.read(id).await.unwrap_or_else(|| {
                        warn!(
                            "Record for {} missing or corrupt; reindexing",
                            path.display()
                        );
                        FileRecord::placeholder()
                    })),
                    None => None,
                };
                match self.index_file(previous, &path).await {
                    IndexOutcome::Indexed => self.index.insert(&path, object_id(&path)),
                    IndexOutcome::Unchanged => {}
                    IndexOutcome::NotIndexable => {
                        if self.index.remove(&path).is_some() {
                            info!("Dropped {}: no longer readable", path.display());
                        }
                    }
                }
            }
            FileEventKind::Deleted => {
                let Some(id) = self.index.remove(&path) else {
                    return;
                };
                if let Err(e) = self.store.remove(&id).await {
                    warn!("Could not remove object for {}: {e}", path.display());
                }
                self.send_deleted(&path).await;
                info!("File deleted: {}", path.display());
            }
        }
    }

    /// Index-or-skip one file given its previous record (the shared
    /// primitive behind reconciliation and live events).
    ///
    /// The caller owns the index entry; this only touches the object
    /// store and the remote service.
    async fn index_file(&mut self, previous: Option<FileRecord>, path: &Path) -> IndexOutcome {
        let id = object_id(path);

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if previous.is_some() {
                    info!(
                        "File {} missing or unreadable ({e}); removing from object store",
                        path.display()
                    );
                    if let Err(remove_err) = self.store.remove(&id).await {
                        warn!(
                            "Could not remove object for {}: {remove_err}",
                            path.display()
                        );
                    }
                }
                return IndexOutcome::NotIndexable;
            }
        };

        let fingerprint = ContentFingerprint::of_bytes(&bytes);
        if let Some(previous) = &previous {
            if previous.matches(&fingerprint) {
                return IndexOutcome::Unchanged;
            }
        }

        let record = FileRecord::new(path, &fingerprint);
        if let Err(e) = self.store.write(&id, &record).await {
            // Next reconciliation sees the missing record and reindexes.
            warn!("Could not persist object for {}: {e}", path.display());
        }

        let source = String::from_utf8_lossy(&bytes);
        let lines = match self.tokenizer.tokenize(&source) {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Could not tokenize {}: {e}", path.display());
                Vec::new()
            }
        };

        if previous.is_some() {
            // The remote drops the stale version before the new one lands.
            self.send_deleted(path).await;
        }
        if let Delivery::Failed(reason) = self
            .sync
            .notify_updated(&self.project_dir, path, lines)
            .await
        {
            warn!(
                "Update notification for {} not delivered: {reason}",
                path.display()
            );
        }

        info!("Indexed {}", path.display());
        IndexOutcome::Indexed
    }

    /// Remove stored objects whose index entry was never written (crash
    /// between object write and index save), telling the remote to drop
    /// their recorded paths.
    ///
    /// Per-object failures are logged and skipped; the next
    /// reconciliation retries them.
    async fn sweep_orphans(&mut self, stats: &mut ReconcileStats) {
        let indexed: HashSet<String> = self.index.entries().map(|(_, id)| id.clone()).collect();

        let ids = match self.store.list_all().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Could not list stored objects: {e}; skipping orphan sweep");
                return;
            }
        };

        for id in ids {
            if indexed.contains(&id) {
                continue;
            }
            let record = self.store.read(&id).await;
            if let Err(e) = self.store.remove(&id).await {
                warn!("Could not remove orphaned object {id}: {e}");
                continue;
            }
            match record {
                Some(record) => {
                    self.send_deleted(Path::new(&record.path)).await;
                    info!("Removed orphaned object for {}", record.path);
                }
                None => warn!("Orphaned object {id} had no readable record; removed anyway"),
            }
            stats.orphans_removed += 1;
        }
    }

    /// Check every indexed entry against disk; reindex changed files and
    /// drop entries whose file is gone.
    async fn revalidate_entries(&mut self, stats: &mut ReconcileStats) {
        let entries: Vec<(String, String)> = self
            .index
            .entries()
            .map(|(path, id)| (path.clone(), id.clone()))
            .collect();

        for (path_str, id) in entries {
            let path = PathBuf::from(&path_str);
            let previous = self.store.read(&id).await.unwrap_or_else(|| {
                warn!("Record for {path_str} missing or corrupt; reindexing");
                FileRecord::placeholder()
            });

            match self.index_file(Some(previous), &path).await {
                IndexOutcome::NotIndexable => {
                    self.index.remove(&path);
                    stats.dropped += 1;
                    info!("Dropped {path_str}: no longer readable");
                }
                IndexOutcome::Indexed => {
                    stats.revalidated += 1;
                    stats.reindexed += 1;
                }
                IndexOutcome::Unchanged => stats.revalidated += 1,
            }
        }
    }

    /// Walk the project tree for tokenizable files the index has not
    /// seen yet.
    async fn discover_new_files(&mut self, stats: &mut ReconcileStats) {
        let walker = WalkDir::new(&self.project_dir).follow_links(false);
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error under {}: {e}", self.project_dir.display());
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !is_tokenizable(path) || self.ignore.is_ignored(path) || self.index.contains(path) {
                continue;
            }

            info!("Found new file {}", path.display());
            if let IndexOutcome::Indexed = self.index_file(None, path).await {
                self.index.insert(path, object_id(path));
                stats.discovered += 1;
            }
        }
    }

    async fn send_deleted(&self, path: &Path) {
        if let Delivery::Failed(reason) = self.sync.notify_deleted(&self.project_dir, path).await {
            warn!(
                "Delete notification for {} not delivered: {reason}",
                path.display()
            );
        }
    }
}
