use crate::cache::ObjectCache;
use crate::error::{CacheError, Result};
use log::warn;
use notify::event::{ModifyKind, RenameMode};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One filesystem change, normalized from the platform notification
/// backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub kind: FileEventKind,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Created,
    Modified,
    Deleted,
}

impl FileEvent {
    #[must_use]
    pub fn new(kind: FileEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

enum WatcherCommand {
    Shutdown,
}

/// Live filesystem watcher over a project directory.
///
/// Events are funneled through one single-consumer queue into the task
/// that owns the [`ObjectCache`], so index and store mutation is
/// serialized. Reconciliation must have finished before events begin
/// flowing; the caller owns that ordering.
pub struct ChangeWatcher;

impl ChangeWatcher {
    pub fn start(cache: ObjectCache) -> Result<WatcherHandle> {
        let (event_tx, event_rx) = mpsc::channel(1024);
        let (command_tx, command_rx) = mpsc::channel(16);

        let watcher = create_fs_watcher(cache.project_dir(), event_tx)?;
        let task = spawn_event_loop(cache, event_rx, command_rx);

        Ok(WatcherHandle {
            command_tx,
            task,
            _watcher: watcher,
        })
    }
}

/// Handle to a running watcher. Dropping it tears down the notify
/// subscription; [`WatcherHandle::shutdown`] additionally drains the
/// loop and flushes the index.
pub struct WatcherHandle {
    command_tx: mpsc::Sender<WatcherCommand>,
    task: JoinHandle<()>,
    _watcher: RecommendedWatcher,
}

impl WatcherHandle {
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.command_tx.send(WatcherCommand::Shutdown).await;
        self.task
            .await
            .map_err(|e| CacheError::Watch(format!("event loop panicked: {e}")))
    }
}

fn create_fs_watcher(
    root: &Path,
    sender: mpsc::Sender<notify::Result<Event>>,
) -> Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = sender.blocking_send(res);
        },
        NotifyConfig::default(),
    )
    .map_err(|e| CacheError::Watch(format!("watcher init failed: {e}")))?;
    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| CacheError::Watch(format!("failed to watch {}: {e}", root.display())))?;
    Ok(watcher)
}

fn spawn_event_loop(
    mut cache: ObjectCache,
    mut event_rx: mpsc::Receiver<notify::Result<Event>>,
    mut command_rx: mpsc::Receiver<WatcherCommand>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(event) = event_rx.recv() => {
                    for file_event in normalize(event) {
                        cache.apply_event(file_event).await;
                    }
                }
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(WatcherCommand::Shutdown) | None => {
                            // apply events already queued before stopping
                            while let Ok(event) = event_rx.try_recv() {
                                for file_event in normalize(event) {
                                    cache.apply_event(file_event).await;
                                }
                            }
                            break;
                        }
                    }
                }
            }
        }
        if let Err(e) = cache.flush().await {
            warn!("Could not flush index on shutdown: {e}");
        }
    })
}

/// Map a raw notify event onto [`FileEvent`]s.
///
/// Renames become a Deleted/Created pair: the object identifier is
/// derived from the path, so a moved file is a new object, not a move.
/// Metadata-only changes are dropped.
fn normalize(event: notify::Result<Event>) -> Vec<FileEvent> {
    let event = match event {
        Ok(event) => event,
        Err(e) => {
            warn!("Watcher error: {e}");
            return Vec::new();
        }
    };

    if let EventKind::Modify(ModifyKind::Name(RenameMode::Both)) = event.kind {
        let mut out = Vec::new();
        let mut paths = event.paths.into_iter();
        if let Some(from) = paths.next() {
            out.push(FileEvent::new(FileEventKind::Deleted, from));
        }
        if let Some(to) = paths.next() {
            out.push(FileEvent::new(FileEventKind::Created, to));
        }
        return out;
    }

    let kind = match event.kind {
        EventKind::Create(_) => Some(FileEventKind::Created),
        EventKind::Remove(_) => Some(FileEventKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(FileEventKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(FileEventKind::Created),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(FileEventKind::Modified),
        _ => None,
    };

    let Some(kind) = kind else {
        return Vec::new();
    };

    event
        .paths
        .into_iter()
        .map(|path| FileEvent::new(kind, path))
        .collect()
}
