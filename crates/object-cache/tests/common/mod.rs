//! Shared test double for the sync client.

#![allow(dead_code)]

use async_trait::async_trait;
use grepplus_object_cache::{Delivery, SyncClient};
use grepplus_protocol::CodeLine;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One observed notification, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Updated { path: PathBuf, lines: Vec<CodeLine> },
    Deleted { path: PathBuf },
}

impl Notification {
    pub fn path(&self) -> &Path {
        match self {
            Self::Updated { path, .. } | Self::Deleted { path } => path,
        }
    }
}

/// Records every notification instead of talking to a server.
#[derive(Debug, Default)]
pub struct RecordingClient {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Drain and return everything observed so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock().unwrap())
    }

    pub fn is_quiet(&self) -> bool {
        self.notifications.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl SyncClient for RecordingClient {
    async fn notify_updated(&self, _dir: &Path, path: &Path, lines: Vec<CodeLine>) -> Delivery {
        self.notifications.lock().unwrap().push(Notification::Updated {
            path: path.to_path_buf(),
            lines,
        });
        Delivery::Delivered
    }

    async fn notify_deleted(&self, _dir: &Path, path: &Path) -> Delivery {
        self.notifications
            .lock()
            .unwrap()
            .push(Notification::Deleted {
                path: path.to_path_buf(),
            });
        Delivery::Delivered
    }
}
