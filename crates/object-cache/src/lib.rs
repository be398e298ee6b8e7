//! # grep++ Object Cache
//!
//! File-synchronization core of the grep++ version controller: keeps a
//! persisted index of a project's source files consistent with the live
//! filesystem and streams tokenized updates to the remote indexing
//! service.
//!
//! ## Pipeline
//!
//! ```text
//! Project directory
//!     │
//!     ├──> ObjectCache::reconcile (once at startup)
//!     │      ├─ orphan sweep
//!     │      ├─ revalidate indexed entries
//!     │      └─ discover new files
//!     │
//!     └──> ChangeWatcher (live notify events)
//!            └─ Created / Modified / Deleted
//!
//! Both funnel into one indexing operation that updates the
//! ObjectStore + ObjectIndex and notifies the SyncClient.
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use grepplus_object_cache::{ChangeWatcher, HttpSyncClient, ObjectCache, DEFAULT_SERVER_URL};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> grepplus_object_cache::Result<()> {
//!     let sync = Arc::new(HttpSyncClient::new(DEFAULT_SERVER_URL)?);
//!     let mut cache = ObjectCache::open("/path/to/project", sync).await?;
//!
//!     cache.reconcile().await?;
//!     let handle = ChangeWatcher::start(cache)?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     handle.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod cache;
mod error;
mod fingerprint;
mod ignore;
mod index;
mod store;
mod sync;
mod watcher;

pub use cache::{
    IndexOutcome, ObjectCache, ReconcileStats, CACHE_DIR_NAME, INDEX_FILE_NAME,
    OBJECTS_DIR_NAME, OBJECT_CACHE_DIR_NAME,
};
pub use error::{CacheError, Result};
pub use fingerprint::{object_id, ContentFingerprint};
pub use ignore::{IgnorePolicy, IGNORE_FILE_NAME};
pub use index::ObjectIndex;
pub use store::{FileRecord, ObjectStore};
pub use sync::{Delivery, HttpSyncClient, SyncClient, DEFAULT_SERVER_URL};
pub use watcher::{ChangeWatcher, FileEvent, FileEventKind, WatcherHandle};
