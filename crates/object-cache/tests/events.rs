//! Live event handling: create/modify/delete dispatch, the dedup fast
//! path, ignore enforcement, and rename modeling.

mod common;

use common::{Notification, RecordingClient};
use grepplus_object_cache::{FileEvent, FileEventKind, ObjectCache};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

async fn project_root(dir: &TempDir) -> PathBuf {
    tokio::fs::canonicalize(dir.path()).await.unwrap()
}

async fn open_cache(root: &Path, client: Arc<RecordingClient>) -> ObjectCache {
    ObjectCache::open(root, client).await.unwrap()
}

fn created(path: &Path) -> FileEvent {
    FileEvent::new(FileEventKind::Created, path)
}

fn modified(path: &Path) -> FileEvent {
    FileEvent::new(FileEventKind::Modified, path)
}

fn deleted(path: &Path) -> FileEvent {
    FileEvent::new(FileEventKind::Deleted, path)
}

#[tokio::test]
async fn created_file_is_indexed_and_announced() {
    let dir = TempDir::new().unwrap();
    let root = project_root(&dir).await;
    let file = root.join("a.py");
    tokio::fs::write(&file, "x=1\n").await.unwrap();

    let client = RecordingClient::new();
    let mut cache = open_cache(&root, client.clone()).await;

    cache.apply_event(created(&file)).await;

    assert!(cache.index().contains(&file));
    match client.take().as_slice() {
        [Notification::Updated { path, lines }] => {
            assert_eq!(path, &file);
            assert_eq!(lines[0].code, "x=1");
            assert_eq!(lines[0].tokens[0].token_type, "NAME");
        }
        other => panic!("expected one update, got {other:?}"),
    }
}

#[tokio::test]
async fn spurious_modify_hits_the_dedup_fast_path() {
    let dir = TempDir::new().unwrap();
    let root = project_root(&dir).await;
    let file = root.join("a.py");
    tokio::fs::write(&file, "x=1\n").await.unwrap();

    let client = RecordingClient::new();
    let mut cache = open_cache(&root, client.clone()).await;
    cache.apply_event(created(&file)).await;
    client.take();

    let object_before = cache
        .store()
        .read(cache.index().get(&file).unwrap())
        .await
        .unwrap();

    // same bytes, new event (editors love these)
    cache.apply_event(modified(&file)).await;

    assert!(client.is_quiet(), "unchanged content must not notify");
    let object_after = cache
        .store()
        .read(cache.index().get(&file).unwrap())
        .await
        .unwrap();
    assert_eq!(object_before, object_after);
}

#[tokio::test]
async fn content_change_sends_delete_then_update() {
    let dir = TempDir::new().unwrap();
    let root = project_root(&dir).await;
    let file = root.join("a.py");
    tokio::fs::write(&file, "x=1\n").await.unwrap();

    let client = RecordingClient::new();
    let mut cache = open_cache(&root, client.clone()).await;
    cache.apply_event(created(&file)).await;
    client.take();

    tokio::fs::write(&file, "x=2\n").await.unwrap();
    cache.apply_event(modified(&file)).await;

    let notifications = client.take();
    assert_eq!(notifications.len(), 2);
    assert_eq!(
        notifications[0],
        Notification::Deleted { path: file.clone() }
    );
    match &notifications[1] {
        Notification::Updated { path, lines } => {
            assert_eq!(path, &file);
            assert_eq!(lines[0].code, "x=2");
        }
        other => panic!("expected update, got {other:?}"),
    }
}

#[tokio::test]
async fn modify_of_untracked_file_indexes_it() {
    let dir = TempDir::new().unwrap();
    let root = project_root(&dir).await;
    let file = root.join("late.py");
    tokio::fs::write(&file, "x=1\n").await.unwrap();

    let client = RecordingClient::new();
    let mut cache = open_cache(&root, client.clone()).await;

    // no create event was ever seen for this path
    cache.apply_event(modified(&file)).await;

    assert!(cache.index().contains(&file));
    assert_eq!(client.take().len(), 1);
}

#[tokio::test]
async fn deleted_file_drops_index_object_and_remote() {
    let dir = TempDir::new().unwrap();
    let root = project_root(&dir).await;
    let file = root.join("a.py");
    tokio::fs::write(&file, "x=1\n").await.unwrap();

    let client = RecordingClient::new();
    let mut cache = open_cache(&root, client.clone()).await;
    cache.apply_event(created(&file)).await;
    client.take();

    tokio::fs::remove_file(&file).await.unwrap();
    cache.apply_event(deleted(&file)).await;

    assert!(cache.index().is_empty());
    assert!(cache.store().list_all().await.unwrap().is_empty());
    assert_eq!(client.take(), vec![Notification::Deleted { path: file }]);
}

#[tokio::test]
async fn delete_of_unindexed_path_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let root = project_root(&dir).await;

    let client = RecordingClient::new();
    let mut cache = open_cache(&root, client.clone()).await;

    cache.apply_event(deleted(&root.join("never-seen.py"))).await;

    assert!(client.is_quiet());
    assert!(cache.index().is_empty());
}

#[tokio::test]
async fn rename_is_one_delete_and_one_update() {
    let dir = TempDir::new().unwrap();
    let root = project_root(&dir).await;
    let old = root.join("old.py");
    let new = root.join("new.py");
    tokio::fs::write(&old, "x=1\n").await.unwrap();

    let client = RecordingClient::new();
    let mut cache = open_cache(&root, client.clone()).await;
    cache.apply_event(created(&old)).await;
    client.take();

    tokio::fs::rename(&old, &new).await.unwrap();

    // the watcher surfaces a rename as a delete + create pair
    cache.apply_event(deleted(&old)).await;
    cache.apply_event(created(&new)).await;

    let notifications = client.take();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0], Notification::Deleted { path: old.clone() });
    assert!(matches!(&notifications[1], Notification::Updated { path, .. } if path == &new));

    assert!(!cache.index().contains(&old));
    assert!(cache.index().contains(&new));
    assert_eq!(cache.store().list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn ignored_and_untracked_paths_are_dropped() {
    let dir = TempDir::new().unwrap();
    let root = project_root(&dir).await;
    tokio::fs::write(root.join(".grepignore"), "scratch\n")
        .await
        .unwrap();
    tokio::fs::create_dir(root.join("scratch")).await.unwrap();

    let ignored = root.join("scratch/tmp.py");
    tokio::fs::write(&ignored, "x=1\n").await.unwrap();
    let untracked = root.join("data.csv");
    tokio::fs::write(&untracked, "1,2,3\n").await.unwrap();

    let client = RecordingClient::new();
    let mut cache = open_cache(&root, client.clone()).await;

    cache.apply_event(created(&ignored)).await;
    cache.apply_event(modified(&ignored)).await;
    cache.apply_event(created(&untracked)).await;
    cache.apply_event(deleted(&ignored)).await;

    assert!(client.is_quiet());
    assert!(cache.index().is_empty());
}

#[tokio::test]
async fn example_scenario_end_to_end() {
    let dir = TempDir::new().unwrap();
    let root = project_root(&dir).await;
    let file = root.join("a.py");
    tokio::fs::write(&file, "x=1").await.unwrap();

    let client = RecordingClient::new();

    // first run indexes it
    let mut cache = open_cache(&root, client.clone()).await;
    cache.reconcile().await.unwrap();
    assert_eq!(cache.index().len(), 1);
    let notifications = client.take();
    assert!(matches!(&notifications[..], [Notification::Updated { .. }]));

    // second run with no changes: silence
    let mut cache = open_cache(&root, client.clone()).await;
    cache.reconcile().await.unwrap();
    assert!(client.is_quiet());

    // edit: delete for the stale version, update with the new tokens
    tokio::fs::write(&file, "x=2").await.unwrap();
    cache.apply_event(modified(&file)).await;
    let notifications = client.take();
    assert_eq!(notifications.len(), 2);
    assert!(matches!(&notifications[0], Notification::Deleted { path } if path == &file));
    match &notifications[1] {
        Notification::Updated { lines, .. } => {
            assert_eq!(lines.len(), 1);
            assert_eq!(lines[0].code, "x=2");
            assert_eq!(lines[0].tokens[2].token_str, "2");
        }
        other => panic!("expected update, got {other:?}"),
    }

    // remove from disk: one delete, everything local cleaned up
    tokio::fs::remove_file(&file).await.unwrap();
    cache.apply_event(deleted(&file)).await;
    assert_eq!(client.take(), vec![Notification::Deleted { path: file }]);
    assert!(cache.index().is_empty());
    assert!(cache.store().list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn flush_survives_a_restart() {
    let dir = TempDir::new().unwrap();
    let root = project_root(&dir).await;
    let file = root.join("a.py");
    tokio::fs::write(&file, "x=1\n").await.unwrap();

    let client = RecordingClient::new();
    let mut cache = open_cache(&root, client.clone()).await;
    cache.apply_event(created(&file)).await;
    cache.flush().await.unwrap();

    let reloaded = open_cache(&root, client.clone()).await;
    assert!(reloaded.index().contains(&file));
    assert_eq!(reloaded.index().len(), 1);
}
