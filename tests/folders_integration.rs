//! Integration tests for folder registration, trees and file access.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docbridge::folders::{FolderError, FolderService, NodeKind};
use docbridge::store::FolderStore;
use docbridge::watcher::{FileChangeEvent, WatchRegistry};
use tempfile::TempDir;
use tokio::sync::mpsc;

struct Harness {
    service: FolderService,
    _changes: mpsc::UnboundedReceiver<FileChangeEvent>,
}

async fn harness_with_deny(deny_list: Vec<PathBuf>) -> Harness {
    let (tx, rx) = mpsc::unbounded_channel();
    let store = FolderStore::open_in_memory().await.unwrap();
    let service =
        FolderService::with_deny_list(store, Arc::new(WatchRegistry::new(tx)), deny_list);
    Harness {
        service,
        _changes: rx,
    }
}

async fn harness() -> Harness {
    harness_with_deny(docbridge::folders::default_deny_list()).await
}

fn s(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_register_list_delete_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("first");
    let second = temp_dir.path().join("second");
    fs::create_dir(&first).unwrap();
    fs::create_dir(&second).unwrap();
    let h = harness().await;

    let a = h.service.register("First", &s(&first)).await.unwrap();
    let b = h.service.register("Second", &s(&second)).await.unwrap();

    let listed: Vec<i64> = h.service.list().await.unwrap().iter().map(|f| f.id).collect();
    assert_eq!(listed, vec![b.id, a.id]);
    assert_eq!(h.service.watches().folder_ids(), vec![a.id, b.id]);

    h.service.delete(a.id).await.unwrap();

    let listed: Vec<i64> = h.service.list().await.unwrap().iter().map(|f| f.id).collect();
    assert_eq!(listed, vec![b.id]);
    assert_eq!(h.service.watches().folder_ids(), vec![b.id]);
}

#[tokio::test]
async fn test_register_checks_custom_deny_list() {
    let temp_dir = TempDir::new().unwrap();
    let protected = temp_dir.path().join("protected");
    fs::create_dir(&protected).unwrap();
    let h = harness_with_deny(vec![fs::canonicalize(&protected).unwrap()]).await;

    let result = h.service.register("Nope", &s(&protected)).await;
    assert!(matches!(result, Err(FolderError::PathDenied(_))));

    let child = protected.join("child");
    fs::create_dir(&child).unwrap();
    assert!(h.service.register("Child", &s(&child)).await.is_ok());
}

#[tokio::test]
async fn test_register_validation_errors() {
    let h = harness().await;

    assert!(matches!(
        h.service.register("   ", "/tmp").await,
        Err(FolderError::Validation(_))
    ));
    assert!(matches!(
        h.service.register(&"x".repeat(101), "/tmp").await,
        Err(FolderError::Validation(_))
    ));
    assert!(matches!(
        h.service.register("Docs", "  ").await,
        Err(FolderError::Validation(_))
    ));
}

#[tokio::test]
async fn test_tree_for_registered_folder() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("book");
    fs::create_dir_all(root.join("chapters")).unwrap();
    fs::write(root.join("chapters").join("one.md"), "# One").unwrap();
    fs::write(root.join("README.md"), "# Book").unwrap();
    fs::write(root.join("cover.png"), "png").unwrap();
    let h = harness().await;
    let folder = h.service.register("Book", &s(&root)).await.unwrap();

    let tree = h.service.tree(folder.id, true).await.unwrap();
    assert_eq!(tree.id, folder.id);
    assert_eq!(tree.tree.name, "book");
    let children = tree.tree.children.as_ref().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].kind, NodeKind::Directory);
    assert_eq!(children[0].name, "chapters");
    assert_eq!(children[1].name, "README.md");

    let full = h.service.tree(folder.id, false).await.unwrap();
    assert_eq!(full.tree.children.unwrap().len(), 3);

    assert!(matches!(
        h.service.tree(999, true).await,
        Err(FolderError::NotFound(999))
    ));
}

#[tokio::test]
async fn test_read_file_only_under_registered_folders() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("docs");
    fs::create_dir(&root).unwrap();
    let inside = root.join("inside.md");
    let outside = temp_dir.path().join("outside.md");
    fs::write(&inside, "inside").unwrap();
    fs::write(&outside, "outside").unwrap();
    let h = harness().await;

    assert!(matches!(
        h.service.read_file(&s(&inside)).await,
        Err(FolderError::AccessDenied(_))
    ));

    h.service.register("Docs", &s(&root)).await.unwrap();

    assert_eq!(h.service.read_file(&s(&inside)).await.unwrap(), "inside");
    assert!(matches!(
        h.service.read_file(&s(&outside)).await,
        Err(FolderError::AccessDenied(_))
    ));
}

#[tokio::test]
async fn test_initialize_watchers_after_restart() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("docbridge.db");
    let live = temp_dir.path().join("live");
    let doomed = temp_dir.path().join("doomed");
    fs::create_dir(&live).unwrap();
    fs::create_dir(&doomed).unwrap();

    {
        let (tx, _rx) = mpsc::unbounded_channel();
        let store = FolderStore::open(&db_path).await.unwrap();
        let service = FolderService::new(store, Arc::new(WatchRegistry::new(tx)));
        service.register("Live", &s(&live)).await.unwrap();
        service.register("Doomed", &s(&doomed)).await.unwrap();
        service.watches().stop_all();
    }
    fs::remove_dir(&doomed).unwrap();

    let (tx, _rx) = mpsc::unbounded_channel();
    let store = FolderStore::open(&db_path).await.unwrap();
    let service = FolderService::new(store, Arc::new(WatchRegistry::new(tx)));

    assert_eq!(service.initialize_watchers().await.unwrap(), 1);
    assert_eq!(service.list().await.unwrap().len(), 2);
}
