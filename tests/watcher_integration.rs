//! Integration tests for folder watching against the real filesystem.

use std::path::Path;
use std::time::Duration;

use docbridge::watcher::{ChangeKind, FileChangeEvent, PathFilter, WatchOptions, WatchRegistry};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Temp dir without a leading dot, so its contents are not treated as hidden.
fn visible_temp_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("docbridge-")
        .tempdir()
        .expect("Failed to create temp dir")
}

type Changes = mpsc::UnboundedReceiver<FileChangeEvent>;

fn registry_with(options: WatchOptions) -> (WatchRegistry, Changes) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        WatchRegistry::with_options(tx, PathFilter::default(), options),
        rx,
    )
}

fn registry() -> (WatchRegistry, Changes) {
    registry_with(WatchOptions::default())
}

fn watch_or_skip(registry: &WatchRegistry, id: i64, path: &Path) -> bool {
    let added = registry.add_folder(id, path);
    if !added {
        eprintln!("Skipping test: could not start a watcher for {}", path.display());
    }
    added
}

async fn next_event(rx: &mut Changes) -> Option<FileChangeEvent> {
    timeout(Duration::from_secs(5), rx.recv()).await.ok().flatten()
}

async fn assert_quiet(rx: &mut Changes, wait: Duration) {
    if let Ok(Some(event)) = timeout(wait, rx.recv()).await {
        panic!("Unexpected event: {event:?}");
    }
}

/// Let the native backend settle before the first write.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_new_markdown_file_emits_created() {
    let temp_dir = visible_temp_dir();
    let (registry, mut rx) = registry();
    if !watch_or_skip(&registry, 1, temp_dir.path()) {
        return;
    }
    settle().await;

    let file = temp_dir.path().join("notes.md");
    std::fs::write(&file, "# Notes").unwrap();

    let event = next_event(&mut rx).await.expect("No event received");
    assert_eq!(event.folder_id, 1);
    assert_eq!(event.path, file.to_string_lossy());
    assert!(matches!(event.event, ChangeKind::Created | ChangeKind::Modified));

    registry.stop_all();
}

#[tokio::test]
async fn test_burst_of_writes_coalesces_to_one_event() {
    let temp_dir = visible_temp_dir();
    let file = temp_dir.path().join("draft.md");
    std::fs::write(&file, "v0").unwrap();

    let (registry, mut rx) = registry();
    if !watch_or_skip(&registry, 7, temp_dir.path()) {
        return;
    }
    settle().await;

    for i in 1..=5 {
        std::fs::write(&file, format!("v{i}")).unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
    }

    let event = next_event(&mut rx).await.expect("No event received");
    assert_eq!(event.path, file.to_string_lossy());
    assert_eq!(event.event, ChangeKind::Modified);

    assert_quiet(&mut rx, Duration::from_millis(800)).await;
    registry.stop_all();
}

#[tokio::test]
async fn test_deleting_file_emits_deleted() {
    let temp_dir = visible_temp_dir();
    let file = temp_dir.path().join("old.md");
    std::fs::write(&file, "bye").unwrap();

    let (registry, mut rx) = registry();
    if !watch_or_skip(&registry, 2, temp_dir.path()) {
        return;
    }
    settle().await;

    std::fs::remove_file(&file).unwrap();

    let event = next_event(&mut rx).await.expect("No event received");
    assert_eq!(event.event, ChangeKind::Deleted);
    assert_eq!(event.path, file.to_string_lossy());

    registry.stop_all();
}

#[tokio::test]
async fn test_irrelevant_files_are_filtered() {
    let temp_dir = visible_temp_dir();
    let ignored = temp_dir.path().join("node_modules");
    let hidden = temp_dir.path().join(".cache");
    std::fs::create_dir(&ignored).unwrap();
    std::fs::create_dir(&hidden).unwrap();

    let (registry, mut rx) = registry();
    if !watch_or_skip(&registry, 3, temp_dir.path()) {
        return;
    }
    settle().await;

    std::fs::write(temp_dir.path().join("image.png"), "x").unwrap();
    std::fs::write(temp_dir.path().join(".secret.md"), "x").unwrap();
    std::fs::write(ignored.join("readme.md"), "x").unwrap();
    std::fs::write(hidden.join("notes.md"), "x").unwrap();
    std::fs::create_dir(temp_dir.path().join("chapter")).unwrap();

    assert_quiet(&mut rx, Duration::from_millis(800)).await;

    let file = temp_dir.path().join("visible.md");
    std::fs::write(&file, "x").unwrap();
    let event = next_event(&mut rx).await.expect("No event received");
    assert_eq!(event.path, file.to_string_lossy());

    registry.stop_all();
}

#[tokio::test]
async fn test_nested_file_reported_with_absolute_path() {
    let temp_dir = visible_temp_dir();
    let nested = temp_dir.path().join("guide").join("part1");
    std::fs::create_dir_all(&nested).unwrap();

    let (registry, mut rx) = registry();
    if !watch_or_skip(&registry, 4, temp_dir.path()) {
        return;
    }
    settle().await;

    let file = nested.join("intro.md");
    std::fs::write(&file, "# Intro").unwrap();

    let event = next_event(&mut rx).await.expect("No event received");
    assert_eq!(event.path, file.to_string_lossy());
    assert_eq!(event.folder_id, 4);

    registry.stop_all();
}

#[tokio::test]
async fn test_removed_folder_emits_nothing() {
    let temp_dir = visible_temp_dir();
    let (registry, mut rx) = registry();
    if !watch_or_skip(&registry, 5, temp_dir.path()) {
        return;
    }
    settle().await;

    std::fs::write(temp_dir.path().join("pending.md"), "x").unwrap();
    assert!(registry.remove_folder(5));

    std::fs::write(temp_dir.path().join("after.md"), "x").unwrap();
    assert_quiet(&mut rx, Duration::from_millis(800)).await;
}

#[tokio::test]
async fn test_re_added_folder_resumes_events() {
    let temp_dir = visible_temp_dir();
    let (registry, mut rx) = registry();
    if !watch_or_skip(&registry, 6, temp_dir.path()) {
        return;
    }
    settle().await;

    // Leave a change pending on the first watch, then replace it inside the window.
    std::fs::write(temp_dir.path().join("before.md"), "x").unwrap();
    settle().await;
    assert!(registry.remove_folder(6));
    assert!(registry.add_folder(6, temp_dir.path()));
    settle().await;

    let file = temp_dir.path().join("back.md");
    std::fs::write(&file, "x").unwrap();

    let event = next_event(&mut rx).await.expect("No event received");
    assert_eq!(event.folder_id, 6);
    assert_eq!(event.path, file.to_string_lossy());
    assert_quiet(&mut rx, Duration::from_millis(800)).await;

    registry.stop_all();
}

#[tokio::test]
async fn test_two_folders_are_tagged_independently() {
    let first = visible_temp_dir();
    let second = visible_temp_dir();
    let (registry, mut rx) = registry();
    if !watch_or_skip(&registry, 10, first.path()) || !watch_or_skip(&registry, 20, second.path())
    {
        return;
    }
    settle().await;

    std::fs::write(first.path().join("a.md"), "x").unwrap();
    std::fs::write(second.path().join("b.md"), "x").unwrap();

    let mut seen = vec![
        next_event(&mut rx).await.expect("No event received"),
        next_event(&mut rx).await.expect("No event received"),
    ];
    seen.sort_by_key(|e| e.folder_id);

    assert_eq!(seen[0].folder_id, 10);
    assert!(seen[0].path.ends_with("a.md"));
    assert_eq!(seen[1].folder_id, 20);
    assert!(seen[1].path.ends_with("b.md"));

    registry.stop_all();
}

#[tokio::test]
async fn test_polling_backend_detects_changes() {
    let temp_dir = visible_temp_dir();
    let (registry, mut rx) = registry_with(WatchOptions {
        use_polling: true,
        poll_interval: Duration::from_millis(100),
        ..WatchOptions::default()
    });
    if !watch_or_skip(&registry, 8, temp_dir.path()) {
        return;
    }
    tokio::time::sleep(Duration::from_millis(250)).await;

    let file = temp_dir.path().join("polled.md");
    std::fs::write(&file, "x").unwrap();

    let event = next_event(&mut rx).await.expect("No event received");
    assert_eq!(event.event, ChangeKind::Created);
    assert_eq!(event.path, file.to_string_lossy());

    registry.stop_all();
}
