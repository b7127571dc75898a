//! Tests for cleanup
//!

use std::fs;

use backup_orchestrator::{
    Context,
    cleanup::{DatedFolder, cleanup, dated_folders, expired, remove_folders},
};
use common::{create_dated_folders, subdirectories};
use filetime::{FileTime, set_file_mtime};
use tempfile::TempDir;

mod common;

#[test]
fn removes_oldest_beyond_keep() {
    let root = TempDir::new().unwrap();
    let month = root.path().join("app").join("2024").join("03");
    create_dated_folders(
        &month,
        &[
            "01-02-00-00",
            "02-02-00-00",
            "03-02-00-00",
            "04-02-00-00",
            "05-02-00-00",
            "06-02-00-00",
            "07-02-00-00",
        ],
    );

    let mut context = Context::default();
    let cleaned = cleanup(&mut context, &month, 5).unwrap();

    assert_eq!(cleaned.removed.len(), 2);
    assert!(cleaned.failed.is_empty());
    assert_eq!(
        subdirectories(&month),
        [
            "03-02-00-00",
            "04-02-00-00",
            "05-02-00-00",
            "06-02-00-00",
            "07-02-00-00"
        ]
    );
}

#[test]
fn keeps_most_recently_modified_not_highest_name() {
    let root = TempDir::new().unwrap();
    // Names sort the other way round to their modified times.
    create_dated_folders(root.path(), &["c", "b", "a"]);

    let mut context = Context::default();
    cleanup(&mut context, root.path(), 1).unwrap();

    assert_eq!(subdirectories(root.path()), ["a"]);
}

#[test]
fn keep_at_least_count_removes_nothing() {
    let root = TempDir::new().unwrap();
    create_dated_folders(root.path(), &["01", "02", "03"]);

    let mut context = Context::default();

    let cleaned = cleanup(&mut context, root.path(), 3).unwrap();
    assert!(cleaned.removed.is_empty());

    let cleaned = cleanup(&mut context, root.path(), 10).unwrap();
    assert!(cleaned.removed.is_empty());

    assert_eq!(subdirectories(root.path()), ["01", "02", "03"]);
}

#[test]
fn keep_zero_removes_everything() {
    let root = TempDir::new().unwrap();
    create_dated_folders(root.path(), &["01", "02", "03"]);

    let mut context = Context::default();
    let cleaned = cleanup(&mut context, root.path(), 0).unwrap();

    assert_eq!(cleaned.removed.len(), 3);
    assert!(subdirectories(root.path()).is_empty());
}

#[test]
fn missing_directory_is_empty() {
    let root = TempDir::new().unwrap();
    let missing = root.path().join("missing");

    let mut context = Context::default();
    let cleaned = cleanup(&mut context, &missing, 0).unwrap();

    assert!(cleaned.removed.is_empty());
    assert!(!missing.exists());
}

#[test]
fn files_are_not_candidates() {
    let root = TempDir::new().unwrap();
    create_dated_folders(root.path(), &["01", "02"]);
    let stray = root.path().join("notes.txt");
    fs::write(&stray, "not a backup").unwrap();
    set_file_mtime(&stray, FileTime::from_unix_time(1_000, 0)).unwrap();

    let mut context = Context::default();
    cleanup(&mut context, root.path(), 1).unwrap();

    assert!(stray.exists());
    assert_eq!(subdirectories(root.path()), ["02"]);
}

#[test]
fn equal_modified_times_keep_count() {
    // Ties are ordered stably but the order is not part of the contract, only the count is.
    let root = TempDir::new().unwrap();
    let folders = create_dated_folders(root.path(), &["x", "y", "z"]);
    for folder in &folders {
        set_file_mtime(folder, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();
    }

    let mut context = Context::default();
    cleanup(&mut context, root.path(), 2).unwrap();

    assert_eq!(subdirectories(root.path()).len(), 2);
}

#[test]
fn dated_folders_oldest_first() {
    let root = TempDir::new().unwrap();
    create_dated_folders(root.path(), &["b", "c", "a"]);

    let context = Context::default();
    let folders = dated_folders(&context, root.path()).unwrap();

    let names: Vec<_> = folders
        .iter()
        .map(|folder| folder.path.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, ["b", "c", "a"]);
}

#[test]
fn expired_is_oldest_prefix() {
    let root = TempDir::new().unwrap();
    let paths = create_dated_folders(root.path(), &["1", "2", "3", "4"]);

    let context = Context::default();
    let folders = dated_folders(&context, root.path()).unwrap();

    let stale = expired(folders.clone(), 1);
    let stale_paths: Vec<_> = stale.iter().map(|folder| folder.path.clone()).collect();
    assert_eq!(stale_paths, paths[..3]);

    assert!(expired(folders, 4).is_empty());
}

#[test]
fn failed_removal_does_not_stop_others() {
    let root = TempDir::new().unwrap();
    let paths = create_dated_folders(root.path(), &["1", "2"]);

    let context = Context::default();
    let mut folders = dated_folders(&context, root.path()).unwrap();
    // A folder that has already vanished cannot be removed.
    folders.insert(
        0,
        DatedFolder {
            path: root.path().join("vanished"),
            modified: folders[0].modified,
        },
    );

    let cleaned = remove_folders(&context, &folders);

    assert_eq!(cleaned.failed.len(), 1);
    assert_eq!(cleaned.failed[0].0, root.path().join("vanished"));
    assert_eq!(cleaned.removed, paths);
    assert!(subdirectories(root.path()).is_empty());
}
