use chrono::NaiveDate;
use rask_log_fanout::storage::{DatePattern, RotatingFileStore, RotationConfig, StorageError};
use std::collections::BTreeSet;
use std::path::Path;
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn names_in(dir: &Path) -> BTreeSet<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

fn touch(dir: &Path, name: &str) {
    std::fs::write(dir.join(name), "old line\n").unwrap();
}

fn config_with_limit(dir: &Path, max_files: usize) -> RotationConfig {
    RotationConfig {
        max_files,
        ..RotationConfig::new(dir)
    }
}

#[tokio::test]
async fn test_setup_keeps_newest_files() {
    let temp_dir = TempDir::new().unwrap();
    for name in ["2023-01-01.log", "2023-01-02.log", "2023-01-03.log"] {
        touch(temp_dir.path(), name);
    }

    let store = RotatingFileStore::setup_for_date(config_with_limit(temp_dir.path(), 2), date(2023, 1, 3))
        .await
        .unwrap();

    let expected: BTreeSet<String> = ["2023-01-02.log", "2023-01-03.log"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(names_in(temp_dir.path()), expected);
    assert_eq!(store.active_path(), temp_dir.path().join("2023-1-3.log"));
}

#[tokio::test]
async fn test_setup_ignores_unparseable_names() {
    let temp_dir = TempDir::new().unwrap();
    for name in [
        "2023-01-01.log",
        "2023-01-02.log",
        "notes.txt",
        "README",
        "2023-01-01.log.bak",
        "crash-2023-01-01.log",
    ] {
        touch(temp_dir.path(), name);
    }

    RotatingFileStore::setup_for_date(config_with_limit(temp_dir.path(), 1), date(2023, 1, 2))
        .await
        .unwrap();

    let names = names_in(temp_dir.path());
    assert!(!names.contains("2023-01-01.log"));
    assert!(names.contains("2023-01-02.log"));
    for untouched in ["notes.txt", "README", "2023-01-01.log.bak", "crash-2023-01-01.log"] {
        assert!(names.contains(untouched), "{untouched} should survive rotation");
    }
}

#[tokio::test]
async fn test_dated_directories_are_not_counted() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir(temp_dir.path().join("2022-12-31.log")).unwrap();
    touch(temp_dir.path(), "2023-01-01.log");

    let store = RotatingFileStore::setup_for_date(config_with_limit(temp_dir.path(), 1), date(2023, 1, 1))
        .await
        .unwrap();

    let files = store.list_dated_files().await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].date, date(2023, 1, 1));
    assert!(temp_dir.path().join("2022-12-31.log").is_dir());
}

#[tokio::test]
async fn test_setup_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    for name in ["2023-01-01.log", "2023-01-02.log", "2023-01-03.log", "2023-01-04.log"] {
        touch(temp_dir.path(), name);
    }

    let config = config_with_limit(temp_dir.path(), 2);
    RotatingFileStore::setup_for_date(config.clone(), date(2023, 1, 4))
        .await
        .unwrap();
    let after_first = names_in(temp_dir.path());

    let store = RotatingFileStore::setup_for_date(config, date(2023, 1, 4))
        .await
        .unwrap();
    assert_eq!(names_in(temp_dir.path()), after_first);

    let report = store.rotate().await.unwrap();
    assert_eq!(report.kept, 2);
    assert!(report.deleted.is_empty());
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn test_zero_max_files_deletes_every_dated_file() {
    let temp_dir = TempDir::new().unwrap();
    touch(temp_dir.path(), "2023-01-01.log");
    touch(temp_dir.path(), "2023-01-02.log");
    touch(temp_dir.path(), "keep.me");

    RotatingFileStore::setup_for_date(config_with_limit(temp_dir.path(), 0), date(2023, 1, 3))
        .await
        .unwrap();

    let expected: BTreeSet<String> = ["keep.me".to_string()].into_iter().collect();
    assert_eq!(names_in(temp_dir.path()), expected);
}

#[tokio::test]
async fn test_list_is_sorted_oldest_first() {
    let temp_dir = TempDir::new().unwrap();
    for name in ["2023-10-01.log", "2023-2-01.log", "2022-12-31.log"] {
        touch(temp_dir.path(), name);
    }

    let store = RotatingFileStore::setup_for_date(RotationConfig::new(temp_dir.path()), date(2023, 10, 1))
        .await
        .unwrap();

    let dates: Vec<NaiveDate> = store
        .list_dated_files()
        .await
        .unwrap()
        .into_iter()
        .map(|file| file.date)
        .collect();
    assert_eq!(dates, vec![date(2022, 12, 31), date(2023, 2, 1), date(2023, 10, 1)]);
}

#[tokio::test]
async fn test_setup_creates_missing_directories() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("a").join("b").join("logs");

    let store = RotatingFileStore::setup_for_date(RotationConfig::new(&nested), date(2024, 5, 6))
        .await
        .unwrap();

    assert!(nested.is_dir());
    assert!(!store.active_path().exists(), "active file is created lazily");
}

#[tokio::test]
async fn test_setup_fails_when_directory_is_a_file() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-dir");
    std::fs::write(&blocker, "x").unwrap();

    let result = RotatingFileStore::setup(RotationConfig::new(&blocker)).await;
    assert!(matches!(result, Err(StorageError::CreateDirectory { .. })));
}

#[tokio::test]
async fn test_append_creates_and_extends_active_file() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = RotatingFileStore::setup_for_date(RotationConfig::new(temp_dir.path()), date(2024, 1, 31))
        .await
        .unwrap();

    store.append_on("first\n", date(2024, 1, 31)).await.unwrap();
    store.append_on("second\n", date(2024, 1, 31)).await.unwrap();

    let content = std::fs::read_to_string(temp_dir.path().join("2024-1-31.log")).unwrap();
    assert_eq!(content, "first\nsecond\n");
}

#[tokio::test]
async fn test_append_after_directory_removed_reports_error() {
    let temp_dir = TempDir::new().unwrap();
    let log_dir = temp_dir.path().join("logs");
    let mut store = RotatingFileStore::setup_for_date(RotationConfig::new(&log_dir), date(2024, 1, 31))
        .await
        .unwrap();

    std::fs::remove_dir_all(&log_dir).unwrap();

    let result = store.append_on("lost\n", date(2024, 1, 31)).await;
    assert!(matches!(result, Err(StorageError::Append { .. })));
}

#[tokio::test]
async fn test_day_rollover_switches_file_and_rotates() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = RotatingFileStore::setup_for_date(config_with_limit(temp_dir.path(), 1), date(2024, 2, 28))
        .await
        .unwrap();

    store.append_on("monday\n", date(2024, 2, 28)).await.unwrap();
    store.append_on("tuesday\n", date(2024, 2, 29)).await.unwrap();

    assert_eq!(store.active_date(), date(2024, 2, 29));
    assert_eq!(store.active_path(), temp_dir.path().join("2024-2-29.log"));
    // Rotation runs before the new file exists, so the previous day survives
    // until the next pass.
    assert!(temp_dir.path().join("2024-2-28.log").exists());

    store.rotate().await.unwrap();
    let expected: BTreeSet<String> = ["2024-2-29.log".to_string()].into_iter().collect();
    assert_eq!(names_in(temp_dir.path()), expected);
}

#[tokio::test]
async fn test_custom_pattern_and_bare_names() {
    let temp_dir = TempDir::new().unwrap();
    touch(temp_dir.path(), "20230101");
    touch(temp_dir.path(), "20230102");
    touch(temp_dir.path(), "20230103");

    let config = RotationConfig {
        max_files: 2,
        date_pattern: DatePattern::new("yyyyMMdd").unwrap(),
        extension: None,
        ..RotationConfig::new(temp_dir.path())
    };
    let mut store = RotatingFileStore::setup_for_date(config, date(2023, 1, 4))
        .await
        .unwrap();
    store.append_on("hello\n", date(2023, 1, 4)).await.unwrap();

    let names = names_in(temp_dir.path());
    assert!(!names.contains("20230101"));
    assert!(names.contains("20230104"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_undeletable_files_are_reported_not_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("locked");
    std::fs::create_dir(&dir).unwrap();
    for name in ["2023-01-01.log", "2023-01-02.log", "2023-01-03.log"] {
        touch(&dir, name);
    }
    std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o555)).unwrap();

    // Permission bits do not bind root; nothing to observe there.
    if std::fs::write(dir.join("access-check"), "").is_ok() {
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let setup = RotatingFileStore::setup_for_date(config_with_limit(&dir, 1), date(2023, 1, 3)).await;
    let report = match &setup {
        Ok(store) => store.rotate().await,
        Err(_) => Ok(Default::default()),
    };
    std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();

    assert!(setup.is_ok());
    let report = report.unwrap();
    assert_eq!(report.kept, 1);
    assert!(report.deleted.is_empty());
    assert_eq!(report.failed.len(), 2);
    assert!(report.failed.contains(&dir.join("2023-01-01.log")));
    assert_eq!(names_in(&dir).len(), 3);
}
