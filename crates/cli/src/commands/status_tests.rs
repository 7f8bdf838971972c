use tempfile::tempdir;

use super::*;

#[test]
fn no_lock_file_reports_not_running() {
    let dir = tempdir().unwrap();
    assert!(running_pid(&dir.path().join("daemon.lock")).is_none());
}

#[test]
fn unlocked_lock_file_reports_not_running() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("daemon.lock");
    std::fs::write(&path, b"12345\n").unwrap();
    assert!(running_pid(&path).is_none());
}

#[test]
fn held_lock_file_reports_the_recorded_pid() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("daemon.lock");
    let file = std::fs::OpenOptions::new().create(true).write(true).truncate(true).open(&path).unwrap();
    file.try_lock_exclusive().unwrap();
    std::fs::write(&path, b"777\n").unwrap();

    assert_eq!(running_pid(&path), Some(777));

    drop(file);
}
