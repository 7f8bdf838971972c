use tempfile::tempdir;

use super::*;

#[test]
fn missing_lock_file_yields_no_pid() {
    let dir = tempdir().unwrap();
    assert!(read_pid(&dir.path().join("daemon.lock")).is_none());
}

#[test]
fn lock_file_pid_is_parsed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("daemon.lock");
    std::fs::write(&path, b"4242\n").unwrap();
    assert_eq!(read_pid(&path), Some(4242));
}

#[cfg(unix)]
#[test]
fn signalling_a_nonexistent_pid_is_an_error() {
    // pid 1 exists but belongs to init; a very large unused pid is a safer
    // bet for "definitely not our process".
    let err = send_sigterm(999_999).unwrap_err();
    assert_eq!(err.code, 1);
}
