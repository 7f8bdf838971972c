use serial_test::serial;
use tempfile::tempdir;

use super::*;

fn clear_env() {
    for var in ["YAWL_STATE_DIR", "YAWL_HTTP_ADDR", "YAWL_AUTH_TOKEN", "YAWL_EXCEPTION_HANDLER_URL"] {
        std::env::remove_var(var);
    }
}

#[tokio::test]
#[serial]
async fn start_fails_with_bind_failure_exit_code_when_port_already_bound() {
    clear_env();
    let dir = tempdir().unwrap();
    let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = blocker.local_addr().unwrap();

    std::env::set_var("YAWL_STATE_DIR", dir.path());
    std::env::set_var("YAWL_HTTP_ADDR", addr.to_string());

    let err = start().await.expect_err("bind should fail, port already held");
    assert_eq!(err.code, 3);

    clear_env();
}
