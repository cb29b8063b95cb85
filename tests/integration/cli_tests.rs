//! Integration tests for the share-manifest binary
//!
//! These run the built executable and check exit codes and log output.

use std::process::{Command, Stdio};

const SNOWFLAKE_ENV: &[&str] = &[
    "SNOWFLAKE_ACCOUNT",
    "SNOWFLAKE_HOST",
    "SNOWFLAKE_USER",
    "SNOWFLAKE_PASSWORD",
    "SNOWFLAKE_PRIVATE_KEY_PATH",
    "SNOWFLAKE_PRIVATE_KEY_PASSPHRASE",
    "SNOWFLAKE_AUTHENTICATOR",
    "SNOWFLAKE_WAREHOUSE",
    "SNOWFLAKE_DATABASE",
    "SNOWFLAKE_SCHEMA",
    "SNOWFLAKE_ROLE",
];

/// The binary with a clean environment apart from what a test sets.
fn share_manifest() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_share-manifest"));
    for var in SNOWFLAKE_ENV {
        command.env_remove(var);
    }
    command.env("RUST_LOG", "info");
    command
}

#[test]
fn test_missing_credentials_exit_code() {
    let output = share_manifest()
        .args(["--account", "xy12345", "--user", "analyst", "--share", "MY_SHARE"])
        .output()
        .expect("Failed to run share-manifest");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Manifest generation failed"), "stderr: {}", stderr);
    assert!(output.stdout.is_empty());
}

#[test]
fn test_unsupported_authenticator_exit_code() {
    let output = share_manifest()
        .args([
            "--account",
            "xy12345",
            "--user",
            "analyst",
            "--password",
            "secret",
            "--share",
            "MY_SHARE",
            "--authenticator",
            "externalbrowser",
        ])
        .output()
        .expect("Failed to run share-manifest");

    assert_eq!(output.status.code(), Some(1));
}

// ============================================================================
// Interrupts
// ============================================================================

#[cfg(unix)]
#[test]
fn test_interrupt_exits_with_failure() {
    use std::io::ErrorKind;
    use std::net::TcpListener;
    use std::thread;
    use std::time::{Duration, Instant};

    // A proxy that accepts the login connection and never answers keeps
    // the binary waiting inside the session login.
    let proxy = TcpListener::bind("127.0.0.1:0").unwrap();
    proxy.set_nonblocking(true).unwrap();
    let proxy_url = format!("http://{}", proxy.local_addr().unwrap());

    let mut child = share_manifest()
        .args([
            "--account",
            "xy12345",
            "--user",
            "analyst",
            "--password",
            "secret",
            "--share",
            "MY_SHARE",
        ])
        .env("HTTPS_PROXY", &proxy_url)
        .env("https_proxy", &proxy_url)
        .env_remove("NO_PROXY")
        .env_remove("no_proxy")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start share-manifest");

    let deadline = Instant::now() + Duration::from_secs(30);
    let _stalled = loop {
        match proxy.accept() {
            Ok((stream, _)) => break stream,
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                if let Some(status) = child.try_wait().unwrap() {
                    panic!("share-manifest exited before logging in: {}", status);
                }
                assert!(Instant::now() < deadline, "Login never reached the proxy");
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => panic!("Proxy accept failed: {}", e),
        }
    };

    let signalled = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("Failed to run kill");
    assert!(signalled.success());

    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Manifest generation interrupted by user"),
        "stderr: {}",
        stderr
    );
    assert!(output.stdout.is_empty());
}
