//! End-to-end lifecycle tests that really spawn and signal processes, using
//! a tiny shell script as the managed server.

#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

fn portico(home: &Path, server_bin: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("portico"));
    cmd.env("NO_COLOR", "1")
        .env("PORTICO_HOME", home)
        .env("PORTICO_RUNTIME_DIR", home.join("runtime"))
        .env("PORTICO_SERVER_BIN", server_bin)
        .env_remove("PORTICO_PORT")
        .env_remove("PORTICO_HOST");
    cmd
}

/// A stand-in server: sleeps long enough to be observed, exits on SIGTERM.
fn fake_server(dir: &Path) -> PathBuf {
    let path = dir.join("fake-server.sh");
    std::fs::write(&path, "#!/bin/sh\nexec sleep 30\n").expect("write script");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod script");
    }
    path
}

/// A project directory carrying the marker, so `start` runs in dedicated
/// mode.
fn project(dir: &Path) -> PathBuf {
    let project = dir.join("proj");
    std::fs::create_dir_all(project.join(".issues")).expect("marker");
    project
}

fn free_port() -> u16 {
    std::net::TcpListener::bind(("127.0.0.1", 0))
        .expect("bind")
        .local_addr()
        .expect("addr")
        .port()
}

#[test]
#[serial]
fn test_start_list_stop_cycle() {
    let home = TempDir::new().expect("tempdir");
    let server = fake_server(home.path());
    let project = project(home.path());
    let port = free_port();

    portico(home.path(), &server)
        .current_dir(&project)
        .args(["start", "--port", &port.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Server started"))
        .stdout(predicate::str::contains(format!("http://127.0.0.1:{port}")));

    portico(home.path(), &server)
        .current_dir(&project)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("port {port}")))
        .stdout(predicate::str::contains("running"));

    portico(home.path(), &server)
        .current_dir(&project)
        .args(["stop", "--port", &port.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Server stopped"));

    portico(home.path(), &server)
        .current_dir(&project)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No registered instances"));
}

#[test]
#[serial]
fn test_global_start_is_idempotent() {
    let home = TempDir::new().expect("tempdir");
    let server = fake_server(home.path());
    // No marker anywhere: global mode.
    let cwd = home.path().join("plain");
    std::fs::create_dir_all(&cwd).expect("cwd");

    portico(home.path(), &server)
        .current_dir(&cwd)
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("Server started"));

    portico(home.path(), &server)
        .current_dir(&cwd)
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("already running"));

    portico(home.path(), &server)
        .current_dir(&cwd)
        .arg("stop")
        .assert()
        .success()
        .stdout(predicate::str::contains("Server stopped"));

    // A second stop of the default instance reports "was not running".
    portico(home.path(), &server)
        .current_dir(&cwd)
        .arg("stop")
        .assert()
        .code(2);
}

#[test]
#[serial]
fn test_stop_cleans_stale_pid_file() {
    let home = TempDir::new().expect("tempdir");
    let server = fake_server(home.path());
    let runtime = home.path().join("runtime");
    std::fs::create_dir_all(&runtime).expect("runtime");
    // i32::MAX is beyond any real pid allocation.
    std::fs::write(runtime.join("portico-7777.pid"), "2147483647\n").expect("pid");

    portico(home.path(), &server)
        .args(["stop", "--port", "7777"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stale"));

    assert!(
        !runtime.join("portico-7777.pid").exists(),
        "stale PID file removed"
    );
}

#[test]
#[serial]
fn test_restart_spawns_a_new_pid() {
    let home = TempDir::new().expect("tempdir");
    let server = fake_server(home.path());
    let project = project(home.path());
    let port = free_port();

    portico(home.path(), &server)
        .current_dir(&project)
        .args(["start", "--port", &port.to_string()])
        .assert()
        .success();
    let first_pid = std::fs::read_to_string(
        home.path().join("runtime").join(format!("portico-{port}.pid")),
    )
    .expect("pid file");

    portico(home.path(), &server)
        .current_dir(&project)
        .arg("restart")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "restarted on port {port}"
        )));
    let second_pid = std::fs::read_to_string(
        home.path().join("runtime").join(format!("portico-{port}.pid")),
    )
    .expect("pid file");
    assert_ne!(first_pid, second_pid);

    portico(home.path(), &server)
        .current_dir(&project)
        .args(["stop", "--port", &port.to_string()])
        .assert()
        .success();
}

#[test]
#[serial]
fn test_stop_all_stops_started_instances() {
    let home = TempDir::new().expect("tempdir");
    let server = fake_server(home.path());
    let project = project(home.path());
    let port = free_port();

    portico(home.path(), &server)
        .current_dir(&project)
        .args(["start", "--port", &port.to_string()])
        .assert()
        .success();

    portico(home.path(), &server)
        .current_dir(&project)
        .arg("stop-all")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stopped: 1, Failed: 0"));

    portico(home.path(), &server)
        .current_dir(&project)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("stopped"));
}
