//! Cross-component scenarios exercising the services against a real
//! temp-dir registry and PID files, with mocked process control.

#![allow(clippy::expect_used)]

use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use portico_cli::application::ports::ProcessProbe;
use portico_cli::application::services::fleet;
use portico_cli::application::services::lifecycle::{
    self, StartOutcome, StartRequest, StopOutcome,
};
use portico_cli::domain::{Instance, Settings};
use portico_cli::infra::daemon::DaemonController;
use portico_cli::infra::registry::InstanceRegistry;
use portico_cli::infra::runtime_dir::RuntimeDirResolver;

use crate::mocks::{FakeProbe, FixedScanner, RecordingSpawner};

struct World {
    _dir: TempDir,
    controller: DaemonController,
    registry: InstanceRegistry,
    resolver: RuntimeDirResolver,
    settings: Settings,
}

fn world() -> World {
    let dir = TempDir::new().expect("tempdir");
    let runtime = dir.path().join("runtime");
    std::fs::create_dir_all(&runtime).expect("runtime dir");
    World {
        controller: DaemonController::new(runtime.clone()),
        registry: InstanceRegistry::with_path(dir.path().join("instances.json")),
        resolver: RuntimeDirResolver::new(Some(runtime), None),
        settings: Settings {
            default_port: 3000,
            host: "127.0.0.1".to_string(),
            server_bin: PathBuf::from("portico-server"),
            discover_roots: Vec::new(),
        },
        _dir: dir,
    }
}

fn dedicated(workspace: &str) -> StartRequest {
    StartRequest {
        workspace: PathBuf::from(workspace),
        explicit_port: None,
        debug: false,
        dedicated: true,
    }
}

/// Registry holds one live and one dead instance: `list` annotates them,
/// `stop-all` terminates only the live one.
#[tokio::test]
async fn mixed_fleet_is_listed_and_stopped_correctly() {
    let w = world();
    w.registry
        .register(Instance::new(PathBuf::from("/p1"), 4000, 11))
        .expect("register");
    w.registry
        .register(Instance::new(PathBuf::from("/p2"), 4001, 22))
        .expect("register");
    let probe = FakeProbe::cooperative(&[11]); // 22 is dead

    let snapshot = fleet::list_instances(&probe, &w.controller, &w.registry);
    let running: Vec<u16> = snapshot
        .entries
        .iter()
        .filter(|e| e.running)
        .map(|e| e.instance.port)
        .collect();
    assert_eq!(running, vec![4000]);

    let tally = fleet::stop_all(&probe, &w.registry, &w.resolver, Duration::from_secs(1))
        .await
        .expect("stop-all");
    assert_eq!(tally.succeeded, 1);
    assert_eq!(tally.failed, 0);
    assert!(!probe.is_running(11));
}

/// Stopping a port that has no PID file and no registry entry is a clean
/// no-op, not an error.
#[tokio::test]
async fn stopping_an_unknown_port_succeeds() {
    let w = world();
    let probe = FakeProbe::cooperative(&[]);

    let outcome = lifecycle::stop_instance(
        &probe,
        &w.controller,
        &w.registry,
        Some(5000),
        5000,
        Duration::from_secs(1),
    )
    .await
    .expect("stop");
    assert_eq!(outcome, StopOutcome::NotRunning);
}

/// With the default port occupied, a dedicated start lands on the next free
/// port and registers the invoking workspace there.
#[tokio::test]
async fn dedicated_start_beside_a_busy_default_picks_next_port() {
    let w = world();
    let probe = FakeProbe::cooperative(&[]);
    let spawner = RecordingSpawner::new(500);

    let outcome = lifecycle::start_instance(
        &probe,
        &spawner,
        &FixedScanner::with_busy(&[3000]),
        &w.controller,
        &w.registry,
        &w.settings,
        &dedicated("/proj"),
    )
    .await
    .expect("start");
    assert_eq!(outcome, StartOutcome::Started { port: 3001, pid: 500 });

    let records = w.registry.read();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].workspace, PathBuf::from("/proj"));
    assert_eq!(records[0].port, 3001);
    assert_eq!(records[0].pid, 500);

    let requests = spawner.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].program, PathBuf::from("portico-server"));
    assert!(
        requests[0]
            .env
            .contains(&("PORT".to_string(), "3001".to_string())),
        "selected port is handed to the server"
    );
    assert!(requests[0].log_path.ends_with("portico-3001.log"));
}

/// A workspace with a dead orphaned record gets its old port back instead of
/// a freshly scanned one.
#[tokio::test]
async fn dedicated_start_reuses_orphaned_port() {
    let w = world();
    w.registry
        .register(Instance::new(PathBuf::from("/proj"), 3005, 42))
        .expect("register");
    w.controller.write_pid(42, Some(3005)).expect("pid");
    let probe = FakeProbe::cooperative(&[]); // 42 died without cleanup
    let spawner = RecordingSpawner::new(500);

    let outcome = lifecycle::start_instance(
        &probe,
        &spawner,
        &FixedScanner::all_free(),
        &w.controller,
        &w.registry,
        &w.settings,
        &dedicated("/proj"),
    )
    .await
    .expect("start");
    assert_eq!(outcome, StartOutcome::Started { port: 3005, pid: 500 });

    let records = w.registry.read();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].pid, 500, "orphan replaced in place");
}

/// Starting twice in the same workspace replaces the first instance rather
/// than leaking a second process on another port.
#[tokio::test]
async fn double_start_replaces_rather_than_duplicates() {
    let w = world();
    let probe = FakeProbe::cooperative(&[]);
    let spawner = RecordingSpawner::new(500);
    let scanner = FixedScanner::all_free();

    let first = lifecycle::start_instance(
        &probe,
        &spawner,
        &scanner,
        &w.controller,
        &w.registry,
        &w.settings,
        &dedicated("/proj"),
    )
    .await
    .expect("first start");
    let StartOutcome::Started { port, pid } = first else {
        panic!("expected a spawn");
    };

    // The first instance is now "running"; start again.
    let probe = FakeProbe::cooperative(&[i32::try_from(pid).expect("pid")]);
    let second = lifecycle::start_instance(
        &probe,
        &spawner,
        &scanner,
        &w.controller,
        &w.registry,
        &w.settings,
        &dedicated("/proj"),
    )
    .await
    .expect("second start");
    assert_eq!(second, StartOutcome::Started { port, pid: 501 });
    assert_eq!(w.registry.read().len(), 1, "still exactly one record");
}

/// stop-all then restart-all brings every instance back on its old port.
#[tokio::test]
async fn fleet_round_trip_preserves_ports() {
    let w = world();
    w.registry
        .register(Instance::new(PathBuf::from("/p1"), 4000, 11))
        .expect("register");
    w.registry
        .register(Instance::new(PathBuf::from("/p2"), 4001, 22))
        .expect("register");
    let probe = FakeProbe::cooperative(&[11, 22]);

    fleet::stop_all(&probe, &w.registry, &w.resolver, Duration::from_secs(1))
        .await
        .expect("stop-all");
    let stopped = w.registry.read();
    assert_eq!(stopped.len(), 2);
    assert!(stopped.iter().all(Instance::is_stopped));

    let spawner = RecordingSpawner::new(100);
    let tally = fleet::restart_all(
        &probe,
        &spawner,
        &w.registry,
        &w.resolver,
        &w.settings,
        Duration::from_secs(1),
    )
    .await
    .expect("restart-all");
    assert_eq!(tally.succeeded, 2);

    let mut ports: Vec<u16> = w.registry.read().iter().map(|r| r.port).collect();
    ports.sort_unstable();
    assert_eq!(ports, vec![4000, 4001]);
    assert!(w.registry.read().iter().all(|r| !r.is_stopped()));
}

/// Restarting an explicit port while the default instance is alive must
/// respawn on that port, leave the default alone, and keep the stop/start
/// legs on the same port-scoped PID file.
#[tokio::test]
async fn explicit_port_restart_respawns_beside_live_default() {
    let w = world();
    w.controller.write_pid(11, None).expect("default pid");
    w.controller.write_pid(42, Some(5000)).expect("port pid");
    let probe = FakeProbe::cooperative(&[11, 42]);
    let spawner = RecordingSpawner::new(7);

    let stopped = lifecycle::stop_instance(
        &probe,
        &w.controller,
        &w.registry,
        Some(5000),
        5000,
        Duration::from_secs(1),
    )
    .await
    .expect("stop leg");
    assert_eq!(stopped, StopOutcome::Stopped { pid: 42 });

    let started = lifecycle::start_instance(
        &probe,
        &spawner,
        &FixedScanner::all_free(),
        &w.controller,
        &w.registry,
        &w.settings,
        &StartRequest {
            workspace: PathBuf::from("/proj"),
            explicit_port: Some(5000),
            debug: false,
            dedicated: false,
        },
    )
    .await
    .expect("start leg");
    assert_eq!(started, StartOutcome::Started { port: 5000, pid: 7 });
    assert_eq!(spawner.spawn_count(), 1, "a fresh process was spawned");
    assert!(probe.is_running(11), "default instance untouched");
    assert_eq!(w.controller.read_pid(None), Some(11));
    assert_eq!(w.controller.read_pid(Some(5000)), Some(7));
}

/// A stuck process leaves stop state intact; a second stop after the
/// process finally dies cleans up.
#[tokio::test]
async fn stop_retry_after_timeout_heals_state() {
    let w = world();
    w.controller.write_pid(42, Some(3005)).expect("pid");
    w.registry
        .register(Instance::new(PathBuf::from("/proj"), 3005, 42))
        .expect("register");

    let stuck = FakeProbe::immortal(&[42]);
    let outcome = lifecycle::stop_instance(
        &stuck,
        &w.controller,
        &w.registry,
        Some(3005),
        3005,
        Duration::ZERO,
    )
    .await
    .expect("stop");
    assert_eq!(outcome, StopOutcome::TimedOut { pid: 42 });
    assert_eq!(w.registry.read().len(), 1);

    // The process eventually died on its own; retry.
    let gone = FakeProbe::cooperative(&[]);
    let outcome = lifecycle::stop_instance(
        &gone,
        &w.controller,
        &w.registry,
        Some(3005),
        3005,
        Duration::ZERO,
    )
    .await
    .expect("retry");
    assert_eq!(outcome, StopOutcome::StaleCleaned);
    assert!(w.registry.read().is_empty());
    assert_eq!(w.controller.read_pid(Some(3005)), None);
}
