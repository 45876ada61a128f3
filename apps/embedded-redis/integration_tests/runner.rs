use embedded_redis::error::AppError;
use embedded_redis::runner::{ensure_dir, load_config, prepare, run};

use server_core::config::{AppConfig, CONFIG_FILE_NAME};
use server_core::{ServerFamily, ServerState};

use std::path::{Path, PathBuf};
use std::time::Duration;

use serial_test::serial;
use tempfile::TempDir;

fn config_in(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, contents).unwrap();
    path
}

/// **VALUE**: Verifies that an explicit config path is honored.
#[test]
fn given_config_path_when_loaded_then_values_applied() {
    let dir = TempDir::new().unwrap();
    let path = config_in(&dir, "[server]\nkind = \"valkey\"\nstartup_timeout = \"2s\"\n");

    let config = load_config(Some(path.as_path())).unwrap();

    assert_eq!(config.server.kind, ServerFamily::Valkey);
    assert_eq!(config.startup_timeout().unwrap(), Duration::from_secs(2));
}

/// **VALUE**: Verifies that a broken config file stops the binary with a clear error.
///
/// **BUG THIS CATCHES**: Would catch a parse failure silently falling back to defaults.
#[test]
fn given_broken_config_when_loaded_then_core_error() {
    let dir = TempDir::new().unwrap();
    let path = config_in(&dir, "version = \"one\"");

    let result = load_config(Some(path.as_path()));

    assert!(matches!(result, Err(AppError::Core { .. })));
}

#[test]
fn given_nested_dir_when_ensured_then_created() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");

    ensure_dir(&nested).unwrap();

    assert!(nested.is_dir());
}

#[test]
fn given_missing_executable_when_prepared_then_core_error() {
    let mut config = AppConfig::default();
    config.server.exec = Some(PathBuf::from("/nonexistent/redis-server"));

    let result = prepare(&config);

    assert!(matches!(result, Err(AppError::Core { .. })));
}

#[cfg(unix)]
fn ready_script(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-redis-server");
    std::fs::write(
        &path,
        "#!/bin/sh\necho \"* Ready to accept connections tcp\"\nexec sleep 30\n",
    )
    .unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// **VALUE**: Verifies the binary's whole flow: config, handle, start, shutdown, stop.
///
/// **WHY THIS MATTERS**: This is what `main` does after logging is set up. If the wiring
/// between config and lifecycle breaks, the binary starts nothing or never exits.
#[cfg(unix)]
#[tokio::test]
#[serial]
async fn given_fake_server_config_when_run_with_immediate_shutdown_then_ok() {
    // GIVEN: A config pointing at a fake server
    let dir = TempDir::new().unwrap();
    let exec = ready_script(dir.path());
    let mut config = AppConfig::default();
    config.server.exec = Some(exec);

    // WHEN: Running with a shutdown that completes immediately
    let result = run(&config, async {}).await;

    // THEN: Clean exit
    assert!(result.is_ok(), "run failed: {result:?}");
}

#[cfg(unix)]
#[test]
#[serial]
fn given_fake_server_config_when_prepared_then_handle_created_with_timeout() {
    let dir = TempDir::new().unwrap();
    let exec = ready_script(dir.path());
    let mut config = AppConfig::default();
    config.server.exec = Some(exec);
    config.server.startup_timeout = String::from("3s");

    let handle = prepare(&config).unwrap();

    assert_eq!(handle.state(), ServerState::Created);
    assert_eq!(handle.startup_timeout(), Duration::from_secs(3));
    assert!(handle.port().is_some_and(|port| port > 0));
}
