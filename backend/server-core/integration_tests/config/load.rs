use server_core::ServerFamily;
use server_core::config::{AppConfig, CONFIG_FILE_NAME};
use server_core::connection::ClientDriver;
use server_core::error::config::ConfigError;

use std::time::Duration;

use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) {
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), contents).unwrap();
}

/// **VALUE**: Verifies that a missing config file yields defaults rather than an error.
///
/// **WHY THIS MATTERS**: First runs have no config file. Failing there would force users
/// to write boilerplate before anything works.
#[test]
fn given_empty_dir_when_loaded_then_defaults_returned() {
    let dir = TempDir::new().unwrap();

    let config = AppConfig::load(dir.path()).unwrap();

    assert_eq!(config.server.kind, ServerFamily::Redis);
    assert_eq!(config.server.port, None);
}

/// **VALUE**: Verifies that every supported key is read from TOML.
///
/// **BUG THIS CATCHES**: Would catch serde renames drifting from the documented keys.
#[test]
fn given_full_toml_when_loaded_then_all_values_applied() {
    // GIVEN: A config with every key set
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        r#"
version = 1

[server]
kind = "valkey"
port = 6400
startup_timeout = "1m 30s"

[client]
driver = "dedicated"
"#,
    );

    // WHEN: Loading
    let config = AppConfig::load(dir.path()).unwrap();

    // THEN: Values applied
    assert_eq!(config.server.kind, ServerFamily::Valkey);
    assert_eq!(config.server.port, Some(6400));
    assert_eq!(config.startup_timeout().unwrap(), Duration::from_secs(90));
    assert_eq!(config.client.driver, ClientDriver::Dedicated);
    assert_eq!(config.properties().unwrap().port(), Some(6400));
}

/// **VALUE**: Verifies that malformed TOML is reported, not replaced by defaults.
///
/// **BUG THIS CATCHES**: Would catch parse errors being swallowed, which silently runs the
/// server with settings the user did not ask for.
#[test]
fn given_malformed_toml_when_loaded_then_returns_parse_error() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[server\nport = ");

    let result = AppConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

#[test]
fn given_invalid_timeout_when_loaded_then_returns_validation_error() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[server]\nstartup_timeout = \"soon\"\n");

    let result = AppConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

/// **VALUE**: Verifies that an executable path that does not exist is rejected at load.
#[test]
fn given_missing_exec_when_loaded_then_returns_validation_error() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[server]\nexec = \"/nonexistent/redis-server\"\n");

    let result = AppConfig::load(dir.path());

    match result {
        Err(ConfigError::ValidationError { reason, .. }) => {
            assert!(reason.contains("/nonexistent/redis-server"));
        }
        other => panic!("Expected validation error, got {other:?}"),
    }
}

#[test]
fn given_port_above_range_when_loaded_then_returns_validation_error() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[server]\nport = 70000\n");

    let result = AppConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}
