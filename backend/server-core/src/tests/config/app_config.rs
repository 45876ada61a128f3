use crate::config::{AppConfig, CONFIG_FILE_NAME, default_config_dir};
use crate::connection::ClientDriver;
use crate::server::kind::ServerFamily;

use std::time::Duration;

/// **VALUE**: Verifies the defaults used when no config file exists.
///
/// **BUG THIS CATCHES**: Would catch a default that fails its own validation, which would
/// make a fresh install refuse to start.
#[test]
fn given_default_config_then_validates_with_expected_values() {
    // GIVEN: Defaults
    let config = AppConfig::default();

    // WHEN/THEN: Valid, with the documented defaults
    assert!(config.validate().is_ok());
    assert_eq!(config.version, 1);
    assert_eq!(config.server.kind, ServerFamily::Redis);
    assert_eq!(config.server.port, None);
    assert_eq!(config.client.driver, ClientDriver::Multiplexed);
    assert_eq!(config.startup_timeout().unwrap(), Duration::from_secs(10));
}

#[test]
fn given_zero_startup_timeout_when_validated_then_fails() {
    let mut config = AppConfig::default();
    config.server.startup_timeout = String::from("0s");

    assert!(config.validate().is_err());
}

#[test]
fn given_future_version_when_validated_then_fails() {
    let config = AppConfig {
        version: 2,
        ..Default::default()
    };

    assert!(config.validate().is_err());
}

#[test]
fn given_config_dir_when_resolved_then_ends_with_app_name() {
    if let Some(dir) = default_config_dir() {
        assert!(dir.ends_with("embedded-redis"));
    }
    assert_eq!(CONFIG_FILE_NAME, "embedded-redis.toml");
}
