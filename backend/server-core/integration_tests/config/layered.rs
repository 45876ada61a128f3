use server_core::config::providers::{EXEC_ENV_VAR, PORT_ENV_VAR};
use server_core::config::{
    DefaultProvider, EnvProvider, LayeredConfig, PropertiesProvider, SettingSource,
};

use models::{ServerProperties, ServerPropertiesBuilder};

use std::collections::HashMap;

use serial_test::serial;
use tempfile::NamedTempFile;

fn env(vars: &[(&'static str, String)]) -> EnvProvider {
    let vars: HashMap<&'static str, String> = vars.iter().cloned().collect();
    EnvProvider::with_lookup(6379, move |key| vars.get(key).cloned())
}

fn layered(env_provider: EnvProvider, properties: ServerProperties) -> LayeredConfig {
    LayeredConfig::new()
        .with_provider(env_provider)
        .with_provider(PropertiesProvider::new(properties))
        .with_provider(DefaultProvider::new(6379))
}

/// **VALUE**: Verifies that the environment overrides the config file.
///
/// **WHY THIS MATTERS**: CI pipelines inject ports through the environment to avoid
/// collisions. A config file winning over them reintroduces the collisions.
#[test]
fn given_env_and_properties_when_resolved_then_env_wins() {
    // GIVEN: Both layers set a port
    let properties = ServerPropertiesBuilder::default()
        .using_port(6390)
        .build()
        .unwrap();
    let config = layered(env(&[(PORT_ENV_VAR, String::from("6391"))]), properties);

    // WHEN: Resolving
    let resolved = config.resolve().unwrap();

    // THEN: Environment value
    assert_eq!(resolved.properties.port(), Some(6391));
    assert_eq!(resolved.port_source, Some(SettingSource::Environment));
}

#[test]
fn given_only_properties_when_resolved_then_properties_win() {
    let properties = ServerPropertiesBuilder::default()
        .using_port(6390)
        .build()
        .unwrap();
    let config = layered(env(&[]), properties);

    let resolved = config.resolve().unwrap();

    assert_eq!(resolved.properties.port(), Some(6390));
    assert_eq!(resolved.port_source, Some(SettingSource::Properties));
}

/// **VALUE**: Verifies the compile-time default as the last layer.
#[test]
fn given_no_overrides_when_resolved_then_default_port_and_no_exec() {
    let config = layered(env(&[]), ServerProperties::default());

    let resolved = config.resolve().unwrap();

    assert_eq!(resolved.properties.port(), Some(6379));
    assert_eq!(resolved.port_source, Some(SettingSource::Default));
    assert_eq!(resolved.properties.exec(), None);
    assert_eq!(resolved.exec_source, None);
}

/// **VALUE**: Verifies that the executable and port are resolved independently.
///
/// **BUG THIS CATCHES**: Would catch the first provider with any value winning for all
/// settings, which drops a file-configured port when only the executable is in the env.
#[test]
fn given_exec_in_env_and_port_in_properties_when_resolved_then_both_applied() {
    // GIVEN: Exec from env, port from properties
    let exec = NamedTempFile::new().unwrap();
    let properties = ServerPropertiesBuilder::default()
        .using_port(6390)
        .build()
        .unwrap();
    let config = layered(
        env(&[(EXEC_ENV_VAR, exec.path().display().to_string())]),
        properties,
    );

    // WHEN: Resolving
    let resolved = config.resolve().unwrap();

    // THEN: Each from its own layer
    assert_eq!(resolved.properties.exec(), Some(exec.path()));
    assert_eq!(resolved.exec_source, Some(SettingSource::Environment));
    assert_eq!(resolved.port_source, Some(SettingSource::Properties));
}

#[test]
fn given_missing_exec_in_env_when_resolved_then_fails() {
    let config = layered(
        env(&[(EXEC_ENV_VAR, String::from("/nonexistent/redis-server"))]),
        ServerProperties::default(),
    );

    assert!(config.resolve().is_err());
}

#[test]
fn given_standard_layers_then_ordered_env_properties_default() {
    let config = LayeredConfig::standard(6379, ServerProperties::default());

    assert_eq!(
        config.sources(),
        vec![
            SettingSource::Environment,
            SettingSource::Properties,
            SettingSource::Default
        ]
    );
}

/// **VALUE**: Verifies the standard stack reads the real process environment.
#[test]
#[serial]
fn given_port_in_process_env_when_standard_resolved_then_env_used() {
    // GIVEN: The variable set for this test only
    // SAFETY: #[serial] keeps other tests from touching the environment concurrently.
    unsafe { std::env::set_var(PORT_ENV_VAR, "6392") };

    // WHEN: Resolving the standard stack
    let resolved = LayeredConfig::standard(6379, ServerProperties::default()).resolve();

    unsafe { std::env::remove_var(PORT_ENV_VAR) };

    // THEN: Environment value
    assert_eq!(resolved.unwrap().properties.port(), Some(6392));
}
