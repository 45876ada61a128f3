use crate::config::providers::{
    ConfigProvider, DefaultProvider, EXEC_ENV_VAR, EnvProvider, PORT_ENV_VAR, SettingSource,
};

use std::collections::HashMap;

fn env_with(vars: &[(&str, &str)]) -> EnvProvider {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    EnvProvider::with_lookup(6379, move |key| vars.get(key).cloned())
}

/// **VALUE**: Verifies that an environment port equal to the default is not an override.
///
/// **WHY THIS MATTERS**: Client tooling commonly exports `6379`. Treating that as an
/// explicit demand would pin the embedded server to 6379 and fail whenever a system
/// Redis is running.
///
/// **BUG THIS CATCHES**: Would catch the default-port filter being lost from the
/// environment layer.
#[test]
fn given_env_port_equal_to_default_when_read_then_ignored() {
    let provider = env_with(&[(PORT_ENV_VAR, "6379")]);

    assert_eq!(provider.port(), None);
}

#[test]
fn given_env_custom_port_when_read_then_returned() {
    let provider = env_with(&[(PORT_ENV_VAR, " 6390 ")]);

    assert_eq!(provider.port(), Some(6390));
    assert_eq!(provider.source(), SettingSource::Environment);
}

/// **VALUE**: Verifies that garbage in the port variable is skipped, not fatal.
///
/// **BUG THIS CATCHES**: Would catch a parse failure aborting startup or being read as 0.
#[test]
fn given_unparsable_env_port_when_read_then_ignored() {
    let provider = env_with(&[(PORT_ENV_VAR, "six-three-seven-nine")]);

    assert_eq!(provider.port(), None);
}

#[test]
fn given_blank_env_exec_when_read_then_ignored() {
    let provider = env_with(&[(EXEC_ENV_VAR, "   ")]);

    assert_eq!(provider.exec(), None);
}

#[test]
fn given_default_provider_then_supplies_port_but_no_exec() {
    let provider = DefaultProvider::new(6379);

    assert_eq!(provider.port(), Some(6379));
    assert_eq!(provider.exec(), None);
    assert_eq!(provider.source(), SettingSource::Default);
}
