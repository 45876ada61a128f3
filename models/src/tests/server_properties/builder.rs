use crate::{ModelError, ServerProperties, ServerPropertiesBuilder};

use std::fs::File;

use tempfile::tempdir;

/// **VALUE**: Verifies that an executable override must exist on disk.
///
/// **WHY THIS MATTERS**: A typo in the configured binary path should fail while the
/// configuration is being assembled, not later as an obscure spawn error.
///
/// **BUG THIS CATCHES**: Would catch removal of the `is_file()` check.
#[test]
fn given_missing_executable_when_building_properties_then_returns_validation_error() {
    // GIVEN: A path that does not exist
    let dir = tempdir().unwrap();
    let missing = dir.path().join("redis-server-does-not-exist");

    // WHEN: Building properties with it
    let result = ServerPropertiesBuilder::default()
        .using_executable(&missing)
        .build();

    // THEN: Validation error naming the path
    match result.unwrap_err() {
        ModelError::Validation { message, .. } => {
            assert!(message.contains("redis-server-does-not-exist"));
            assert!(message.contains("not found"));
        }
    }
}

/// **VALUE**: Verifies that a directory is not accepted as an executable.
///
/// **BUG THIS CATCHES**: Would catch an `exists()` check sneaking in where `is_file()` is required.
#[test]
fn given_directory_as_executable_when_building_properties_then_returns_validation_error() {
    // GIVEN: An existing directory
    let dir = tempdir().unwrap();

    // WHEN: Building properties with the directory as exec
    let result = ServerPropertiesBuilder::default()
        .using_executable(dir.path())
        .build();

    // THEN: Rejected
    assert!(result.is_err());
}

/// **VALUE**: Verifies that an existing executable and a port are carried through.
#[test]
fn given_existing_executable_when_building_properties_then_keeps_values() {
    // GIVEN: An existing file
    let dir = tempdir().unwrap();
    let exec = dir.path().join("redis-server");
    File::create(&exec).unwrap();

    // WHEN: Building
    let properties = ServerPropertiesBuilder::default()
        .using_executable(&exec)
        .using_port(6380)
        .build()
        .expect("properties should build");

    // THEN: Values preserved
    assert_eq!(properties.exec(), Some(exec.as_path()));
    assert_eq!(properties.port(), Some(6380));
    assert_eq!(properties.port_or_default(6379), 6380);
}

/// **VALUE**: Verifies that `copy()` keeps the original values and only overrides what is set.
///
/// **WHY THIS MATTERS**: Configuration resolution copies the file-based properties and pins
/// the winning port. Losing the executable in the copy would silently launch the wrong binary.
///
/// **BUG THIS CATCHES**: Would catch a copy builder that starts from defaults.
#[test]
fn given_existing_properties_when_copied_with_new_port_then_keeps_executable() {
    // GIVEN: Properties with an executable and no port
    let dir = tempdir().unwrap();
    let exec = dir.path().join("valkey-server");
    File::create(&exec).unwrap();
    let original = ServerPropertiesBuilder::default()
        .using_executable(&exec)
        .build()
        .unwrap();

    // WHEN: Copying with a port
    let copied = ServerProperties::copy(&original)
        .using_port(7000)
        .build()
        .unwrap();

    // THEN: Executable kept, port set, original untouched
    assert_eq!(copied.exec(), Some(exec.as_path()));
    assert_eq!(copied.port(), Some(7000));
    assert_eq!(original.port(), None);
}

/// **VALUE**: Verifies that an absent port falls back to the supplied default.
#[test]
fn given_no_port_when_port_or_default_called_then_returns_default() {
    // GIVEN: Empty properties
    let properties = ServerProperties::default();

    // WHEN/THEN: Default is returned
    assert_eq!(properties.port_or_default(6379), 6379);
    assert!(properties.exec().is_none());
}

/// **VALUE**: Verifies that non-positive ports pass through untouched.
///
/// **WHY THIS MATTERS**: Zero and negative ports mean "no preference" and are interpreted
/// by the port resolver. Rejecting them here would make ephemeral ports unreachable
/// through configuration.
#[test]
fn given_negative_port_when_building_properties_then_accepts_it() {
    // GIVEN/WHEN: A negative port
    let properties = ServerPropertiesBuilder::default()
        .using_port(-1)
        .build()
        .unwrap();

    // THEN: Accepted as-is
    assert_eq!(properties.port(), Some(-1));
}
