use crate::error::server::ServerError;
use crate::server::executable::{find_on_path, locate_executable};

use std::path::Path;

use tempfile::NamedTempFile;

/// **VALUE**: Verifies that an existing override wins over the PATH lookup.
#[test]
fn given_existing_override_when_located_then_returns_override() {
    // GIVEN: A real file
    let file = NamedTempFile::new().unwrap();

    // WHEN: Locating with the file as override
    let found = locate_executable("redis-server", Some(file.path())).unwrap();

    // THEN: The override is used verbatim
    assert_eq!(found, file.path());
}

/// **VALUE**: Verifies that a missing override is a launch error, not a PATH fallback.
///
/// **WHY THIS MATTERS**: If a user points at a specific binary and it is missing, running
/// whatever `redis-server` happens to be on PATH hides the misconfiguration.
///
/// **BUG THIS CATCHES**: Would catch a silent fallback to PATH for bad overrides.
#[test]
fn given_missing_override_when_located_then_returns_launch_error() {
    let result = locate_executable(
        "redis-server",
        Some(Path::new("/definitely/not/here/redis-server")),
    );

    match result {
        Err(ServerError::Launch { message, .. }) => {
            assert!(message.contains("/definitely/not/here/redis-server"));
        }
        other => panic!("Expected Launch error, got {other:?}"),
    }
}

/// **VALUE**: Verifies that a binary that exists nowhere produces a launch error.
#[test]
fn given_unknown_binary_when_located_then_returns_launch_error() {
    let result = locate_executable("no-such-server-binary-3f9a1c", None);

    assert!(matches!(result, Err(ServerError::Launch { .. })));
}

#[cfg(unix)]
#[test]
fn given_sh_when_searched_on_path_then_found() {
    let found = find_on_path("sh").expect("sh should be on PATH");
    assert!(found.is_file());
}
