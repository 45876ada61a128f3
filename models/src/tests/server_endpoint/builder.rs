use crate::{ModelError, ServerEndpointBuilder};

/// **VALUE**: Verifies that a complete builder produces the endpoint handed to clients.
///
/// **WHY THIS MATTERS**: Connection factories take host and port from this value
/// verbatim. A builder that swaps or drops fields breaks every client connection.
///
/// **BUG THIS CATCHES**: Would catch field mix-ups or a broken `address()` format.
#[test]
fn given_host_and_port_when_building_endpoint_then_returns_endpoint() {
    // GIVEN: Builder with loopback host and a port
    let builder = ServerEndpointBuilder::default()
        .with_host("127.0.0.1")
        .with_port(6390);

    // WHEN: Building
    let endpoint = builder.build().expect("endpoint should build");

    // THEN: Fields and address are preserved
    assert_eq!(endpoint.host, "127.0.0.1");
    assert_eq!(endpoint.port, 6390);
    assert_eq!(endpoint.address(), "127.0.0.1:6390");
    assert_eq!(endpoint.to_string(), "127.0.0.1:6390");
}

/// **VALUE**: Verifies that port zero is rejected.
///
/// **WHY THIS MATTERS**: Port zero means "let the OS choose" at bind time. As a
/// connection target it is meaningless and would fail at connect time with a
/// confusing error.
///
/// **BUG THIS CATCHES**: Would catch removal of the non-zero port check.
#[test]
fn given_zero_port_when_building_endpoint_then_returns_validation_error() {
    // GIVEN: Builder with port zero
    let builder = ServerEndpointBuilder::default()
        .with_host("127.0.0.1")
        .with_port(0);

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    match result.unwrap_err() {
        ModelError::Validation { message, .. } => {
            assert_eq!(message, "Port must be non-zero");
        }
    }
}

/// **VALUE**: Verifies that missing and blank hosts are rejected.
///
/// **BUG THIS CATCHES**: Would catch if host becomes optional or whitespace is accepted.
#[test]
fn given_missing_or_blank_host_when_building_endpoint_then_returns_validation_error() {
    // GIVEN: One builder without host, one with a blank host
    let missing = ServerEndpointBuilder::default().with_port(6379);
    let blank = ServerEndpointBuilder::default()
        .with_host("   ")
        .with_port(6379);

    // WHEN/THEN: Both fail with distinct messages
    match missing.build().unwrap_err() {
        ModelError::Validation { message, .. } => assert_eq!(message, "Host is required"),
    }
    match blank.build().unwrap_err() {
        ModelError::Validation { message, .. } => assert_eq!(message, "Host cannot be empty"),
    }
}

/// **VALUE**: Verifies that a missing port is rejected.
#[test]
fn given_missing_port_when_building_endpoint_then_returns_validation_error() {
    // GIVEN: Builder without port
    let builder = ServerEndpointBuilder::default().with_host("127.0.0.1");

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    match result.unwrap_err() {
        ModelError::Validation { message, .. } => assert_eq!(message, "Port is required"),
    }
}
