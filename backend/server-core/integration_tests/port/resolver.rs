use server_core::error::port::PortError;
use server_core::port::resolve;
use server_core::{PortOrigin, PortResolver, ServerFamily};

use crate::helpers::occupy_port;

// ============================================================================
// Public API tests for port resolution against real sockets
// ============================================================================

/// **VALUE**: Verifies that an unspecified port yields a real OS-assigned port.
///
/// **WHY THIS MATTERS**: Parallel test suites each start their own server. Ephemeral
/// ports are what keep them from colliding.
///
/// **BUG THIS CATCHES**: Would catch the resolver returning 0 (the bind-to-any request
/// itself) instead of the port the OS picked.
#[test]
fn given_unspecified_port_when_resolved_then_returns_positive_ephemeral_port() {
    // GIVEN: No preference
    let requested = 0;

    // WHEN: Resolving
    let resolved = resolve(requested, 6379).unwrap();

    // THEN: A usable port from the OS
    assert!(resolved.port() > 0);
    assert_eq!(resolved.origin(), PortOrigin::Ephemeral);
}

/// **VALUE**: Verifies the default port is replaced even when it happens to be free.
///
/// **BUG THIS CATCHES**: Would catch the default port being probed and used directly,
/// which collides as soon as two suites run side by side.
#[test]
fn given_default_port_when_resolved_then_ephemeral_port_is_used() {
    let resolved = PortResolver::for_kind(&ServerFamily::Redis)
        .resolve(6379)
        .unwrap();

    assert!(resolved.port() > 0);
    assert_ne!(resolved.origin(), PortOrigin::Explicit);
}

/// **VALUE**: Verifies that a free custom port is honored exactly.
#[test]
fn given_free_custom_port_when_resolved_then_same_port_returned() {
    // GIVEN: A port known to be free a moment ago
    let (listener, port) = occupy_port();
    drop(listener);

    // WHEN: Requesting it explicitly
    let resolved = resolve(i32::from(port), 6379).unwrap();

    // THEN: Exactly that port
    assert_eq!(resolved.port(), port);
    assert_eq!(resolved.origin(), PortOrigin::Explicit);
}

/// **VALUE**: Verifies that an occupied custom port is a hard error.
///
/// **WHY THIS MATTERS**: Silently moving to another port would leave clients configured
/// for the requested port talking to whatever else holds it.
///
/// **BUG THIS CATCHES**: Would catch the ephemeral fallback leaking into the explicit path.
#[test]
fn given_occupied_custom_port_when_resolved_then_returns_explicit_port_unavailable() {
    // GIVEN: A listener holding the port
    let (_listener, port) = occupy_port();

    // WHEN: Requesting it explicitly
    let result = resolve(i32::from(port), 6379);

    // THEN: Error naming the port
    let err = result.unwrap_err();
    assert_eq!(err.port(), i32::from(port));
    let PortError::ExplicitPortUnavailable { message, .. } = err;
    assert!(message.contains(&port.to_string()));
}

/// **VALUE**: Verifies the conventional port is treated as explicit under a different default.
///
/// **BUG THIS CATCHES**: Would catch 6379 being special-cased regardless of the kind's
/// configured default.
#[test]
fn given_6379_occupied_and_different_default_when_resolved_then_error_names_6379() {
    // GIVEN: 6379 held by us, or already held by a system Redis
    let _guard = std::net::TcpListener::bind("127.0.0.1:6379").ok();

    // WHEN: Requesting 6379 from a resolver whose default is 16379
    let result = PortResolver::new(16379).resolve(6379);

    // THEN: Explicit failure for 6379
    assert_eq!(result.unwrap_err().port(), 6379);
}

#[test]
fn given_occupied_port_when_availability_checked_then_false() {
    let (_listener, port) = occupy_port();

    assert!(!PortResolver::new(6379).is_available(port));
}
