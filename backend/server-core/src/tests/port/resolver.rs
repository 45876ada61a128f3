// Unit tests for the resolver's classification and fallback paths.
// Integration tests binding real sockets are in integration_tests/port/resolver.rs

use crate::error::port::PortError;
use crate::port::{PortOrigin, PortRequest, PortResolver};

use std::cell::RefCell;
use std::io::{Error as IoError, ErrorKind};
use std::net::SocketAddr;

const DEFAULT_PORT: u16 = 6379;

/// **VALUE**: Verifies the three-way classification that drives the asymmetric policy.
///
/// **WHY THIS MATTERS**: Whether a port failure is fatal depends entirely on this
/// classification. Treating the default port as custom would make every default
/// configuration fail when a system Redis is running.
///
/// **BUG THIS CATCHES**: Would catch off-by-one comparisons (`< 0` instead of `<= 0`)
/// or the default-port special case being dropped.
#[test]
fn given_raw_ports_when_classified_then_maps_to_request_kind() {
    // GIVEN/WHEN/THEN: Each raw value maps to its request kind
    assert_eq!(PortRequest::classify(0, DEFAULT_PORT), PortRequest::Unspecified);
    assert_eq!(PortRequest::classify(-1, DEFAULT_PORT), PortRequest::Unspecified);
    assert_eq!(PortRequest::classify(6379, DEFAULT_PORT), PortRequest::Default);
    assert_eq!(PortRequest::classify(6380, DEFAULT_PORT), PortRequest::Custom(6380));
    assert_eq!(PortRequest::classify(70000, DEFAULT_PORT), PortRequest::Custom(70000));
}

/// **VALUE**: Verifies that the default port triggers an ephemeral probe, not a probe of 6379.
///
/// **WHY THIS MATTERS**: "6379" in a config usually means "whatever Redis normally uses",
/// not "fail if 6379 is busy". Probing 6379 itself would break on developer machines.
///
/// **BUG THIS CATCHES**: Would catch the resolver probing the default port directly.
#[test]
fn given_default_port_when_resolved_then_probes_port_zero() {
    // GIVEN: A probe recording requested ports and returning a fixed ephemeral port
    let probed = RefCell::new(Vec::new());
    let probe = |addr: SocketAddr| {
        probed.borrow_mut().push(addr.port());
        Ok(49152)
    };

    // WHEN: Resolving the default port
    let resolved = PortResolver::new(DEFAULT_PORT)
        .resolve_with(6379, probe)
        .unwrap();

    // THEN: Port 0 was probed and the OS port returned
    assert_eq!(*probed.borrow(), vec![0]);
    assert_eq!(resolved.port(), 49152);
    assert_eq!(resolved.origin(), PortOrigin::Ephemeral);
}

/// **VALUE**: Verifies the best-effort fallback when no ephemeral port can be obtained.
///
/// **WHY THIS MATTERS**: In sandboxes without free ports the resolver must still return
/// something usable instead of aborting startup.
///
/// **BUG THIS CATCHES**: Would catch an error being propagated for the ephemeral case, or a
/// non-positive sentinel leaking out of the resolver.
#[test]
fn given_ephemeral_probe_failure_when_resolved_then_falls_back_to_default() {
    // GIVEN: A probe that always fails
    let probe = |_: SocketAddr| Err(IoError::new(ErrorKind::AddrNotAvailable, "exhausted"));

    // WHEN: Resolving an unspecified port
    let resolved = PortResolver::new(DEFAULT_PORT).resolve_with(0, probe);

    // THEN: Default port returned, marked as fallback
    let resolved = resolved.expect("ephemeral resolution never fails");
    assert_eq!(resolved.port(), DEFAULT_PORT);
    assert_eq!(resolved.origin(), PortOrigin::DefaultFallback);
}

/// **VALUE**: Verifies that a probe reporting port 0 is not mistaken for success.
#[test]
fn given_probe_returning_zero_when_resolved_then_falls_back_to_default() {
    // GIVEN: A broken probe returning 0
    let probe = |_: SocketAddr| Ok(0);

    // WHEN: Resolving an unspecified port
    let resolved = PortResolver::new(DEFAULT_PORT).resolve_with(-5, probe).unwrap();

    // THEN: Fallback, never port 0
    assert_eq!(resolved.port(), DEFAULT_PORT);
    assert_eq!(resolved.origin(), PortOrigin::DefaultFallback);
}

/// **VALUE**: Verifies that explicit port failures are fatal and name the port.
///
/// **WHY THIS MATTERS**: A caller who asked for 7000 must not silently get another port;
/// clients configured for 7000 would never find the server.
///
/// **BUG THIS CATCHES**: Would catch a fallback being added to the explicit path.
#[test]
fn given_custom_port_probe_failure_when_resolved_then_returns_explicit_port_unavailable() {
    // GIVEN: A probe that reports the port as taken
    let probe = |_: SocketAddr| Err(IoError::new(ErrorKind::AddrInUse, "address in use"));

    // WHEN: Resolving a custom port
    let result = PortResolver::new(DEFAULT_PORT).resolve_with(7000, probe);

    // THEN: Fatal error referencing 7000
    let err = result.unwrap_err();
    assert_eq!(err.port(), 7000);
    match err {
        PortError::ExplicitPortUnavailable { message, .. } => {
            assert!(message.contains("7000"), "message should name the port: {message}");
        }
    }
}

/// **VALUE**: Verifies that ports beyond the TCP range fail without touching the network.
///
/// **BUG THIS CATCHES**: Would catch a truncating `as u16` cast turning 70000 into 4464.
#[test]
fn given_out_of_range_custom_port_when_resolved_then_fails_without_probing() {
    // GIVEN: A probe that panics if called
    let probe = |addr: SocketAddr| -> std::io::Result<u16> {
        panic!("probe should not run for {addr}")
    };

    // WHEN: Resolving 70000
    let result = PortResolver::new(DEFAULT_PORT).resolve_with(70000, probe);

    // THEN: Explicit port error
    assert_eq!(result.unwrap_err().port(), 70000);
}

/// **VALUE**: Verifies that a free custom port is returned unchanged.
#[test]
fn given_free_custom_port_when_resolved_then_returns_it_as_explicit() {
    // GIVEN: A probe echoing the requested port
    let probe = |addr: SocketAddr| Ok(addr.port());

    // WHEN: Resolving 6380
    let resolved = PortResolver::new(DEFAULT_PORT).resolve_with(6380, probe).unwrap();

    // THEN: Same port, explicit origin
    assert_eq!(resolved.port(), 6380);
    assert_eq!(resolved.origin(), PortOrigin::Explicit);
}
