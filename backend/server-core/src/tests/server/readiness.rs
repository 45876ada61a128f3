use crate::ServerFamily;
use crate::error::server::ServerError;
use crate::server::readiness::{
    DEFAULT_STARTUP_TIMEOUT, Readiness, ReadinessContext, readiness_backoff,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use backoff::backoff::Backoff;

fn context(output_matched: bool) -> ReadinessContext {
    ReadinessContext {
        pid: None,
        host: String::from("127.0.0.1"),
        port: 6400,
        output_matched,
    }
}

/// **VALUE**: Verifies that log-pattern readiness only reflects the output flag.
///
/// **BUG THIS CATCHES**: Would catch the pattern strategy reporting ready before any
/// matching line was seen.
#[test]
fn given_log_pattern_when_output_not_matched_then_not_ready() {
    // GIVEN: The Redis log pattern
    let readiness = Readiness::for_kind(&ServerFamily::Redis).unwrap();

    // WHEN/THEN: Ready only after a match
    assert!(!readiness.is_ready(&context(false)));
    assert!(readiness.is_ready(&context(true)));
    assert!(readiness.pattern().is_some());
}

#[test]
fn given_immediate_readiness_when_checked_then_always_ready() {
    assert!(Readiness::Immediate.is_ready(&context(false)));
    assert!(Readiness::Immediate.pattern().is_none());
}

/// **VALUE**: Verifies that listening readiness without a PID is never ready.
///
/// **BUG THIS CATCHES**: Would catch a socket owned by an unrelated process counting as
/// our server being up.
#[test]
fn given_listening_readiness_without_pid_when_checked_then_not_ready() {
    assert!(!Readiness::Listening.is_ready(&context(true)));
}

/// **VALUE**: Verifies custom predicates receive the poll context.
#[test]
fn given_custom_readiness_when_checked_then_predicate_sees_context() {
    // GIVEN: A predicate counting calls and checking the port
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let readiness = Readiness::custom(move |ctx| {
        seen.fetch_add(1, Ordering::SeqCst);
        ctx.port == 6400
    });

    // WHEN: Checking twice
    let first = readiness.is_ready(&context(false));
    let second = readiness.clone().is_ready(&context(false));

    // THEN: Both calls reach the same predicate
    assert!(first && second);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(format!("{readiness:?}"), "Custom(..)");
}

/// **VALUE**: Verifies that a malformed pattern is rejected up front.
///
/// **WHY THIS MATTERS**: A bad regex discovered during start would only show up as a
/// confusing timeout after the full startup window.
#[test]
fn given_invalid_pattern_when_compiled_then_returns_validation_error() {
    let result = Readiness::log_pattern("Ready to accept (");

    assert!(matches!(result, Err(ServerError::Validation { .. })));
}

/// **VALUE**: Verifies that the readiness backoff gives up once the timeout is spent.
///
/// **BUG THIS CATCHES**: Would catch `max_elapsed_time` being left unset, which makes the
/// readiness loop spin forever on a server that never comes up.
#[test]
fn given_short_timeout_when_backoff_polled_past_it_then_stops() {
    // GIVEN: A 50ms budget
    let mut backoff = readiness_backoff(Duration::from_millis(50));

    // WHEN: Waiting past the budget
    assert!(backoff.next_backoff().is_some());
    std::thread::sleep(Duration::from_millis(80));

    // THEN: No further retries
    assert!(backoff.next_backoff().is_none());
}

#[test]
fn given_default_timeout_then_is_ten_seconds() {
    assert_eq!(DEFAULT_STARTUP_TIMEOUT, Duration::from_secs(10));
}
