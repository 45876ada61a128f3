use server_core::Lifecycle;
use server_core::error::server::ServerError;
use server_core::server::lifecycle::run_until;

use common::ErrorLocation;

use std::panic::Location;

use tokio::sync::oneshot;

/// Records the calls a host makes.
#[derive(Default)]
struct Recorder {
    calls: Vec<&'static str>,
    running: bool,
    fail_start: bool,
}

impl Lifecycle for Recorder {
    async fn start(&mut self) -> Result<(), ServerError> {
        self.calls.push("start");
        if self.fail_start {
            return Err(ServerError::Launch {
                message: String::from("refused"),
                location: ErrorLocation::from(Location::caller()),
                source: Box::new(std::io::Error::other("refused")),
            });
        }
        self.running = true;
        Ok(())
    }

    async fn stop(&mut self) {
        self.calls.push("stop");
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

/// **VALUE**: Verifies that `run_until` brackets the shutdown signal with start and stop.
///
/// **BUG THIS CATCHES**: Would catch stop running before the signal or not at all.
#[tokio::test]
async fn given_component_when_shutdown_signalled_then_started_and_stopped() {
    // GIVEN: A component and a shutdown channel
    let mut component = Recorder::default();
    let (tx, rx) = oneshot::channel::<()>();
    tx.send(()).unwrap();

    // WHEN: Running until shutdown
    run_until(&mut component, async {
        let _ = rx.await;
    })
    .await
    .unwrap();

    // THEN: Start then stop
    assert_eq!(component.calls, vec!["start", "stop"]);
    assert!(!component.is_running());
}

/// **VALUE**: Verifies that a failed start skips waiting for shutdown.
///
/// **WHY THIS MATTERS**: A host waiting on Ctrl-C for a server that never started would
/// look alive while serving nothing.
#[tokio::test]
async fn given_failing_component_when_run_then_returns_error_without_stop() {
    let mut component = Recorder {
        fail_start: true,
        ..Default::default()
    };

    let result = run_until(&mut component, std::future::pending()).await;

    assert!(matches!(result, Err(ServerError::Launch { .. })));
    assert_eq!(component.calls, vec!["start"]);
}
