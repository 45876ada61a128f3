use crate::server::engine::{EmbeddedServer, drain_lines, with_process};

use std::path::PathBuf;

fn engine() -> EmbeddedServer {
    EmbeddedServer::new(
        PathBuf::from("/usr/bin/redis-server"),
        "127.0.0.1",
        6400,
        vec![String::from("--port"), String::from("6400")],
    )
}

/// **VALUE**: Verifies the command the engine will spawn.
///
/// **BUG THIS CATCHES**: Would catch arguments being dropped between the kind and the
/// spawned process.
#[test]
fn given_engine_when_command_built_then_uses_executable_and_args() {
    // GIVEN: An engine
    let engine = engine();

    // WHEN: Building the command
    let cmd = engine.build_command();
    let std_cmd = cmd.as_std();

    // THEN: Program and args match
    assert_eq!(std_cmd.get_program(), "/usr/bin/redis-server");
    let args: Vec<_> = std_cmd.get_args().collect();
    assert_eq!(args, vec!["--port", "6400"]);
}

/// **VALUE**: Verifies that a fresh engine reports no process.
#[test]
fn given_new_engine_then_is_inactive_without_pid() {
    let engine = engine();

    assert!(!engine.is_active());
    assert_eq!(engine.pid(), None);
    assert_eq!(engine.ports(), vec![6400]);
    assert_eq!(engine.host(), "127.0.0.1");
}

/// **VALUE**: Verifies the sysinfo process lookup used to deliver SIGTERM.
///
/// **BUG THIS CATCHES**: Would catch the process table not being refreshed before lookup,
/// which makes every graceful stop fall through to SIGKILL.
#[test]
fn given_own_pid_when_looked_up_then_process_found() {
    let pid = std::process::id();

    let found = with_process(pid, |p| p.pid().as_u32());

    assert_eq!(found, Some(pid));
}

/// **VALUE**: Verifies that stopping an engine that never started is a no-op.
#[tokio::test]
async fn given_unstarted_engine_when_stopped_then_ok() {
    let mut engine = engine();

    assert!(engine.stop().await.is_ok());
    assert!(!engine.is_active());
}

/// **VALUE**: Verifies that output is read to EOF even when a line is not valid UTF-8.
///
/// **WHY THIS MATTERS**: The reader owns the child's pipe. If it gives up early the pipe
/// closes and the child's next write kills it with SIGPIPE, taking the server down.
///
/// **BUG THIS CATCHES**: Would catch a strict UTF-8 line reader stopping at the first bad
/// byte, so the readiness banner after it is never seen.
#[tokio::test]
async fn given_invalid_utf8_line_when_drained_then_later_lines_still_delivered() {
    // GIVEN: Output with an invalid UTF-8 line before the banner
    let output: &[u8] = b"boot \xff\xfe\r\n* Ready to accept connections tcp\nlast";

    // WHEN: Draining it
    let mut lines = Vec::new();
    drain_lines(output, "stdout", |line| lines.push(line.to_string())).await;

    // THEN: Every line arrives, the bad one decoded lossily
    assert_eq!(
        lines,
        vec![
            String::from("boot \u{FFFD}\u{FFFD}"),
            String::from("* Ready to accept connections tcp"),
            String::from("last"),
        ]
    );
}
