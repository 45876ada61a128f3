use crate::error::server::ServerError;
use crate::server::readiness::{Readiness, ReadinessContext, readiness_backoff};

use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use backoff::backoff::Backoff;
use log::{debug, info, trace, warn};
use regex::Regex;
use sysinfo::{Pid, Process, ProcessesToUpdate, Signal, System};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child as TokioChild;
use tokio::process::Command as TokioCommand;
use tokio::spawn as TokioSpawn;
use tokio::time::sleep as TokioSleep;
use tokio::time::timeout as TokioTimeout;

const STOP_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// A server child process bound to one port.
///
/// Owns at most one child at a time. The child is spawned with `kill_on_drop`, so dropping
/// a running engine does not leak the process.
#[derive(Debug)]
pub struct EmbeddedServer {
    executable: PathBuf,
    host: String,
    port: u16,
    args: Vec<String>,
    child: Option<TokioChild>,
    output_matched: Arc<AtomicBool>,
    active: bool,
}

impl EmbeddedServer {
    pub(crate) fn new(executable: PathBuf, host: &str, port: u16, args: Vec<String>) -> Self {
        Self {
            executable,
            host: host.to_string(),
            port,
            args,
            child: None,
            output_matched: Arc::new(AtomicBool::new(false)),
            active: false,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// All ports the server listens on. Embedded servers only ever bind one.
    pub fn ports(&self) -> Vec<u16> {
        vec![self.port]
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(TokioChild::id)
    }

    pub fn is_active(&self) -> bool {
        self.active && self.child.is_some()
    }

    pub(crate) fn build_command(&self) -> TokioCommand {
        let mut cmd = TokioCommand::new(&self.executable);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Spawn the server and wait until `readiness` reports it is serving.
    ///
    /// # Errors
    ///
    /// - [`ServerError::AlreadyRunning`] if a child is already active
    /// - [`ServerError::Launch`] if spawning fails or the child exits before becoming ready
    /// - [`ServerError::Timeout`] if readiness is not reached within `timeout` (the child is killed)
    pub async fn start(
        &mut self,
        readiness: &Readiness,
        timeout: Duration,
    ) -> Result<(), ServerError> {
        if self.is_active() {
            return Err(ServerError::AlreadyRunning {
                message: format!(
                    "Server {} is already running on port {} (PID: {:?})",
                    self.executable.display(),
                    self.port,
                    self.pid()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        debug!(
            "Spawning {} {}",
            self.executable.display(),
            self.args.join(" ")
        );

        let mut child = self.build_command().spawn().map_err(|e| ServerError::Launch {
            message: format!(
                "Failed to start server {} on port [{}]: {e}",
                self.executable.display(),
                self.port
            ),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(e),
        })?;

        info!(
            "Spawned {} on port {} (PID: {:?})",
            self.executable.display(),
            self.port,
            child.id()
        );

        self.output_matched.store(false, Ordering::SeqCst);
        self.capture_output(&mut child, readiness.pattern().cloned());

        let waited = wait_until_ready(
            &mut child,
            readiness,
            timeout,
            ReadyTarget {
                executable: &self.executable,
                host: &self.host,
                port: self.port,
                output_matched: &self.output_matched,
            },
        )
        .await;

        if let Err(e) = waited {
            warn!(
                "Server did not become ready, killing spawned process (PID: {:?})",
                child.id()
            );
            if let Err(kill_err) = child.kill().await {
                warn!("Failed to kill server that did not become ready: {kill_err}");
            }
            return Err(e);
        }

        self.child = Some(child);
        self.active = true;
        Ok(())
    }

    /// Terminate the child: SIGTERM first, SIGKILL after a grace period.
    ///
    /// Calling this without a running child is a no-op.
    pub async fn stop(&mut self) -> Result<(), ServerError> {
        self.active = false;

        let Some(mut child) = self.child.take() else {
            trace!("Stop requested but no child process is running");
            return Ok(());
        };

        if let Some(pid) = child.id() {
            let signalled = with_process(pid, |p| p.kill_with(Signal::Term).unwrap_or(false))
                .unwrap_or(false);
            debug!("Sent SIGTERM to PID {pid}: success={signalled}");

            if signalled {
                match TokioTimeout(STOP_GRACE_PERIOD, child.wait()).await {
                    Ok(Ok(status)) => {
                        info!("Server (PID {pid}) exited with {status}");
                        return Ok(());
                    }
                    Ok(Err(e)) => {
                        warn!("Failed to wait for server (PID {pid}): {e}");
                    }
                    Err(_) => {
                        warn!(
                            "Server (PID {pid}) still running after {STOP_GRACE_PERIOD:?}, killing"
                        );
                    }
                }
            }
        }

        if let Ok(Some(status)) = child.try_wait() {
            debug!("Server already exited with {status}");
            return Ok(());
        }

        child.kill().await.map_err(|e| ServerError::Stop {
            message: format!("Failed to kill server on port {}: {e}", self.port),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(e),
        })?;

        info!("Server on port {} killed", self.port);
        Ok(())
    }

    fn capture_output(&self, child: &mut TokioChild, pattern: Option<Regex>) {
        if let Some(stderr) = child.stderr.take() {
            TokioSpawn(drain_lines(stderr, "stderr", |line| {
                trace!("Server stderr: {line}");
            }));
        }

        if let Some(stdout) = child.stdout.take() {
            let matched = Arc::clone(&self.output_matched);
            TokioSpawn(drain_lines(stdout, "stdout", move |line| {
                trace!("Server output: {line}");

                if let Some(ref re) = pattern
                    && !matched.load(Ordering::SeqCst)
                    && re.is_match(line)
                {
                    debug!("Readiness pattern matched: {line}");
                    matched.store(true, Ordering::SeqCst);
                }
            }));
        }
    }
}

/// Read `pipe` line by line until EOF, handing each line to `on_line`.
///
/// Lines are decoded lossily. The pipe must stay open until the child closes it, or the
/// child's next write raises SIGPIPE.
pub(crate) async fn drain_lines<R, F>(pipe: R, name: &'static str, mut on_line: F)
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut segments = BufReader::new(pipe).split(b'\n');

    loop {
        match segments.next_segment().await {
            Ok(Some(raw)) => {
                let line = String::from_utf8_lossy(&raw);
                on_line(line.trim_end_matches('\r'));
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read server {name}: {e}");
                break;
            }
        }
    }
}

/// What the readiness loop is waiting on.
struct ReadyTarget<'a> {
    executable: &'a Path,
    host: &'a str,
    port: u16,
    output_matched: &'a AtomicBool,
}

async fn wait_until_ready(
    child: &mut TokioChild,
    readiness: &Readiness,
    timeout: Duration,
    target: ReadyTarget<'_>,
) -> Result<(), ServerError> {
    let mut backoff = readiness_backoff(timeout);

    debug!("Waiting up to {timeout:?} for server readiness ({readiness:?})");

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                return Err(ServerError::Launch {
                    message: format!(
                        "Server {} exited with {status} before becoming ready",
                        target.executable.display()
                    ),
                    location: ErrorLocation::from(Location::caller()),
                    source: Box::new(IoError::other(status.to_string())),
                });
            }
            Ok(None) => {}
            Err(e) => {
                return Err(ServerError::Launch {
                    message: format!("Failed to poll server process: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                    source: Box::new(e),
                });
            }
        }

        let context = ReadinessContext {
            pid: child.id(),
            host: target.host.to_string(),
            port: target.port,
            output_matched: target.output_matched.load(Ordering::SeqCst),
        };

        if readiness.is_ready(&context) {
            info!("Server is ready on {}:{}", target.host, target.port);
            return Ok(());
        }

        match backoff.next_backoff() {
            Some(duration) => {
                trace!("Server not ready, retrying after {duration:?}");
                TokioSleep(duration).await;
            }
            None => {
                return Err(ServerError::Timeout {
                    message: format!(
                        "Server on port {} did not become ready within {timeout:?}",
                        target.port
                    ),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
    }
}

pub(crate) fn with_process<F, R>(pid: u32, f: F) -> Option<R>
where
    F: FnOnce(&Process) -> R,
{
    let pid = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    sys.process(pid).map(f)
}
