// Fake server executables for lifecycle tests.
//
// Spawning tests are marked #[serial]: writing a script while another test forks can
// leave the file descriptor inherited and the exec fails with ETXTBSY.

use std::net::TcpListener;
use std::path::PathBuf;

use tempfile::TempDir;

/// Prints the Redis readiness banner, then idles.
pub const READY_SCRIPT: &str = "#!/bin/sh\n\
echo \"1:M 01 Jan 2024 00:00:00.000 * Server initialized\"\n\
echo \"1:M 01 Jan 2024 00:00:00.000 * Ready to accept connections tcp\"\n\
exec sleep 30\n";

/// Writes a line that is not valid UTF-8, then the banner, then keeps writing.
pub const INVALID_UTF8_SCRIPT: &str = "#!/bin/sh\n\
printf 'boot \\377\\376\\n'\n\
sleep 0.3\n\
echo \"1:M 01 Jan 2024 00:00:00.000 * Ready to accept connections tcp\"\n\
while true; do echo \"1:M * DB saved on disk\"; sleep 0.1; done\n";

/// Listens on the port passed as `--port <port>` without printing anything.
pub const LISTENING_SCRIPT: &str = "#!/bin/sh\n\
exec python3 -c 'import socket, sys, time\n\
s = socket.socket()\n\
s.setsockopt(socket.SOL_SOCKET, socket.SO_REUSEADDR, 1)\n\
s.bind((\"127.0.0.1\", int(sys.argv[2])))\n\
s.listen()\n\
time.sleep(30)' \"$@\"\n";

/// Idles without ever announcing readiness.
pub const SILENT_SCRIPT: &str = "#!/bin/sh\nexec sleep 30\n";

/// Exits before becoming ready.
pub const CRASHING_SCRIPT: &str = "#!/bin/sh\necho \"fatal: bad config\" >&2\nexit 3\n";

/// An executable script inside its own temp dir. The dir is removed on drop.
pub struct FakeServer {
    _dir: TempDir,
    pub path: PathBuf,
}

#[cfg(unix)]
pub fn fake_server(contents: &str) -> FakeServer {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fake-redis-server");
    std::fs::write(&path, contents).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

    FakeServer { _dir: dir, path }
}

/// Holds a loopback port open for the lifetime of the listener.
pub fn occupy_port() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

/// `true` if `python3` can be run, needed by [`LISTENING_SCRIPT`].
pub fn has_python3() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}
