use crate::error::server::ServerError;

use common::ErrorLocation;

use std::env::{current_exe, split_paths, var_os};
use std::io::{Error as IoError, ErrorKind};
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::debug;

/// Locate the server executable.
///
/// An override must name an existing file. Without one, `binary` is searched on `PATH`
/// and then next to the current executable.
///
/// # Errors
///
/// Returns [`ServerError::Launch`] if nothing runnable is found.
#[track_caller]
pub(crate) fn locate_executable(
    binary: &str,
    exec_override: Option<&Path>,
) -> Result<PathBuf, ServerError> {
    if let Some(exec) = exec_override {
        if exec.is_file() {
            debug!("Using executable override {}", exec.display());
            return Ok(exec.to_path_buf());
        }

        return Err(ServerError::Launch {
            message: format!("Executable [{}] for server not found", exec.display()),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(IoError::new(ErrorKind::NotFound, "no such file")),
        });
    }

    if let Some(found) = find_on_path(binary) {
        debug!("Found {binary} on PATH at {}", found.display());
        return Ok(found);
    }

    debug!("{binary} not in PATH, trying local binary");

    if let Some(local) = find_next_to_current_exe(binary) {
        debug!("Found local {binary} at {}", local.display());
        return Ok(local);
    }

    Err(ServerError::Launch {
        message: format!("{binary} not found on PATH or next to the current executable"),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(IoError::new(ErrorKind::NotFound, binary.to_string())),
    })
}

pub(crate) fn find_on_path(binary: &str) -> Option<PathBuf> {
    let path = var_os("PATH")?;
    split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

fn find_next_to_current_exe(binary: &str) -> Option<PathBuf> {
    let exe = current_exe().ok()?;
    let candidate = exe.parent()?.join(binary);
    candidate.is_file().then_some(candidate)
}
