//! Named-pipe housekeeping.
//!
//! [`ensure_fifo`] makes sure a FIFO sits at a path, replacing whatever else
//! might be there.  [`open_writer`] and [`wake_reader`] open the write end
//! without blocking, which is how clients send messages and how the server
//! releases a listener parked in a blocking `open`.

use std::ffi::CString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

/// Errors produced while preparing the pipe.
#[derive(Debug, thiserror::Error)]
pub enum FifoError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to inspect {path}: {source}")]
    Inspect { path: PathBuf, source: io::Error },
    #[error("failed to remove {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },
    #[error("mkfifo {path} failed: {source}")]
    Mkfifo { path: PathBuf, source: io::Error },
    #[error("path contains a NUL byte: {0}")]
    InvalidPath(PathBuf),
}

/// Ensure a named pipe exists at `path`.
///
/// Parent directories are created on demand.  An existing FIFO is left
/// untouched; anything else at `path` (regular file, directory entry,
/// dangling symlink) is removed and replaced.
///
/// There is a window between the check and the `mkfifo`; the pipe is a
/// private per-user path so a concurrent writer there is not expected.
pub fn ensure_fifo(path: &Path) -> Result<(), FifoError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| FifoError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_fifo() => return Ok(()),
        Ok(meta) => {
            let removed = if meta.is_dir() {
                fs::remove_dir(path)
            } else {
                fs::remove_file(path)
            };
            removed.map_err(|source| FifoError::Remove {
                path: path.to_path_buf(),
                source,
            })?;
            log::debug!("replaced non-fifo entry at {}", path.display());
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(FifoError::Inspect {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    mkfifo(path)
}

fn mkfifo(path: &Path) -> Result<(), FifoError> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| FifoError::InvalidPath(path.to_path_buf()))?;

    // SAFETY: `c_path` is a valid NUL-terminated string that outlives the call.
    let ret = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
    if ret != 0 {
        return Err(FifoError::Mkfifo {
            path: path.to_path_buf(),
            source: io::Error::last_os_error(),
        });
    }
    Ok(())
}

/// Whether `path` currently names a FIFO.
pub fn is_fifo(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_fifo())
        .unwrap_or(false)
}

/// Open the write end of the pipe without blocking.
///
/// Fails with `ENXIO` when no reader has the pipe open, so a client can
/// report "no listener" instead of hanging.
pub fn open_writer(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
}

/// Briefly connect as a writer so a reader blocked in `open` returns.
///
/// The reader then sees end-of-file as soon as this end is dropped.
/// Returns `true` if a reader was attached.
pub fn wake_reader(path: &Path) -> bool {
    if !is_fifo(path) {
        return false;
    }
    open_writer(path).is_ok()
}

/// Remove the pipe file, treating "already gone" as success.
pub fn remove_fifo(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
