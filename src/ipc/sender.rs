//! Client side of the pipe protocol.

use crate::fifo;
use crate::message::Message;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Errors produced when sending a message.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("no listener on {0}")]
    NoListener(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Writes encoded [`Message`]s into a listener's pipe.
pub struct FifoSender {
    path: PathBuf,
}

impl FifoSender {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The filesystem path of the pipe.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encode `msg` and write it as a single line.
    ///
    /// Fails immediately with [`SendError::NoListener`] when the pipe is
    /// missing or nobody is reading it.
    pub fn send(&self, msg: &Message) -> Result<(), SendError> {
        if !fifo::is_fifo(&self.path) {
            return Err(SendError::NoListener(self.path.clone()));
        }
        let mut pipe = fifo::open_writer(&self.path).map_err(|e| {
            if e.raw_os_error() == Some(libc::ENXIO) {
                SendError::NoListener(self.path.clone())
            } else {
                SendError::Io(e)
            }
        })?;
        let mut line = msg.encode();
        line.push('\n');
        pipe.write_all(line.as_bytes())?;
        Ok(())
    }
}
