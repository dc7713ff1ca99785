//! Start/stop/restart control over the pipe listener.
//!
//! [`FifoServer`] owns at most one running [`FifoListener`].  All three
//! operations are idempotent: stopping an idle server does nothing and
//! starting a running one restarts it.  Dropping the server stops the
//! listener and removes the pipe.

use crate::config::{expand_path, DEFAULT_FIFO_PATH};
use crate::dispatch::Dispatcher;
use crate::fifo::{self, FifoError};
use crate::ipc::listener::{FifoListener, ListenerHandle, DEFAULT_BACKOFF};
use crate::traits::CommandExecutor;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Setup-time failures, surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Fifo(#[from] FifoError),
    #[error("failed to spawn listener thread: {0}")]
    Spawn(std::io::Error),
    #[error("listener thread panicked")]
    WorkerPanicked,
    #[error("failed to remove {path}: {source}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Owns the listener and its pipe.
pub struct FifoServer<E: CommandExecutor + 'static> {
    dispatcher: Arc<Dispatcher<E>>,
    backoff: Duration,
    listener: Option<ListenerHandle>,
}

impl<E: CommandExecutor + 'static> FifoServer<E> {
    pub fn new(executor: E) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(executor)),
            backoff: DEFAULT_BACKOFF,
            listener: None,
        }
    }

    /// Override the pause the listener takes after a failed cycle.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn executor(&self) -> &E {
        self.dispatcher.executor()
    }

    /// Whether a listener thread is alive.
    pub fn is_running(&self) -> bool {
        self.listener.as_ref().is_some_and(|l| !l.is_finished())
    }

    /// Path of the running listener's pipe.
    pub fn path(&self) -> Option<&Path> {
        self.listener.as_ref().map(|l| l.path())
    }

    /// Start listening on `path`, or on the default pipe when `None`.
    ///
    /// `~` and `$VAR` in `path` are expanded.  A listener that is already
    /// running is stopped first.
    pub fn start(&mut self, path: Option<&str>) -> Result<(), ServerError> {
        self.reap_finished();
        self.stop()?;
        let path = expand_path(path.unwrap_or(DEFAULT_FIFO_PATH));
        self.start_at(path)
    }

    fn start_at(&mut self, path: PathBuf) -> Result<(), ServerError> {
        fifo::ensure_fifo(&path)?;
        let handle = FifoListener::new(&path, Arc::clone(&self.dispatcher))
            .with_backoff(self.backoff)
            .spawn()
            .map_err(ServerError::Spawn)?;
        info!("fifo server started on {}", path.display());
        self.listener = Some(handle);
        Ok(())
    }

    /// Stop the listener and remove its pipe.  Does nothing when idle.
    ///
    /// Blocks until the worker exits; a client holding the write end open
    /// delays this until it closes.
    pub fn stop(&mut self) -> Result<(), ServerError> {
        let Some(handle) = self.listener.take() else {
            return Ok(());
        };
        let path = handle.path().to_path_buf();
        let joined = handle.stop();
        fifo::remove_fifo(&path).map_err(|source| ServerError::Cleanup {
            path: path.clone(),
            source,
        })?;
        info!("fifo server on {} stopped", path.display());
        joined.map_err(|_| ServerError::WorkerPanicked)
    }

    /// Restart on the current pipe, or start on `path` when idle.
    ///
    /// `path` is ignored while a listener is running.
    pub fn restart(&mut self, path: Option<&str>) -> Result<(), ServerError> {
        self.reap_finished();
        match self.path().map(Path::to_path_buf) {
            Some(current) => {
                self.stop()?;
                self.start_at(current)
            }
            None => self.start(path),
        }
    }

    /// Forget a listener whose thread already exited, so the next start
    /// is not blocked by it.
    fn reap_finished(&mut self) {
        if !self.listener.as_ref().is_some_and(|l| l.is_finished()) {
            return;
        }
        if let Some(handle) = self.listener.take() {
            let path = handle.path().to_path_buf();
            if handle.stop().is_err() {
                error!("listener on {} had panicked", path.display());
            }
            if let Err(e) = fifo::remove_fifo(&path) {
                warn!("failed to remove {}: {}", path.display(), e);
            }
        }
    }
}

impl<E: CommandExecutor + 'static> Drop for FifoServer<E> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("failed to stop fifo server: {}", e);
        }
    }
}

//  Tests
