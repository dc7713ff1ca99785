//! Waiting for termination signals.
//!
//! The daemon parks its main thread here and stops the server once a
//! signal arrives, so the pipe file is removed on a clean exit.

use log::info;
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use std::io;

/// Signals that end the daemon.
pub const TERMINATION_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Errors from installing signal handlers.
#[derive(Debug, thiserror::Error)]
#[error("failed to install signal handlers: {0}")]
pub struct ShutdownError(#[from] io::Error);

/// Registered signal handlers, ready to be waited on.
///
/// Handlers are installed on construction, so a signal delivered before
/// [`wait`](ShutdownSignals::wait) is called is not lost.
pub struct ShutdownSignals {
    signals: Signals,
}

impl ShutdownSignals {
    /// Listen for [`TERMINATION_SIGNALS`].
    pub fn install() -> Result<Self, ShutdownError> {
        Self::for_signals(&TERMINATION_SIGNALS)
    }

    pub fn for_signals(signals: &[i32]) -> Result<Self, ShutdownError> {
        Ok(Self {
            signals: Signals::new(signals)?,
        })
    }

    /// Block until one of the signals arrives and return it.
    pub fn wait(&mut self) -> Option<i32> {
        let signal = self.signals.forever().next();
        if let Some(signal) = signal {
            info!("shutdown signal {} received", signal);
        }
        signal
    }
}
