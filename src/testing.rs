//! Shared test doubles.

use crate::traits::CommandExecutor;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once};
use std::time::{Duration, Instant};

//  Executor

/// Test double that records every instruction it receives.
#[derive(Debug, Default)]
pub(crate) struct RecordingExecutor {
    calls: Mutex<Vec<String>>,
    fail: AtomicBool,
    panic: AtomicBool,
}

#[derive(Debug, thiserror::Error)]
#[error("executor refused: {0}")]
pub(crate) struct RecordingError(pub String);

impl RecordingExecutor {
    /// Make every subsequent call return an error (it is still recorded).
    pub(crate) fn failing() -> Self {
        let exec = Self::default();
        exec.fail.store(true, Ordering::SeqCst);
        exec
    }

    /// Make every subsequent call panic (it is still recorded).
    pub(crate) fn panicking() -> Self {
        let exec = Self::default();
        exec.panic.store(true, Ordering::SeqCst);
        exec
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Poll until at least `n` calls were recorded or two seconds pass.
    pub(crate) fn wait_for_calls(&self, n: usize) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            let calls = self.calls();
            if calls.len() >= n {
                return calls;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        self.calls()
    }
}

impl CommandExecutor for RecordingExecutor {
    type Error = RecordingError;

    fn execute(&self, instruction: &str) -> Result<(), RecordingError> {
        self.calls.lock().unwrap().push(instruction.to_string());
        if self.panic.load(Ordering::SeqCst) {
            panic!("executor blew up on {}", instruction);
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(RecordingError(instruction.to_string()));
        }
        Ok(())
    }
}

//  Log capture

/// Global logger that keeps every record in memory.
///
/// Tests run in parallel and share it, so assertions should look for a
/// message fragment unique to the test.
struct CapturingLogger {
    records: Mutex<Vec<(Level, String)>>,
}

static LOGGER: CapturingLogger = CapturingLogger {
    records: Mutex::new(Vec::new()),
};
static INIT: Once = Once::new();

impl Log for CapturingLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

/// Install the capturing logger (idempotent).
pub(crate) fn capture_logs() {
    INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
}

/// Captured records whose message contains `needle`.
pub(crate) fn logged(needle: &str) -> Vec<(Level, String)> {
    LOGGER
        .records
        .lock()
        .map(|r| r.iter().filter(|(_, m)| m.contains(needle)).cloned().collect())
        .unwrap_or_default()
}
