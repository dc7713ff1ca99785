//! The FIFO listener loop.
//!
//! Opens the named pipe for reading (which blocks until a writer connects),
//! reads newline-delimited messages and hands each one to a
//! [`Dispatcher`], strictly one at a time and in arrival order.  When the
//! writer closes its end the listener goes back to `open` and waits for the
//! next one.
//!
//! I/O failures never end the loop: they are logged, followed by a fixed
//! back-off, and the whole ensure/open cycle is retried.  The loop only
//! exits once its shutdown flag is set.

use crate::dispatch::Dispatcher;
use crate::fifo::{self, FifoError};
use crate::traits::CommandExecutor;
use log::{debug, error, info, warn};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default pause between failed cycles.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Granularity at which the back-off sleep checks for shutdown.
const BACKOFF_SLICE: Duration = Duration::from_millis(50);

/// How often [`ListenerHandle::stop`] pokes a reader stuck in `open`.
const WAKE_INTERVAL: Duration = Duration::from_millis(20);

/// Errors from a single open/read cycle.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error(transparent)]
    Fifo(#[from] FifoError),
    #[error("failed to open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("read error: {0}")]
    Read(io::Error),
}

/// Reads messages from a FIFO and dispatches them.
pub struct FifoListener<E: CommandExecutor> {
    path: PathBuf,
    dispatcher: Arc<Dispatcher<E>>,
    backoff: Duration,
}

impl<E: CommandExecutor + 'static> FifoListener<E> {
    pub fn new(path: impl AsRef<Path>, dispatcher: Arc<Dispatcher<E>>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            dispatcher,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Override the pause after a failed cycle.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// The filesystem path of the pipe.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the loop on a dedicated thread.
    pub fn spawn(self) -> io::Result<ListenerHandle> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let path = self.path.clone();
        let handle = thread::Builder::new()
            .name("vim-fifo-listener".into())
            .spawn(move || self.run(&flag))?;
        Ok(ListenerHandle {
            path,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Run the loop on the calling thread until `shutdown` is set.
    pub fn run(&self, shutdown: &AtomicBool) {
        info!("listening on {}", self.path.display());
        while !shutdown.load(Ordering::SeqCst) {
            if let Err(e) = self.session(shutdown) {
                error!("fifo error: {}", e);
                if !shutdown.load(Ordering::SeqCst) {
                    warn!("retrying in {:?}", self.backoff);
                }
                sleep_unless_shutdown(self.backoff, shutdown);
            }
        }
        info!("listener on {} stopped", self.path.display());
    }

    /// One ensure/open/read cycle.  Returns `Ok` when the writer hangs up.
    fn session(&self, shutdown: &AtomicBool) -> Result<(), ListenerError> {
        fifo::ensure_fifo(&self.path)?;
        let file = File::open(&self.path).map_err(|source| ListenerError::Open {
            path: self.path.clone(),
            source,
        })?;
        debug!("writer connected");

        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(ListenerError::Read)?;
            if n == 0 {
                debug!("writer disconnected");
                return Ok(());
            }
            let line = String::from_utf8_lossy(&buf);
            if line.trim().is_empty() {
                continue;
            }
            // Errors are already logged by the dispatcher.
            let _ = self.dispatcher.handle(&line);

            if shutdown.load(Ordering::SeqCst) {
                return Ok(());
            }
        }
    }
}

fn sleep_unless_shutdown(total: Duration, shutdown: &AtomicBool) {
    let deadline = Instant::now() + total;
    loop {
        let now = Instant::now();
        if now >= deadline || shutdown.load(Ordering::SeqCst) {
            return;
        }
        thread::sleep(BACKOFF_SLICE.min(deadline - now));
    }
}

/// Handle to the background listener thread.
pub struct ListenerHandle {
    path: PathBuf,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Ask the worker to exit at its next check.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Signal shutdown and wait for the worker to exit.
    ///
    /// A worker parked in a blocking `open` is released by briefly opening
    /// the write end, repeated until it notices the flag.  A writer that
    /// keeps its end open delays this until it closes.
    ///
    /// Returns `Err` if the worker panicked.
    pub fn stop(mut self) -> thread::Result<()> {
        self.shutdown_and_join()
    }

    fn shutdown_and_join(&mut self) -> thread::Result<()> {
        self.shutdown();
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        while !handle.is_finished() {
            if fifo::wake_reader(&self.path) {
                debug!("woke blocked reader on {}", self.path.display());
            }
            thread::sleep(WAKE_INTERVAL);
        }
        handle.join()
    }
}

/// Dropping the handle stops the worker the same way [`ListenerHandle::stop`]
/// does, so the thread never outlives it.
impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if self.shutdown_and_join().is_err() {
            error!("listener on {} panicked", self.path.display());
        }
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::testing::RecordingExecutor;
    use std::fs::OpenOptions;
    use std::io::Write;

    fn spawn_listener(path: &Path) -> (Arc<Dispatcher<RecordingExecutor>>, ListenerHandle) {
        let dispatcher = Arc::new(Dispatcher::new(RecordingExecutor::default()));
        let handle = FifoListener::new(path, Arc::clone(&dispatcher))
            .with_backoff(Duration::from_millis(50))
            .spawn()
            .expect("spawn listener");
        (dispatcher, handle)
    }

    /// Open the pipe for writing, blocking until the listener has it open.
    fn connect(path: &Path) -> File {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !fifo::is_fifo(path) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        OpenOptions::new().write(true).open(path).expect("open writer")
    }

    #[test]
    fn dispatches_messages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("public.fifo");
        let (dispatcher, handle) = spawn_listener(&path);

        {
            let mut w = connect(&path);
            for word in ["one", "two", "three"] {
                let msg = Message::vim_exe("/tmp", vec!["echo".into(), word.into()]);
                writeln!(w, "{}", msg.encode()).unwrap();
            }
        }

        let calls = dispatcher.executor().wait_for_calls(3);
        assert_eq!(calls.len(), 3);
        assert!(calls[0].contains("echo one"));
        assert!(calls[1].contains("echo two"));
        assert!(calls[2].contains("echo three"));

        handle.stop().unwrap();
    }

    #[test]
    fn malformed_line_does_not_stop_listener() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("public.fifo");
        let (dispatcher, handle) = spawn_listener(&path);

        {
            let mut w = connect(&path);
            writeln!(w, "not a message at all").unwrap();
            writeln!(w).unwrap();
            w.write_all(&[0xff, 0xfe, b'\n']).unwrap();
            let msg = Message::vim_exe("/tmp", vec!["echo".into(), "ok".into()]);
            writeln!(w, "{}", msg.encode()).unwrap();
        }

        let calls = dispatcher.executor().wait_for_calls(1);
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("echo ok"));

        handle.stop().unwrap();
    }

    #[test]
    fn reopens_after_writer_disconnects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("public.fifo");
        let (dispatcher, handle) = spawn_listener(&path);

        for round in 0..2 {
            let mut w = connect(&path);
            let msg = Message::vim_exe("/tmp", vec!["echo".into(), format!("r{}", round)]);
            writeln!(w, "{}", msg.encode()).unwrap();
            drop(w);
            dispatcher.executor().wait_for_calls(round + 1);
        }

        let calls = dispatcher.executor().calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].contains("echo r1"));

        handle.stop().unwrap();
    }

    #[test]
    fn stop_releases_reader_blocked_in_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("public.fifo");
        let (_dispatcher, handle) = spawn_listener(&path);

        // Nobody ever writes; the worker sits in `open`.
        thread::sleep(Duration::from_millis(100));
        assert!(!handle.is_finished());

        let started = Instant::now();
        handle.stop().unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn retries_until_path_becomes_usable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("public.fifo");
        // A non-empty directory cannot be replaced, so every cycle fails.
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("blocker"), "x").unwrap();

        let (dispatcher, handle) = spawn_listener(&path);
        thread::sleep(Duration::from_millis(150));
        assert!(!handle.is_finished());
        assert!(!fifo::is_fifo(&path));

        std::fs::remove_dir_all(&path).unwrap();
        let mut w = connect(&path);
        let msg = Message::vim_exe("/", vec!["pwd".into()]);
        writeln!(w, "{}", msg.encode()).unwrap();
        drop(w);
        assert_eq!(dispatcher.executor().wait_for_calls(1).len(), 1);

        handle.stop().unwrap();
    }

    #[test]
    fn dropping_handle_joins_worker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("public.fifo");
        let (dispatcher, handle) = spawn_listener(&path);
        thread::sleep(Duration::from_millis(50));

        drop(handle);
        // The worker held the only other reference to the dispatcher.
        assert_eq!(Arc::strong_count(&dispatcher), 1);
    }
}
