//! The seam between vim-fifo and whatever actually runs commands.
//!
//! The listener and dispatcher only ever talk to a [`CommandExecutor`].
//! Concrete executors live in [`executor`](crate::executor): one that
//! forwards to a Vim server over `--remote-expr`, and a dry-run one that
//! only logs.

/// Something that can run a Vim Ex instruction string.
///
/// The instruction handed over by the
/// [`Dispatcher`](crate::dispatch::Dispatcher) is a single line combining a
/// directory change, the requested command, and a directory restore.
///
/// # Contract
///
/// * [`execute`](CommandExecutor::execute) is called from the listener
///   thread, one instruction at a time, so implementations must be
///   [`Send`] + [`Sync`].
/// * Failures are reported through `Err`; the caller logs them and keeps
///   listening.
pub trait CommandExecutor: Send + Sync {
    /// The error type produced by this executor.
    type Error: std::error::Error + Send + 'static;

    /// Run `instruction` to completion.
    fn execute(&self, instruction: &str) -> Result<(), Self::Error>;
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for std::sync::Arc<E> {
    type Error = E::Error;

    fn execute(&self, instruction: &str) -> Result<(), Self::Error> {
        (**self).execute(instruction)
    }
}
