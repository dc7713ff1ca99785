//! Turns one wire line into one executor call.
//!
//! The dispatcher never panics on bad input: malformed lines, unknown modes
//! and executor failures are logged and returned as a [`DispatchError`] so
//! the listener can carry on with the next line.

use crate::escape::{double_quotes, join_arguments};
use crate::message::{Message, MessageError};
use crate::traits::CommandExecutor;
use log::{debug, error, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Why a line did not result in a successful executor call.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("malformed message: {0}")]
    Malformed(#[from] MessageError),
    #[error("unsupported mode: {0}")]
    UnsupportedMode(String),
    #[error("command execution failed: {0}")]
    Executor(String),
}

/// Build the Ex instruction that runs `command` inside `pwd`.
///
/// The window-local directory is switched for the duration of the command
/// and restored in a `finally` block, so it is restored even when the
/// command throws.  `pwd` is passed through `fnameescape()` on the Vim
/// side; here it only needs its quotes doubled.
pub fn build_instruction(pwd: &str, command: &str) -> String {
    format!(
        "try | execute 'lcd ' . fnameescape('{}') | execute '{}' | finally | lcd - | endtry",
        double_quotes(pwd),
        double_quotes(command),
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}

/// Decodes messages and hands them to a [`CommandExecutor`].
pub struct Dispatcher<E: CommandExecutor> {
    executor: E,
}

impl<E: CommandExecutor> Dispatcher<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Handle one line read from the pipe.
    ///
    /// Every failure is logged before it is returned.
    pub fn handle(&self, line: &str) -> Result<(), DispatchError> {
        let msg = match Message::decode(line) {
            Ok(msg) => msg,
            Err(e) => {
                error!("invalid message format: {} ({:?})", e, line.trim());
                return Err(e.into());
            }
        };
        debug!("received {:?}", msg);
        self.dispatch(msg)
    }

    /// Act on an already decoded message.
    pub fn dispatch(&self, msg: Message) -> Result<(), DispatchError> {
        if !msg.is_supported() {
            warn!("unsupported mode: {}", msg.mode);
            return Err(DispatchError::UnsupportedMode(msg.mode));
        }

        let command = join_arguments(&msg.arguments);
        let instruction = build_instruction(&msg.context.pwd, &command);
        debug!("executing {}", instruction);

        // A panicking executor must not take the listener thread down with it.
        match panic::catch_unwind(AssertUnwindSafe(|| self.executor.execute(&instruction))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!("command execution failed: {}", e);
                Err(DispatchError::Executor(e.to_string()))
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                error!("command execution panicked: {}", reason);
                Err(DispatchError::Executor(format!("panicked: {}", reason)))
            }
        }
    }
}
