//! Concrete [`CommandExecutor`](crate::traits::CommandExecutor)
//! implementations.
//!
//! [`vim::VimRemote`] forwards instructions to a running Vim server;
//! [`LogExecutor`] only logs them, which is handy for trying out clients.

pub mod vim;

use crate::traits::CommandExecutor;
use log::info;
use std::convert::Infallible;

/// Dry-run executor: logs every instruction and never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogExecutor;

impl CommandExecutor for LogExecutor {
    type Error = Infallible;

    fn execute(&self, instruction: &str) -> Result<(), Infallible> {
        info!("would execute: {}", instruction);
        Ok(())
    }
}
