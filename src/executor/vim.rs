//! [`CommandExecutor`] backed by Vim's client-server feature.
//!
//! Each instruction is sent with
//! `vim --servername <name> --remote-expr "execute('<instruction>')"`.
//! `--remote-expr` waits for the server to evaluate the expression, so a
//! failing Ex command surfaces as a non-zero exit status here.

use crate::config::VimConfig;
use crate::escape::double_quotes;
use crate::traits::CommandExecutor;
use log::debug;
use std::process::Command;

/// Forwards instructions to a Vim server process.
#[derive(Debug, Clone)]
pub struct VimRemote {
    binary: String,
    servername: String,
}

/// Errors from talking to the Vim server.
#[derive(Debug, thiserror::Error)]
pub enum VimRemoteError {
    #[error("failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        source: std::io::Error,
    },
    #[error("vim server {servername} rejected command ({status}): {stderr}")]
    Rejected {
        servername: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

impl VimRemote {
    pub fn new(binary: impl Into<String>, servername: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            servername: servername.into(),
        }
    }

    pub fn from_config(config: &VimConfig) -> Self {
        Self::new(config.binary.clone(), config.servername.clone())
    }

    pub fn servername(&self) -> &str {
        &self.servername
    }

    /// The argument vector passed to the Vim binary for `instruction`.
    fn remote_args(&self, instruction: &str) -> Vec<String> {
        vec![
            "--servername".into(),
            self.servername.clone(),
            "--remote-expr".into(),
            format!("execute('{}')", double_quotes(instruction)),
        ]
    }
}

impl CommandExecutor for VimRemote {
    type Error = VimRemoteError;

    fn execute(&self, instruction: &str) -> Result<(), VimRemoteError> {
        let args = self.remote_args(instruction);
        debug!("{} {:?}", self.binary, args);
        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|source| VimRemoteError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(VimRemoteError::Rejected {
                servername: self.servername.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
