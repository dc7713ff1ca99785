//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/vim-fifo/config.json`
//! or from the path passed on the command line (`--config <path>`).  Every
//! key is optional and unknown keys are ignored, so a minimal `{}` file is
//! valid.
//!
//! # Example
//!
//! ```json
//! {
//!   "fifo_path": "~/.cache/vim/fifo/public.fifo",
//!   "retry_backoff_ms": 1000,
//!   "vim": { "binary": "vim", "servername": "VIM" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Pipe location used when neither the caller nor the config names one.
pub const DEFAULT_FIFO_PATH: &str = "~/.cache/vim/fifo/public.fifo";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the listener creates its pipe.  `~` and `$VAR` are expanded.
    pub fifo_path: String,
    /// Pause after a failed open/read cycle before retrying (ms).
    pub retry_backoff_ms: u64,
    /// How to reach the Vim server.
    pub vim: VimConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fifo_path: DEFAULT_FIFO_PATH.into(),
            retry_backoff_ms: 1000,
            vim: VimConfig::default(),
        }
    }
}

/// Settings for the [`VimRemote`](crate::executor::vim::VimRemote) executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VimConfig {
    /// Vim binary used for `--remote-expr`.
    pub binary: String,
    /// `--servername` of the target Vim instance.
    pub servername: String,
}

impl Default for VimConfig {
    fn default() -> Self {
        Self {
            binary: "vim".into(),
            servername: "VIM".into(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// The configured pipe path with `~` and variables expanded.
    pub fn resolved_fifo_path(&self) -> PathBuf {
        expand_path(&self.fifo_path)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

/// Resolve the config directory (`$XDG_CONFIG_HOME/vim-fifo`).
pub fn config_dir() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("vim-fifo")
}

/// Expand `$VAR` / `${VAR}` references, then a leading `~`.
///
/// Unset variables and `~user` forms are left as written.
pub fn expand_path(path: &str) -> PathBuf {
    let expanded = expand_vars(path);
    PathBuf::from(expand_home(&expanded))
}

fn expand_home(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return path.to_string(),
    };
    match dirs::home_dir() {
        Some(home) => format!("{}{}", home.display(), rest),
        None => path.to_string(),
    }
}

fn expand_vars(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        match std::env::var(name) {
            Ok(value) if !name.is_empty() => out.push_str(&value),
            _ => out.push_str(&rest[pos..pos + 1 + consumed]),
        }
        rest = &after[consumed..];
    }
    out.push_str(rest);
    out
}
