//! The request record that travels over the pipe, and its wire encoding.
//!
//! # Wire format
//!
//! Every message is one line: the standard base64 encoding of a JSON
//! object, followed by `\n`.
//!
//! ```json
//! {"mode":"vim-exe","context":{"pwd":"/tmp/proj"},"arguments":["echo","hello world"]}
//! ```
//!
//! Base64 keeps newlines and control characters inside arguments from
//! colliding with the line framing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// The only mode the dispatcher acts on.
pub const VIM_EXE_MODE: &str = "vim-exe";

/// Working-directory metadata attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Context {
    pub pwd: String,
}

impl Context {
    pub fn new(pwd: impl Into<String>) -> Self {
        Self { pwd: pwd.into() }
    }
}

/// A single remote-command request.
///
/// `mode` is kept as a free-form string: the decoder accepts any tag and
/// leaves rejection of unsupported modes to the
/// [`Dispatcher`](crate::dispatch::Dispatcher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Message {
    pub mode: String,
    pub context: Context,
    pub arguments: Vec<String>,
}

/// Why a line could not be turned into a [`Message`].
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl Message {
    pub fn new(mode: impl Into<String>, context: Context, arguments: Vec<String>) -> Self {
        Self {
            mode: mode.into(),
            context,
            arguments,
        }
    }

    /// Shorthand for a `vim-exe` request.
    pub fn vim_exe(pwd: impl Into<String>, arguments: Vec<String>) -> Self {
        Self::new(VIM_EXE_MODE, Context::new(pwd), arguments)
    }

    /// Serialize to the single-line wire form (without the trailing `\n`).
    pub fn encode(&self) -> String {
        // Serializing plain strings and vectors of strings cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        STANDARD.encode(json)
    }

    /// Parse one line of wire data.
    ///
    /// Surrounding whitespace (including the line terminator) is ignored.
    /// Missing, mistyped, or unknown fields are rejected.
    pub fn decode(line: &str) -> Result<Self, MessageError> {
        let bytes = STANDARD.decode(line.trim())?;
        let json = String::from_utf8(bytes)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Whether the dispatcher knows how to act on this message.
    pub fn is_supported(&self) -> bool {
        self.mode == VIM_EXE_MODE
    }
}

//  Tests
