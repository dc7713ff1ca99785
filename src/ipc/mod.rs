//! Named-pipe transport.
//!
//! [`listener`] reads newline-delimited messages from the pipe on a
//! background thread; [`sender`] is the matching client that writes one.

pub mod listener;
pub mod sender;
