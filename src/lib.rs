//! **vim-fifo** — run commands in a live Vim from other processes.
//!
//! A background listener owns a named pipe (by default
//! `~/.cache/vim/fifo/public.fifo`).  Clients write one base64-encoded JSON
//! request per line; each request names a working directory and a command
//! with its arguments, and ends up as a single Ex instruction run inside
//! that directory.
//!
//! # Architecture
//!
//! * [`message`] — the wire record and its encoding.
//! * [`escape`] — Vim command-line quoting for arguments.
//! * [`fifo`] — creating, replacing and poking the named pipe.
//! * [`ipc`] — the listener loop and the matching client.
//! * [`dispatch`] — turns a decoded message into one executor call.
//! * [`server`] — start/stop/restart over the listener.
//! * [`shutdown`] — waiting for termination signals in the daemon.
//!
//! The only thing that actually runs commands is the
//! [`traits::CommandExecutor`] trait, so the loop is not coupled to how Vim
//! is reached.  Concrete executors live in [`executor`].

pub mod config;
pub mod dispatch;
pub mod escape;
pub mod executor;
pub mod fifo;
pub mod ipc;
pub mod message;
pub mod server;
pub mod shutdown;
#[cfg(test)]
pub(crate) mod testing;
pub mod traits;
