//! Store-and-forward mail spool
//!
//! A small line-oriented mail service. Clients connect over TCP and
//! issue `SEND`, `LIST`, `READ`, `DEL` and `QUIT`; each message is kept
//! as one file in a per-recipient directory under the spool root.
//!
//! The pieces, leaf first:
//!
//! - [`Spool`] -- mailbox directories, id allocation, message files
//! - [`Mail`] -- the validated message value
//! - [`protocol`] -- line framing, command handlers and dispatch
//! - [`Session`] -- one client from greeting to close
//! - [`Server`] -- TCP accept loop, one task per session
//! - [`SpoolClient`] -- a client for the same protocol

mod client;
mod config;
mod error;
mod mail;
pub mod protocol;
mod server;
mod session;
mod spool;
mod username;

pub use client::SpoolClient;
pub use config::{ClientConfig, ServerConfig};
pub use error::{Error, Result};
pub use mail::{BODY_TERMINATOR, MAX_NAME_LEN, MAX_SUBJECT_LEN, Mail};
pub use protocol::{Command, Response};
pub use server::Server;
pub use session::{GREETING, Session, SessionEnd};
pub use spool::{Spool, StoredMessage};
pub use username::Username;
