//! Wire protocol
//!
//! Text, line-oriented, one command cycle at a time:
//!
//! ```text
//!   Client: SEND / alice / bob / Hi / Hello / .
//!   Server: OK
//!   Client: LIST / bob
//!   Server: OK / messages: 1 / 1
//!   Client: QUIT
//!   (server closes the connection)
//! ```
//!
//! ## Module layout
//!
//! - `connection` -- line framing over the client byte stream
//! - `command` -- verb parsing
//! - `response` -- the `OK`/`ERR` envelope
//! - `dispatcher` -- one command cycle: verb, handler, reply
//! - `handlers/` -- one file per command (SEND, LIST, READ, DEL)

mod command;
mod connection;
mod dispatcher;
mod handlers;
mod response;

pub use command::Command;
pub use connection::{Connection, MAX_LINE_LEN};
pub use dispatcher::{Flow, dispatch};
pub use response::{INVALID_COMMAND, Response, STATUS_ERR, STATUS_OK};
