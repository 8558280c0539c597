//! Command dispatch
//!
//! Reads one verb, routes it to its handler and writes the reply.
//! Handler failures become `ERR` and the session carries on; only a
//! dead stream, cancellation or QUIT ends it.

use super::handlers::{handle_del, handle_list, handle_read, handle_send};
use super::{Command, Connection, Response};
use crate::error::{Error, Result};
use crate::spool::Spool;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

/// What the session should do after a command cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// QUIT received; close without replying.
    Quit,
}

/// Run one command cycle.
///
/// # Errors
///
/// Returns `Err` only for errors that end the session (see
/// [`Error::ends_session`]).
pub async fn dispatch<S: AsyncRead + AsyncWrite + Unpin + Send>(
    conn: &mut Connection<S>,
    spool: &Spool,
) -> Result<Flow> {
    let verb = conn.read_line().await?;

    let Some(command) = Command::parse(&verb) else {
        debug!("Unrecognised command {:?}", verb);
        conn.write_all(&Response::InvalidCommand.render()).await?;
        return Ok(Flow::Continue);
    };

    let outcome = match command {
        Command::Send => handle_send(conn, spool).await,
        Command::List => handle_list(conn, spool).await,
        Command::Read => handle_read(conn, spool).await,
        Command::Del => handle_del(conn, spool).await,
        Command::Quit => return Ok(Flow::Quit),
    };

    let response = match outcome {
        Ok(response) => response,
        Err(e) if e.ends_session() => return Err(e),
        Err(e) => {
            log_failure(command, &e);
            Response::Err
        }
    };

    conn.write_all(&response.render()).await?;
    Ok(Flow::Continue)
}

fn log_failure(command: Command, error: &Error) {
    match error {
        Error::Io(_)
        | Error::Json(_)
        | Error::Malformed(_)
        | Error::DuplicateId { .. }
        | Error::IdsExhausted(_) => {
            warn!("{} failed: {}", command, error);
        }
        _ => debug!("{} rejected: {}", command, error),
    }
}
