//! SEND command handler.
//!
//! The client follows the verb with three header lines and a body
//! closed by a lone `.`:
//!
//! ```text
//! SEND
//! alice          sender, 1-8 characters
//! bob            receiver, 1-8 characters, names the mailbox
//! Hi             subject, 1-80 characters
//! Hello          body lines, stored verbatim
//! .
//! ```
//!
//! The whole framing is consumed before validation so a rejected SEND
//! leaves the stream positioned at the next verb. Nothing touches the
//! spool until every field has passed.

use crate::error::Result;
use crate::mail::{BODY_TERMINATOR, Mail};
use crate::protocol::{Connection, Response};
use crate::spool::Spool;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// Handle the SEND command. Replies `OK` once the message is stored.
///
/// # Errors
///
/// Returns the validation or storage error to be answered with `ERR`,
/// or a transport error that ends the session.
pub async fn handle_send<S: AsyncRead + AsyncWrite + Unpin + Send>(
    conn: &mut Connection<S>,
    spool: &Spool,
) -> Result<Response> {
    let sender = conn.read_line().await?;
    let receiver = conn.read_line().await?;
    let subject = conn.read_line().await?;

    let mut body = Vec::new();
    loop {
        let line = conn.read_line().await?;
        if line == BODY_TERMINATOR {
            break;
        }
        body.push(line);
    }

    let mail = Mail::new(sender, &receiver, subject, body)?;
    let stored = spool.deliver(&mail).await?;
    debug!("SEND stored {} as id {}", receiver, stored.id);
    Ok(Response::ok())
}
