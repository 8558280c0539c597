//! LIST command handler.
//!
//! Takes one line, the mailbox name, and replies with the message count
//! followed by one id per line:
//!
//! ```text
//! OK
//! messages: 2
//! 1
//! 3
//! ```

use super::require_mailbox;
use crate::error::Result;
use crate::protocol::{Connection, Response};
use crate::spool::Spool;
use crate::username::Username;
use tokio::io::{AsyncRead, AsyncWrite};

/// Handle the LIST command.
///
/// # Errors
///
/// Returns the validation or storage error to be answered with `ERR`,
/// or a transport error that ends the session.
pub async fn handle_list<S: AsyncRead + AsyncWrite + Unpin + Send>(
    conn: &mut Connection<S>,
    spool: &Spool,
) -> Result<Response> {
    let name = conn.read_line().await?;
    let user = Username::parse(&name)?;
    require_mailbox(spool, &user).await?;

    let messages = spool.list(&user).await?;
    let mut payload = Vec::with_capacity(messages.len() + 1);
    payload.push(format!("messages: {}", messages.len()));
    payload.extend(messages.iter().map(|m| m.id.to_string()));
    Ok(Response::Ok(payload))
}
