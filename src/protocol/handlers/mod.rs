//! Command handlers.
//!
//! Each handler lives in its own module, reads the rest of its command
//! from the [`Connection`](super::Connection) and returns the
//! [`Response`](super::Response) to send. A handler never writes to the
//! stream itself; the dispatcher owns the reply.

mod del;
mod list;
mod read;
mod send;

pub use del::handle_del;
pub use list::handle_list;
pub use read::handle_read;
pub use send::handle_send;

use super::Connection;
use crate::error::{Error, Result};
use crate::spool::Spool;
use crate::username::Username;
use tokio::io::{AsyncRead, AsyncWrite};

/// Read the `username` / `id` pair shared by READ and DEL.
///
/// Both lines are consumed before either is validated, so a bad
/// username does not leave the id line behind to be taken as a verb.
async fn read_target<S: AsyncRead + AsyncWrite + Unpin + Send>(
    conn: &mut Connection<S>,
    spool: &Spool,
) -> Result<(Username, u64)> {
    let name = conn.read_line().await?;
    let raw_id = conn.read_line().await?;

    let user = Username::parse(&name)?;
    let id = parse_id(&raw_id)?;
    require_mailbox(spool, &user).await?;
    Ok((user, id))
}

async fn require_mailbox(spool: &Spool, user: &Username) -> Result<()> {
    if spool.mailbox_exists(user).await {
        Ok(())
    } else {
        Err(Error::UnknownMailbox(user.to_string()))
    }
}

fn parse_id(raw: &str) -> Result<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidId(raw.to_string()));
    }
    raw.parse().map_err(|_| Error::InvalidId(raw.to_string()))
}
