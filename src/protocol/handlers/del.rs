//! DEL command handler.
//!
//! Same input as READ; removes the message file instead of returning
//! it.

use super::read_target;
use crate::error::Result;
use crate::protocol::{Connection, Response};
use crate::spool::Spool;
use tokio::io::{AsyncRead, AsyncWrite};

/// Handle the DEL command. Replies `OK` once the file is gone.
///
/// # Errors
///
/// Returns the validation or storage error to be answered with `ERR`,
/// or a transport error that ends the session.
pub async fn handle_del<S: AsyncRead + AsyncWrite + Unpin + Send>(
    conn: &mut Connection<S>,
    spool: &Spool,
) -> Result<Response> {
    let (user, id) = read_target(conn, spool).await?;
    spool.remove(&user, id).await?;
    Ok(Response::ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::protocol::handlers::test_support::{connection, deliver, spool};
    use crate::username::Username;

    #[tokio::test]
    async fn removes_message() {
        let (spool, _dir) = spool().await;
        deliver(&spool, "bob", "one", &[]).await;
        deliver(&spool, "bob", "two", &[]).await;
        let mut conn = connection("bob\n1\n");

        assert_eq!(handle_del(&mut conn, &spool).await.unwrap(), Response::ok());

        let left = spool.list(&Username::parse("bob").unwrap()).await.unwrap();
        assert_eq!(left.iter().map(|m| m.id).collect::<Vec<_>>(), vec![2]);
    }

    #[tokio::test]
    async fn second_delete_fails() {
        let (spool, _dir) = spool().await;
        deliver(&spool, "bob", "one", &[]).await;

        let mut conn = connection("bob\n1\nbob\n1\n");
        handle_del(&mut conn, &spool).await.unwrap();
        let err = handle_del(&mut conn, &spool).await.unwrap_err();

        assert!(matches!(err, Error::MessageNotFound { id: 1, .. }));
    }

    #[tokio::test]
    async fn malformed_id_fails() {
        let (spool, _dir) = spool().await;
        deliver(&spool, "bob", "one", &[]).await;
        let mut conn = connection("bob\none\n");

        let err = handle_del(&mut conn, &spool).await.unwrap_err();
        assert!(matches!(err, Error::InvalidId(_)));
    }

    #[tokio::test]
    async fn unknown_mailbox_fails() {
        let (spool, _dir) = spool().await;
        let mut conn = connection("carol\n1\n");

        let err = handle_del(&mut conn, &spool).await.unwrap_err();
        assert!(matches!(err, Error::UnknownMailbox(_)));
    }
}
