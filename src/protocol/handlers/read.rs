//! READ command handler.
//!
//! Takes a mailbox name and a message id and replies with the stored
//! body lines. The message is left in place.

use super::read_target;
use crate::error::Result;
use crate::protocol::{Connection, Response};
use crate::spool::Spool;
use tokio::io::{AsyncRead, AsyncWrite};

/// Handle the READ command.
///
/// # Errors
///
/// Returns the validation or storage error to be answered with `ERR`,
/// or a transport error that ends the session.
pub async fn handle_read<S: AsyncRead + AsyncWrite + Unpin + Send>(
    conn: &mut Connection<S>,
    spool: &Spool,
) -> Result<Response> {
    let (user, id) = read_target(conn, spool).await?;
    let mail = spool.read(&user, id).await?;
    Ok(Response::Ok(mail.body().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::protocol::handlers::test_support::{connection, deliver, spool};

    #[tokio::test]
    async fn returns_body() {
        let (spool, _dir) = spool().await;
        deliver(&spool, "bob", "Hi", &["Hello", "", "Bye"]).await;
        let mut conn = connection("bob\n1\n");

        let response = handle_read(&mut conn, &spool).await.unwrap();

        assert_eq!(response.render(), "OK\nHello\n\nBye\n");
    }

    #[tokio::test]
    async fn reading_does_not_remove() {
        let (spool, _dir) = spool().await;
        deliver(&spool, "bob", "Hi", &["Hello"]).await;

        for _ in 0..2 {
            let mut conn = connection("bob\n1\n");
            assert!(handle_read(&mut conn, &spool).await.is_ok());
        }
    }

    #[tokio::test]
    async fn picks_the_requested_id() {
        let (spool, _dir) = spool().await;
        deliver(&spool, "bob", "one", &["first"]).await;
        deliver(&spool, "bob", "two", &["second"]).await;
        let mut conn = connection("bob\n2\n");

        let response = handle_read(&mut conn, &spool).await.unwrap();

        assert_eq!(response, Response::Ok(vec!["second".into()]));
    }

    #[tokio::test]
    async fn missing_id_fails() {
        let (spool, _dir) = spool().await;
        deliver(&spool, "bob", "Hi", &[]).await;
        let mut conn = connection("bob\n42\n");

        let err = handle_read(&mut conn, &spool).await.unwrap_err();
        assert!(matches!(err, Error::MessageNotFound { id: 42, .. }));
    }

    #[tokio::test]
    async fn empty_id_fails() {
        let (spool, _dir) = spool().await;
        deliver(&spool, "bob", "Hi", &[]).await;
        let mut conn = connection("bob\n\n");

        let err = handle_read(&mut conn, &spool).await.unwrap_err();
        assert!(matches!(err, Error::InvalidId(_)));
    }

    #[tokio::test]
    async fn unknown_mailbox_fails() {
        let (spool, _dir) = spool().await;
        let mut conn = connection("carol\n1\n");

        let err = handle_read(&mut conn, &spool).await.unwrap_err();
        assert!(matches!(err, Error::UnknownMailbox(_)));
    }
}
