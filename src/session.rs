//! Connection session
//!
//! One [`Session`] per client, from greeting to close:
//!
//! ```text
//!   greeting
//!      |
//!   dispatch -> OK / ERR / invalid command -> dispatch -> ...
//!      |
//!   QUIT, peer closed, transport error, idle timeout or cancellation
//!      |
//!   stream shut down (exactly once)
//! ```

use crate::error::Error;
use crate::protocol::{Connection, Flow, dispatch};
use crate::spool::Spool;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Sent once when a client connects.
pub const GREETING: &str = "Welcome to mailspool!\nPlease enter your commands...\n";

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client sent QUIT.
    Quit,
    /// The client closed its side of the stream.
    PeerClosed,
    /// The cancellation token fired.
    Cancelled,
    /// No complete line arrived within the idle timeout.
    TimedOut,
    /// Reading or writing the stream failed.
    TransportError,
}

/// A single client connection.
pub struct Session<S> {
    conn: Connection<S>,
    spool: Arc<Spool>,
    peer: String,
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> Session<S> {
    pub fn new(stream: S, spool: Arc<Spool>, cancel: CancellationToken) -> Self {
        Self {
            conn: Connection::new(stream, cancel),
            spool,
            peer: "client".to_string(),
        }
    }

    /// Label used in log lines, typically the peer address.
    #[must_use]
    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = peer.into();
        self
    }

    /// Fail the session when a line takes longer than `limit` to arrive.
    #[must_use]
    pub fn with_idle_timeout(mut self, limit: Option<Duration>) -> Self {
        self.conn = self.conn.with_idle_timeout(limit);
        self
    }

    /// Greet the client and serve command cycles until the session ends.
    pub async fn run(self) -> SessionEnd {
        let Self {
            mut conn,
            spool,
            peer,
        } = self;

        info!("Session started for {}", peer);

        let end = match conn.write_all(GREETING).await {
            Ok(()) => serve(&mut conn, &spool).await,
            Err(e) => classify(&e),
        };

        match end {
            SessionEnd::TransportError => warn!("Session for {} ended on transport error", peer),
            _ => info!("Session for {} ended: {:?}", peer, end),
        }

        conn.close().await;
        end
    }
}

async fn serve<S: AsyncRead + AsyncWrite + Unpin + Send>(
    conn: &mut Connection<S>,
    spool: &Spool,
) -> SessionEnd {
    loop {
        match dispatch(conn, spool).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => return SessionEnd::Quit,
            Err(e) => return classify(&e),
        }
    }
}

fn classify(error: &Error) -> SessionEnd {
    match error {
        Error::Disconnected => SessionEnd::PeerClosed,
        Error::Cancelled => SessionEnd::Cancelled,
        Error::TimedOut => SessionEnd::TimedOut,
        other => {
            debug!("Session error: {}", other);
            SessionEnd::TransportError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn spool() -> (Arc<Spool>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let spool = Spool::open(temp_dir.path().join("spool")).await.unwrap();
        (Arc::new(spool), temp_dir)
    }

    /// Run a whole session over `input` and return how it ended plus
    /// everything after the greeting.
    async fn run(spool: Arc<Spool>, input: &str) -> (SessionEnd, String) {
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        client.write_all(input.as_bytes()).await.unwrap();
        client.shutdown().await.unwrap();

        let end = Session::new(server, spool, CancellationToken::new())
            .run()
            .await;

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        let out = out
            .strip_prefix(GREETING)
            .expect("greeting first")
            .to_string();
        (end, out)
    }

    #[tokio::test]
    async fn full_scenario() {
        let (spool, _dir) = spool().await;
        let input = "SEND\nalice\nbob\nHi\nHello\n.\n\
                     LIST\nbob\n\
                     READ\nbob\n1\n\
                     DEL\nbob\n1\n\
                     LIST\nbob\n\
                     QUIT\n";

        let (end, out) = run(spool, input).await;

        assert_eq!(end, SessionEnd::Quit);
        assert_eq!(
            out,
            "OK\n\
             OK\nmessages: 1\n1\n\
             OK\nHello\n\
             OK\n\
             OK\nmessages: 0\n"
        );
    }

    #[tokio::test]
    async fn rejected_send_leaves_mailbox_untouched() {
        let (spool, _dir) = spool().await;
        let input = "SEND\nalice\nbob\nHi\nHello\n.\n\
                     SEND\nalicealice9\nbob\nHi\n.\n\
                     LIST\nbob\n\
                     QUIT\n";

        let (_, out) = run(spool, input).await;

        assert_eq!(out, "OK\nERR\nOK\nmessages: 1\n1\n");
    }

    #[tokio::test]
    async fn unknown_mailbox_and_missing_id() {
        let (spool, _dir) = spool().await;
        let input = "LIST\ncarol\n\
                     SEND\nalice\nbob\nHi\nHello\n.\n\
                     READ\nbob\n42\n\
                     DEL\nbob\n42\n\
                     QUIT\n";

        let (_, out) = run(spool, input).await;

        assert_eq!(out, "ERR\nOK\nERR\nERR\n");
    }

    #[tokio::test]
    async fn crlf_input_is_accepted() {
        let (spool, _dir) = spool().await;
        let input = "SEND\r\nalice\r\nbob\r\nHi\r\nHello\r\n.\r\nREAD\r\nbob\r\n1\r\nQUIT\r\n";

        let (_, out) = run(spool, input).await;

        assert_eq!(out, "OK\nOK\nHello\n");
    }

    #[tokio::test]
    async fn peer_close_ends_session() {
        let (spool, _dir) = spool().await;
        let (end, out) = run(spool, "LIST\ncarol\n").await;

        assert_eq!(end, SessionEnd::PeerClosed);
        assert_eq!(out, "ERR\n");
    }

    #[tokio::test]
    async fn peer_close_mid_send_writes_nothing() {
        let (spool, _dir) = spool().await;
        let (end, out) = run(Arc::clone(&spool), "SEND\nalice\nbob\nHi\nHello\n").await;

        assert_eq!(end, SessionEnd::PeerClosed);
        assert!(out.is_empty());
        let bob = crate::Username::parse("bob").unwrap();
        assert!(!spool.mailbox_exists(&bob).await);
    }

    #[tokio::test]
    async fn cancellation_abandons_half_read_command() {
        let (spool, _dir) = spool().await;
        let (mut client, server) = tokio::io::duplex(4096);
        let cancel = CancellationToken::new();

        let session = tokio::spawn(Session::new(server, Arc::clone(&spool), cancel.clone()).run());

        client.write_all(b"SEND\nalice\nbob\n").await.unwrap();
        let mut greeting = vec![0u8; GREETING.len()];
        client.read_exact(&mut greeting).await.unwrap();
        cancel.cancel();

        assert_eq!(session.await.unwrap(), SessionEnd::Cancelled);

        let mut rest = String::new();
        client.read_to_string(&mut rest).await.unwrap();
        assert!(rest.is_empty());
        let bob = crate::Username::parse("bob").unwrap();
        assert!(!spool.mailbox_exists(&bob).await);
    }

    #[tokio::test]
    async fn cancellation_ends_session_blocked_on_a_client_that_never_reads() {
        let (spool, _dir) = spool().await;
        let (mut client, server) = tokio::io::duplex(256);
        let cancel = CancellationToken::new();

        let session = tokio::spawn(Session::new(server, spool, cancel.clone()).run());
        let flooder = tokio::spawn(async move {
            while client.write_all(b"HELO\n").await.is_ok() {}
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let end = tokio::time::timeout(Duration::from_secs(2), session)
            .await
            .expect("session ends after cancellation")
            .unwrap();
        assert_eq!(end, SessionEnd::Cancelled);
        flooder.await.unwrap();
    }

    #[tokio::test]
    async fn overlong_line_ends_session() {
        let (spool, _dir) = spool().await;
        let input = format!("LIST\n{}\n", "b".repeat(crate::protocol::MAX_LINE_LEN * 4));

        let (end, out) = run(spool, &input).await;

        assert_eq!(end, SessionEnd::TransportError);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn idle_timeout_ends_session() {
        let (spool, _dir) = spool().await;
        let (_client, server) = tokio::io::duplex(4096);

        let end = Session::new(server, spool, CancellationToken::new())
            .with_idle_timeout(Some(Duration::from_millis(20)))
            .run()
            .await;

        assert_eq!(end, SessionEnd::TimedOut);
    }
}
