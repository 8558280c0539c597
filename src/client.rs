//! Mail spool client

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::mail::{BODY_TERMINATOR, Mail};
use crate::protocol::{Command, Response};
use crate::session::GREETING;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Client for a mailspool server.
///
/// Every operation opens its own connection, sends the command followed
/// by `QUIT` and reads the reply until the server closes the stream.
/// That end-of-stream is what delimits a READ payload.
pub struct SpoolClient {
    config: ClientConfig,
}

impl SpoolClient {
    #[must_use]
    pub const fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Submit `mail` to its receiver's mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or the server answers
    /// `ERR`.
    pub async fn send(&self, mail: &Mail) -> Result<()> {
        let mut lines = vec![
            Command::Send.as_str(),
            mail.sender(),
            mail.receiver().as_str(),
            mail.subject(),
        ];
        lines.extend(mail.body().iter().map(String::as_str));
        lines.push(BODY_TERMINATOR);

        self.expect_ok(Command::Send, &lines).await?;
        Ok(())
    }

    /// Ids of the messages in `user`'s mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails, the mailbox does not
    /// exist, or the listing is malformed.
    pub async fn list(&self, user: &str) -> Result<Vec<u64>> {
        let payload = self
            .expect_ok(Command::List, &[Command::List.as_str(), user])
            .await?;
        parse_listing(&payload)
    }

    /// Body lines of message `id` in `user`'s mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or the message does not
    /// exist.
    pub async fn read(&self, user: &str, id: u64) -> Result<Vec<String>> {
        let id = id.to_string();
        self.expect_ok(Command::Read, &[Command::Read.as_str(), user, id.as_str()])
            .await
    }

    /// Delete message `id` from `user`'s mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or the message does not
    /// exist.
    pub async fn delete(&self, user: &str, id: u64) -> Result<()> {
        let id = id.to_string();
        self.expect_ok(Command::Del, &[Command::Del.as_str(), user, id.as_str()])
            .await?;
        Ok(())
    }

    // -- private helpers --

    async fn expect_ok(&self, command: Command, lines: &[&str]) -> Result<Vec<String>> {
        match self.exchange(lines).await? {
            Response::Ok(payload) => Ok(payload),
            Response::Err | Response::InvalidCommand => {
                Err(Error::Rejected(command.as_str().to_string()))
            }
        }
    }

    async fn exchange(&self, lines: &[&str]) -> Result<Response> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        debug!("Connecting to mailspool server at {}", addr);

        let mut stream = TcpStream::connect(&addr).await?;

        let mut request = String::new();
        for line in lines {
            request.push_str(line);
            request.push('\n');
        }
        request.push_str(Command::Quit.as_str());
        request.push('\n');
        stream.write_all(request.as_bytes()).await?;

        let mut raw = String::new();
        stream.read_to_string(&mut raw).await?;

        let reply = raw
            .strip_prefix(GREETING)
            .ok_or_else(|| Error::Protocol("missing greeting".into()))?;
        Response::parse(reply)
    }
}

fn parse_listing(payload: &[String]) -> Result<Vec<u64>> {
    let (header, ids) = payload
        .split_first()
        .ok_or_else(|| Error::Protocol("empty listing".into()))?;
    let count: usize = header
        .strip_prefix("messages: ")
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| Error::Protocol(format!("bad listing header {header:?}")))?;

    let ids = ids
        .iter()
        .map(|id| {
            id.parse()
                .map_err(|_| Error::Protocol(format!("bad message id {id:?}")))
        })
        .collect::<Result<Vec<u64>>>()?;

    if ids.len() != count {
        return Err(Error::Protocol(format!(
            "listing announced {count} messages but carried {}",
            ids.len()
        )));
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(lines: &[&str]) -> Vec<String> {
        lines.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parses_listing() {
        let ids = parse_listing(&payload(&["messages: 2", "1", "3"])).unwrap();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn parses_empty_listing() {
        assert!(parse_listing(&payload(&["messages: 0"])).unwrap().is_empty());
    }

    #[test]
    fn rejects_count_mismatch() {
        assert!(matches!(
            parse_listing(&payload(&["messages: 3", "1"])),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn rejects_bad_header() {
        assert!(parse_listing(&payload(&["count 1", "1"])).is_err());
        assert!(parse_listing(&[]).is_err());
    }
}
