//! Line-oriented I/O over one client byte stream
//!
//! [`Connection`] owns the buffered stream for the whole session and
//! hands out one owned `String` per line. Every read and every write
//! races the session's cancellation token (and the optional idle
//! deadline), so a shutdown abandons a half-read command or a client
//! that stopped reading promptly.

use crate::error::{Error, Result};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Longest accepted line in bytes, terminator included.
pub const MAX_LINE_LEN: usize = 1024;

/// A client byte stream with line framing.
pub struct Connection<S> {
    stream: BufReader<S>,
    cancel: CancellationToken,
    idle_timeout: Option<Duration>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    pub fn new(stream: S, cancel: CancellationToken) -> Self {
        Self {
            stream: BufReader::new(stream),
            cancel,
            idle_timeout: None,
        }
    }

    /// Fail reads and writes that wait longer than `limit`.
    #[must_use]
    pub fn with_idle_timeout(mut self, limit: Option<Duration>) -> Self {
        self.idle_timeout = limit;
        self
    }

    /// Read the next line with at most one `\n` or `\r\n` stripped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Disconnected`] when the peer has closed the
    /// stream, [`Error::Cancelled`] once the session's token fires, and
    /// [`Error::TimedOut`] when the idle deadline passes. A line longer
    /// than [`MAX_LINE_LEN`] yields [`Error::LineTooLong`].
    pub async fn read_line(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        let read = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(Error::Cancelled),
            read = read_raw(&mut self.stream, self.idle_timeout, &mut buf) => read?,
        };
        if read == 0 {
            return Err(Error::Disconnected);
        }
        if read == MAX_LINE_LEN && buf.last() != Some(&b'\n') {
            return Err(Error::LineTooLong(MAX_LINE_LEN));
        }

        let line = strip_terminator(buf);
        debug!("<- {:?}", line);
        Ok(line)
    }

    /// Write `text` as-is and flush.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the stream fails. Gives up with
    /// [`Error::Cancelled`] or [`Error::TimedOut`] when a peer that
    /// stopped reading keeps the write blocked.
    pub async fn write_all(&mut self, text: &str) -> Result<()> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::Cancelled),
            written = write_raw(self.stream.get_mut(), self.idle_timeout, text.as_bytes()) => written,
        }
    }

    /// Write `line` followed by `\n` and flush.
    ///
    /// # Errors
    ///
    /// See [`Connection::write_all`].
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        let mut text = String::with_capacity(line.len() + 1);
        text.push_str(line);
        text.push('\n');
        self.write_all(&text).await
    }

    /// Shut down the write half and release the stream.
    ///
    /// Consumes the connection, so it can only happen once.
    pub async fn close(self) {
        let mut stream = self.stream.into_inner();
        if let Err(e) = stream.shutdown().await {
            debug!("Shutdown failed: {}", e);
        }
    }
}

async fn read_raw<S: AsyncRead + Unpin>(
    stream: &mut BufReader<S>,
    idle_timeout: Option<Duration>,
    buf: &mut Vec<u8>,
) -> Result<usize> {
    let mut limited = (&mut *stream).take(MAX_LINE_LEN as u64);
    let read = limited.read_until(b'\n', buf);
    match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, read)
            .await
            .map_err(|_| Error::TimedOut)?
            .map_err(Error::Transport),
        None => read.await.map_err(Error::Transport),
    }
}

async fn write_raw<S: AsyncWrite + Unpin>(
    stream: &mut S,
    idle_timeout: Option<Duration>,
    bytes: &[u8],
) -> Result<()> {
    let write = async {
        stream.write_all(bytes).await?;
        stream.flush().await
    };
    match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, write)
            .await
            .map_err(|_| Error::TimedOut)?
            .map_err(Error::Transport),
        None => write.await.map_err(Error::Transport),
    }
}

fn strip_terminator(mut buf: Vec<u8>) -> String {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
