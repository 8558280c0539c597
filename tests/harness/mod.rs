//! In-process mailspool server for integration testing
//!
//! Each [`TestServer`] gets its own temporary spool directory and an
//! OS-assigned port on localhost. Dropping it cancels the server and
//! removes the spool.

#![allow(dead_code)]

use mailspool::{ClientConfig, GREETING, Server, ServerConfig, SpoolClient};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

pub struct TestServer {
    port: u16,
    spool_dir: PathBuf,
    cancel: CancellationToken,
    _temp_dir: TempDir,
}

impl TestServer {
    /// Bind to `127.0.0.1:0` with a fresh spool and start serving.
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let spool_dir = temp_dir.path().join("spool");

        let mut config = ServerConfig::new(&spool_dir);
        config.port = 0;

        let server = Server::bind(&config).await.expect("bind server");
        let port = server.local_addr().expect("local addr").port();

        let cancel = CancellationToken::new();
        tokio::spawn(server.run(cancel.clone()));

        Self {
            port,
            spool_dir,
            cancel,
            _temp_dir: temp_dir,
        }
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    pub fn spool_dir(&self) -> &Path {
        &self.spool_dir
    }

    pub fn client(&self) -> SpoolClient {
        SpoolClient::new(ClientConfig {
            host: "127.0.0.1".to_string(),
            port: self.port,
        })
    }

    /// Send `input` verbatim on a fresh connection and return everything
    /// the server wrote after the greeting, up to the connection close.
    /// The write side is shut after `input`, so the server sees end of
    /// stream if the script does not QUIT.
    pub async fn raw(&self, input: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", self.port))
            .await
            .expect("connect");
        stream.write_all(input.as_bytes()).await.expect("write");
        stream.shutdown().await.expect("half-close");

        let mut out = String::new();
        stream.read_to_string(&mut out).await.expect("read");
        out.strip_prefix(GREETING)
            .expect("greeting comes first")
            .to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
