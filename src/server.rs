//! TCP front end
//!
//! Accepts connections and runs one [`Session`] task per client, all
//! sharing one [`Spool`]. Cancelling the token passed to
//! [`Server::run`] stops the accept loop and every live session; `run`
//! returns once they have all shut their streams.

use crate::config::ServerConfig;
use crate::error::Result;
use crate::session::Session;
use crate::spool::Spool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A bound mail spool server.
pub struct Server {
    listener: TcpListener,
    spool: Arc<Spool>,
    idle_timeout: Option<Duration>,
}

impl Server {
    /// Open the spool and bind to `config.host:config.port`.
    ///
    /// Port `0` lets the OS pick a free port; see
    /// [`Server::local_addr`].
    ///
    /// # Errors
    ///
    /// Returns an error if the spool cannot be opened or the address
    /// cannot be bound.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let spool = Spool::open(&config.spool_dir).await?;
        let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
        info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            spool: Arc::new(spool),
            idle_timeout: config.idle_timeout,
        })
    }

    /// The address the server is listening on.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be queried.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve clients until `cancel` fires.
    ///
    /// An accept failure stops the server after the live sessions have
    /// been cancelled and drained.
    ///
    /// # Errors
    ///
    /// Returns the accept error that stopped the server.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let mut sessions = JoinSet::new();

        let outcome = loop {
            tokio::select! {
                () = cancel.cancelled() => break Ok(()),
                accepted = self.listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!("Accept failed: {}", e);
                            break Err(e.into());
                        }
                    };
                    info!("Client connected from {}", addr);
                    let session = Session::new(stream, Arc::clone(&self.spool), cancel.child_token())
                        .with_peer(addr.to_string())
                        .with_idle_timeout(self.idle_timeout);
                    sessions.spawn(session.run());
                }
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = joined {
                        warn!("Session task failed: {}", e);
                    }
                }
            }
        };

        drop(self.listener);
        cancel.cancel();
        while let Some(joined) = sessions.join_next().await {
            match joined {
                Ok(end) => debug!("Session drained: {:?}", end),
                Err(e) => warn!("Session task failed: {}", e),
            }
        }
        info!("Server stopped");
        outcome
    }
}
