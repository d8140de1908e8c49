//! Proxy server shell
//!
//! Owns the listening socket and dispatches every accepted connection to an
//! independent session task.

use crate::config::{Credentials, ProxyConfig};
use crate::socks::handle_session;
use anyhow::{Context, Result};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// SOCKS5 proxy server
pub struct Server {
    listener: TcpListener,
    credentials: Arc<Credentials>,
}

impl Server {
    /// Bind the listening socket described by the configuration.
    pub async fn bind(config: ProxyConfig) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen)
            .await
            .with_context(|| format!("Failed to bind {}", config.listen))?;

        info!(
            "listening on {} ({})",
            config.listen,
            if config.credentials.required() {
                "username/password required"
            } else {
                "no authentication"
            }
        );

        Ok(Server {
            listener,
            credentials: Arc::new(config.credentials),
        })
    }

    /// Address the server is actually bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the accept loop.
    ///
    /// Every accepted connection is handled on its own task, so one stalled
    /// client never blocks acceptance. Session errors are logged and
    /// contained; only a fatal `accept` error ends the loop.
    pub async fn serve(self) -> Result<()> {
        loop {
            let (stream, peer) = self
                .listener
                .accept()
                .await
                .context("listener accept failed")?;

            debug!("accepted connection from {}", peer);

            let credentials = self.credentials.clone();
            tokio::spawn(async move {
                if let Err(err) = handle_session(stream, &credentials).await {
                    warn!("session from {} ended with error: {:#}", peer, err);
                }
            });
        }
    }
}
