//! Session handler
//!
//! Drives one accepted connection through the full SOCKS5 lifecycle:
//! negotiation, request parsing, and command dispatch.

use super::auth::negotiate;
use super::connect::handle_connect;
use super::reply::send_reply;
use super::request::parse_request;
use super::types::SocksCommand;
use crate::config::Credentials;
use crate::error::{ReplyCode, Socks5Error};
use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

/// Handle one SOCKS5 session from greeting to relay teardown.
///
/// The phases run strictly in order; every failure is local to this session
/// and leaves the stream to be closed on drop. Generic over the stream so the
/// whole engine runs against in-memory pipes in tests.
pub async fn handle_session<S>(mut stream: S, credentials: &Credentials) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    negotiate(&mut stream, credentials)
        .await
        .context("authentication negotiation failed")?;

    let request = match parse_request(&mut stream).await {
        Ok(request) => request,
        Err(err) => {
            // The decoder may owe the client a negative reply (bad command
            // or address type) before the session closes.
            if let Some(code) = err.reply_code() {
                send_reply(&mut stream, code, None).await?;
            }
            return Err(err).context("failed to parse request");
        }
    };

    info!("{} request to {}", request.command, request.target);

    match request.command {
        SocksCommand::Connect => handle_connect(stream, request.target).await,
        SocksCommand::Bind | SocksCommand::UdpAssociate => {
            warn!("{} command not supported", request.command);
            send_reply(&mut stream, ReplyCode::CommandNotSupported, None).await?;
            Err(Socks5Error::CommandNotSupported(request.command.to_byte()).into())
        }
    }
}
