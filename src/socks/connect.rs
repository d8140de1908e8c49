//! CONNECT command handler
//!
//! Dials the requested target, reports the outcome to the client, and hands
//! the established pair to the relay.

use super::relay::relay;
use super::reply::send_reply;
use super::types::TargetAddr;
use crate::error::{ReplyCode, Socks5Error};
use anyhow::Result;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, error, info};

/// Handle a CONNECT request on an authenticated session.
///
/// Dials the target, sends the success reply carrying the outbound socket's
/// local address, and relays until both directions finish. A dial failure is
/// reported to the client as `NetworkUnreachable` and ends the session; it is
/// never retried.
pub async fn handle_connect<S>(mut client: S, target: TargetAddr) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    debug!("connect to {}", target);

    let target_stream = match dial(&target).await {
        Ok(stream) => stream,
        Err(err) => {
            error!("failed to connect to {}: {}", target, err);
            send_reply(&mut client, ReplyCode::NetworkUnreachable, None).await?;
            return Err(Socks5Error::Connect {
                host: target.to_string(),
                source: err,
            }
            .into());
        }
    };

    let local_addr = target_stream.local_addr().ok();
    send_reply(&mut client, ReplyCode::Succeeded, local_addr).await?;

    info!("start proxy with {}", target);
    let (sent, received) = relay(client, target_stream).await?;
    info!(
        "end proxy with {}: {} bytes sent, {} bytes received",
        target, sent, received
    );

    Ok(())
}

/// Dial TCP to the requested target.
///
/// Domain names resolve here, proxy-side; the first resolved address is
/// used. This is the seam to wrap when outbound policy (such as upstream
/// chaining) is layered on top of the protocol engine.
pub async fn dial(target: &TargetAddr) -> io::Result<TcpStream> {
    match target {
        TargetAddr::Ip(addr) => TcpStream::connect(addr).await,
        TargetAddr::Domain(domain, port) => TcpStream::connect((domain.as_str(), *port)).await,
    }
}
