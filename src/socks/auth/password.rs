//! Username/password sub-negotiation
//!
//! Implements RFC 1929 username/password authentication for SOCKS5.

use crate::config::Credentials;
use crate::error::Socks5Error;
use crate::socks::consts::SOCKS5_AUTH_VERSION;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Sub-negotiation result codes
const AUTH_SUCCESS: u8 = 0x00;
const AUTH_FAILURE: u8 = 0x01;

/// Verify a username/password sub-negotiation against the configured pair.
///
/// # Protocol
///
/// Client sends:
/// ```text
/// +----+------+----------+------+----------+
/// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
/// +----+------+----------+------+----------+
/// | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
/// +----+------+----------+------+----------+
/// ```
///
/// Server responds:
/// ```text
/// +----+--------+
/// |VER | STATUS |
/// +----+--------+
/// | 1  |   1    |
/// +----+--------+
/// ```
///
/// Credentials are compared as raw bytes with plain equality, which is not
/// timing-safe.
pub async fn verify_password<S>(
    stream: &mut S,
    credentials: &Credentials,
) -> Result<(), Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut header = [0u8; 2];
    stream.read_exact(&mut header).await?;

    let version = header[0];
    let username_len = header[1] as usize;

    if version != SOCKS5_AUTH_VERSION {
        send_status(stream, AUTH_FAILURE).await?;
        return Err(Socks5Error::UnsupportedAuthVersion(version));
    }

    if username_len == 0 {
        send_status(stream, AUTH_FAILURE).await?;
        return Err(Socks5Error::InvalidCredentialLength(username_len));
    }

    let mut username = vec![0u8; username_len];
    stream.read_exact(&mut username).await?;

    let mut len_buf = [0u8; 1];
    stream.read_exact(&mut len_buf).await?;
    let password_len = len_buf[0] as usize;

    if password_len == 0 {
        send_status(stream, AUTH_FAILURE).await?;
        return Err(Socks5Error::InvalidCredentialLength(password_len));
    }

    let mut password = vec![0u8; password_len];
    stream.read_exact(&mut password).await?;

    if credentials.matches(&username, &password) {
        send_status(stream, AUTH_SUCCESS).await?;
        debug!(
            "authentication succeeded for {}",
            String::from_utf8_lossy(&username)
        );
        Ok(())
    } else {
        send_status(stream, AUTH_FAILURE).await?;
        warn!(
            "authentication failed for {}",
            String::from_utf8_lossy(&username)
        );
        Err(Socks5Error::AuthFailed)
    }
}

/// Send the sub-negotiation status to the client
async fn send_status<S: AsyncWrite + Unpin>(stream: &mut S, status: u8) -> std::io::Result<()> {
    stream.write_all(&[SOCKS5_AUTH_VERSION, status]).await?;
    stream.flush().await?;
    Ok(())
}
