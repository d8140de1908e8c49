//! SOCKS5 authentication negotiation
//!
//! Drives the method-selection handshake as an explicit state machine and
//! hands username/password sub-negotiation to [`password`].

mod password;

pub use password::verify_password;

use super::consts::*;
use crate::config::Credentials;
use crate::error::Socks5Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Authentication method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// No authentication required
    None,
    /// Username/password authentication
    Password,
}

impl AuthMethod {
    /// Convert to SOCKS5 method byte
    pub fn to_byte(self) -> u8 {
        match self {
            AuthMethod::None => SOCKS5_AUTH_METHOD_NONE,
            AuthMethod::Password => SOCKS5_AUTH_METHOD_PASSWORD,
        }
    }

    /// Parse from SOCKS5 method byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            SOCKS5_AUTH_METHOD_NONE => Some(AuthMethod::None),
            SOCKS5_AUTH_METHOD_PASSWORD => Some(AuthMethod::Password),
            _ => None,
        }
    }
}

/// Negotiation states, one transition per state.
///
/// Failure is the `Err` path out of any transition; there is no further
/// reading once a terminal reply has been written.
#[derive(Debug)]
enum NegotiationState {
    /// Waiting for the client greeting
    AwaitGreeting,
    /// Greeting read; pick a method from the client's offer
    SelectMethod(Vec<u8>),
    /// Username/password sub-negotiation in progress
    Authenticating(AuthMethod),
    /// Terminal success
    Authenticated(AuthMethod),
}

/// Run the authentication negotiation for one session.
///
/// 1. Read the greeting and verify the version.
/// 2. Pick the first acceptable method in the client's offer order and reply
///    with it, or reply `0xFF` and fail.
/// 3. If username/password was selected, run the sub-negotiation.
///
/// Returns the negotiated method once the session may proceed to the request.
pub async fn negotiate<S>(
    stream: &mut S,
    credentials: &Credentials,
) -> Result<AuthMethod, Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut state = NegotiationState::AwaitGreeting;

    loop {
        state = match state {
            NegotiationState::AwaitGreeting => {
                NegotiationState::SelectMethod(read_greeting(stream).await?)
            }
            NegotiationState::SelectMethod(methods) => {
                select_method(stream, &methods, credentials).await?
            }
            NegotiationState::Authenticating(method) => {
                verify_password(stream, credentials).await?;
                NegotiationState::Authenticated(method)
            }
            NegotiationState::Authenticated(method) => {
                debug!("negotiated authentication method: {:?}", method);
                return Ok(method);
            }
        };
    }
}

/// Read the client greeting: `VER NMETHODS METHODS(NMETHODS)`.
///
/// The method list is read exact-size, driven by NMETHODS.
async fn read_greeting<S>(stream: &mut S) -> Result<Vec<u8>, Socks5Error>
where
    S: AsyncRead + Unpin,
{
    let mut header = [0u8; 2];
    stream.read_exact(&mut header).await?;

    let version = header[0];
    let num_methods = header[1];

    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version));
    }
    if num_methods == 0 {
        return Err(Socks5Error::MalformedGreeting("empty method list"));
    }

    let mut methods = vec![0u8; num_methods as usize];
    stream.read_exact(&mut methods).await?;

    Ok(methods)
}

/// Reply with the selected method and transition, or reply `0xFF` and fail.
async fn select_method<S>(
    stream: &mut S,
    methods: &[u8],
    credentials: &Credentials,
) -> Result<NegotiationState, Socks5Error>
where
    S: AsyncWrite + Unpin,
{
    let Some(method) = pick_method(methods, credentials) else {
        stream
            .write_all(&[SOCKS5_VERSION, SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE])
            .await?;
        stream.flush().await?;
        return Err(Socks5Error::NoAcceptableMethod);
    };

    stream.write_all(&[SOCKS5_VERSION, method.to_byte()]).await?;
    stream.flush().await?;

    Ok(match method {
        AuthMethod::Password => NegotiationState::Authenticating(method),
        AuthMethod::None => NegotiationState::Authenticated(method),
    })
}

/// Pick the first acceptable method in the client's offer order.
///
/// "No authentication" is acceptable only on an open proxy;
/// username/password only when credentials are configured.
fn pick_method(methods: &[u8], credentials: &Credentials) -> Option<AuthMethod> {
    methods.iter().copied().find_map(|byte| match byte {
        SOCKS5_AUTH_METHOD_NONE if !credentials.required() => Some(AuthMethod::None),
        SOCKS5_AUTH_METHOD_PASSWORD if credentials.required() => Some(AuthMethod::Password),
        _ => None,
    })
}
