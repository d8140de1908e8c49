//! Error types for Burrow
//!
//! This module defines the SOCKS5 error taxonomy and the protocol reply
//! codes used throughout the proxy engine.

use crate::socks::Direction;
use std::io;
use thiserror::Error;

/// Errors produced while driving one SOCKS5 session
#[derive(Error, Debug)]
pub enum Socks5Error {
    /// IO error on the client or target socket
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Client greeting did not match the expected SOCKS5 shape
    #[error("malformed greeting: {0}")]
    MalformedGreeting(&'static str),

    /// Unsupported SOCKS version byte
    #[error("unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// No authentication method offered by the client is usable
    #[error("no acceptable authentication method")]
    NoAcceptableMethod,

    /// Sub-negotiation message carried the wrong version byte
    #[error("unsupported auth sub-negotiation version: {0}")]
    UnsupportedAuthVersion(u8),

    /// Username or password field with an out-of-range length
    #[error("invalid credential length: {0}")]
    InvalidCredentialLength(usize),

    /// Supplied credentials did not match the configured pair
    #[error("authentication failed")]
    AuthFailed,

    /// Command outside the supported set (only CONNECT is implemented)
    #[error("command not supported: {0}")]
    CommandNotSupported(u8),

    /// Address type outside IPv4/IPv6/domain
    #[error("address type not supported: {0}")]
    AddressTypeNotSupported(u8),

    /// Domain name field that cannot name a target
    #[error("invalid domain name: {0}")]
    InvalidDomain(String),

    /// Dialing the requested target failed
    #[error("failed to connect to {host}: {source}")]
    Connect {
        /// Target in host:port form
        host: String,
        /// Underlying dial error
        source: io::Error,
    },

    /// A relay direction failed after the tunnel was established
    #[error("relay {direction} failed: {source}")]
    Relay {
        /// Direction that reported the failure
        direction: Direction,
        /// Underlying copy error
        source: io::Error,
    },
}

impl Socks5Error {
    /// Negative reply owed to the client before the session is torn down.
    ///
    /// Errors detected before enough protocol context exists (bad version,
    /// raw IO failures) return `None` and the session just closes.
    pub fn reply_code(&self) -> Option<ReplyCode> {
        match self {
            Socks5Error::CommandNotSupported(_) => Some(ReplyCode::CommandNotSupported),
            Socks5Error::AddressTypeNotSupported(_) => Some(ReplyCode::AddressTypeNotSupported),
            _ => None,
        }
    }
}

/// Reply codes for the SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<ReplyCode> for u8 {
    fn from(code: ReplyCode) -> Self {
        code as u8
    }
}
