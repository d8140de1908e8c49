//! SOCKS5 protocol engine
//!
//! Implements the RFC 1928 negotiation and relay pipeline for one accepted
//! connection: authentication, request decoding, target dialing, and the
//! bidirectional byte relay. The server shell in [`crate::server`] feeds
//! accepted sockets into [`handle_session`].

mod auth;
mod connect;
mod consts;
mod handler;
mod relay;
mod reply;
mod request;
mod types;

pub use auth::{negotiate, verify_password, AuthMethod};
pub use connect::{dial, handle_connect};
pub use consts::*;
pub use handler::handle_session;
pub use relay::{relay, Direction, RelayOutcome};
pub use reply::{encode_reply, send_reply};
pub use request::parse_request;
pub use types::{ProxyRequest, SocksCommand, TargetAddr};
