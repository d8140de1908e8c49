//! Bidirectional TCP relay
//!
//! Pumps bytes between the client and the target in two concurrent
//! directional loops and joins on both outcomes.

use super::consts::DEFAULT_BUFFER_SIZE;
use crate::error::Socks5Error;
use std::fmt;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Relay direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Bytes flowing from the client to the target
    ClientToTarget,
    /// Bytes flowing from the target to the client
    TargetToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ClientToTarget => write!(f, "client->target"),
            Direction::TargetToClient => write!(f, "target->client"),
        }
    }
}

/// Result of one relay direction
#[derive(Debug)]
pub struct RelayOutcome {
    /// Direction this outcome belongs to
    pub direction: Direction,
    /// Bytes copied before EOF or the error
    pub bytes_copied: u64,
    /// Copy error, if the direction did not end at EOF
    pub error: Option<io::Error>,
}

/// Relay bytes between client and target until both directions terminate.
///
/// Each direction runs in its own task and reports exactly one
/// [`RelayOutcome`] on a shared channel. The call returns only after BOTH
/// outcomes are in, so a half-closed connection still drains the other
/// direction until it also terminates. An errored direction surfaces as a
/// relay failure but does not invalidate the bytes the other direction moved.
///
/// Returns (client->target bytes, target->client bytes) on a clean finish.
pub async fn relay<C, T>(client: C, target: T) -> Result<(u64, u64), Socks5Error>
where
    C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (client_read, client_write) = tokio::io::split(client);
    let (target_read, target_write) = tokio::io::split(target);

    let (outcomes, mut results) = mpsc::channel(2);

    tokio::spawn(pump(
        Direction::ClientToTarget,
        client_read,
        target_write,
        outcomes.clone(),
    ));
    tokio::spawn(pump(
        Direction::TargetToClient,
        target_read,
        client_write,
        outcomes,
    ));

    let mut sent = 0;
    let mut received = 0;
    let mut failure = None;

    // Rendezvous: both directions must report before teardown.
    for _ in 0..2 {
        let Some(outcome) = results.recv().await else {
            // Both pump tasks always report; a closed channel means the
            // runtime is shutting down and there is nothing left to drain.
            break;
        };

        match outcome.direction {
            Direction::ClientToTarget => sent = outcome.bytes_copied,
            Direction::TargetToClient => received = outcome.bytes_copied,
        }

        match outcome.error {
            Some(err) => {
                warn!(
                    "relay {} failed after {} bytes: {}",
                    outcome.direction, outcome.bytes_copied, err
                );
                failure = Some((outcome.direction, err));
            }
            None => debug!(
                "relay {} finished: {} bytes",
                outcome.direction, outcome.bytes_copied
            ),
        }
    }

    match failure {
        Some((direction, source)) => Err(Socks5Error::Relay { direction, source }),
        None => Ok((sent, received)),
    }
}

/// Copy one direction until EOF or error, then report the outcome.
///
/// On clean EOF the write side is shut down so the peer's read loop
/// terminates as well.
async fn pump<R, W>(
    direction: Direction,
    mut reader: R,
    mut writer: W,
    outcomes: mpsc::Sender<RelayOutcome>,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; DEFAULT_BUFFER_SIZE];
    let mut copied = 0u64;

    let error = loop {
        match reader.read(&mut buf).await {
            Ok(0) => break None,
            Ok(n) => match writer.write_all(&buf[..n]).await {
                Ok(()) => copied += n as u64,
                Err(err) => break Some(err),
            },
            Err(err) => break Some(err),
        }
    };

    if error.is_none() {
        let _ = writer.shutdown().await;
    }

    let _ = outcomes
        .send(RelayOutcome {
            direction,
            bytes_copied: copied,
            error,
        })
        .await;
}
