//! Per-connection relay sessions.
//!
//! A relay session owns one accepted connection and its paired outbound
//! connection. It waits on readability of both sockets, feeds received
//! bytes through per-direction segment reassembly, and forwards assembled
//! units to the opposite peer. Any fatal error, either peer's end-of-stream,
//! or shutdown cancellation closes both sockets together.

use std::fmt;

use log::{debug, warn};
use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWrite},
    net::TcpStream,
    select,
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::RelayConfig,
    forward::forward,
    reassembly::{Assembly, ChunkBuffer, ReassemblyError, SEGMENT_BUFFER_CAPACITY},
};

/// One of the two independent byte streams of a relayed connection.
///
/// Each direction carries its own reassembly state; a connection is two
/// byte streams, not one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Bytes flowing from the accepted client towards the destination.
    ClientToTarget,
    /// Bytes flowing from the destination back to the client.
    TargetToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::ClientToTarget => "client->target",
            Direction::TargetToClient => "target->client",
        })
    }
}

/// Errors that end a single relay session.
///
/// All of these are local to one session: they close that session's two
/// sockets and never affect sibling connections.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The outbound connection to the destination could not be established.
    #[error("connect to destination failed: {0}")]
    Connect(#[source] std::io::Error),
    /// Reading from one of the endpoints failed.
    #[error("receive failed: {0}")]
    Receive(#[source] std::io::Error),
    /// Writing to one of the endpoints failed.
    #[error("send failed: {0}")]
    Send(#[source] std::io::Error),
    /// The peer socket accepted fewer bytes than the assembled chunk holds.
    #[error("partial write: {sent} of {expected} bytes accepted")]
    PartialWrite {
        /// Bytes the socket accepted.
        sent: usize,
        /// Bytes the assembled chunk holds.
        expected: usize,
    },
    /// Segment accumulation failed.
    #[error(transparent)]
    Reassembly(#[from] ReassemblyError),
}

/// Relay one accepted connection until end-of-stream, a fatal error, or
/// shutdown cancellation.
///
/// Opens the outbound connection first; if that fails the accepted stream
/// is dropped and the session never starts. There is no retry at any level.
///
/// # Errors
///
/// Returns [`RelayError::Connect`] when the outbound connection fails, and
/// any [`RelayError`] a transfer step raises afterwards.
pub async fn run_relay(
    source: TcpStream,
    config: &RelayConfig,
    shutdown: CancellationToken,
) -> Result<(), RelayError> {
    let destination = TcpStream::connect(config.destination)
        .await
        .map_err(RelayError::Connect)?;
    debug!("connected to destination {}", config.destination);
    relay_streams(source, destination, config.verbose, shutdown).await
}

#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
async fn relay_streams(
    source: TcpStream,
    destination: TcpStream,
    verbose: bool,
    shutdown: CancellationToken,
) -> Result<(), RelayError> {
    let (mut source_read, mut source_write) = source.into_split();
    let (mut destination_read, mut destination_write) = destination.into_split();
    let mut inbound = ChunkBuffer::default();
    let mut outbound = ChunkBuffer::default();
    let mut inbound_scratch = [0u8; SEGMENT_BUFFER_CAPACITY];
    let mut outbound_scratch = [0u8; SEGMENT_BUFFER_CAPACITY];

    loop {
        // A waiting buffer always has room: a gated segment flushes once its
        // declared length (at most the capacity) has accumulated.
        let inbound_room = inbound.remaining();
        let outbound_room = outbound.remaining();
        debug_assert!(inbound_room > 0, "inbound buffer wedged with no room");
        debug_assert!(outbound_room > 0, "outbound buffer wedged with no room");

        select! {
            biased;

            () = shutdown.cancelled() => {
                debug!("shutdown requested; closing session");
                return Ok(());
            }
            read = source_read.read(&mut inbound_scratch[..inbound_room]) => {
                let received = read.map_err(RelayError::Receive)?;
                if received == 0 {
                    log_end_of_stream(Direction::ClientToTarget, &inbound, &outbound);
                    return Ok(());
                }
                transfer(
                    &mut inbound,
                    &inbound_scratch[..received],
                    &mut destination_write,
                    Direction::ClientToTarget,
                    verbose,
                )
                .await?;
            }
            read = destination_read.read(&mut outbound_scratch[..outbound_room]) => {
                let received = read.map_err(RelayError::Receive)?;
                if received == 0 {
                    log_end_of_stream(Direction::TargetToClient, &inbound, &outbound);
                    return Ok(());
                }
                transfer(
                    &mut outbound,
                    &outbound_scratch[..received],
                    &mut source_write,
                    Direction::TargetToClient,
                    verbose,
                )
                .await?;
            }
        }
    }
}

/// Drive one direction's transfer step: reassemble, then forward if a unit
/// completed.
async fn transfer<W>(
    buffer: &mut ChunkBuffer,
    received: &[u8],
    writer: &mut W,
    direction: Direction,
    verbose: bool,
) -> Result<(), RelayError>
where
    W: AsyncWrite + Unpin,
{
    match buffer.push(received)? {
        Assembly::Ready(chunk) => forward(writer, &chunk, direction, verbose).await,
        Assembly::Pending => {
            debug!(
                "{direction} holding {held} bytes until the segment completes",
                held = buffer.len()
            );
            Ok(())
        }
    }
}

fn log_end_of_stream(direction: Direction, inbound: &ChunkBuffer, outbound: &ChunkBuffer) {
    let discarded = inbound.len() + outbound.len();
    if discarded > 0 {
        warn!("{direction} reached end of stream; discarding {discarded} buffered bytes");
    } else {
        debug!("{direction} reached end of stream; closing session");
    }
}
