//! Atomic forwarding of assembled chunks.
//!
//! A chunk that leaves the reassembler is written to the peer socket in one
//! call; the peer either receives the whole unit or the session ends.

use std::fmt::Write as _;

use log::info;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::relay::{Direction, RelayError};

/// Write one assembled chunk to `writer`, requiring the whole chunk to be
/// accepted by a single write.
///
/// A write that accepts fewer bytes than the chunk holds is fatal for the
/// session rather than retried with the remainder. Broken pipes surface as
/// [`std::io::ErrorKind::BrokenPipe`] errors, never as process signals.
/// When `verbose` is set the chunk is hex-dumped to the diagnostic log
/// before writing.
///
/// # Errors
///
/// Returns [`RelayError::Send`] when the write fails and
/// [`RelayError::PartialWrite`] when it accepts only part of the chunk.
pub async fn forward<W>(
    writer: &mut W,
    chunk: &[u8],
    direction: Direction,
    verbose: bool,
) -> Result<(), RelayError>
where
    W: AsyncWrite + Unpin,
{
    if verbose {
        info!(
            "{direction} forwarding {len} bytes\n{dump}",
            len = chunk.len(),
            dump = hex_dump(chunk)
        );
    }

    let sent = writer.write(chunk).await.map_err(RelayError::Send)?;
    if sent != chunk.len() {
        return Err(RelayError::PartialWrite {
            sent,
            expected: chunk.len(),
        });
    }
    Ok(())
}

/// Render `bytes` as offset-prefixed rows of sixteen hex octets.
///
/// # Examples
///
/// ```
/// use framegate::forward::hex_dump;
///
/// assert_eq!(hex_dump(&[0x0A, 0xFF]), "00000000  0a ff");
/// ```
#[must_use]
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (row, line) in bytes.chunks(16).enumerate() {
        if row > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{:08x} ", row * 16);
        for byte in line {
            let _ = write!(out, " {byte:02x}");
        }
    }
    out
}
