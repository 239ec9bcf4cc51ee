//! First-byte classification of relayed chunks.
//!
//! The relay recognises three storage-protocol headers by their leading
//! opcode byte and reads the declared length field each one carries.
//! Everything else passes through untouched.

use crate::byte_order::{read_network_u24, read_network_u32};

/// Opcode of an iSCSI login response header.
const OPCODE_LOGIN_RESPONSE: u8 = 0x23;
/// Opcode of a SCSI Data-In header.
const OPCODE_DATA_IN: u8 = 0x25;
/// Opcode of a SCSI READ(10) command descriptor block.
const OPCODE_READ_COMMAND: u8 = 0x01;

/// Leading bytes required before the data segment length field (bytes 5..8)
/// can be read.
const SEGMENT_FIELD_END: usize = 8;
/// Leading bytes required before the READ(10) transfer length field
/// (bytes 20..24) can be read.
const TRANSFER_FIELD_END: usize = 24;

/// Classification of a freshly received chunk, derived from its leading
/// bytes.
///
/// Produced by [`classify`] exactly once per accumulation and consumed by
/// the segment reassembler through exhaustive matching. The declared lengths
/// count from the start of the chunk, so header bytes already received are
/// included.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderClass {
    /// The first byte matches no recognised opcode; forward immediately.
    Passthrough,
    /// A recognised opcode whose length field is not fully buffered yet.
    /// Callers keep accumulating and classify again.
    Incomplete,
    /// iSCSI login response carrying a declared data segment length.
    LoginResponse {
        /// Declared data segment length in bytes (24-bit big-endian at
        /// bytes 5..8).
        segment_len: usize,
    },
    /// SCSI Data-In carrying a declared data segment length.
    DataIn {
        /// Declared data segment length in bytes (24-bit big-endian at
        /// bytes 5..8).
        segment_len: usize,
    },
    /// SCSI READ(10). The expected transfer length is surfaced for
    /// diagnostics only and never gates forwarding.
    ReadCommand {
        /// Expected data transfer length (32-bit big-endian at bytes
        /// 20..24).
        transfer_len: u32,
    },
}

/// Inspect the leading bytes of `chunk` and classify it.
///
/// Returns [`HeaderClass::Incomplete`] when the opcode is recognised but the
/// chunk does not yet reach the bytes holding its length field, rather than
/// misreading whatever happens to be there. Never mutates or retains the
/// input.
#[must_use]
pub fn classify(chunk: &[u8]) -> HeaderClass {
    match chunk.first() {
        Some(&OPCODE_LOGIN_RESPONSE) => segment_len(chunk).map_or(
            HeaderClass::Incomplete,
            |segment_len| HeaderClass::LoginResponse { segment_len },
        ),
        Some(&OPCODE_DATA_IN) => segment_len(chunk)
            .map_or(HeaderClass::Incomplete, |segment_len| HeaderClass::DataIn {
                segment_len,
            }),
        Some(&OPCODE_READ_COMMAND) => transfer_len(chunk).map_or(
            HeaderClass::Incomplete,
            |transfer_len| HeaderClass::ReadCommand { transfer_len },
        ),
        _ => HeaderClass::Passthrough,
    }
}

fn segment_len(chunk: &[u8]) -> Option<usize> {
    let field = chunk.get(SEGMENT_FIELD_END - 3..SEGMENT_FIELD_END)?;
    Some(read_network_u24([field[0], field[1], field[2]]) as usize)
}

fn transfer_len(chunk: &[u8]) -> Option<u32> {
    let field = chunk.get(TRANSFER_FIELD_END - 4..TRANSFER_FIELD_END)?;
    Some(read_network_u32([field[0], field[1], field[2], field[3]]))
}
