//! Per-direction segment reassembly.
//!
//! Most relayed traffic passes straight through. Chunks classified as gated
//! storage-protocol segments accumulate in a [`ChunkBuffer`] until the
//! declared data segment length has arrived, then flush as a single unit.
//! The buffer is bounded: a header declaring a segment the buffer could
//! never hold is rejected instead of overrunning.

use bytes::{Bytes, BytesMut};
use log::debug;
use thiserror::Error;

use crate::classify::{HeaderClass, classify};

/// Capacity of a per-direction accumulation buffer in bytes.
///
/// Matches the relay's read size, so a single read can never exceed the
/// space left in an empty buffer.
pub const SEGMENT_BUFFER_CAPACITY: usize = 8 * 1024;

/// Errors produced while accumulating a segment.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// The header declared a segment longer than the buffer can ever hold.
    #[error("declared segment of {declared} bytes exceeds buffer capacity of {capacity}")]
    FrameTooLarge {
        /// Segment length the header declared.
        declared: usize,
        /// Fixed capacity of the accumulation buffer.
        capacity: usize,
    },
    /// An append would push the buffer past its fixed capacity.
    #[error("appending {incoming} bytes to {held} held bytes exceeds capacity of {capacity}")]
    CapacityExceeded {
        /// Bytes the caller attempted to append.
        incoming: usize,
        /// Bytes already held in the buffer.
        held: usize,
        /// Fixed capacity of the accumulation buffer.
        capacity: usize,
    },
}

/// Outcome of feeding freshly received bytes into a [`ChunkBuffer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Assembly {
    /// A complete unit; forward these bytes. The buffer is empty again and
    /// the next push starts a fresh classification.
    Ready(Bytes),
    /// A classified segment is still accumulating; forward nothing yet.
    Pending,
}

/// Bounded accumulation buffer for one relay direction.
///
/// Each direction of a relayed connection owns one `ChunkBuffer`; the two
/// never share classification state.
#[derive(Debug)]
pub struct ChunkBuffer {
    buf: BytesMut,
    capacity: usize,
    /// Declared total length, once a gated opcode has been classified.
    gate: Option<usize>,
}

impl Default for ChunkBuffer {
    fn default() -> Self { Self::new(SEGMENT_BUFFER_CAPACITY) }
}

impl ChunkBuffer {
    /// Create an empty buffer bounded at `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
            gate: None,
        }
    }

    /// Bytes that may still be appended without breaching the bound.
    #[must_use]
    pub fn remaining(&self) -> usize { self.capacity - self.buf.len() }

    /// Bytes currently held back from forwarding.
    #[must_use]
    pub fn len(&self) -> usize { self.buf.len() }

    /// Whether the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }

    /// Feed freshly received bytes and decide whether a unit is ready to
    /// forward.
    ///
    /// The leading bytes of a fresh accumulation are classified once;
    /// pass-through chunks flush immediately, while gated segments stay
    /// [`Assembly::Pending`] until the declared length has accumulated.
    /// Bytes the transport coalesced past the declared length are forwarded
    /// as part of the same unit.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::FrameTooLarge`] when a header declares a
    /// segment longer than the buffer capacity, and
    /// [`ReassemblyError::CapacityExceeded`] when the append itself would
    /// overflow the bound.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Assembly, ReassemblyError> {
        if chunk.len() > self.remaining() {
            return Err(ReassemblyError::CapacityExceeded {
                incoming: chunk.len(),
                held: self.buf.len(),
                capacity: self.capacity,
            });
        }
        self.buf.extend_from_slice(chunk);

        if let Some(declared) = self.gate {
            return Ok(self.flush_if_complete(declared));
        }

        match classify(&self.buf) {
            HeaderClass::Passthrough => Ok(Assembly::Ready(self.take())),
            HeaderClass::Incomplete => Ok(Assembly::Pending),
            HeaderClass::ReadCommand { transfer_len } => {
                debug!("read command: expected transfer of {transfer_len} bytes");
                Ok(Assembly::Ready(self.take()))
            }
            HeaderClass::LoginResponse { segment_len } => {
                debug!("login response: data segment of {segment_len} bytes");
                self.gate_on(segment_len)
            }
            HeaderClass::DataIn { segment_len } => {
                debug!("data-in: data segment of {segment_len} bytes");
                self.gate_on(segment_len)
            }
        }
    }

    fn gate_on(&mut self, declared: usize) -> Result<Assembly, ReassemblyError> {
        if declared > self.capacity {
            return Err(ReassemblyError::FrameTooLarge {
                declared,
                capacity: self.capacity,
            });
        }
        self.gate = Some(declared);
        Ok(self.flush_if_complete(declared))
    }

    fn flush_if_complete(&mut self, declared: usize) -> Assembly {
        if self.buf.len() >= declared {
            self.gate = None;
            Assembly::Ready(self.take())
        } else {
            Assembly::Pending
        }
    }

    fn take(&mut self) -> Bytes { self.buf.split().freeze() }
}
