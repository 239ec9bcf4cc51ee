//! Public API for the `framegate` library.
//!
//! `framegate` is a transparent, protocol-aware TCP relay. It accepts
//! connections on a listen address, opens a matching outbound connection to a
//! fixed destination, and copies bytes in both directions. Chunks whose
//! leading byte identifies an iSCSI/SCSI response header are held back until
//! the full declared data segment has arrived, so the peer always observes
//! those segments whole rather than in whatever pieces the transport
//! delivered.

pub mod byte_order;
pub mod classify;
pub mod config;
pub mod forward;
pub mod reassembly;
pub mod relay;
pub mod server;

pub use classify::HeaderClass;
pub use config::{ConfigError, RelayConfig, parse_addr};
pub use reassembly::{Assembly, ChunkBuffer, ReassemblyError, SEGMENT_BUFFER_CAPACITY};
pub use relay::{Direction, RelayError};
pub use server::{BackoffConfig, RelayServer, ServerError};
