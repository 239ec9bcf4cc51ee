//! Errors raised by [`RelayServer`](super::RelayServer) operations.

use std::io;

use thiserror::Error;

/// Errors that may occur while starting the server.
///
/// Both variants are fatal for the whole process: nothing can proceed
/// without a listening socket.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding the listen address failed (in use or invalid).
    #[error("bind error: {0}")]
    Bind(#[source] io::Error),
    /// Preparing the bound socket for accepting connections failed.
    #[error("listen error: {0}")]
    Listen(#[source] io::Error),
}
