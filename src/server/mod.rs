//! Accept-and-spawn server for the relay.
//!
//! `RelayServer` binds the configured listen address, accepts connections
//! on a single sequential loop, and spawns one relay session per accepted
//! connection. The typestate `S` tracks whether a listener is bound yet:
//! servers start [`Unbound`] and must call [`RelayServer::bind`] before
//! they can run.
//!
//! No cap on concurrent connections is enforced; every accepted connection
//! gets a session regardless of how many are already active. Bounding the
//! load is the operator's responsibility.

use std::{
    net::{SocketAddr, TcpListener as StdTcpListener},
    sync::Arc,
};

use tokio::{net::TcpListener, sync::oneshot};

use crate::config::RelayConfig;

mod backoff;
pub mod error;
mod runtime;

pub use backoff::BackoffConfig;
pub use error::ServerError;

/// Accept-and-spawn server owning the relay's listening socket.
///
/// Carries a typestate `S` indicating whether it is [`Unbound`] (no TCP
/// listener yet) or [`Bound`]. Only bound servers expose
/// [`run`](RelayServer::run).
pub struct RelayServer<S = Unbound> {
    config: Arc<RelayConfig>,
    backoff: BackoffConfig,
    /// Fired once the accept loop has been started. Single-use: a fresh
    /// sender must be installed for every run.
    ready_tx: Option<oneshot::Sender<()>>,
    state: S,
}

/// Marker indicating the server has not yet bound a listener.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbound;

/// Marker indicating the server is bound to a TCP listener.
#[derive(Debug)]
pub struct Bound {
    pub(crate) listener: Arc<TcpListener>,
}

/// Trait implemented by [`Unbound`] and [`Bound`] to model binding
/// typestate.
pub trait ServerState: sealed::Sealed {}

mod sealed {
    //! Prevent external implementations of [`ServerState`].

    pub trait Sealed {}
    impl Sealed for super::Unbound {}
    impl Sealed for super::Bound {}
}

impl ServerState for Unbound {}
impl ServerState for Bound {}

impl RelayServer<Unbound> {
    /// Create a server for `config` with default back-off settings.
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config: Arc::new(config),
            backoff: BackoffConfig::default(),
            ready_tx: None,
            state: Unbound,
        }
    }

    /// Bind the configured listen address.
    ///
    /// Must be called from within a tokio runtime context, as the listener
    /// is registered with the runtime immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address is in use or invalid,
    /// and [`ServerError::Listen`] if the bound socket cannot be prepared
    /// for accepting connections.
    pub fn bind(self) -> Result<RelayServer<Bound>, ServerError> {
        let std_listener = StdTcpListener::bind(self.config.listen).map_err(ServerError::Bind)?;
        self.bind_existing_listener(std_listener)
    }

    /// Bind to an already-created standard listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Listen`] if the listener cannot be prepared
    /// for accepting connections.
    pub fn bind_existing_listener(
        self,
        std_listener: StdTcpListener,
    ) -> Result<RelayServer<Bound>, ServerError> {
        std_listener
            .set_nonblocking(true)
            .map_err(ServerError::Listen)?;
        let listener = TcpListener::from_std(std_listener).map_err(ServerError::Listen)?;
        Ok(RelayServer {
            config: self.config,
            backoff: self.backoff,
            ready_tx: self.ready_tx,
            state: Bound {
                listener: Arc::new(listener),
            },
        })
    }
}

impl<S: ServerState> RelayServer<S> {
    /// Replace the accept-loop back-off configuration.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Install a readiness signal fired once the accept loop is running.
    #[must_use]
    pub fn ready_signal(mut self, tx: oneshot::Sender<()>) -> Self {
        self.ready_tx = Some(tx);
        self
    }
}

impl RelayServer<Bound> {
    /// The address the listener is actually bound to, or `None` if
    /// retrieving it fails.
    ///
    /// Binding port 0 assigns an ephemeral port; tests use this accessor to
    /// learn it.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> { self.state.listener.local_addr().ok() }
}
