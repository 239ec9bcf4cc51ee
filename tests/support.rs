//! Shared fixtures for the relay integration tests.

use std::{net::SocketAddr, time::Duration};

use framegate::{RelayConfig, RelayServer};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

/// Upper bound on any single await in the integration tests.
pub const WAIT: Duration = Duration::from_secs(5);

/// A running relay server bound to an ephemeral port.
pub struct RelayHarness {
    /// Address clients connect to.
    pub addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl RelayHarness {
    /// Signal shutdown and wait for the server task to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        self.handle.await.expect("server task join");
    }
}

/// Start a relay listening on an ephemeral loopback port, forwarding to
/// `destination`.
pub async fn start_relay(destination: SocketAddr) -> RelayHarness {
    let config = RelayConfig {
        listen: "127.0.0.1:0".parse().expect("listen address"),
        destination,
        verbose: false,
    };
    let (ready_tx, ready_rx) = oneshot::channel();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = RelayServer::new(config)
        .ready_signal(ready_tx)
        .bind()
        .expect("bind relay listener");
    let addr = server.local_addr().expect("relay local addr");

    let handle = tokio::spawn(async move {
        server
            .run_with_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
            .expect("server run");
    });
    ready_rx.await.expect("server readiness");

    RelayHarness {
        addr,
        stop: stop_tx,
        handle,
    }
}

/// Bind a destination listener on an ephemeral loopback port.
pub async fn target_listener() -> (SocketAddr, TcpListener) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind target");
    let addr = listener.local_addr().expect("target addr");
    (addr, listener)
}

/// Bind and immediately drop a listener, yielding a loopback port with
/// nothing behind it.
pub async fn dead_destination() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    listener.local_addr().expect("local addr")
}
