//! Runtime control for [`RelayServer`]: the accept loop, relay-session
//! spawning, and shutdown.

use std::{any::Any, future::Future, sync::Arc};

use futures::FutureExt;
use log::{debug, error, warn};
use tokio::{
    net::{TcpListener, TcpStream},
    select, signal,
    time::sleep,
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{BackoffConfig, Bound, RelayServer, ServerError};
use crate::{config::RelayConfig, relay::run_relay};

impl RelayServer<Bound> {
    /// Run the server until Ctrl+C.
    ///
    /// # Errors
    ///
    /// Infallible once bound; the `Result` keeps the signature stable
    /// should runtime failures become reportable.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await
    }

    /// Run the server until the `shutdown` future resolves.
    ///
    /// The accept loop stops first; active relay sessions are then
    /// cancelled and awaited, closing their sockets, before this returns.
    ///
    /// # Errors
    ///
    /// Infallible once bound; see [`run`](Self::run).
    pub async fn run_with_shutdown<S>(self, shutdown: S) -> Result<(), ServerError>
    where
        S: Future<Output = ()> + Send,
    {
        let RelayServer {
            config,
            backoff,
            ready_tx,
            state: Bound { listener },
        } = self;
        let shutdown_token = CancellationToken::new();
        let tracker = TaskTracker::new();

        tracker.spawn(accept_loop(
            listener,
            config,
            shutdown_token.clone(),
            tracker.clone(),
            backoff,
        ));

        if let Some(tx) = ready_tx
            && tx.send(()).is_err()
        {
            warn!("failed to send readiness signal: receiver dropped");
        }

        shutdown.await;
        shutdown_token.cancel();
        tracker.close();
        tracker.wait().await;
        Ok(())
    }
}

/// Accept connections until shutdown, spawning one relay session each.
///
/// Accept failures log a warning and retry with exponential back-off; a
/// successful accept resets the delay. The loop never waits on the
/// sessions it spawns.
#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
async fn accept_loop(
    listener: Arc<TcpListener>,
    config: Arc<RelayConfig>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    backoff: BackoffConfig,
) {
    let backoff = backoff.normalized();
    let mut delay = backoff.initial_delay;
    loop {
        select! {
            biased;

            () = shutdown.cancelled() => return,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    debug!("accepted connection: peer_addr={peer_addr}");
                    spawn_relay_task(stream, Arc::clone(&config), &shutdown, &tracker);
                    delay = backoff.initial_delay;
                }
                Err(e) => {
                    let local_addr = listener.local_addr().ok();
                    warn!("accept error: error={e:?}, local_addr={local_addr:?}");
                    sleep(delay).await;
                    delay = (delay * 2).min(backoff.max_delay);
                }
            },
        }
    }
}

/// Spawn a task owning one relay session, logging and discarding any panic.
fn spawn_relay_task(
    stream: TcpStream,
    config: Arc<RelayConfig>,
    shutdown: &CancellationToken,
    tracker: &TaskTracker,
) {
    let peer_addr = match stream.peer_addr() {
        Ok(addr) => Some(addr),
        Err(e) => {
            warn!("failed to retrieve peer address: error={e}");
            None
        }
    };
    let token = shutdown.clone();
    tracker.spawn(async move {
        let session = std::panic::AssertUnwindSafe(async {
            if let Err(e) = run_relay(stream, &config, token).await {
                warn!("relay session ended: error={e}, peer_addr={peer_addr:?}");
            }
        })
        .catch_unwind();

        if let Err(panic) = session.await {
            let panic_msg = panic_message(panic.as_ref());
            // Emit via both `log` and `tracing` for tests that capture either.
            error!("relay task panicked: panic={panic_msg}, peer_addr={peer_addr:?}");
            tracing::error!(panic = %panic_msg, ?peer_addr, "relay task panicked");
        }
    });
}

/// Extract a loggable message from a panic payload.
fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        format!("{panic:?}")
    }
}
