//! Process shutdown signalling.
//!
//! A cloneable flag backed by a `tokio::sync::watch` channel. Transports
//! select on [`Shutdown::wait`] to stop reading and abort in-flight work.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Shutdown {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Request shutdown. Later calls are no-ops.
    pub fn trigger(&self) {
        self.sender.send_if_modified(|triggered| {
            let changed = !*triggered;
            *triggered = true;
            changed
        });
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as any clone of `self`, so this cannot fail.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }

    /// Trigger on Ctrl-C, or SIGTERM on unix.
    ///
    /// On unix the handlers are registered before this returns, so a signal
    /// delivered before the returned future is first polled is not lost.
    /// Must be called from within a runtime.
    #[cfg(unix)]
    pub fn listen_for_signals(self) -> impl Future<Output = ()> + Send + 'static {
        use tokio::signal::unix::{SignalKind, signal};

        let interrupt = signal(SignalKind::interrupt());
        let terminate = signal(SignalKind::terminate());

        async move {
            tokio::select! {
                _ = recv_or_park(interrupt, "SIGINT") => info!("Received Ctrl-C"),
                _ = recv_or_park(terminate, "SIGTERM") => info!("Received SIGTERM"),
            }
            self.trigger();
        }
    }

    /// Trigger on Ctrl-C.
    #[cfg(not(unix))]
    pub fn listen_for_signals(self) -> impl Future<Output = ()> + Send + 'static {
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl-C"),
                Err(e) => {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            }
            self.trigger();
        }
    }
}

#[cfg(unix)]
async fn recv_or_park(stream: std::io::Result<tokio::signal::unix::Signal>, name: &str) {
    match stream {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            warn!("Failed to listen for {}: {}", name, e);
            std::future::pending::<()>().await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
