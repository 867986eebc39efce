//! Runtime - graceful shutdown and signal handling

use std::sync::Arc;
use tokio::sync::watch;

/// Shutdown latch shared by the server and anything it spawns.
#[derive(Clone)]
pub struct Shutdown {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self { Self::new() }
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender: Arc::new(sender) }
    }

    /// Trigger shutdown. Later calls are no-ops.
    pub fn trigger(&self) {
        self.sender.send_if_modified(|triggered| !std::mem::replace(triggered, true));
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once shutdown has been triggered (immediately if it already was).
    pub async fn wait(&self) {
        let mut rx = self.sender.subscribe();
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

/// Install SIGINT/SIGTERM handlers and return the shutdown handle they trigger.
pub fn install_signal_handlers() -> Shutdown {
    let shutdown = Shutdown::new();
    let handle = shutdown.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        handle.trigger();
    });

    shutdown
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                _ = sigint.recv() => tracing::info!("Received SIGINT"),
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "signal handler install failed, falling back to Ctrl+C");
            ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C"),
        Err(e) => {
            tracing::error!(error = %e, "Ctrl+C handler failed, shutdown only on request");
            std::future::pending::<()>().await;
        }
    }
}
