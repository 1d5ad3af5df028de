//! Cooperative cancellation of file workers
//!
//! Every worker asks the coordinator for its own shutdown receiver before it
//! starts reading. Triggering shutdown fires all of them at once; workers
//! check their receiver between lines, so whatever they already emitted
//! stays valid.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, oneshot};
use tracing::{error, info, warn};

/// Hands out and fires shutdown signals
#[derive(Clone, Default)]
pub struct ShutdownCoordinator {
    /// Senders for every receiver handed out and not yet fired
    shutdown_signals: Arc<Mutex<Vec<oneshot::Sender<()>>>>,

    /// Whether shutdown has been triggered
    shutting_down: Arc<RwLock<bool>>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shutdown signal receiver.
    ///
    /// A receiver created after shutdown was triggered fires immediately.
    pub async fn create_shutdown_signal(&self) -> oneshot::Receiver<()> {
        let (sender, receiver) = oneshot::channel();
        let mut signals = self.shutdown_signals.lock().await;
        if *self.shutting_down.read().await {
            let _ = sender.send(());
        } else {
            signals.push(sender);
        }
        receiver
    }

    /// Fire every outstanding shutdown signal
    pub async fn trigger(&self) {
        // Lock order (signals, then flag) matches create_shutdown_signal.
        let mut signals = self.shutdown_signals.lock().await;
        let mut shutting_down = self.shutting_down.write().await;
        if *shutting_down {
            warn!("Shutdown already in progress");
            return;
        }
        *shutting_down = true;
        drop(shutting_down);

        let count = signals.len();
        for sender in signals.drain(..) {
            let _ = sender.send(());
        }
        info!(workers = count, "Shutdown signalled to file workers");
    }

    /// Check if shutdown is in progress
    pub async fn is_shutting_down(&self) -> bool {
        *self.shutting_down.read().await
    }

    /// Trigger shutdown on SIGINT or SIGTERM
    pub fn setup_signal_handlers(&self) -> Result<()> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigterm = signal(SignalKind::terminate())?;
            let coordinator = self.clone();
            tokio::spawn(async move {
                if sigterm.recv().await.is_none() {
                    error!("Signal stream for SIGTERM was closed");
                    return;
                }
                warn!("Received SIGTERM, stopping file workers");
                coordinator.trigger().await;
            });
        }

        let coordinator = self.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
                return;
            }
            warn!("Received Ctrl-C, stopping file workers");
            coordinator.trigger().await;
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_fires_every_receiver() {
        let coordinator = ShutdownCoordinator::new();
        let first = coordinator.create_shutdown_signal().await;
        let second = coordinator.create_shutdown_signal().await;
        assert!(!coordinator.is_shutting_down().await);

        coordinator.trigger().await;

        assert!(coordinator.is_shutting_down().await);
        assert!(first.await.is_ok());
        assert!(second.await.is_ok());
    }

    #[tokio::test]
    async fn test_receiver_created_after_trigger_fires_immediately() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.trigger().await;
        coordinator.trigger().await;

        let late = coordinator.create_shutdown_signal().await;
        assert!(late.await.is_ok());
    }
}
