// Intake Shutdown Token

use tokio::sync::watch;

/// Shutdown signal for graceful termination
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for shutdown signal (returns at once if already requested).
    ///
    /// A dropped sender can no longer request shutdown, so the wait then
    /// stays pending forever.
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Shutdown sender
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Signal shutdown to every intake loop holding a token
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a shutdown channel
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_is_observed() {
        let (tx, mut token) = shutdown_channel();
        assert!(!token.is_shutdown());

        tx.shutdown();

        token.wait().await;
        assert!(token.is_shutdown());
        // Late waiters return immediately
        let mut late = token.clone();
        late.wait().await;
    }

    #[tokio::test]
    async fn test_dropped_sender_never_signals() {
        let (tx, mut token) = shutdown_channel();
        drop(tx);

        let waited = tokio::time::timeout(Duration::from_millis(20), token.wait()).await;
        assert!(waited.is_err());
        assert!(!token.is_shutdown());
    }

    #[tokio::test]
    async fn test_shutdown_then_drop_still_observed() {
        let (tx, mut token) = shutdown_channel();
        tx.shutdown();
        drop(tx);

        token.wait().await;
        assert!(token.is_shutdown());
    }
}
