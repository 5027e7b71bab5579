//! Cooperative cancellation for the dealer and player tasks.
//!
//! A `ShutdownController` owns the signal; every task holds a `ShutdownToken`
//! clone and races `cancelled()` in its `select!` loops. Waits must wake
//! promptly on shutdown, never rely on their timeout alone.

use tokio::sync::watch;
use tracing::info;

/// Owner side of the shutdown signal. Requesting shutdown is idempotent.
pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Hand out a token for a task to observe.
    pub fn token(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Request shutdown. Duplicate requests are ignored.
    pub fn shutdown(&self) {
        let already = *self.tx.borrow();
        if already {
            return;
        }
        info!("shutdown requested");
        let _ = self.tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of the shutdown signal.
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested. A dropped controller counts
    /// as shutdown so no task is left waiting on a dead channel.
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
