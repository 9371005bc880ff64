// src/server/reload.rs

use tokio::sync::broadcast;
use tracing::debug;

/// Payload pushed to browsers on every reload.
pub const RELOAD_MESSAGE: &str = "reload";

/// Fan-out of reload notifications to every connected SSE client.
///
/// Cloning shares the channel. Notifying without listeners is a no-op.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<String>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Tell every connected browser to reload. Fire-and-forget: returns the
    /// number of clients reached.
    pub fn notify_reloadable(&self) -> usize {
        let reached = self.tx.send(RELOAD_MESSAGE.to_string()).unwrap_or(0);
        debug!(clients = reached, "reload broadcast");
        reached
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}
