//! Graceful stop for the gate.
//!
//! `main` owns the [`Shutdown`] and fires it on SIGINT/SIGTERM.
//! `HttpServer::run` drains in-flight requests when it fires, and the ban
//! sweeper (a resubscribed receiver) leaves its interval loop.

use tokio::sync::broadcast;

pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver for the server; it resubscribes one for the sweeper.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Stop the server and sweeper. A no-op when nothing is listening.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
