//! Background task applying cart snapshots to storage.
//!
//! Mutations hand a full snapshot to the writer and return immediately.
//! Snapshots are written one at a time in the order they were queued.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use super::{CartItem, CartStore};

enum Command {
    Save(Vec<CartItem>),
    Flush(oneshot::Sender<()>),
}

/// Handle to the writer task. The task exits when every handle is dropped.
#[derive(Clone)]
pub(crate) struct CartWriter {
    tx: mpsc::UnboundedSender<Command>,
}

impl CartWriter {
    /// Spawn the writer on the current tokio runtime.
    pub(crate) fn spawn(store: CartStore) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(store, rx));
        Self { tx }
    }

    /// Queue a snapshot without waiting for it to be written.
    pub(crate) fn schedule(&self, snapshot: Vec<CartItem>) {
        if self.tx.send(Command::Save(snapshot)).is_err() {
            error!("Cart writer has stopped; snapshot dropped");
        }
    }

    /// Wait until every snapshot queued before this call has been written
    /// (or has failed and been logged).
    pub(crate) async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

async fn run(store: CartStore, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Save(snapshot) => match store.save(&snapshot).await {
                Ok(()) => debug!(items = snapshot.len(), "Cart persisted"),
                Err(e) => {
                    let event_id = sentry::capture_error(&e);
                    error!(error = %e, sentry_event_id = %event_id, "Failed to persist cart");
                }
            },
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    debug!("Cart writer stopped");
}
