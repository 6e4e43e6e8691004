//! Synchronous handoff channels connecting the pipeline stages.
//!
//! A send does not complete until a receiver has taken the value, so a value
//! counts as delivered only once someone downstream holds it. The channel
//! closes when every [`HandoffSender`] has been dropped; there is no
//! end-of-stream value.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Returned when the receiving side has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("handoff receiver dropped")]
pub struct ReceiverDropped;

struct Parcel<T> {
    item: T,
    taken: oneshot::Sender<()>,
}

/// Sending half. Clone it to give several producers access to one channel.
pub struct HandoffSender<T> {
    tx: mpsc::Sender<Parcel<T>>,
}

/// Receiving half.
pub struct HandoffReceiver<T> {
    rx: mpsc::Receiver<Parcel<T>>,
}

/// Create a new handoff channel.
pub fn channel<T>() -> (HandoffSender<T>, HandoffReceiver<T>) {
    // One slot for the parcel in transit; the sender then waits for the
    // receiver to acknowledge it, which makes the exchange a rendezvous.
    let (tx, rx) = mpsc::channel(1);
    (HandoffSender { tx }, HandoffReceiver { rx })
}

impl<T> HandoffSender<T> {
    /// Hand `item` to a receiver, waiting until it has been taken.
    ///
    /// If this future is dropped after the item entered the channel but before
    /// it was taken, the receiver may still get it.
    pub async fn send(&self, item: T) -> Result<(), ReceiverDropped> {
        let (taken, wait_taken) = oneshot::channel();
        self.tx
            .send(Parcel { item, taken })
            .await
            .map_err(|_| ReceiverDropped)?;
        wait_taken.await.map_err(|_| ReceiverDropped)
    }

    /// Whether the receiving half has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<T> Clone for HandoffSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> std::fmt::Debug for HandoffSender<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoffSender")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<T> HandoffReceiver<T> {
    /// Take the next value, or `None` once all senders are gone and the
    /// channel is drained.
    ///
    /// Cancel safe: if the future is dropped before completing, no value is
    /// lost.
    pub async fn recv(&mut self) -> Option<T> {
        let parcel = self.rx.recv().await?;
        // The sender may have stopped waiting; the value is delivered anyway.
        let _ = parcel.taken.send(());
        Some(parcel.item)
    }

    /// Receive every remaining value until the channel closes.
    pub async fn drain(mut self) -> Vec<T> {
        let mut items = Vec::new();
        while let Some(item) = self.recv().await {
            items.push(item);
        }
        items
    }
}

impl<T> std::fmt::Debug for HandoffReceiver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoffReceiver").finish_non_exhaustive()
    }
}
