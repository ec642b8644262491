//! # Rendezvous links.
//!
//! A link moves one item at a time from an [`Offer`] to a [`Take`]. Sending
//! completes only after the receiving side took the item, so at most one item
//! is in flight per direction and a slow receiver backpressures the sender.
//!
//! ```text
//! Offer::send(item)
//!     ├─► mpsc (capacity 1) ── (item, ack) ──► Take::recv()
//!     │                                            └─► ack.send(())
//!     └─► await ack  ◄──────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - `Take::recv` is cancel-safe (it never loses an item it did not return).
//! - `Offer::send` is **not** cancel-safe: dropping it after the item was queued
//!   may still deliver the item. Callers that race a send against other work
//!   keep the send future alive across iterations instead of recreating it.
//! - Either side observes [`LinkClosed`] once its peer is dropped.

use tokio::sync::{mpsc, oneshot};

use crate::error::LinkClosed;

type Slot<T> = (T, oneshot::Sender<()>);

/// Creates a connected rendezvous pair.
pub(crate) fn rendezvous<T>() -> (Offer<T>, Take<T>) {
    let (tx, rx) = mpsc::channel::<Slot<T>>(1);
    (Offer { tx }, Take { rx })
}

/// Sending half of a rendezvous link.
pub(crate) struct Offer<T> {
    tx: mpsc::Sender<Slot<T>>,
}

impl<T> Clone for Offer<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> Offer<T> {
    /// Sends `item` and waits until the receiver took it.
    pub async fn send(&self, item: T) -> Result<(), LinkClosed> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx.send((item, ack_tx)).await.map_err(|_| LinkClosed)?;
        ack_rx.await.map_err(|_| LinkClosed)
    }

    /// Blocking variant of [`send`](Self::send) for threads outside the async runtime.
    ///
    /// # Panics
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_send(&self, item: T) -> Result<(), LinkClosed> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .blocking_send((item, ack_tx))
            .map_err(|_| LinkClosed)?;
        ack_rx.blocking_recv().map_err(|_| LinkClosed)
    }

    /// Returns `true` once the receiving half has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of a rendezvous link.
pub(crate) struct Take<T> {
    rx: mpsc::Receiver<Slot<T>>,
}

impl<T> Take<T> {
    /// Takes the next item and releases its sender. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<T> {
        let (item, ack) = self.rx.recv().await?;
        let _ = ack.send(());
        Some(item)
    }

    /// Refuses further items and releases every sender waiting on a queued one.
    pub fn close(&mut self) {
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_send_completes_only_after_take() {
        let (offer, mut take) = rendezvous::<u32>();
        let sender = tokio::spawn(async move { offer.send(7).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!sender.is_finished(), "send returned before the item was taken");

        assert_eq!(take.recv().await, Some(7));
        assert_eq!(sender.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn test_send_fails_when_receiver_dropped() {
        let (offer, take) = rendezvous::<u32>();
        drop(take);
        assert_eq!(offer.send(1).await, Err(LinkClosed));
        assert!(offer.is_closed());
    }

    #[tokio::test]
    async fn test_pending_item_dropped_with_receiver_releases_sender() {
        let (offer, take) = rendezvous::<u32>();
        let sender = tokio::spawn(async move { offer.send(1).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(take);
        assert_eq!(sender.await.unwrap(), Err(LinkClosed));
    }

    #[tokio::test]
    async fn test_close_releases_waiting_sender() {
        let (offer, mut take) = rendezvous::<u32>();
        let sender = {
            let offer = offer.clone();
            tokio::spawn(async move { offer.send(1).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        take.close();
        assert_eq!(sender.await.unwrap(), Err(LinkClosed));
        assert_eq!(offer.send(2).await, Err(LinkClosed));
    }

    #[tokio::test]
    async fn test_recv_none_when_all_senders_dropped() {
        let (offer, mut take) = rendezvous::<u32>();
        drop(offer);
        assert_eq!(take.recv().await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_send_from_plain_thread() {
        let (offer, mut take) = rendezvous::<&'static str>();
        let thread = std::thread::spawn(move || offer.blocking_send("ping"));
        assert_eq!(take.recv().await, Some("ping"));
        let res = tokio::task::spawn_blocking(move || thread.join().unwrap())
            .await
            .unwrap();
        assert_eq!(res, Ok(()));
    }
}
