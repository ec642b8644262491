//! # Non-blocking event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`]: distributes events to multiple subscribers
//! concurrently without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► interested? ──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │                    (bounded)         └──────► panic → SubscriberPanicked
//!     ├──► interested? ──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     └──► interested? ──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Overflow**: event dropped for that subscriber only, `SubscriberOverflow` published
//! - **Isolation**: a slow or panicking subscriber doesn't affect others
//! - **Per-subscriber FIFO**: each subscriber sees events in order
//! - **Drain on shutdown**: [`SubscriberSet::shutdown`] lets workers finish queued events
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

struct SubscriberChannel {
    sub: Arc<dyn Subscribe>,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for multiple event subscribers.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called from within a tokio runtime. Queue capacity comes from
    /// [`Subscribe::queue_capacity`] (minimum 1).
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let (tx, rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            workers.push(tokio::spawn(worker(Arc::clone(&sub), rx, bus.clone())));
            channels.push(SubscriberChannel { sub, sender: tx });
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Number of attached subscribers.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Emits an event to every interested subscriber.
    ///
    /// Overflow events are never re-published when they themselves overflow.
    pub fn emit(&self, event: &Event) {
        let is_overflow_evt = event.is_subscriber_overflow();
        let shared = Arc::new(event.clone());

        for channel in &self.channels {
            if !channel.sub.interested(event.kind) {
                continue;
            }
            let reason = match channel.sender.try_send(Arc::clone(&shared)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !is_overflow_evt {
                self.bus
                    .publish(Event::subscriber_overflow(channel.sub.name(), reason));
            }
        }
    }

    /// Closes all queues and waits for the workers to drain them.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }
}

async fn worker(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let fut = sub.on_event(ev.as_ref());
        if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            bus.publish(Event::subscriber_panicked(
                sub.name(),
                panic_message(panic_err.as_ref()),
            ));
        }
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.seen.lock().push(ev.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
        fn interested(&self, kind: EventKind) -> bool {
            kind != EventKind::StatusReported
        }
    }

    struct Panicky;

    #[async_trait]
    impl Subscribe for Panicky {
        async fn on_event(&self, _ev: &Event) {
            panic!("boom");
        }
        fn name(&self) -> &'static str {
            "panicky"
        }
    }

    #[tokio::test]
    async fn test_emit_respects_filter_and_order() {
        let rec = Arc::new(Recorder::default());
        let set = SubscriberSet::new(vec![rec.clone()], Bus::new(8));
        set.emit(&Event::new(EventKind::ControlReceived));
        set.emit(&Event::new(EventKind::StatusReported));
        set.emit(&Event::new(EventKind::BridgeStopped));
        set.shutdown().await;
        assert_eq!(
            *rec.seen.lock(),
            vec![EventKind::ControlReceived, EventKind::BridgeStopped]
        );
    }

    #[tokio::test]
    async fn test_panic_is_reported_on_bus() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Panicky)], bus.clone());
        set.emit(&Event::new(EventKind::BridgeStopped));
        set.shutdown().await;

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }
}
