//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom event handlers into the
//! runtime. Each subscriber is driven by a dedicated worker loop fed by a bounded
//! queue that is owned by the [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching, retries) – they do **not** block
//!   the bridge, the host callback thread, nor other subscribers.
//! - Each subscriber **declares** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. If a queue overflows, events for that
//!   subscriber are **dropped** (warn).
//!
//! ## Example
//! ```rust
//! use svcvisor::{Event, EventKind, Subscribe};
//!
//! struct ExitAudit;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for ExitAudit {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::FinalStatusReported {
//!             // write audit record with ev.exit ...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "exit-audit" }
//!     fn queue_capacity(&self) -> usize { 64 }
//! }
//! ```

use crate::events::{Event, EventKind};
use async_trait::async_trait;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Event filter applied before queueing; uninteresting kinds never occupy queue slots.
    fn interested(&self, _kind: EventKind) -> bool {
        true
    }

    /// Preferred capacity of this subscriber's queue.
    ///
    /// On overflow, events for this subscriber are **dropped** (warn).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
