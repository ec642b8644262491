//! # Runtime events emitted by the bridge and the service runner.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Startup events**: handshake outcome and handler start
//! - **Control events**: commands flowing from the host to the handler
//! - **Status events**: reports flowing from the handler to the host
//! - **Terminal events**: how and when a run ended
//!
//! The [`Event`] struct carries optional metadata such as the service name,
//! command, state, exit code and a reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use svcvisor::{ControlCommand, Event, EventKind};
//!
//! let ev = Event::new(EventKind::ControlReceived)
//!     .with_service("spooler")
//!     .with_command(ControlCommand::Stop);
//!
//! assert_eq!(ev.kind, EventKind::ControlReceived);
//! assert_eq!(ev.service.as_deref(), Some("spooler"));
//! assert_eq!(ev.command, Some(ControlCommand::Stop));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::status::{ControlCommand, ExitCode, ServiceState};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `service`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `service`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Startup events ===
    /// Host assigned a status handle; the bridge is about to start the handler.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `args`: number of startup arguments
    DispatcherReady,

    /// Host refused registration or dispatch; the handler never started.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `reason`: host error message
    RegistrationFailed,

    /// Handler task spawned.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `reason`: handler name
    HandlerStarted,

    // === Control events ===
    /// Control event accepted from the host callback thread.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `command`: decoded command
    ControlReceived,

    /// Handler took the pending change request.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `command`: delivered command
    RequestDelivered,

    /// Control event dropped because the handler no longer receives requests.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `command`: dropped command
    RequestDropped,

    /// Control callback observed on an unexpected thread.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `exit`: sentinel exit code
    AffinityViolation,

    // === Status events ===
    /// Handler status reported to the host.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `state`: reported state
    StatusReported,

    /// Host rejected a status report; the run ends.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `state`: state that failed to report
    /// - `exit`: resolved exit code
    /// - `reason`: host error message
    StatusReportFailed,

    // === Terminal events ===
    /// Handler returned.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `exit`: exit code returned by the handler
    HandlerExited,

    /// Handler task panicked.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `exit`: sentinel exit code
    /// - `reason`: panic info
    HandlerPanicked,

    /// Final `Stopped` status sent to the host.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `exit`: reported exit code
    /// - `reason`: host error message if the report failed (ignored otherwise)
    FinalStatusReported,

    /// Bridge released its resources and signalled bridge-stopped.
    ///
    /// Sets:
    /// - `service`: service name
    BridgeStopped,

    /// Handler still running after the grace period; it is abandoned.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `grace_ms`: configured grace
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Service (or subscriber) name, if applicable.
    pub service: Option<Arc<str>>,
    /// Control command involved.
    pub command: Option<ControlCommand>,
    /// Service state involved.
    pub state: Option<ServiceState>,
    /// Exit code involved.
    pub exit: Option<ExitCode>,
    /// Number of startup arguments.
    pub args: Option<u32>,
    /// Grace period in milliseconds (compact).
    pub grace_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            service: None,
            command: None,
            state: None,
            exit: None,
            args: None,
            grace_ms: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    #[inline]
    pub fn with_command(mut self, command: ControlCommand) -> Self {
        self.command = Some(command);
        self
    }

    #[inline]
    pub fn with_state(mut self, state: ServiceState) -> Self {
        self.state = Some(state);
        self
    }

    #[inline]
    pub fn with_exit(mut self, exit: ExitCode) -> Self {
        self.exit = Some(exit);
        self
    }

    /// Attaches the startup argument count (saturating).
    #[inline]
    pub fn with_args(mut self, n: usize) -> Self {
        self.args = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    /// Attaches a grace duration (stored as milliseconds).
    #[inline]
    pub fn with_grace(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.grace_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_service(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_service(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    /// Returns `true` for events after which the run cannot continue.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::RegistrationFailed
                | EventKind::AffinityViolation
                | EventKind::StatusReportFailed
                | EventKind::HandlerExited
                | EventKind::HandlerPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::ControlReceived);
        let b = Event::new(EventKind::ControlReceived);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_metadata_builders() {
        let ev = Event::new(EventKind::GraceExceeded)
            .with_service("svc")
            .with_grace(Duration::from_secs(2))
            .with_args(3);
        assert_eq!(ev.grace_ms, Some(2000));
        assert_eq!(ev.args, Some(3));
        assert_eq!(ev.service.as_deref(), Some("svc"));
    }

    #[test]
    fn test_terminal_kinds() {
        assert!(Event::new(EventKind::AffinityViolation).is_terminal());
        assert!(!Event::new(EventKind::StatusReported).is_terminal());
    }
}
