//! # Service status and change requests.
//!
//! [`Status`] is what a handler reports to the host; [`ChangeRequest`] is what
//! the bridge hands to the handler when the host issues a command.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use svcvisor::{AcceptedCommands, ServiceState, Status};
//!
//! let starting = Status::new(ServiceState::StartPending)
//!     .with_checkpoint(1)
//!     .with_wait_hint(Duration::from_secs(5));
//! assert!(starting.state.is_pending());
//!
//! let running = Status::new(ServiceState::Running)
//!     .with_accepted(AcceptedCommands::STOP | AcceptedCommands::SHUTDOWN);
//! assert!(running.accepted.contains(AcceptedCommands::STOP));
//! ```

use std::time::Duration;

use crate::status::{AcceptedCommands, ControlCommand, ServiceState};

/// Full description of the service as reported to the host.
///
/// `checkpoint` and `wait_hint` only matter while [`ServiceState::is_pending`]:
/// the host's watchdog expects a fresh report (with a bumped checkpoint)
/// before `wait_hint` elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Status {
    pub state: ServiceState,
    pub accepted: AcceptedCommands,
    /// Progress counter for lengthy pending operations.
    pub checkpoint: u32,
    /// Estimated time for the pending operation to progress.
    pub wait_hint: Duration,
}

impl Status {
    /// Creates a status in `state` with nothing accepted and no progress hints.
    #[inline]
    pub fn new(state: ServiceState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    /// The terminal status reported at the end of every run.
    #[inline]
    pub fn stopped() -> Self {
        Self::new(ServiceState::Stopped)
    }

    #[inline]
    pub fn with_accepted(mut self, accepted: AcceptedCommands) -> Self {
        self.accepted = accepted;
        self
    }

    #[inline]
    pub fn with_checkpoint(mut self, checkpoint: u32) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    #[inline]
    pub fn with_wait_hint(mut self, wait_hint: Duration) -> Self {
        self.wait_hint = wait_hint;
        self
    }
}

/// A host command paired with the status known when it was issued.
///
/// Immutable snapshot: the bridge builds one per accepted control event and
/// hands it to the handler exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRequest {
    pub command: ControlCommand,
    /// Host event type (meaningful for device/session style controls).
    pub event_type: u32,
    /// Opaque host pointer-sized event payload.
    pub event_data: usize,
    /// Context value the host passed along with the callback.
    pub context: usize,
    /// Last status successfully reported before the command arrived.
    pub status: Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_stopped_with_nothing_accepted() {
        let s = Status::default();
        assert_eq!(s, Status::stopped());
        assert!(s.accepted.is_empty());
        assert_eq!(s.checkpoint, 0);
        assert_eq!(s.wait_hint, Duration::ZERO);
    }

    #[test]
    fn test_builders_preserve_state() {
        let s = Status::new(ServiceState::StopPending)
            .with_checkpoint(3)
            .with_wait_hint(Duration::from_millis(1500));
        assert_eq!(s.state, ServiceState::StopPending);
        assert_eq!(s.checkpoint, 3);
        assert_eq!(s.wait_hint, Duration::from_millis(1500));
    }
}
