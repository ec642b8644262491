//! # Thread-affinity guard for control callbacks.
//!
//! Hosts conventionally invoke the control callback on the thread that
//! registered it, but do not promise to. The bridge state is not reentrant, so
//! every raw callback is stamped with the identity of the calling execution
//! unit and checked against the identity captured at registration.
//!
//! On mismatch the real command is replaced by a synthetic event carrying
//! [`ExitCode::CROSS_THREAD_CALLBACK`]; the bridge fails the run on it.

use std::thread::{self, ThreadId};

use crate::status::{ControlCommand, ExitCode};

/// Identity of an execution unit (an OS thread).
pub type UnitId = ThreadId;

/// Identity of the execution unit running the caller.
#[inline]
pub fn current_unit() -> UnitId {
    thread::current().id()
}

/// Arguments of one host control callback, as received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawControl {
    pub control: u32,
    pub event_type: u32,
    pub event_data: usize,
    pub context: usize,
}

/// A control callback after the affinity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ControlEvent {
    pub command: ControlCommand,
    pub event_type: u32,
    pub event_data: usize,
    pub context: usize,
    /// Set by the guard (never by the host) when the callback ran on a foreign thread.
    pub error: Option<u32>,
}

/// Compares callback threads against the registration thread.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AffinityGuard {
    expected: UnitId,
}

impl AffinityGuard {
    /// Captures the calling thread as the expected callback thread.
    pub fn capture() -> Self {
        Self {
            expected: current_unit(),
        }
    }

    /// Stamps `raw` with the current thread and checks it.
    pub fn stamp(&self, raw: RawControl) -> ControlEvent {
        self.stamp_from(current_unit(), raw)
    }

    fn stamp_from(&self, caller: UnitId, raw: RawControl) -> ControlEvent {
        if caller != self.expected {
            return ControlEvent {
                command: ControlCommand::Other(0),
                event_type: 0,
                event_data: 0,
                context: raw.context,
                error: Some(ExitCode::CROSS_THREAD_CALLBACK),
            };
        }
        ControlEvent {
            command: ControlCommand::from_raw(raw.control),
            event_type: raw.event_type,
            event_data: raw.event_data,
            context: raw.context,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(control: u32) -> RawControl {
        RawControl {
            control,
            event_type: 3,
            event_data: 0xdead,
            context: 11,
        }
    }

    #[test]
    fn test_same_thread_passes_command_through() {
        let guard = AffinityGuard::capture();
        let ev = guard.stamp(raw(1));
        assert_eq!(ev.command, ControlCommand::Stop);
        assert_eq!(ev.event_type, 3);
        assert_eq!(ev.event_data, 0xdead);
        assert_eq!(ev.error, None);
    }

    #[test]
    fn test_foreign_thread_is_flagged_and_command_dropped() {
        let guard = AffinityGuard::capture();
        let ev = std::thread::spawn(move || guard.stamp(raw(1)))
            .join()
            .unwrap();
        assert_eq!(ev.error, Some(ExitCode::CROSS_THREAD_CALLBACK));
        assert_ne!(ev.command, ControlCommand::Stop);
    }

    #[test]
    fn test_identity_is_stable_per_thread() {
        assert_eq!(current_unit(), current_unit());
        let other = std::thread::spawn(current_unit).join().unwrap();
        assert_ne!(other, current_unit());
    }
}
