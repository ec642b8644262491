//! # Service states and control commands.

use crate::host::record::{
    SERVICE_CONTINUE_PENDING, SERVICE_CONTROL_CONTINUE, SERVICE_CONTROL_INTERROGATE,
    SERVICE_CONTROL_PAUSE, SERVICE_CONTROL_PRESHUTDOWN, SERVICE_CONTROL_SHUTDOWN,
    SERVICE_CONTROL_STOP, SERVICE_PAUSE_PENDING, SERVICE_PAUSED, SERVICE_RUNNING,
    SERVICE_START_PENDING, SERVICE_STOP_PENDING, SERVICE_STOPPED,
};

/// Execution state of the service as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceState {
    #[default]
    Stopped,
    StartPending,
    StopPending,
    Running,
    ContinuePending,
    PausePending,
    Paused,
}

impl ServiceState {
    /// Returns `true` for the transitional `*Pending` states.
    ///
    /// Only in these states do `checkpoint` and `wait_hint` carry meaning; the host
    /// may kill the service if the wait hint elapses without a fresh report.
    #[inline]
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            ServiceState::StartPending
                | ServiceState::StopPending
                | ServiceState::ContinuePending
                | ServiceState::PausePending
        )
    }

    /// Host wire value.
    pub const fn as_raw(self) -> u32 {
        match self {
            ServiceState::Stopped => SERVICE_STOPPED,
            ServiceState::StartPending => SERVICE_START_PENDING,
            ServiceState::StopPending => SERVICE_STOP_PENDING,
            ServiceState::Running => SERVICE_RUNNING,
            ServiceState::ContinuePending => SERVICE_CONTINUE_PENDING,
            ServiceState::PausePending => SERVICE_PAUSE_PENDING,
            ServiceState::Paused => SERVICE_PAUSED,
        }
    }

    /// Parses a host wire value; unknown values yield `None`.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            SERVICE_STOPPED => Some(ServiceState::Stopped),
            SERVICE_START_PENDING => Some(ServiceState::StartPending),
            SERVICE_STOP_PENDING => Some(ServiceState::StopPending),
            SERVICE_RUNNING => Some(ServiceState::Running),
            SERVICE_CONTINUE_PENDING => Some(ServiceState::ContinuePending),
            SERVICE_PAUSE_PENDING => Some(ServiceState::PausePending),
            SERVICE_PAUSED => Some(ServiceState::Paused),
            _ => None,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(self) -> &'static str {
        match self {
            ServiceState::Stopped => "stopped",
            ServiceState::StartPending => "start_pending",
            ServiceState::StopPending => "stop_pending",
            ServiceState::Running => "running",
            ServiceState::ContinuePending => "continue_pending",
            ServiceState::PausePending => "pause_pending",
            ServiceState::Paused => "paused",
        }
    }
}

/// Command sent by the host to request a state change.
///
/// `Interrogate` asks the service to report its current status and is always
/// accepted. Host codes this crate does not model travel as [`ControlCommand::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlCommand {
    Stop,
    Pause,
    Continue,
    Interrogate,
    Shutdown,
    PreShutdown,
    Other(u32),
}

impl ControlCommand {
    /// Decodes a host control code. Total: every code maps to some command.
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            SERVICE_CONTROL_STOP => ControlCommand::Stop,
            SERVICE_CONTROL_PAUSE => ControlCommand::Pause,
            SERVICE_CONTROL_CONTINUE => ControlCommand::Continue,
            SERVICE_CONTROL_INTERROGATE => ControlCommand::Interrogate,
            SERVICE_CONTROL_SHUTDOWN => ControlCommand::Shutdown,
            SERVICE_CONTROL_PRESHUTDOWN => ControlCommand::PreShutdown,
            other => ControlCommand::Other(other),
        }
    }

    /// Host wire value.
    pub const fn as_raw(self) -> u32 {
        match self {
            ControlCommand::Stop => SERVICE_CONTROL_STOP,
            ControlCommand::Pause => SERVICE_CONTROL_PAUSE,
            ControlCommand::Continue => SERVICE_CONTROL_CONTINUE,
            ControlCommand::Interrogate => SERVICE_CONTROL_INTERROGATE,
            ControlCommand::Shutdown => SERVICE_CONTROL_SHUTDOWN,
            ControlCommand::PreShutdown => SERVICE_CONTROL_PRESHUTDOWN,
            ControlCommand::Other(raw) => raw,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(self) -> &'static str {
        match self {
            ControlCommand::Stop => "stop",
            ControlCommand::Pause => "pause",
            ControlCommand::Continue => "continue",
            ControlCommand::Interrogate => "interrogate",
            ControlCommand::Shutdown => "shutdown",
            ControlCommand::PreShutdown => "pre_shutdown",
            ControlCommand::Other(_) => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_states() {
        assert!(ServiceState::StartPending.is_pending());
        assert!(ServiceState::StopPending.is_pending());
        assert!(ServiceState::ContinuePending.is_pending());
        assert!(ServiceState::PausePending.is_pending());
        assert!(!ServiceState::Running.is_pending());
        assert!(!ServiceState::Paused.is_pending());
        assert!(!ServiceState::Stopped.is_pending());
    }

    #[test]
    fn test_state_raw_values() {
        assert_eq!(ServiceState::Stopped.as_raw(), 1);
        assert_eq!(ServiceState::Running.as_raw(), 4);
        assert_eq!(ServiceState::Paused.as_raw(), 7);
        assert_eq!(ServiceState::from_raw(3), Some(ServiceState::StopPending));
        assert_eq!(ServiceState::from_raw(0), None);
        assert_eq!(ServiceState::from_raw(8), None);
    }

    #[test]
    fn test_unknown_control_code_passes_through() {
        let cmd = ControlCommand::from_raw(0x0000_0006);
        assert_eq!(cmd, ControlCommand::Other(6));
        assert_eq!(cmd.as_raw(), 6);
        assert_eq!(ControlCommand::from_raw(0x0F), ControlCommand::PreShutdown);
    }

    #[test]
    fn test_default_state_is_stopped() {
        assert_eq!(ServiceState::default(), ServiceState::Stopped);
    }
}
