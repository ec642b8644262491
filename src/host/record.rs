//! # Host wire representation.
//!
//! [`StatusRecord`] mirrors the status structure a service control manager
//! expects in its "set service status" call. The raw numeric constants below
//! are the host's own values; everything above this module works with the
//! typed model in [`crate::status`].

/// Service runs in its own process.
pub const SERVICE_WIN32_OWN_PROCESS: u32 = 0x0000_0010;

pub const SERVICE_STOPPED: u32 = 0x0000_0001;
pub const SERVICE_START_PENDING: u32 = 0x0000_0002;
pub const SERVICE_STOP_PENDING: u32 = 0x0000_0003;
pub const SERVICE_RUNNING: u32 = 0x0000_0004;
pub const SERVICE_CONTINUE_PENDING: u32 = 0x0000_0005;
pub const SERVICE_PAUSE_PENDING: u32 = 0x0000_0006;
pub const SERVICE_PAUSED: u32 = 0x0000_0007;

pub const SERVICE_CONTROL_STOP: u32 = 0x0000_0001;
pub const SERVICE_CONTROL_PAUSE: u32 = 0x0000_0002;
pub const SERVICE_CONTROL_CONTINUE: u32 = 0x0000_0003;
pub const SERVICE_CONTROL_INTERROGATE: u32 = 0x0000_0004;
pub const SERVICE_CONTROL_SHUTDOWN: u32 = 0x0000_0005;
pub const SERVICE_CONTROL_PRESHUTDOWN: u32 = 0x0000_000F;

pub const SERVICE_ACCEPT_STOP: u32 = 0x0000_0001;
pub const SERVICE_ACCEPT_PAUSE_CONTINUE: u32 = 0x0000_0002;
pub const SERVICE_ACCEPT_SHUTDOWN: u32 = 0x0000_0004;
pub const SERVICE_ACCEPT_PRESHUTDOWN: u32 = 0x0000_0100;

pub const NO_ERROR: u32 = 0;
/// Returned by a control callback that cannot handle the control.
pub const ERROR_CALL_NOT_IMPLEMENTED: u32 = 120;
/// Marker placed in the generic exit field when the real code is service specific.
pub const ERROR_SERVICE_SPECIFIC_ERROR: u32 = 1066;
/// Start of the error range the host reserves for applications (bit 29).
pub const APPLICATION_ERROR: u32 = 1 << 29;

/// Status structure handed to [`HostAdapter::report_status`](crate::HostAdapter::report_status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusRecord {
    pub service_type: u32,
    pub current_state: u32,
    pub controls_accepted: u32,
    pub win32_exit_code: u32,
    pub service_specific_exit_code: u32,
    pub checkpoint: u32,
    pub wait_hint_ms: u32,
}

impl StatusRecord {
    /// Returns `true` if this record reports the terminal `Stopped` state.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.current_state == SERVICE_STOPPED
    }
}
