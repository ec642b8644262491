//! # Exit codes of a service run.
//!
//! An [`ExitCode`] is either a generic host error number or a service-specific
//! code. A zero code means "no error" regardless of the flag.
//!
//! The bridge reserves a few service-specific values from the host's
//! application-error range for failures it detects itself:
//! - [`ExitCode::STATUS_REPORT_FAILED`]: reporting a status to the host failed
//!   and the host gave no error number;
//! - [`ExitCode::CROSS_THREAD_CALLBACK`]: a control callback arrived on an
//!   unexpected thread;
//! - [`ExitCode::HANDLER_PANICKED`]: the handler task panicked.

use crate::host::record::APPLICATION_ERROR;

/// Exit code reported with the final `Stopped` status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitCode {
    /// `true` if `code` is defined by the service rather than by the host.
    pub service_specific: bool,
    pub code: u32,
}

impl ExitCode {
    /// Sentinel: status report to host failed.
    pub const STATUS_REPORT_FAILED: u32 = APPLICATION_ERROR;
    /// Sentinel: control event received on an unexpected thread.
    pub const CROSS_THREAD_CALLBACK: u32 = APPLICATION_ERROR + 1;
    /// Sentinel: handler task panicked.
    pub const HANDLER_PANICKED: u32 = APPLICATION_ERROR + 2;

    /// Clean exit.
    pub const SUCCESS: Self = Self {
        service_specific: false,
        code: 0,
    };

    /// A service-defined error code.
    #[inline]
    pub const fn service_specific(code: u32) -> Self {
        Self {
            service_specific: true,
            code,
        }
    }

    /// A generic host error number.
    #[inline]
    pub const fn win32(code: u32) -> Self {
        Self {
            service_specific: false,
            code,
        }
    }

    #[inline]
    pub const fn is_success(self) -> bool {
        self.code == 0
    }

    /// Returns `true` if the code is one of the bridge's own sentinels.
    pub const fn is_sentinel(self) -> bool {
        self.service_specific
            && matches!(
                self.code,
                Self::STATUS_REPORT_FAILED | Self::CROSS_THREAD_CALLBACK | Self::HANDLER_PANICKED
            )
    }
}

impl Default for ExitCode {
    fn default() -> Self {
        Self::SUCCESS
    }
}
