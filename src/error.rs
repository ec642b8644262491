//! Error types used by the svcvisor runtime and host adapters.
//!
//! This module defines three error types:
//!
//! - [`RunError`]: failures that stop a run before the service reaches `Running`
//!   and are returned to the caller of [`run`](crate::run).
//! - [`HostError`]: failures reported by a [`HostAdapter`](crate::HostAdapter).
//! - [`LinkClosed`]: the peer of a handler link is gone.
//!
//! Runtime failures after the service started are not errors for the caller:
//! the bridge folds them into the [`ExitCode`](crate::ExitCode) of the final
//! status report.

use thiserror::Error;

/// # Errors returned by [`run`](crate::run) and [`Service::run`](crate::Service::run).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RunError {
    /// The async runtime hosting the bridge could not be created.
    #[error("failed to build service runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// The host refused to register the control callback.
    #[error("control handler registration failed: {0}")]
    Registration(HostError),

    /// The host dispatch call failed or returned before starting the service.
    #[error("service dispatcher failed: {0}")]
    Dispatch(HostError),
}

impl RunError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use svcvisor::{HostError, RunError};
    ///
    /// let err = RunError::Dispatch(HostError::Os { code: 1063 });
    /// assert_eq!(err.as_label(), "run_dispatch_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::Runtime(_) => "run_runtime_failed",
            RunError::Registration(_) => "run_registration_failed",
            RunError::Dispatch(_) => "run_dispatch_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RunError::Runtime(e) => format!("runtime: {e}"),
            RunError::Registration(e) => format!("registration: {}", e.as_message()),
            RunError::Dispatch(e) => format!("dispatch: {}", e.as_message()),
        }
    }
}

/// # Errors produced by a host adapter.
///
/// A host error may carry the host's native error number, which the bridge
/// prefers over its own sentinels when composing an exit code.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Host call failed with a native error number.
    #[error("host error {code}")]
    Os {
        /// Native error number.
        code: u32,
    },

    /// Host call failed without a usable error number.
    #[error("host failure: {reason}")]
    Other {
        /// Description of the failure.
        reason: String,
    },
}

impl HostError {
    /// Creates an error without a native error number.
    pub fn other(reason: impl Into<String>) -> Self {
        HostError::Other {
            reason: reason.into(),
        }
    }

    /// Native error number, if the host supplied one.
    ///
    /// # Example
    /// ```
    /// use svcvisor::HostError;
    ///
    /// assert_eq!(HostError::Os { code: 6 }.code(), Some(6));
    /// assert_eq!(HostError::other("gone").code(), None);
    /// ```
    pub fn code(&self) -> Option<u32> {
        match self {
            HostError::Os { code } => Some(*code),
            HostError::Other { .. } => None,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HostError::Os { .. } => "host_os_error",
            HostError::Other { .. } => "host_failure",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HostError::Os { code } => format!("os error: {code}"),
            HostError::Other { reason } => format!("failure: {reason}"),
        }
    }
}

/// The other side of a handler link has gone away.
///
/// Returned by [`StatusUpdates::send`](crate::StatusUpdates::send) once the
/// bridge stopped listening.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("link closed")]
pub struct LinkClosed;
