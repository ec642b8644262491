//! # Host adapter contract.
//!
//! [`HostAdapter`] is the seam between the bridge and a concrete service
//! control manager. An implementation exposes three calls:
//!
//! ```text
//! registration thread                      host
//! ───────────────────                      ────
//! dispatch(entry) ───────────────────────► (blocks)
//!                                           ├─► entry.main(entry.context, raw_args)   (any thread)
//!                                           │      └─► register_control_handler(name, cb, ctx)
//!                                           │
//!     cb(control, event_type, data, ctx) ◄──┤   (on the registration thread, repeatedly)
//!                                           │
//! bridge: report_status(handle, &record) ──►│
//!                                           └─► returns once the service reported Stopped
//! ```
//!
//! Both callbacks are plain function pointers. Per-run state travels in the
//! pointer-sized `context` value, which the bridge uses as a key into its
//! registration table.

use crate::error::HostError;
use crate::host::record::StatusRecord;

/// Raw startup arguments in the host's native (UTF-16) encoding.
pub type RawArgs = Vec<Vec<u16>>;

/// Control callback invoked by the host: `(control, event_type, event_data, context) -> result`.
pub type ControlCallback = fn(u32, u32, usize, usize) -> u32;

/// Service entry point invoked by the host once dispatch started: `(context, args)`.
pub type ServiceMain = fn(usize, RawArgs);

/// Opaque status handle assigned by the host at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceHandle(pub usize);

/// Service table entry handed to [`HostAdapter::dispatch`].
#[derive(Debug, Clone)]
pub struct DispatchEntry {
    /// Service name as registered with the host.
    pub name: String,
    /// Entry point the host must call exactly once.
    pub main: ServiceMain,
    /// Value the host passes back to `main`.
    pub context: usize,
}

/// Binding to a host service control manager.
pub trait HostAdapter: Send + Sync + 'static {
    /// Connects the calling thread to the host and starts delivering to `entry`.
    ///
    /// Blocks until the service terminated or the connection failed. Control
    /// callbacks registered later are delivered on this thread.
    fn dispatch(&self, entry: DispatchEntry) -> Result<(), HostError>;

    /// Registers `callback` for service `name`; the host passes `context` back on every call.
    fn register_control_handler(
        &self,
        name: &str,
        callback: ControlCallback,
        context: usize,
    ) -> Result<ServiceHandle, HostError>;

    /// Reports `record` for the service behind `handle`.
    fn report_status(&self, handle: ServiceHandle, record: &StatusRecord) -> Result<(), HostError>;
}
