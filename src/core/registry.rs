//! # Registration table and host trampolines.
//!
//! The host calls back through plain function pointers that carry only a
//! pointer-sized `context`. Every run inserts its [`Registration`] (service
//! name, host adapter, affinity guard, control link, handshake) into a
//! process-wide table and hands the returned id to the host as that context.
//! The trampolines below resolve the id and forward into the run's own state.
//!
//! ## Architecture
//! ```text
//! host ──► service_main(ctx, raw_args)
//!            └─► table[ctx] ─► register_control_handler(name, control_handler, ctx)
//!                           ─► handshake.publish(handle, decoded args)
//!
//! host ──► control_handler(control, event_type, data, ctx)          (registration thread)
//!            └─► table[ctx] ─► guard.stamp(raw) ─► control link (blocks until bridge takes it)
//! ```
//!
//! ## Rules
//! - Ids are never reused within a process; `0` is never handed out.
//! - The table lock is never held while blocking on a link.
//! - A callback for an id that is gone (run finished) returns immediately.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::core::affinity::{AffinityGuard, ControlEvent, RawControl};
use crate::core::handshake::{Dispatched, Handshake};
use crate::core::link::Offer;
use crate::host::args::decode_args;
use crate::host::record::{ERROR_CALL_NOT_IMPLEMENTED, NO_ERROR};
use crate::host::{HostAdapter, RawArgs};

/// Per-run context reachable from the host trampolines.
pub(crate) struct Registration {
    pub name: Arc<str>,
    pub host: Arc<dyn HostAdapter>,
    pub guard: AffinityGuard,
    pub control: Offer<ControlEvent>,
    pub handshake: Arc<Handshake>,
}

static TABLE: LazyLock<RwLock<HashMap<usize, Arc<Registration>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// Inserts `reg` and returns its context id.
pub(crate) fn register(reg: Registration) -> usize {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    TABLE.write().insert(id, Arc::new(reg));
    id
}

pub(crate) fn lookup(id: usize) -> Option<Arc<Registration>> {
    TABLE.read().get(&id).cloned()
}

/// Removes the registration; later callbacks for `id` become no-ops.
pub(crate) fn deregister(id: usize) -> Option<Arc<Registration>> {
    TABLE.write().remove(&id)
}

/// Service entry point handed to the host.
pub(crate) fn service_main(context: usize, raw_args: RawArgs) {
    let Some(reg) = lookup(context) else {
        return;
    };
    let outcome = reg
        .host
        .register_control_handler(&reg.name, control_handler, context)
        .map(|handle| Dispatched {
            handle,
            args: decode_args(&raw_args),
        });
    reg.handshake.publish(outcome);
}

/// Control callback handed to the host.
///
/// Runs on the host's callback thread and returns as soon as the bridge
/// accepted the event.
pub(crate) fn control_handler(control: u32, event_type: u32, event_data: usize, context: usize) -> u32 {
    let Some(reg) = lookup(context) else {
        return ERROR_CALL_NOT_IMPLEMENTED;
    };
    let event = reg.guard.stamp(RawControl {
        control,
        event_type,
        event_data,
        context,
    });
    // A closed link means the bridge already stopped; nothing is left to tell.
    let _ = reg.control.blocking_send(event);
    NO_ERROR
}
