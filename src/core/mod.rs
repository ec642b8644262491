//! Runtime core: registration, handshake and the bridge loop.
//!
//! The only public API from this module is [`Service`] (with its builder and
//! the [`run`] shortcut) and [`current_unit`].
//!
//! Internal modules:
//! - [`affinity`]: stamps control callbacks delivered off the registration thread;
//! - [`bridge`]: the select loop between host, handler and status reports;
//! - [`handshake`]: dispatcher-ready / bridge-stopped signals;
//! - [`link`]: rendezvous links (one item in flight);
//! - [`registry`]: registration table behind the host trampolines;
//! - [`service`]: the registration-thread side of one run.

pub(crate) mod affinity;
mod bridge;
pub(crate) mod handshake;
pub(crate) mod link;
pub(crate) mod registry;
mod service;

pub use affinity::{UnitId, current_unit};
pub use service::{Service, ServiceBuilder, run};
