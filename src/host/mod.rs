//! Host side of the bridge.
//!
//! - [`HostAdapter`] the seam to a concrete service control manager
//! - [`record`] the host's status structure and raw constants
//! - [`translate`] generic status model → [`record::StatusRecord`]
//! - [`sim`] in-process simulated host for tests and demos

mod adapter;
pub(crate) mod args;
pub mod record;
pub mod sim;
pub mod translate;

pub use adapter::{ControlCallback, DispatchEntry, HostAdapter, RawArgs, ServiceHandle, ServiceMain};
