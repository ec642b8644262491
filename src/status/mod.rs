//! # Generic status model.
//!
//! Host-independent types shared by the bridge and handlers:
//! - [`ServiceState`], [`ControlCommand`] states and commands
//! - [`AcceptedCommands`] bit set of commands the service accepts
//! - [`Status`], [`ChangeRequest`] what flows between bridge and handler
//! - [`ExitCode`] how a run ends

mod accepted;
mod exit;
mod state;
#[allow(clippy::module_inception)]
mod status;

pub use accepted::AcceptedCommands;
pub use exit::ExitCode;
pub use state::{ControlCommand, ServiceState};
pub use status::{ChangeRequest, Status};
