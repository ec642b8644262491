//! # Service handler contract.
//!
//! A [`Handler`] implements the service itself. The bridge calls
//! [`Handler::execute`] once per run on the async runtime and keeps it
//! connected to the host through two streams:
//!
//! - [`ChangeRequests`]: host commands, one at a time, in host order;
//! - [`StatusUpdates`]: statuses the handler wants the host to see.
//!
//! Returning from `execute` ends the run; the returned [`ExitCode`] is reported
//! with the final `Stopped` status.
//!
//! ## Contract
//! - Keep draining `requests`: the host's callback thread waits until the
//!   previous command was taken.
//! - Report `StartPending`/`Running` early, and react to `Stop`/`Shutdown` by
//!   reporting `StopPending` and returning.
//! - `requests.recv()` yields `None` and `updates.send()` fails once the bridge
//!   stopped (for example after a failed status report); return then.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use svcvisor::{
//!     AcceptedCommands, ChangeRequests, ControlCommand, ExitCode, Handler, ServiceState,
//!     Status, StatusUpdates,
//! };
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl Handler for Echo {
//!     async fn execute(
//!         &self,
//!         _args: Vec<String>,
//!         mut requests: ChangeRequests,
//!         updates: StatusUpdates,
//!     ) -> ExitCode {
//!         let running = Status::new(ServiceState::Running).with_accepted(AcceptedCommands::STOP);
//!         if updates.send(running).await.is_err() {
//!             return ExitCode::SUCCESS;
//!         }
//!         while let Some(req) = requests.recv().await {
//!             match req.command {
//!                 ControlCommand::Interrogate => {
//!                     let _ = updates.send(req.status).await;
//!                 }
//!                 ControlCommand::Stop | ControlCommand::Shutdown => break,
//!                 _ => {}
//!             }
//!         }
//!         let _ = updates.send(Status::new(ServiceState::StopPending)).await;
//!         ExitCode::SUCCESS
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::core::link::{Offer, Take};
use crate::error::LinkClosed;
use crate::status::{ChangeRequest, ExitCode, Status};

/// # User-supplied service body.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Human-readable name (for events/logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs the service until it decides to stop.
    ///
    /// `args` are the startup arguments supplied by the host, order preserved.
    async fn execute(
        &self,
        args: Vec<String>,
        requests: ChangeRequests,
        updates: StatusUpdates,
    ) -> ExitCode;
}

/// Incoming host commands.
///
/// Each request is handed over by rendezvous: the bridge does not accept the
/// next host command until this one was received.
pub struct ChangeRequests {
    inner: Take<ChangeRequest>,
}

impl ChangeRequests {
    pub(crate) fn new(inner: Take<ChangeRequest>) -> Self {
        Self { inner }
    }

    /// Receives the next request; `None` once the bridge stopped.
    ///
    /// Cancel-safe: can be used as a `tokio::select!` branch.
    pub async fn recv(&mut self) -> Option<ChangeRequest> {
        self.inner.recv().await
    }
}

/// Outgoing status reports.
///
/// Cloneable so auxiliary tasks of the handler can report progress too.
#[derive(Clone)]
pub struct StatusUpdates {
    inner: Offer<Status>,
}

impl StatusUpdates {
    pub(crate) fn new(inner: Offer<Status>) -> Self {
        Self { inner }
    }

    /// Sends `status` to the bridge and waits until the bridge picked it up.
    ///
    /// Picking up is not the same as reporting: a status the host rejects ends
    /// the run, which the handler observes as a closed link on later calls.
    pub async fn send(&self, status: Status) -> Result<(), LinkClosed> {
        self.inner.send(status).await
    }

    /// Returns `true` once the bridge stopped listening.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}
