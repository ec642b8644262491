//! # svcvisor
//!
//! **svcvisor** bridges a host service control manager (SCM) and an async
//! service handler written against a small, host-independent model.
//!
//! The host drives a service through callbacks on its own thread and expects
//! status reports through a handle it assigns later. The handler wants a plain
//! stream of commands and a way to say what state it is in. svcvisor sits in
//! between: one bridge loop per run owns the status handle, forwards host
//! commands one at a time, reports every status the handler sends, and always
//! finishes with exactly one `Stopped` report.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  registration thread                 tokio runtime
//! ┌──────────────────────────┐       ┌──────────────────────────────────────────────┐
//! │ Service::run()           │       │ Bridge                                       │
//! │  ├─ register (ctx)       │       │  ├─ wait dispatcher-ready                    │
//! │  ├─ host.dispatch() ─────┼─┐     │  ├─ spawn Handler::execute(args, req, upd)   │
//! │  │   control callbacks ──┼─┼──►  │  ├─ loop {                                   │
//! │  │   (blocking, 1 slot)  │ │     │  │    control ─► Mailbox ─► ChangeRequests    │
//! │  └─ wait bridge-stopped  │ │     │  │    StatusUpdates ─► to_record ─► report   │
//! └──────────────────────────┘ │     │  │    handler completion ─► exit code        │
//!                              │     │  │  }                                       │
//!  service entry (host thread) │     │  ├─ final Stopped report (exactly once)      │
//!   register_control_handler ◄─┘     │  └─ set bridge-stopped                       │
//!   publish handle + args ─────────► │                                              │
//!                                    └───────────────┬──────────────────────────────┘
//!                                                    ▼
//!                                          Bus ─► SubscriberSet ─► subscribers
//! ```
//!
//! ### Run lifecycle
//! ```text
//! dispatcher-ready ─► DispatcherReady ─► HandlerStarted
//!   ├─ control     ─► ControlReceived ─► RequestDelivered | RequestDropped
//!   ├─ status      ─► StatusReported  | StatusReportFailed ─┐
//!   ├─ foreign-thread callback ─► AffinityViolation ────────┤
//!   └─ handler returns ─► HandlerExited | HandlerPanicked ──┤
//!                                                           ▼
//!                                  FinalStatusReported ─► BridgeStopped
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                            |
//! |-------------------|------------------------------------------------------------------|-----------------------------------------------|
//! | **Service**       | Run a handler as a host service from the registration thread.    | [`Service`], [`ServiceBuilder`], [`run`]      |
//! | **Handlers**      | Implement the service body as a trait or a closure.              | [`Handler`], [`HandlerFn`], [`HandlerRef`]    |
//! | **Status model**  | Host-independent states, commands and exit codes.                | [`Status`], [`ControlCommand`], [`ExitCode`]  |
//! | **Host**          | Seam to a service control manager, plus a simulated host.        | [`HostAdapter`], [`host::sim::SimHost`]       |
//! | **Subscriber API**| Observe run events (logging, metrics, custom subscribers).       | [`Subscribe`], [`Event`], [`EventKind`]       |
//! | **Errors**        | Typed errors for runs that never started and for host calls.     | [`RunError`], [`HostError`]                   |
//! | **Configuration** | Runtime threads, bus capacity, handler grace period.             | [`Config`]                                    |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use svcvisor::host::{record::SERVICE_RUNNING, sim::SimHost};
//! use svcvisor::{
//!     AcceptedCommands, ChangeRequests, Config, ControlCommand, ExitCode, HandlerFn,
//!     HandlerRef, Service, ServiceState, Status, StatusUpdates,
//! };
//!
//! let host = Arc::new(SimHost::new().with_args(["--verbose"]));
//! let ctl = host.controller();
//!
//! let handler: HandlerRef = HandlerFn::arc(
//!     "hello",
//!     |args: Vec<String>, mut requests: ChangeRequests, updates: StatusUpdates| async move {
//!         assert_eq!(args, ["hello", "--verbose"]);
//!         let running = Status::new(ServiceState::Running).with_accepted(AcceptedCommands::STOP);
//!         if updates.send(running).await.is_err() {
//!             return ExitCode::SUCCESS;
//!         }
//!         while let Some(req) = requests.recv().await {
//!             if req.command == ControlCommand::Stop {
//!                 let _ = updates.send(Status::new(ServiceState::StopPending)).await;
//!                 break;
//!             }
//!         }
//!         ExitCode::SUCCESS
//!     },
//! );
//!
//! let mut cfg = Config::default();
//! cfg.worker_threads = 2;
//! cfg.grace = Duration::from_secs(5);
//!
//! let service = Service::builder("hello", host.clone())
//!     .with_config(cfg)
//!     .build()
//!     .expect("runtime");
//!
//! let run = std::thread::spawn(move || service.run(handler));
//! assert!(host.wait_for_state(SERVICE_RUNNING, Duration::from_secs(5)));
//! ctl.send(ControlCommand::Stop);
//!
//! assert_eq!(run.join().unwrap().unwrap(), ExitCode::SUCCESS);
//! assert!(host.reports().last().unwrap().is_stopped());
//! ```
mod config;
mod core;
mod error;
mod events;
mod handler;
pub mod host;
mod status;
mod subscribers;

// ---- Public re-exports ----

pub use config::Config;
pub use core::{Service, ServiceBuilder, UnitId, current_unit, run};
pub use error::{HostError, LinkClosed, RunError};
pub use events::{Bus, Event, EventKind};
pub use handler::{ChangeRequests, Handler, HandlerFn, HandlerRef, StatusUpdates};
pub use host::record::StatusRecord;
pub use host::{ControlCallback, DispatchEntry, HostAdapter, RawArgs, ServiceHandle, ServiceMain};
pub use status::{AcceptedCommands, ChangeRequest, ControlCommand, ExitCode, ServiceState, Status};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
