//! # Bridge: the single loop between host, handler and status reports.
//!
//! The bridge owns the status handle for one run. It waits for
//! dispatcher-ready, starts the [`Handler`](crate::Handler), then multiplexes
//! three sources until one of them ends the run:
//!
//! - control events from the host callback thread,
//! - status updates from the handler,
//! - handler completion.
//!
//! ## Architecture
//! ```text
//! control link ──► [Mailbox] ──► ChangeRequests (handler)
//!                     ▲ holds at most one request until the handler takes it
//!
//! StatusUpdates ──► to_record(status, exit) ──► host.report_status()
//!
//! handler task ──► ExitCode ──┐
//! report failure ─────────────┼──► final Stopped report ──► bridge-stopped
//! affinity violation ─────────┘
//! ```
//!
//! ## Rules
//! - Nothing is reported before dispatcher-ready; if it never carries a handle
//!   nothing is reported at all.
//! - While a request waits in the mailbox the control link is not read, so the
//!   host callback thread stays blocked (one command in flight).
//! - Every status report uses the current exit code.
//! - Exactly one final `Stopped` report per started run, whatever ended it.

use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};
use tokio::select;
use tokio::task::JoinHandle;

use crate::core::affinity::ControlEvent;
use crate::core::handshake::{Dispatched, Handshake};
use crate::core::link::{self, Offer, Take};
use crate::core::registry;
use crate::error::{HostError, LinkClosed};
use crate::events::{Bus, Event, EventKind};
use crate::handler::{ChangeRequests, HandlerRef, StatusUpdates};
use crate::host::translate::to_record;
use crate::host::{HostAdapter, ServiceHandle};
use crate::status::{ChangeRequest, ControlCommand, ExitCode, Status};
use crate::subscribers::panic_message;

/// How a bridge run ended.
pub(crate) enum Outcome {
    /// The host never assigned a status handle; nothing was reported.
    NotStarted(Option<HostError>),
    /// The final `Stopped` status was reported with `exit`.
    ///
    /// `handler` is still running when the run ended for another reason than
    /// handler completion.
    Stopped {
        exit: ExitCode,
        handler: Option<JoinHandle<ExitCode>>,
    },
}

/// Pending delivery of one change request to the handler.
type Delivery = BoxFuture<'static, Result<(), LinkClosed>>;

/// Single-slot hand-off between the control link and the handler.
enum Mailbox {
    /// Empty; the next control event may be read.
    Awaiting,
    /// One request is waiting for the handler.
    ///
    /// The delivery future lives here across loop iterations, so a request is
    /// never offered twice.
    Holding {
        command: ControlCommand,
        delivery: Delivery,
    },
    /// The handler dropped its request stream; events are accepted and discarded.
    Detached,
}

impl Mailbox {
    fn is_holding(&self) -> bool {
        matches!(self, Mailbox::Holding { .. })
    }

    /// Drives the held delivery and returns the command it carried; pends
    /// forever when nothing is held.
    async fn delivered(&mut self) -> (ControlCommand, Result<(), LinkClosed>) {
        match self {
            Mailbox::Holding { command, delivery } => (*command, delivery.await),
            _ => std::future::pending().await,
        }
    }
}

/// One run of the bridge.
pub(crate) struct Bridge {
    /// Service name (for events).
    pub name: Arc<str>,
    pub host: Arc<dyn HostAdapter>,
    pub handler: HandlerRef,
    pub handshake: Arc<Handshake>,
    /// Receiving half of the control link fed by the host callback.
    pub control: Take<ControlEvent>,
    /// Registration id to release when the bridge stops.
    pub context: usize,
    pub bus: Bus,
}

impl Bridge {
    /// Runs the bridge to completion.
    ///
    /// ### Steps
    /// 1. Wait for dispatcher-ready and take the handle and arguments
    /// 2. Start the handler
    /// 3. Multiplex control, status and completion until the run ends
    /// 4. Report the final `Stopped` status (once)
    /// 5. Release the registration and set bridge-stopped
    pub async fn run(mut self) -> Outcome {
        let Dispatched { handle, args } = match self.handshake.dispatched().await {
            Some(Ok(dispatched)) => dispatched,
            failed => {
                let err = failed.and_then(Result::err);
                let reason = err
                    .as_ref()
                    .map_or_else(|| "service never started".to_string(), HostError::as_message);
                self.bus.publish(
                    Event::new(EventKind::RegistrationFailed)
                        .with_service(Arc::clone(&self.name))
                        .with_reason(reason),
                );
                self.release();
                return Outcome::NotStarted(err);
            }
        };
        self.bus.publish(
            Event::new(EventKind::DispatcherReady)
                .with_service(Arc::clone(&self.name))
                .with_args(args.len()),
        );

        let (exit, handler) = self.drive(handle, args).await;

        let stopped = to_record(&Status::stopped(), &exit);
        let mut ev = Event::new(EventKind::FinalStatusReported)
            .with_service(Arc::clone(&self.name))
            .with_exit(exit);
        if let Err(e) = self.host.report_status(handle, &stopped) {
            ev = ev.with_reason(e.as_message());
        }
        self.bus.publish(ev);

        self.release();
        Outcome::Stopped { exit, handler }
    }

    /// Main loop. Returns the exit code for the final report and the handler
    /// task if it has not finished yet.
    ///
    /// Both handler links are dropped on return, so a handler that is still
    /// running sees `None` from its requests and `LinkClosed` from its updates.
    async fn drive(
        &mut self,
        handle: ServiceHandle,
        args: Vec<String>,
    ) -> (ExitCode, Option<JoinHandle<ExitCode>>) {
        let (request_tx, request_rx) = link::rendezvous::<ChangeRequest>();
        let (status_tx, mut status_rx) = link::rendezvous::<Status>();

        let handler = Arc::clone(&self.handler);
        let mut completion = tokio::spawn(async move {
            handler
                .execute(
                    args,
                    ChangeRequests::new(request_rx),
                    StatusUpdates::new(status_tx),
                )
                .await
        });
        self.bus.publish(
            Event::new(EventKind::HandlerStarted)
                .with_service(Arc::clone(&self.name))
                .with_reason(self.handler.name()),
        );

        let mut current = Status::default();
        let mut exit = ExitCode::SUCCESS;
        let mut mailbox = Mailbox::Awaiting;
        let mut statuses_open = true;

        loop {
            select! {
                biased;

                Some(ev) = self.control.recv(), if !mailbox.is_holding() => {
                    if let Some(code) = ev.error {
                        exit = ExitCode::service_specific(code);
                        self.bus.publish(
                            Event::new(EventKind::AffinityViolation)
                                .with_service(Arc::clone(&self.name))
                                .with_exit(exit),
                        );
                        return (exit, Some(completion));
                    }
                    self.publish_command(EventKind::ControlReceived, ev.command);
                    if matches!(mailbox, Mailbox::Detached) {
                        self.publish_command(EventKind::RequestDropped, ev.command);
                        continue;
                    }
                    mailbox = Mailbox::Holding {
                        command: ev.command,
                        delivery: deliver(&request_tx, ev, current),
                    };
                }
                (command, delivered) = mailbox.delivered(), if mailbox.is_holding() => {
                    match delivered {
                        Ok(()) => {
                            self.publish_command(EventKind::RequestDelivered, command);
                            mailbox = Mailbox::Awaiting;
                        }
                        Err(LinkClosed) => {
                            self.publish_command(EventKind::RequestDropped, command);
                            mailbox = Mailbox::Detached;
                        }
                    }
                }
                next = status_rx.recv(), if statuses_open => {
                    let Some(status) = next else {
                        statuses_open = false;
                        continue;
                    };
                    match self.host.report_status(handle, &to_record(&status, &exit)) {
                        Ok(()) => {
                            current = status;
                            self.bus.publish(
                                Event::new(EventKind::StatusReported)
                                    .with_service(Arc::clone(&self.name))
                                    .with_state(status.state),
                            );
                        }
                        Err(e) => {
                            exit = ExitCode::service_specific(
                                e.code().unwrap_or(ExitCode::STATUS_REPORT_FAILED),
                            );
                            self.bus.publish(
                                Event::new(EventKind::StatusReportFailed)
                                    .with_service(Arc::clone(&self.name))
                                    .with_state(status.state)
                                    .with_exit(exit)
                                    .with_reason(e.as_message()),
                            );
                            return (exit, Some(completion));
                        }
                    }
                }
                joined = &mut completion => {
                    let exit = match joined {
                        Ok(code) => {
                            self.bus.publish(
                                Event::new(EventKind::HandlerExited)
                                    .with_service(Arc::clone(&self.name))
                                    .with_exit(code),
                            );
                            code
                        }
                        Err(e) => {
                            let exit = ExitCode::service_specific(ExitCode::HANDLER_PANICKED);
                            let info = if e.is_panic() {
                                panic_message(&*e.into_panic())
                            } else {
                                e.to_string()
                            };
                            self.bus.publish(
                                Event::new(EventKind::HandlerPanicked)
                                    .with_service(Arc::clone(&self.name))
                                    .with_exit(exit)
                                    .with_reason(info),
                            );
                            exit
                        }
                    };
                    return (exit, None);
                }
            }
        }
    }

    fn publish_command(&self, kind: EventKind, command: ControlCommand) {
        self.bus.publish(
            Event::new(kind)
                .with_service(Arc::clone(&self.name))
                .with_command(command),
        );
    }

    /// Closes the control link, drops the registration and sets bridge-stopped.
    fn release(&mut self) {
        self.control.close();
        registry::deregister(self.context);
        self.bus.publish(Event::new(EventKind::BridgeStopped).with_service(Arc::clone(&self.name)));
        self.handshake.bridge_stopped();
    }
}

/// Builds the delivery of one change request carrying the current status.
fn deliver(requests: &Offer<ChangeRequest>, ev: ControlEvent, status: Status) -> Delivery {
    let requests = requests.clone();
    let request = ChangeRequest {
        command: ev.command,
        event_type: ev.event_type,
        event_data: ev.event_data,
        context: ev.context,
        status,
    };
    async move { requests.send(request).await }.boxed()
}
