//! # In-process simulated host.
//!
//! [`SimHost`] plays the service control manager for tests and demos. It
//! follows the same threading contract as a real host:
//!
//! - `dispatch` runs the service entry point on its own thread, then turns the
//!   calling thread into the control delivery thread;
//! - control commands queued through a [`SimController`] are delivered one at
//!   a time through the registered callback on that thread;
//! - `dispatch` returns once a `Stopped` status was reported.
//!
//! Faults can be injected at each host call, and a command can be delivered
//! from a foreign thread to exercise the affinity check.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use svcvisor::host::record::SERVICE_RUNNING;
//! use svcvisor::host::sim::SimHost;
//! use svcvisor::{
//!     AcceptedCommands, ChangeRequests, ControlCommand, ExitCode, HandlerFn, ServiceState,
//!     Status, StatusUpdates,
//! };
//!
//! let host = Arc::new(SimHost::new());
//! let ctl = host.controller();
//! let handler = HandlerFn::arc(
//!     "doc",
//!     |_args: Vec<String>, mut req: ChangeRequests, upd: StatusUpdates| async move {
//!         let running = Status::new(ServiceState::Running).with_accepted(AcceptedCommands::STOP);
//!         let _ = upd.send(running).await;
//!         while let Some(r) = req.recv().await {
//!             if r.command == ControlCommand::Stop {
//!                 break;
//!             }
//!         }
//!         ExitCode::SUCCESS
//!     },
//! );
//!
//! let run = std::thread::spawn({
//!     let host = Arc::clone(&host);
//!     move || svcvisor::run("doc", host, handler)
//! });
//! assert!(host.wait_for_state(SERVICE_RUNNING, Duration::from_secs(5)));
//! ctl.send(ControlCommand::Stop);
//! assert_eq!(run.join().unwrap().unwrap(), ExitCode::SUCCESS);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio::sync::mpsc;

use crate::error::HostError;
use crate::host::args::encode_wide;
use crate::host::record::StatusRecord;
use crate::host::{ControlCallback, DispatchEntry, HostAdapter, ServiceHandle};
use crate::status::ControlCommand;

/// Native "invalid handle" error number.
const ERROR_INVALID_HANDLE: u32 = 6;

/// Handle the simulated host assigns at registration.
const SIM_HANDLE: ServiceHandle = ServiceHandle(0x5157);

enum SimCommand {
    Control {
        control: u32,
        event_type: u32,
        event_data: usize,
    },
    Foreign {
        control: u32,
    },
    Exit,
}

#[derive(Default)]
struct Faults {
    dispatch: Option<HostError>,
    no_start: bool,
    registration: Option<HostError>,
    report: Option<(usize, HostError)>,
}

/// Simulated service control manager.
pub struct SimHost {
    tx: mpsc::UnboundedSender<SimCommand>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<SimCommand>>>,
    callback: Mutex<Option<(ControlCallback, usize)>>,
    args: Vec<String>,
    faults: Faults,
    attempts: AtomicUsize,
    reports: Mutex<Vec<StatusRecord>>,
    reported: Condvar,
    results: Mutex<Vec<u32>>,
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHost {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            callback: Mutex::new(None),
            args: Vec::new(),
            faults: Faults::default(),
            attempts: AtomicUsize::new(0),
            reports: Mutex::new(Vec::new()),
            reported: Condvar::new(),
            results: Mutex::new(Vec::new()),
        }
    }

    /// Extra startup arguments passed after the service name.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// `dispatch` fails immediately with `err`.
    pub fn with_dispatch_failure(mut self, err: HostError) -> Self {
        self.faults.dispatch = Some(err);
        self
    }

    /// `dispatch` returns `Ok` without ever calling the service entry point.
    pub fn without_start(mut self) -> Self {
        self.faults.no_start = true;
        self
    }

    /// `register_control_handler` fails with `err`.
    pub fn with_registration_failure(mut self, err: HostError) -> Self {
        self.faults.registration = Some(err);
        self
    }

    /// The report attempt number `attempt` (0-based) fails with `err`.
    pub fn with_report_failure(mut self, attempt: usize, err: HostError) -> Self {
        self.faults.report = Some((attempt, err));
        self
    }

    /// Handle for queueing control commands.
    pub fn controller(&self) -> SimController {
        SimController {
            tx: self.tx.clone(),
        }
    }

    /// Every record the host accepted, in order.
    pub fn reports(&self) -> Vec<StatusRecord> {
        self.reports.lock().clone()
    }

    /// Return values of every control callback delivered so far.
    pub fn callback_results(&self) -> Vec<u32> {
        self.results.lock().clone()
    }

    /// Waits until `pred` holds for the accepted records or `timeout` elapses.
    pub fn wait_for(&self, pred: impl Fn(&[StatusRecord]) -> bool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut reports = self.reports.lock();
        while !pred(&reports) {
            if self.reported.wait_until(&mut reports, deadline).timed_out() {
                return pred(&reports);
            }
        }
        true
    }

    /// Waits until a record with `state` was accepted.
    pub fn wait_for_state(&self, state: u32, timeout: Duration) -> bool {
        self.wait_for(|r| r.iter().any(|x| x.current_state == state), timeout)
    }

    fn deliver(&self, control: u32, event_type: u32, event_data: usize) {
        let Some((callback, context)) = *self.callback.lock() else {
            return;
        };
        let res = callback(control, event_type, event_data, context);
        self.results.lock().push(res);
    }

    fn deliver_foreign(&self, control: u32) {
        let Some((callback, context)) = *self.callback.lock() else {
            return;
        };
        let res = std::thread::spawn(move || callback(control, 0, 0, context)).join();
        if let Ok(res) = res {
            self.results.lock().push(res);
        }
    }
}

impl HostAdapter for SimHost {
    fn dispatch(&self, entry: DispatchEntry) -> Result<(), HostError> {
        if let Some(err) = &self.faults.dispatch {
            return Err(err.clone());
        }
        if self.faults.no_start {
            return Ok(());
        }
        let mut rx = self
            .rx
            .lock()
            .take()
            .ok_or_else(|| HostError::other("dispatcher already running"))?;

        let raw = std::iter::once(entry.name.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(encode_wide)
            .collect();
        let main = entry.main;
        let context = entry.context;
        std::thread::Builder::new()
            .name(format!("{}-main", entry.name))
            .spawn(move || main(context, raw))
            .map_err(|e| HostError::other(e.to_string()))?
            .join()
            .map_err(|_| HostError::other("service entry point panicked"))?;

        while let Some(cmd) = rx.blocking_recv() {
            match cmd {
                SimCommand::Control {
                    control,
                    event_type,
                    event_data,
                } => self.deliver(control, event_type, event_data),
                SimCommand::Foreign { control } => self.deliver_foreign(control),
                SimCommand::Exit => break,
            }
        }
        Ok(())
    }

    fn register_control_handler(
        &self,
        _name: &str,
        callback: ControlCallback,
        context: usize,
    ) -> Result<ServiceHandle, HostError> {
        if let Some(err) = &self.faults.registration {
            let _ = self.tx.send(SimCommand::Exit);
            return Err(err.clone());
        }
        *self.callback.lock() = Some((callback, context));
        Ok(SIM_HANDLE)
    }

    fn report_status(&self, handle: ServiceHandle, record: &StatusRecord) -> Result<(), HostError> {
        if handle != SIM_HANDLE {
            return Err(HostError::Os {
                code: ERROR_INVALID_HANDLE,
            });
        }
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed);
        if let Some((at, err)) = &self.faults.report {
            if *at == attempt {
                return Err(err.clone());
            }
        }
        self.reports.lock().push(*record);
        self.reported.notify_all();
        if record.is_stopped() {
            *self.callback.lock() = None;
            let _ = self.tx.send(SimCommand::Exit);
        }
        Ok(())
    }
}

/// Queues control commands for a [`SimHost`].
#[derive(Clone)]
pub struct SimController {
    tx: mpsc::UnboundedSender<SimCommand>,
}

impl SimController {
    /// Queues `command` for delivery on the dispatch thread.
    pub fn send(&self, command: ControlCommand) {
        self.send_raw(command.as_raw(), 0, 0);
    }

    /// Queues a raw control code with its event payload.
    pub fn send_raw(&self, control: u32, event_type: u32, event_data: usize) {
        let _ = self.tx.send(SimCommand::Control {
            control,
            event_type,
            event_data,
        });
    }

    /// Queues `command` for delivery from a freshly spawned thread.
    pub fn send_from_foreign_thread(&self, command: ControlCommand) {
        let _ = self.tx.send(SimCommand::Foreign {
            control: command.as_raw(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::record::{SERVICE_RUNNING, SERVICE_STOPPED};

    fn record(state: u32) -> StatusRecord {
        StatusRecord {
            current_state: state,
            ..StatusRecord::default()
        }
    }

    #[test]
    fn test_report_requires_registered_handle() {
        let host = SimHost::new();
        let err = host.report_status(ServiceHandle(1), &record(SERVICE_RUNNING));
        assert_eq!(err, Err(HostError::Os { code: ERROR_INVALID_HANDLE }));
        assert!(host.reports().is_empty());
    }

    #[test]
    fn test_report_failure_hits_one_attempt() {
        let host = SimHost::new().with_report_failure(1, HostError::Os { code: 5 });
        assert!(host.report_status(SIM_HANDLE, &record(SERVICE_RUNNING)).is_ok());
        assert!(host.report_status(SIM_HANDLE, &record(SERVICE_RUNNING)).is_err());
        assert!(host.report_status(SIM_HANDLE, &record(SERVICE_STOPPED)).is_ok());
        assert_eq!(host.reports().len(), 2);
    }

    #[test]
    fn test_wait_for_state_times_out() {
        let host = SimHost::new();
        assert!(!host.wait_for_state(SERVICE_RUNNING, Duration::from_millis(10)));
        host.report_status(SIM_HANDLE, &record(SERVICE_RUNNING)).unwrap();
        assert!(host.wait_for_state(SERVICE_RUNNING, Duration::from_millis(10)));
    }

    #[test]
    fn test_dispatch_faults() {
        fn main(_ctx: usize, _args: crate::host::RawArgs) {}
        let entry = || DispatchEntry {
            name: "svc".into(),
            main,
            context: 1,
        };
        let failing = SimHost::new().with_dispatch_failure(HostError::Os { code: 1063 });
        assert_eq!(failing.dispatch(entry()), Err(HostError::Os { code: 1063 }));
        assert_eq!(SimHost::new().without_start().dispatch(entry()), Ok(()));
    }
}
