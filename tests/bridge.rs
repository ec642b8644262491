use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use svcvisor::host::record::{
    ERROR_SERVICE_SPECIFIC_ERROR, NO_ERROR, SERVICE_ACCEPT_STOP, SERVICE_PAUSED,
    SERVICE_RUNNING, SERVICE_START_PENDING, SERVICE_STOP_PENDING, SERVICE_STOPPED,
};
use svcvisor::host::sim::SimHost;
use svcvisor::{
    AcceptedCommands, ChangeRequest, ChangeRequests, Config, ControlCommand, Event, EventKind,
    ExitCode, HandlerFn, HandlerRef, HostError, RunError, Service, ServiceState, Status,
    StatusUpdates, Subscribe,
};

const WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Recorder {
    kinds: Mutex<Vec<EventKind>>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.kinds.lock().push(event.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

fn start(host: &Arc<SimHost>, handler: HandlerRef) -> JoinHandle<Result<ExitCode, RunError>> {
    start_with(host, handler, Config::default(), Vec::new())
}

fn start_with(
    host: &Arc<SimHost>,
    handler: HandlerRef,
    cfg: Config,
    subs: Vec<Arc<dyn Subscribe>>,
) -> JoinHandle<Result<ExitCode, RunError>> {
    let service = Service::builder("svc", host.clone())
        .with_config(cfg)
        .with_subscribers(subs)
        .build()
        .expect("runtime");
    std::thread::spawn(move || service.run(handler))
}

fn running() -> Status {
    Status::new(ServiceState::Running).with_accepted(AcceptedCommands::STOP)
}

/// Reports Running, records every request, returns on Stop after StopPending.
fn recording_handler(seen: Arc<Mutex<Vec<ChangeRequest>>>) -> HandlerRef {
    HandlerFn::arc(
        "recording",
        move |_args: Vec<String>, mut requests: ChangeRequests, updates: StatusUpdates| {
            let seen = Arc::clone(&seen);
            async move {
                let _ = updates.send(running()).await;
                while let Some(req) = requests.recv().await {
                    seen.lock().push(req);
                    match req.command {
                        ControlCommand::Stop => {
                            let _ = updates.send(Status::new(ServiceState::StopPending)).await;
                            return ExitCode::SUCCESS;
                        }
                        ControlCommand::Pause => {
                            let paused =
                                Status::new(ServiceState::Paused).with_accepted(req.status.accepted);
                            let _ = updates.send(paused).await;
                        }
                        _ => {}
                    }
                }
                ExitCode::SUCCESS
            }
        },
    )
}

/// Reports Running, then idles until the bridge closes its links.
fn idle_handler() -> HandlerRef {
    HandlerFn::arc(
        "idle",
        |_args: Vec<String>, mut requests: ChangeRequests, updates: StatusUpdates| async move {
            let _ = updates.send(running()).await;
            while requests.recv().await.is_some() {}
            ExitCode::SUCCESS
        },
    )
}

fn stopped_count(host: &SimHost) -> usize {
    host.reports().iter().filter(|r| r.is_stopped()).count()
}

#[test]
fn test_statuses_reported_in_order_with_single_stop() {
    let host = Arc::new(SimHost::new());
    let ctl = host.controller();
    let handler = HandlerFn::arc(
        "ordered",
        |_args: Vec<String>, mut requests: ChangeRequests, updates: StatusUpdates| async move {
            let starting = Status::new(ServiceState::StartPending)
                .with_checkpoint(1)
                .with_wait_hint(Duration::from_millis(1500));
            let _ = updates.send(starting).await;
            let _ = updates.send(running()).await;
            while let Some(req) = requests.recv().await {
                if req.command == ControlCommand::Stop {
                    break;
                }
            }
            let _ = updates.send(Status::new(ServiceState::StopPending)).await;
            ExitCode::SUCCESS
        },
    );

    let run = start(&host, handler);
    assert!(host.wait_for_state(SERVICE_RUNNING, WAIT));
    ctl.send(ControlCommand::Stop);
    assert_eq!(run.join().unwrap().unwrap(), ExitCode::SUCCESS);

    let reports = host.reports();
    let states: Vec<u32> = reports.iter().map(|r| r.current_state).collect();
    assert_eq!(
        states,
        vec![SERVICE_START_PENDING, SERVICE_RUNNING, SERVICE_STOP_PENDING, SERVICE_STOPPED]
    );
    assert_eq!(reports[0].checkpoint, 1);
    assert_eq!(reports[0].wait_hint_ms, 1500);
    assert_eq!(reports[1].controls_accepted, SERVICE_ACCEPT_STOP);
    assert_eq!(reports[3].win32_exit_code, NO_ERROR);
    assert_eq!(stopped_count(&host), 1);
    assert!(host.callback_results().iter().all(|&r| r == NO_ERROR));
}

#[test]
fn test_requests_arrive_in_host_order_with_current_status() {
    let host = Arc::new(SimHost::new());
    let ctl = host.controller();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let run = start(&host, recording_handler(Arc::clone(&seen)));
    assert!(host.wait_for_state(SERVICE_RUNNING, WAIT));
    ctl.send(ControlCommand::Interrogate);
    ctl.send_raw(0x80, 7, 42);
    ctl.send(ControlCommand::Pause);
    assert!(host.wait_for_state(SERVICE_PAUSED, WAIT));
    ctl.send(ControlCommand::Interrogate);
    ctl.send(ControlCommand::Stop);
    assert_eq!(run.join().unwrap().unwrap(), ExitCode::SUCCESS);

    let seen = seen.lock().clone();
    let commands: Vec<ControlCommand> = seen.iter().map(|r| r.command).collect();
    assert_eq!(
        commands,
        vec![
            ControlCommand::Interrogate,
            ControlCommand::Other(0x80),
            ControlCommand::Pause,
            ControlCommand::Interrogate,
            ControlCommand::Stop,
        ]
    );
    assert_eq!(seen[0].status.state, ServiceState::Running);
    assert_eq!((seen[1].event_type, seen[1].event_data), (7, 42));
    assert_eq!(seen[3].status.state, ServiceState::Paused);
    assert_eq!(stopped_count(&host), 1);
}

#[test]
fn test_report_failure_with_error_number_ends_run() {
    let host = Arc::new(SimHost::new().with_report_failure(0, HostError::Os { code: 1053 }));

    let exit = start(&host, idle_handler()).join().unwrap().unwrap();
    assert_eq!(exit, ExitCode::service_specific(1053));

    let reports = host.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].is_stopped());
    assert_eq!(reports[0].win32_exit_code, ERROR_SERVICE_SPECIFIC_ERROR);
    assert_eq!(reports[0].service_specific_exit_code, 1053);
}

#[test]
fn test_report_failure_without_error_number_uses_sentinel() {
    let host = Arc::new(SimHost::new().with_report_failure(0, HostError::other("pipe broken")));

    let exit = start(&host, idle_handler()).join().unwrap().unwrap();
    assert_eq!(exit, ExitCode::service_specific(ExitCode::STATUS_REPORT_FAILED));

    let last = *host.reports().last().unwrap();
    assert!(last.is_stopped());
    assert_eq!(last.win32_exit_code, ERROR_SERVICE_SPECIFIC_ERROR);
    assert_eq!(last.service_specific_exit_code, ExitCode::STATUS_REPORT_FAILED);
}

#[test]
fn test_foreign_thread_callback_is_not_forwarded() {
    let host = Arc::new(SimHost::new());
    let ctl = host.controller();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let run = start(&host, recording_handler(Arc::clone(&seen)));
    assert!(host.wait_for_state(SERVICE_RUNNING, WAIT));
    ctl.send_from_foreign_thread(ControlCommand::Stop);

    let exit = run.join().unwrap().unwrap();
    assert_eq!(exit, ExitCode::service_specific(ExitCode::CROSS_THREAD_CALLBACK));
    assert!(seen.lock().is_empty());

    let last = *host.reports().last().unwrap();
    assert!(last.is_stopped());
    assert_eq!(last.service_specific_exit_code, ExitCode::CROSS_THREAD_CALLBACK);
    assert_eq!(stopped_count(&host), 1);
}

#[test]
fn test_handler_exit_code_is_reported() {
    let host = Arc::new(SimHost::new());
    let handler = HandlerFn::arc(
        "failing",
        |_args: Vec<String>, _requests: ChangeRequests, updates: StatusUpdates| async move {
            let _ = updates.send(running()).await;
            ExitCode::service_specific(42)
        },
    );

    let exit = start(&host, handler).join().unwrap().unwrap();
    assert_eq!(exit, ExitCode::service_specific(42));
    let last = *host.reports().last().unwrap();
    assert_eq!(last.win32_exit_code, ERROR_SERVICE_SPECIFIC_ERROR);
    assert_eq!(last.service_specific_exit_code, 42);
}

#[test]
fn test_handler_panic_reports_sentinel() {
    let host = Arc::new(SimHost::new());
    let handler = HandlerFn::arc(
        "panicking",
        |_args: Vec<String>, _requests: ChangeRequests, _updates: StatusUpdates| async move {
            if true {
                panic!("boom");
            }
            ExitCode::SUCCESS
        },
    );

    let exit = start(&host, handler).join().unwrap().unwrap();
    assert_eq!(exit, ExitCode::service_specific(ExitCode::HANDLER_PANICKED));
    assert_eq!(host.reports().len(), 1);
    assert_eq!(stopped_count(&host), 1);
}

#[test]
fn test_startup_arguments_are_passed_in_order() {
    let host = Arc::new(SimHost::new().with_args(["--port", "8080"]));
    let got = Arc::new(Mutex::new(Vec::new()));
    let handler = {
        let got = Arc::clone(&got);
        HandlerFn::arc(
            "args",
            move |args: Vec<String>, _requests: ChangeRequests, _updates: StatusUpdates| {
                *got.lock() = args;
                async { ExitCode::SUCCESS }
            },
        )
    };

    assert_eq!(start(&host, handler).join().unwrap().unwrap(), ExitCode::SUCCESS);
    assert_eq!(*got.lock(), vec!["svc", "--port", "8080"]);
}

#[test]
fn test_registration_failure_reports_nothing() {
    let host = Arc::new(SimHost::new().with_registration_failure(HostError::Os { code: 1063 }));

    match start(&host, idle_handler()).join().unwrap() {
        Err(RunError::Registration(e)) => assert_eq!(e.code(), Some(1063)),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(host.reports().is_empty());
}

#[test]
fn test_dispatch_failure_reports_nothing() {
    let host = Arc::new(SimHost::new().with_dispatch_failure(HostError::Os { code: 1063 }));

    match start(&host, idle_handler()).join().unwrap() {
        Err(RunError::Dispatch(e)) => assert_eq!(e, HostError::Os { code: 1063 }),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(host.reports().is_empty());
}

#[test]
fn test_dispatch_returning_early_is_an_error() {
    let host = Arc::new(SimHost::new().without_start());

    let res = start(&host, idle_handler()).join().unwrap();
    assert!(matches!(res, Err(RunError::Dispatch(_))));
    assert!(host.reports().is_empty());
}

#[test]
fn test_event_sequence_for_clean_run() {
    let host = Arc::new(SimHost::new());
    let ctl = host.controller();
    let recorder = Arc::new(Recorder::default());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let run = start_with(
        &host,
        recording_handler(seen),
        Config::default(),
        vec![recorder.clone() as Arc<dyn Subscribe>],
    );
    assert!(host.wait_for_state(SERVICE_RUNNING, WAIT));
    ctl.send(ControlCommand::Stop);
    run.join().unwrap().unwrap();

    let kinds = recorder.kinds.lock().clone();
    assert_eq!(
        kinds,
        vec![
            EventKind::DispatcherReady,
            EventKind::HandlerStarted,
            EventKind::StatusReported,
            EventKind::ControlReceived,
            EventKind::RequestDelivered,
            EventKind::StatusReported,
            EventKind::HandlerExited,
            EventKind::FinalStatusReported,
            EventKind::BridgeStopped,
        ]
    );
}

#[test]
fn test_stuck_handler_exceeds_grace() {
    let host = Arc::new(SimHost::new().with_report_failure(0, HostError::Os { code: 5 }));
    let recorder = Arc::new(Recorder::default());
    let handler = HandlerFn::arc(
        "stuck",
        |_args: Vec<String>, _requests: ChangeRequests, updates: StatusUpdates| async move {
            let _ = updates.send(running()).await;
            tokio::time::sleep(Duration::from_secs(3600)).await;
            ExitCode::SUCCESS
        },
    );
    let cfg = Config {
        grace: Duration::from_millis(50),
        ..Config::default()
    };

    let exit = start_with(&host, handler, cfg, vec![recorder.clone() as Arc<dyn Subscribe>])
        .join()
        .unwrap()
        .unwrap();
    assert_eq!(exit, ExitCode::service_specific(5));

    let kinds = recorder.kinds.lock().clone();
    assert!(kinds.contains(&EventKind::StatusReportFailed));
    assert_eq!(kinds.last(), Some(&EventKind::GraceExceeded));
}
