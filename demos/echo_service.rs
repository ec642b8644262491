//! # Example: echo_service
//!
//! Runs a small service against the in-process simulated host.
//!
//! Shows how to:
//! - Implement [`Handler`] for a long-running service.
//! - Report `StartPending` with a checkpoint, then `Running`.
//! - Answer `Interrogate`, honor `Pause`/`Continue`, stop on `Stop`.
//! - Attach the built-in [`LogWriter`] subscriber.
//!
//! ## Flow
//! ```text
//! main thread ──► Service::run() ──► SimHost::dispatch() (control delivery thread)
//! driver thread ──► SimController::send(Interrogate, Pause, Continue, Stop)
//! Echo::execute ──► StartPending ─► Running ─► ... ─► StopPending ─► return
//! bridge ──► final Stopped
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example echo_service --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use svcvisor::host::record::{SERVICE_PAUSED, SERVICE_RUNNING};
use svcvisor::host::sim::SimHost;
use svcvisor::{
    AcceptedCommands, ChangeRequests, Config, ControlCommand, ExitCode, Handler, LogWriter,
    Service, ServiceState, Status, StatusUpdates, Subscribe,
};

struct Echo;

#[async_trait]
impl Handler for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    async fn execute(
        &self,
        args: Vec<String>,
        mut requests: ChangeRequests,
        updates: StatusUpdates,
    ) -> ExitCode {
        println!("[echo] args={args:?}");
        let accepted = AcceptedCommands::STOP | AcceptedCommands::PAUSE_CONTINUE;

        let starting = Status::new(ServiceState::StartPending)
            .with_checkpoint(1)
            .with_wait_hint(Duration::from_secs(2));
        if updates.send(starting).await.is_err() {
            return ExitCode::SUCCESS;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        if updates
            .send(Status::new(ServiceState::Running).with_accepted(accepted))
            .await
            .is_err()
        {
            return ExitCode::SUCCESS;
        }

        let mut ticks = tokio::time::interval(Duration::from_millis(250));
        loop {
            tokio::select! {
                req = requests.recv() => {
                    let Some(req) = req else { return ExitCode::SUCCESS };
                    let next = match req.command {
                        ControlCommand::Interrogate => req.status,
                        ControlCommand::Pause => Status::new(ServiceState::Paused).with_accepted(accepted),
                        ControlCommand::Continue => Status::new(ServiceState::Running).with_accepted(accepted),
                        ControlCommand::Stop | ControlCommand::Shutdown => break,
                        other => {
                            println!("[echo] ignoring {}", other.as_label());
                            continue;
                        }
                    };
                    if updates.send(next).await.is_err() {
                        return ExitCode::SUCCESS;
                    }
                }
                _ = ticks.tick() => println!("[echo] tick"),
            }
        }

        let _ = updates
            .send(Status::new(ServiceState::StopPending).with_wait_hint(Duration::from_secs(1)))
            .await;
        ExitCode::SUCCESS
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let host = Arc::new(SimHost::new().with_args(["--greeting", "hello"]));
    let ctl = host.controller();

    let cfg = Config {
        worker_threads: 2,
        ..Config::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let service = Service::builder("echo", host.clone())
        .with_config(cfg)
        .with_subscribers(subs)
        .build()?;

    let driver = std::thread::spawn({
        let host = Arc::clone(&host);
        move || {
            host.wait_for_state(SERVICE_RUNNING, Duration::from_secs(5));
            ctl.send(ControlCommand::Interrogate);
            ctl.send(ControlCommand::Pause);
            host.wait_for_state(SERVICE_PAUSED, Duration::from_secs(5));
            ctl.send(ControlCommand::Continue);
            std::thread::sleep(Duration::from_millis(600));
            ctl.send(ControlCommand::Stop);
        }
    });

    let exit = service.run(Arc::new(Echo))?;
    let _ = driver.join();
    println!("[main] exit={exit:?} reports={}", host.reports().len());
    Ok(())
}
