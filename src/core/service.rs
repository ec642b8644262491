//! # Service: one run of the control bridge on the registration thread.
//!
//! [`Service::run`] is called from the thread that should become the host's
//! dispatch thread. It registers the run, starts the runtime-side pieces
//! (event listener and [`Bridge`]), then hands control to the host.
//!
//! ## Architecture
//! ```text
//! registration thread                      runtime (tokio)
//! ───────────────────                      ───────────────
//! AffinityGuard::capture()
//! registry::register(..) ─► ctx
//! spawn listener ────────────────────────► Bus ─► SubscriberSet::emit()
//! spawn bridge ──────────────────────────► Bridge::run() waits dispatcher-ready
//! host.dispatch(service_main, ctx)
//!   ├─► service_main: register handler, publish handle/args ─► bridge starts handler
//!   └─► control callbacks (this thread) ─► control link ─► bridge
//! wait(bridge-stopped)
//! join bridge ─► Outcome
//! wait handler up to Config::grace (only if it is still running)
//! stop listener, drain subscribers
//! return ExitCode | RunError
//! ```
//!
//! ## Rules
//! - `run` must not be called from inside an async runtime: it blocks its thread.
//! - A dispatch that fails, or returns without the service ever starting,
//!   releases the bridge without any status report and yields a [`RunError`].

use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::affinity::AffinityGuard;
use crate::core::bridge::{Bridge, Outcome};
use crate::core::handshake::Handshake;
use crate::core::link;
use crate::core::registry::{self, Registration};
use crate::error::{HostError, RunError};
use crate::events::{Bus, Event, EventKind};
use crate::handler::HandlerRef;
use crate::host::{DispatchEntry, HostAdapter};
use crate::status::ExitCode;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for a [`Service`].
pub struct ServiceBuilder {
    name: String,
    host: Arc<dyn HostAdapter>,
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ServiceBuilder {
    /// Creates a builder for the service `name` running on `host`.
    pub fn new(name: impl Into<String>, host: Arc<dyn HostAdapter>) -> Self {
        Self {
            name: name.into(),
            host,
            cfg: Config::default(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the default configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive run events (control commands, reports, exit)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the service and its runtime.
    ///
    /// # Errors
    /// [`RunError::Runtime`] if the runtime cannot be created.
    pub fn build(self) -> Result<Service, RunError> {
        let mut rt = tokio::runtime::Builder::new_multi_thread();
        rt.enable_all().thread_name(format!("{}-bridge", self.name));
        if let Some(n) = self.cfg.worker_threads() {
            rt.worker_threads(n);
        }
        let runtime = rt.build()?;

        Ok(Service {
            name: Arc::from(self.name),
            host: self.host,
            bus: Bus::new(self.cfg.bus_capacity_clamped()),
            cfg: self.cfg,
            subscribers: self.subscribers,
            runtime,
        })
    }
}

/// A service ready to run once.
pub struct Service {
    name: Arc<str>,
    host: Arc<dyn HostAdapter>,
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    bus: Bus,
    runtime: Runtime,
}

impl Service {
    /// Shortcut for [`ServiceBuilder::new`].
    pub fn builder(name: impl Into<String>, host: Arc<dyn HostAdapter>) -> ServiceBuilder {
        ServiceBuilder::new(name, host)
    }

    /// Service name as registered with the host.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Event bus of this run. Receivers subscribed before [`run`](Self::run)
    /// see every event of the run.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs `handler` as this service until the final `Stopped` report.
    ///
    /// Blocks the calling thread, which becomes the host's dispatch thread.
    /// Returns the exit code reported with `Stopped`.
    ///
    /// # Errors
    /// - [`RunError::Dispatch`] if the host dispatcher failed or returned
    ///   without starting the service;
    /// - [`RunError::Registration`] if the host refused the control callback.
    ///
    /// # Panics
    /// Panics if called from within an async runtime.
    pub fn run(mut self, handler: HandlerRef) -> Result<ExitCode, RunError> {
        let handshake = Arc::new(Handshake::new());
        let (control_tx, control_rx) = link::rendezvous();
        let context = registry::register(Registration {
            name: Arc::clone(&self.name),
            host: Arc::clone(&self.host),
            guard: AffinityGuard::capture(),
            control: control_tx,
            handshake: Arc::clone(&handshake),
        });

        let token = CancellationToken::new();
        let listener = self.spawn_listener(token.clone());

        let bridge = self.runtime.spawn(
            Bridge {
                name: Arc::clone(&self.name),
                host: Arc::clone(&self.host),
                handler,
                handshake: Arc::clone(&handshake),
                control: control_rx,
                context,
                bus: self.bus.clone(),
            }
            .run(),
        );

        let dispatch_err = self.dispatch(context, &handshake);

        handshake.wait_bridge_stopped();
        let outcome = match self.runtime.block_on(bridge) {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Outcome::NotStarted(None),
        };

        let res = match outcome {
            Outcome::NotStarted(err) => Err(match dispatch_err {
                Some(e) => RunError::Dispatch(e),
                None => RunError::Registration(err.unwrap_or_else(not_started)),
            }),
            Outcome::Stopped { exit, handler } => {
                if let Some(handler) = handler {
                    self.wait_handler(handler);
                }
                Ok(exit)
            }
        };

        token.cancel();
        let _ = self.runtime.block_on(listener);
        let Service { runtime, .. } = self;
        runtime.shutdown_background();
        res
    }

    /// Calls the host dispatcher and makes sure dispatcher-ready is set when it returns.
    ///
    /// Returns the error to surface if the dispatcher is the reason the service
    /// never started.
    fn dispatch(&self, context: usize, handshake: &Handshake) -> Option<HostError> {
        let entry = DispatchEntry {
            name: self.name.to_string(),
            main: registry::service_main,
            context,
        };
        let err = match self.host.dispatch(entry) {
            Ok(()) => not_started(),
            Err(e) => e,
        };
        handshake.publish(Err(err.clone())).then_some(err)
    }

    /// Gives a handler that outlived the bridge up to [`Config::grace`] to return.
    ///
    /// A handler still running afterwards is abandoned, not aborted: its task
    /// is detached and goes away with the runtime.
    fn wait_handler(&self, mut handler: JoinHandle<ExitCode>) {
        let grace = self.cfg.handler_grace();
        let finished = match grace {
            Some(grace) => self
                .runtime
                .block_on(async { tokio::time::timeout(grace, &mut handler).await })
                .is_ok(),
            None => handler.is_finished(),
        };
        if !finished {
            self.bus.publish(
                Event::new(EventKind::GraceExceeded)
                    .with_service(Arc::clone(&self.name))
                    .with_grace(grace.unwrap_or_default()),
            );
        }
    }

    /// Subscribes to the bus and forwards events to the subscriber set until `token` fires.
    fn spawn_listener(&mut self, token: CancellationToken) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let subs = std::mem::take(&mut self.subscribers);
        let bus = self.bus.clone();
        self.runtime.spawn(async move {
            let set = SubscriberSet::new(subs, bus);
            loop {
                tokio::select! {
                    biased;
                    ev = rx.recv() => match ev {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = token.cancelled() => break,
                }
            }
            loop {
                match rx.try_recv() {
                    Ok(ev) => set.emit(&ev),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
            set.shutdown().await;
        })
    }
}

fn not_started() -> HostError {
    HostError::other("dispatcher returned without starting the service")
}

/// Runs `handler` as the service `name` on `host` with the default [`Config`].
///
/// See [`Service::run`].
pub fn run(
    name: impl Into<String>,
    host: Arc<dyn HostAdapter>,
    handler: HandlerRef,
) -> Result<ExitCode, RunError> {
    Service::builder(name, host).build()?.run(handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use crate::host::sim::SimHost;

    fn service(grace: Duration) -> Service {
        let cfg = Config {
            grace,
            worker_threads: 1,
            ..Config::default()
        };
        Service::builder("grace", Arc::new(SimHost::new()))
            .with_config(cfg)
            .build()
            .expect("runtime")
    }

    #[test]
    fn test_wait_handler_returns_when_handler_finishes_in_time() {
        let service = service(Duration::from_secs(5));
        let mut events = service.bus().subscribe();
        let handler = service.runtime.spawn(async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            ExitCode::SUCCESS
        });

        service.wait_handler(handler);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_wait_handler_abandons_without_aborting() {
        let service = service(Duration::from_millis(20));
        let mut events = service.bus().subscribe();
        let done = Arc::new(AtomicBool::new(false));
        let handler = {
            let done = Arc::clone(&done);
            service.runtime.spawn(async move {
                tokio::time::sleep(Duration::from_millis(150)).await;
                done.store(true, Ordering::SeqCst);
                ExitCode::SUCCESS
            })
        };

        service.wait_handler(handler);
        let ev = events.try_recv().expect("grace event");
        assert_eq!(ev.kind, EventKind::GraceExceeded);
        assert!(!done.load(Ordering::SeqCst));

        std::thread::sleep(Duration::from_millis(500));
        assert!(done.load(Ordering::SeqCst), "abandoned handler was cancelled");
    }
}
