//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [dispatcher-ready] service="echo" args=2
//! [handler-started] service="echo" handler="echo"
//! [status] service="echo" state=running
//! [control] service="echo" cmd=stop
//! [delivered] service="echo" cmd=stop
//! [handler-exited] service="echo" exit=0
//! [final-status] service="echo" exit=0
//! [bridge-stopped] service="echo"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn cmd(e: &Event) -> &'static str {
    e.command.map(|c| c.as_label()).unwrap_or("none")
}

fn state(e: &Event) -> &'static str {
    e.state.map(|s| s.as_label()).unwrap_or("none")
}

fn exit(e: &Event) -> String {
    match e.exit {
        Some(x) if x.service_specific => format!("{}(specific)", x.code),
        Some(x) => x.code.to_string(),
        None => "none".to_string(),
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let svc = e.service.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::DispatcherReady => {
                println!("[dispatcher-ready] service={svc:?} args={:?}", e.args.unwrap_or(0));
            }
            EventKind::RegistrationFailed => {
                println!("[registration-failed] service={svc:?} err={reason:?}");
            }
            EventKind::HandlerStarted => {
                println!("[handler-started] service={svc:?} handler={reason:?}");
            }
            EventKind::ControlReceived => {
                println!("[control] service={svc:?} cmd={}", cmd(e));
            }
            EventKind::RequestDelivered => {
                println!("[delivered] service={svc:?} cmd={}", cmd(e));
            }
            EventKind::RequestDropped => {
                println!("[dropped] service={svc:?} cmd={}", cmd(e));
            }
            EventKind::AffinityViolation => {
                println!("[affinity-violation] service={svc:?} exit={}", exit(e));
            }
            EventKind::StatusReported => {
                println!("[status] service={svc:?} state={}", state(e));
            }
            EventKind::StatusReportFailed => {
                println!(
                    "[status-failed] service={svc:?} state={} exit={} err={reason:?}",
                    state(e),
                    exit(e)
                );
            }
            EventKind::HandlerExited => {
                println!("[handler-exited] service={svc:?} exit={}", exit(e));
            }
            EventKind::HandlerPanicked => {
                println!("[handler-panicked] service={svc:?} info={reason:?}");
            }
            EventKind::FinalStatusReported => {
                if reason.is_empty() {
                    println!("[final-status] service={svc:?} exit={}", exit(e));
                } else {
                    println!("[final-status] service={svc:?} exit={} err={reason:?}", exit(e));
                }
            }
            EventKind::BridgeStopped => {
                println!("[bridge-stopped] service={svc:?}");
            }
            EventKind::GraceExceeded => {
                println!(
                    "[grace-exceeded] service={svc:?} grace_ms={:?}",
                    e.grace_ms.unwrap_or(0)
                );
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] subscriber={svc} reason={reason:?}");
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] subscriber={svc} info={reason}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
