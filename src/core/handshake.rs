//! # Startup/shutdown handshake between the registration thread and the bridge.
//!
//! Two manual-reset [`Signal`]s:
//! - **dispatcher-ready**: set from the service entry point once the host
//!   assigned a status handle and the startup arguments were decoded (or once
//!   it is known that this will never happen);
//! - **bridge-stopped**: set by the bridge after its final status report.
//!
//! ```text
//! registration thread           service entry (host)          bridge task
//! ───────────────────           ────────────────────          ───────────
//! spawn bridge ───────────────────────────────────────────►  wait(dispatcher-ready)
//! dispatch() ─────────────────► register handler
//!                               publish(Ok(Dispatched))
//!                               set(dispatcher-ready) ──────► take handle/args
//!      ...                                                    ... loop ...
//!                                                             final Stopped report
//! wait_blocking(bridge-stopped) ◄───────────────────────────  set(bridge-stopped)
//! return to caller
//! ```
//!
//! ## Rules
//! - The bridge never touches the handle before dispatcher-ready is set.
//! - The dispatched payload is published at most once; later attempts are ignored.
//! - The registration thread never returns before bridge-stopped is set.

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::HostError;
use crate::host::ServiceHandle;

/// Manual-reset event: once set, every current and future waiter proceeds.
pub(crate) struct Signal {
    tx: watch::Sender<bool>,
}

impl Signal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Sets the signal. Idempotent.
    pub fn set(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// Waits asynchronously until the signal is set.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so `wait_for` cannot observe a closed channel.
        let _ = rx.wait_for(|set| *set).await;
    }

    /// Blocks the calling OS thread until the signal is set.
    ///
    /// Must not be called from within an async task.
    pub fn wait_blocking(&self) {
        futures::executor::block_on(self.wait());
    }
}

/// What the service entry point learned from the host.
#[derive(Debug)]
pub(crate) struct Dispatched {
    pub handle: ServiceHandle,
    pub args: Vec<String>,
}

/// The pair of handshake signals plus the payload guarded by dispatcher-ready.
pub(crate) struct Handshake {
    dispatcher_ready: Signal,
    bridge_stopped: Signal,
    dispatched: Mutex<Option<Result<Dispatched, HostError>>>,
}

impl Handshake {
    pub fn new() -> Self {
        Self {
            dispatcher_ready: Signal::new(),
            bridge_stopped: Signal::new(),
            dispatched: Mutex::new(None),
        }
    }

    /// Publishes the dispatch outcome and sets dispatcher-ready.
    ///
    /// Returns `false` (and changes nothing) if an outcome was already published.
    pub fn publish(&self, outcome: Result<Dispatched, HostError>) -> bool {
        {
            let mut slot = self.dispatched.lock();
            if slot.is_some() || self.dispatcher_ready.is_set() {
                return false;
            }
            *slot = Some(outcome);
        }
        self.dispatcher_ready.set();
        true
    }

    /// Waits for dispatcher-ready and takes the published outcome.
    ///
    /// Returns `None` if the outcome was already taken.
    pub async fn dispatched(&self) -> Option<Result<Dispatched, HostError>> {
        self.dispatcher_ready.wait().await;
        self.dispatched.lock().take()
    }

    /// Marks the bridge as stopped; called once after the final status report.
    pub fn bridge_stopped(&self) {
        self.bridge_stopped.set();
    }

    #[cfg(test)]
    pub fn is_bridge_stopped(&self) -> bool {
        self.bridge_stopped.is_set()
    }

    /// Blocks the registration thread until the bridge stopped.
    pub fn wait_bridge_stopped(&self) {
        self.bridge_stopped.wait_blocking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_signal_set_before_wait() {
        let s = Signal::new();
        s.set();
        s.wait().await;
        assert!(s.is_set());
    }

    #[tokio::test]
    async fn test_signal_wakes_async_waiter() {
        let s = Arc::new(Signal::new());
        let waiter = {
            let s = Arc::clone(&s);
            tokio::spawn(async move { s.wait().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());
        s.set();
        waiter.await.unwrap();
    }

    #[test]
    fn test_signal_wakes_blocking_waiter() {
        let s = Arc::new(Signal::new());
        let setter = {
            let s = Arc::clone(&s);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(10));
                s.set();
            })
        };
        s.wait_blocking();
        setter.join().unwrap();
        assert!(s.is_set());
    }

    #[tokio::test]
    async fn test_publish_is_once_only() {
        let hs = Handshake::new();
        assert!(hs.publish(Err(HostError::Os { code: 1 })));
        assert!(!hs.publish(Err(HostError::Os { code: 2 })));
        match hs.dispatched().await {
            Some(Err(e)) => assert_eq!(e.code(), Some(1)),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(hs.dispatched().await.is_none());
    }

    #[tokio::test]
    async fn test_dispatched_waits_for_ready() {
        let hs = Arc::new(Handshake::new());
        let reader = {
            let hs = Arc::clone(&hs);
            tokio::spawn(async move { hs.dispatched().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!reader.is_finished());
        assert!(!hs.dispatcher_ready.is_set());

        hs.publish(Ok(Dispatched {
            handle: ServiceHandle(9),
            args: vec!["svc".into()],
        }));
        let got = reader.await.unwrap().unwrap().unwrap();
        assert_eq!(got.handle, ServiceHandle(9));
        assert_eq!(got.args, vec!["svc".to_string()]);
    }
}
