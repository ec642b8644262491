//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(Vec<String>, ChangeRequests, StatusUpdates) -> Fut`,
//! producing a fresh future per run. Shared state goes into the closure
//! explicitly (`Arc<...>`).
//!
//! ## Example
//! ```rust
//! use svcvisor::{ChangeRequests, ExitCode, HandlerFn, HandlerRef, StatusUpdates};
//!
//! let h: HandlerRef = HandlerFn::arc(
//!     "oneshot",
//!     |_args: Vec<String>, _requests: ChangeRequests, _updates: StatusUpdates| async move {
//!         ExitCode::SUCCESS
//!     },
//! );
//! assert_eq!(h.name(), "oneshot");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::handler::{ChangeRequests, Handler, StatusUpdates};
use crate::status::ExitCode;

/// Shared handle to a handler.
pub type HandlerRef = Arc<dyn Handler>;

/// Function-backed handler implementation.
#[derive(Debug)]
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Vec<String>, ChangeRequests, StatusUpdates) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ExitCode> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        args: Vec<String>,
        requests: ChangeRequests,
        updates: StatusUpdates,
    ) -> ExitCode {
        (self.f)(args, requests, updates).await
    }
}
