//! # Service handler abstractions.
//!
//! - [`Handler`] - trait implemented by the service body
//! - [`HandlerFn`] - closure-backed handler
//! - [`HandlerRef`] - shared reference to a handler (`Arc<dyn Handler>`)
//! - [`ChangeRequests`], [`StatusUpdates`] - the handler's two links to the bridge

#[allow(clippy::module_inception)]
mod handler;
mod handler_fn;

pub use handler::{ChangeRequests, Handler, StatusUpdates};
pub use handler_fn::{HandlerFn, HandlerRef};
