//! # Event subscribers for the svcvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and built-in implementations for handling runtime events broadcast through
//! the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Bridge ── publish(Event) ──► Bus ──► event listener ──► SubscriberSet::emit(&Event)
//!                                                              │
//!                                                    ┌─────────┼─────────┐
//!                                                    ▼         ▼         ▼
//!                                                LogWriter  Metrics   Custom
//! ```

#[cfg(feature = "logging")]
mod embedded;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
pub(crate) use subscriber_set::panic_message;
