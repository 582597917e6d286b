//! Lifecycle events emitted by the orchestrator.
//!
//! - [`Bus`]: broadcast channel wrapper used by the driver and the
//!   subscriber listener;
//! - [`Event`] / [`EventKind`]: the event payload and its classification.

mod bus;
mod event;

pub use event::{Event, EventKind};

pub(crate) use bus::Bus;
