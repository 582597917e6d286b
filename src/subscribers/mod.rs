//! Observability surface: event subscribers and their fan-out set.
//!
//! - [`Subscribe`]: trait for plugging custom event handlers into the
//!   orchestrator (logging, metrics, audit);
//! - [`SubscriberSet`]: non-blocking fan-out with per-subscriber bounded
//!   queues, dedicated workers, and panic isolation;
//! - [`LogWriter`] (feature `logging`): simple stdout renderer for demos.

mod set;
mod subscriber;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscriber::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
