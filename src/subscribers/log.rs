//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints lifecycle events to stdout in a human-readable
//! format. This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [state] running
//! [order] storage, network
//! [phase-started] start
//! [component-disabled] component=replication dependency=storage
//! [component-failed] component=network phase=start err="port in use"
//! [shutdown-requested]
//! [fatal-shutdown] reason="disk full"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use - implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::StateChanged => {
                println!("[state] {}", e.state.unwrap_or("?"));
            }
            EventKind::OrderComputed => {
                println!("[order] {}", e.reason.as_deref().unwrap_or(""));
            }
            EventKind::ComponentDisabled => {
                println!(
                    "[component-disabled] component={:?} dependency={:?}",
                    e.component, e.reason
                );
            }
            EventKind::EdgeSkipped => {
                println!(
                    "[edge-skipped] component={:?} missing={:?}",
                    e.component, e.reason
                );
            }
            EventKind::PhaseStarted => {
                println!("[phase-started] {}", e.phase.unwrap_or("?"));
            }
            EventKind::PhaseCompleted => {
                println!("[phase-completed] {}", e.phase.unwrap_or("?"));
            }
            EventKind::ComponentFailed => {
                println!(
                    "[component-failed] component={:?} phase={:?} err={:?}",
                    e.component, e.phase, e.reason
                );
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::FatalShutdownRequested => {
                println!("[fatal-shutdown] reason={:?}", e.reason);
            }
            EventKind::SubscriberOverflow => {
                println!(
                    "[subscriber-overflow] subscriber={:?} reason={:?}",
                    e.component, e.reason
                );
            }
            EventKind::SubscriberPanicked => {
                println!(
                    "[subscriber-panicked] subscriber={:?} info={:?}",
                    e.component, e.reason
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
