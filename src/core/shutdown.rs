//! # Shutdown coordination and OS signal handling.
//!
//! [`ShutdownCoordinator`] lets the run loop park without busy-waiting until
//! any thread or task requests termination, and distinguishes a clean
//! shutdown from a fatal abort.
//!
//! ## Contract
//! - `request_shutdown()` is idempotent: any number of calls, from any
//!   threads, produce exactly one wake of the parked waiter.
//! - `request_fatal()` additionally marks the shutdown fatal and records the
//!   first reason; the lifecycle driver then moves to the ABORTED state and
//!   performs best-effort teardown instead of the normal path.
//! - `wait()` parks on a [`CancellationToken`]; requests that arrive before
//!   the wait begins complete it immediately.
//!
//! ## Signals
//! [`wait_for_shutdown_signal`] completes when the process receives a
//! termination signal.
//!
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for hard stop)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Cross-thread shutdown signal: one parked waiter, idempotent multi-writer.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    requested: AtomicBool,
    fatal: AtomicBool,
    reason: Mutex<Option<String>>,
}

impl ShutdownCoordinator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Requests a clean shutdown and wakes the parked waiter.
    ///
    /// Returns `true` for the first effective request; repeated or
    /// concurrent calls are no-ops returning `false`.
    pub fn request_shutdown(&self) -> bool {
        let first = !self.requested.swap(true, Ordering::SeqCst);
        self.token.cancel();
        first
    }

    /// Requests a fatal shutdown: the driver transitions to ABORTED and
    /// skips further forward progress, still attempting best-effort
    /// `stop`/`unprepare`.
    ///
    /// Only the first reason is recorded. Returns `true` for the first
    /// effective fatal request.
    pub fn request_fatal(&self, reason: impl Into<String>) -> bool {
        let first = !self.fatal.swap(true, Ordering::SeqCst);
        if first {
            let mut guard = self.reason.lock().expect("shutdown reason poisoned");
            *guard = Some(reason.into());
        }
        self.requested.store(true, Ordering::SeqCst);
        self.token.cancel();
        first
    }

    /// Parks until a shutdown is requested. Never busy-spins; returns
    /// immediately if a request already happened.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }

    /// True once any shutdown (clean or fatal) has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// True once a fatal shutdown has been requested.
    pub fn is_fatal(&self) -> bool {
        self.fatal.load(Ordering::SeqCst)
    }

    /// The first fatal reason, when one was recorded.
    pub fn fatal_reason(&self) -> Option<String> {
        self.reason
            .lock()
            .expect("shutdown reason poisoned")
            .clone()
    }
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners. Returns `Ok(())` when any
/// signal is received, or `Err` if signal registration fails.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners. Returns `Ok(())` when any
/// signal is received, or `Err` if signal registration fails.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_request_before_wait_completes_immediately() {
        let coord = ShutdownCoordinator::new();
        assert!(coord.request_shutdown());
        coord.wait().await;
        assert!(coord.is_requested());
        assert!(!coord.is_fatal());
    }

    #[tokio::test]
    async fn test_repeated_requests_are_noops() {
        let coord = ShutdownCoordinator::new();
        assert!(coord.request_shutdown());
        assert!(!coord.request_shutdown());
        assert!(!coord.request_shutdown());
        coord.wait().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_wake_exactly_once() {
        let coord = Arc::new(ShutdownCoordinator::new());

        let waiter = {
            let c = Arc::clone(&coord);
            tokio::spawn(async move { c.wait().await })
        };

        let mut requesters = Vec::new();
        for _ in 0..16 {
            let c = Arc::clone(&coord);
            requesters.push(tokio::spawn(async move { c.request_shutdown() }));
        }

        let mut effective = 0;
        for r in requesters {
            if r.await.unwrap() {
                effective += 1;
            }
        }
        assert_eq!(effective, 1, "exactly one request must be the first");
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_fatal_records_first_reason_only() {
        let coord = ShutdownCoordinator::new();
        assert!(coord.request_fatal("disk full"));
        assert!(!coord.request_fatal("later reason"));
        coord.wait().await;
        assert!(coord.is_fatal());
        assert_eq!(coord.fatal_reason().as_deref(), Some("disk full"));
    }

    #[tokio::test]
    async fn test_fatal_after_clean_still_marks_fatal() {
        let coord = ShutdownCoordinator::new();
        coord.request_shutdown();
        coord.request_fatal("broke while shutting down");
        assert!(coord.is_fatal());
    }
}
