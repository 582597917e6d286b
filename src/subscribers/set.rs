//! # SubscriberSet: non-blocking fan-out over multiple subscribers.
//!
//! [`SubscriberSet`] distributes each [`Event`] to multiple subscribers
//! **without awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught and published (isolation).
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//! - No retries on per-subscriber queue overflow (events are dropped for
//!   that subscriber).
//!
//! ## Diagram
//! ```text
//!    emit(&Event)
//!        │                        (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle, time};

use crate::events::{Bus, Event};

use super::Subscribe;

/// Per-subscriber channel with metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Mutex<Vec<SubscriberChannel>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    ///
    /// Overflow and panic reports are published back to `bus`.
    #[must_use]
    pub(crate) fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let s = Arc::clone(&sub);
            let worker_bus = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = s.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        worker_bus
                            .publish(Event::subscriber_panicked(s.name(), format!("{panic_err:?}")));
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self {
            channels: Mutex::new(channels),
            workers: Mutex::new(workers),
            bus,
        }
    }

    /// Fan-out one event to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is **full** or **closed**, the event is
    /// dropped for it and an overflow event is published with the
    /// subscriber's name. Overflow events themselves are never re-reported.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        let channels = self.channels.lock().expect("subscriber channels poisoned");
        for channel in channels.iter() {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.report_drop(event, channel.name, "full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    self.report_drop(event, channel.name, "closed");
                }
            }
        }
    }

    fn report_drop(&self, dropped: &Event, subscriber: &'static str, reason: &'static str) {
        // Overflow of an overflow report would loop through the listener.
        if !matches!(
            dropped.kind,
            crate::events::EventKind::SubscriberOverflow
                | crate::events::EventKind::SubscriberPanicked
        ) {
            self.bus
                .publish(Event::subscriber_overflow(subscriber, reason));
        }
    }

    /// Graceful drain: close all queues and await worker completion, bounded
    /// by `grace`. Workers still running after the bound are left detached.
    pub(crate) async fn drain(&self, grace: Duration) {
        let channels = {
            let mut guard = self.channels.lock().expect("subscriber channels poisoned");
            std::mem::take(&mut *guard)
        };
        drop(channels);

        let workers = {
            let mut guard = self.workers.lock().expect("subscriber workers poisoned");
            std::mem::take(&mut *guard)
        };

        let join_all = async {
            for h in workers {
                let _ = h.await;
            }
        };
        let _ = time::timeout(grace, join_all).await;
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels
            .lock()
            .expect("subscriber channels poisoned")
            .is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels
            .lock()
            .expect("subscriber channels poisoned")
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(Arc<AtomicUsize>);

    #[async_trait]
    impl Subscribe for Counter {
        async fn on_event(&self, _event: &Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn name(&self) -> &'static str {
            "counter"
        }
    }

    #[tokio::test]
    async fn test_emit_delivers_to_worker() {
        let bus = Bus::new(8);
        let seen = Arc::new(AtomicUsize::new(0));
        let set = SubscriberSet::new(vec![Arc::new(Counter(seen.clone()))], bus);

        set.emit(&Event::new(EventKind::StateChanged));
        set.emit(&Event::new(EventKind::StateChanged));
        set.drain(Duration::from_secs(1)).await;

        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_drain_is_idempotent() {
        let bus = Bus::new(8);
        let set = SubscriberSet::new(Vec::new(), bus);
        set.drain(Duration::from_millis(10)).await;
        set.drain(Duration::from_millis(10)).await;
        assert!(set.is_empty());
    }
}
