//! # Orchestrator: the process-wide component lifecycle coordinator.
//!
//! The [`Orchestrator`] owns the component [`Registry`], the event bus, a
//! [`SubscriberSet`], and the [`ShutdownCoordinator`]. It drives every
//! registered component through the lifecycle phases in dependency order and
//! parks until shutdown is requested.
//!
//! It is an explicit owned value (typically one `Arc<Orchestrator>` per
//! process) passed by reference into every component hook — never ambient
//! global state — so multiple orchestrators can coexist in tests.
//!
//! ## Key responsibilities
//! - typed component lookup ([`Orchestrator::feature`] and friends)
//! - lifecycle execution via the internal [`LifecycleDriver`]
//! - shutdown triggers ([`Orchestrator::begin_shutdown`],
//!   [`Orchestrator::fatal_shutdown`]) and OS signal handling
//! - event fan-out to subscribers
//! - the read-only dependency report for operators debugging startup order
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use compvisor::{Component, ComponentSpec, Config, Orchestrator};
//!
//! struct Storage;
//! struct Network;
//!
//! #[async_trait]
//! impl Component for Storage {
//!     fn name(&self) -> &str { "storage" }
//!     fn as_any(&self) -> &dyn std::any::Any { self }
//! }
//!
//! #[async_trait]
//! impl Component for Network {
//!     fn name(&self) -> &str { "network" }
//!     fn as_any(&self) -> &dyn std::any::Any { self }
//!
//!     async fn start(&self, ctx: &Orchestrator) -> Result<(), compvisor::ComponentError> {
//!         // Storage started first: the dependency is safe to use.
//!         let _storage = ctx.feature::<Storage>();
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut cfg = Config::default();
//! cfg.handle_signals = false;
//!
//! let orch = Orchestrator::builder(cfg)
//!     .add(ComponentSpec::new(Storage))?
//!     .add(ComponentSpec::new(Network).starts_after::<Storage>())?
//!     .build();
//!
//! orch.begin_shutdown(); // unpark immediately once startup completes
//! orch.run().await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use super::builder::OrchestratorBuilder;
use super::config::Config;
use super::driver::LifecycleDriver;
use super::graph::DepGraph;
use super::propagate::propagate_disablement;
use super::registry::Registry;
use super::scheduler::execution_order;
use super::shutdown::{ShutdownCoordinator, wait_for_shutdown_signal};
use crate::components::{Component, ComponentId};
use crate::error::{ConfigError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::SubscriberSet;

/// Coordinates component registration, scheduling, lifecycle execution, and
/// shutdown.
pub struct Orchestrator {
    cfg: Config,
    registry: Registry,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    shutdown: ShutdownCoordinator,
    // Set once the execution order is frozen; enabled flags are immutable
    // from then on.
    frozen: AtomicBool,
}

impl Orchestrator {
    /// Creates a builder with the given configuration.
    pub fn builder(cfg: Config) -> OrchestratorBuilder {
        OrchestratorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        registry: Registry,
        bus: Bus,
        subs: Arc<SubscriberSet>,
    ) -> Self {
        Self {
            cfg,
            registry,
            bus,
            subs,
            shutdown: ShutdownCoordinator::new(),
            frozen: AtomicBool::new(false),
        }
    }

    /// Global runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// The cross-thread shutdown signal shared by all triggers.
    pub fn shutdown_coordinator(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn publish(&self, ev: Event) {
        self.bus.publish(ev);
    }

    pub(crate) fn freeze(&self) {
        self.frozen.store(true, Ordering::SeqCst);
    }

    /// Runs the full lifecycle: options, scheduling, startup, the running
    /// wait, and teardown. Returns the first fatal error, if any.
    ///
    /// The lifecycle itself is sequential on this task; only the signal
    /// listener and subscriber workers run concurrently.
    pub async fn run(self: &Arc<Self>) -> Result<(), RuntimeError> {
        let (listener_stop, listener) = self.subscriber_listener();
        if self.cfg.handle_signals {
            self.signal_listener();
        }

        let result = LifecycleDriver::new(self).run().await;
        // The listener flushes everything still buffered on the bus (the
        // terminal state events included) before the queues close.
        listener_stop.cancel();
        let _ = listener.await;
        self.subs.drain(self.cfg.grace).await;
        result
    }

    /// Subscribes to the bus and forwards events to the subscriber set.
    ///
    /// Returns a stop token plus the task handle; on stop the listener
    /// forwards whatever is still buffered before exiting, so awaiting the
    /// handle guarantees every published event reached the queues.
    fn subscriber_listener(&self) -> (CancellationToken, tokio::task::JoinHandle<()>) {
        use tokio::sync::broadcast::error::{RecvError, TryRecvError};

        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        let stop = CancellationToken::new();
        let token = stop.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => return,
                    },
                    _ = token.cancelled() => break,
                }
            }
            loop {
                match rx.try_recv() {
                    Ok(ev) => set.emit(&ev),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
        });
        (stop, handle)
    }

    /// Feeds OS termination signals into the shutdown coordinator.
    fn signal_listener(self: &Arc<Self>) {
        let me = Arc::clone(self);
        tokio::spawn(async move {
            if wait_for_shutdown_signal().await.is_ok() {
                me.begin_shutdown();
            }
        });
    }

    /// Requests a clean shutdown. Safe from any thread or task, idempotent:
    /// repeated and concurrent calls are no-ops.
    pub fn begin_shutdown(&self) {
        if self.shutdown.request_shutdown() {
            self.bus.publish(Event::new(EventKind::ShutdownRequested));
        }
    }

    /// Requests a fatal shutdown: `run()` transitions to the aborted state,
    /// skips the normal shutdown path, and still attempts best-effort
    /// `stop`/`unprepare`. Idempotent; only the first reason is kept.
    pub fn fatal_shutdown(&self, reason: impl Into<String>) {
        let reason = reason.into();
        if self.shutdown.request_fatal(reason.clone()) {
            self.bus
                .publish(Event::new(EventKind::FatalShutdownRequested).with_reason(reason));
        }
    }

    /// True if a component of type `T` is registered.
    pub fn has_feature<T: Component>(&self) -> bool {
        self.registry.has::<T>()
    }

    /// True if `T` is registered and currently enabled.
    pub fn is_enabled<T: Component>(&self) -> bool {
        self.registry
            .index_of(ComponentId::of::<T>())
            .map(|i| self.registry.is_enabled_at(i))
            .unwrap_or(false)
    }

    /// Typed lookup; `None` when `T` was never registered.
    pub fn try_feature<T: Component>(&self) -> Option<Arc<T>> {
        self.registry.try_feature::<T>()
    }

    /// Typed lookup of a registered component.
    ///
    /// # Panics
    /// Panics when `T` was never registered: that is a broken dependency
    /// declaration (a programming error), not a recoverable condition.
    pub fn feature<T: Component>(&self) -> Arc<T> {
        self.registry.feature::<T>()
    }

    /// Typed lookup of a registered, enabled component.
    ///
    /// # Panics
    /// Panics when `T` is unregistered or disabled.
    pub fn enabled_feature<T: Component>(&self) -> Arc<T> {
        self.registry.enabled_feature::<T>()
    }

    /// Explicitly disables `T` (self-disablement during the option phases,
    /// e.g. "this feature is not applicable on this platform").
    ///
    /// The next scheduling pass recomputes the execution order without `T`
    /// and re-runs disablement propagation.
    ///
    /// # Panics
    /// Panics when called after the execution order has frozen, or when `T`
    /// was never registered; both indicate programming errors.
    pub fn disable_feature<T: Component>(&self) {
        assert!(
            !self.frozen.load(Ordering::SeqCst),
            "cannot disable '{}': the execution order is already frozen",
            ComponentId::of::<T>().type_name()
        );
        let index = match self.registry.index_of(ComponentId::of::<T>()) {
            Some(i) => i,
            None => panic!(
                "cannot disable unregistered component '{}'",
                ComponentId::of::<T>().type_name()
            ),
        };
        self.registry.set_enabled_at(index, false);
    }

    /// Computes the dependency report: the execution order that the current
    /// enabled flags would produce, plus the raw edge set.
    ///
    /// Read-only: propagation runs on a snapshot and never mutates the
    /// registry.
    pub fn dependency_report(&self) -> Result<DependencyReport, ConfigError> {
        let (graph, _skipped) = DepGraph::build(&self.registry)?;
        let mut enabled = self.registry.enabled_snapshot();
        propagate_disablement(&self.registry, &mut enabled)?;
        let order = execution_order(&self.registry, &graph, &enabled)?;
        Ok(DependencyReport::from_parts(self, &graph, &order))
    }
}

/// Serialized view of the computed execution order and the raw edge set,
/// for operators debugging startup ordering issues.
#[derive(Clone, Debug)]
pub struct DependencyReport {
    /// Component names in execution order.
    pub order: Vec<String>,
    /// All ordering edges as `(from, to)` component names.
    pub edges: Vec<(String, String)>,
}

impl DependencyReport {
    pub(crate) fn from_parts(
        orch: &Orchestrator,
        graph: &DepGraph,
        order: &[ComponentId],
    ) -> Self {
        let registry = orch.registry();
        Self {
            order: order.iter().map(|&id| registry.name_of(id)).collect(),
            edges: graph
                .edges()
                .map(|(from, to)| (registry.name_at(from), registry.name_at(to)))
                .collect(),
        }
    }
}

impl fmt::Display for DependencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "execution order:")?;
        for (i, name) in self.order.iter().enumerate() {
            writeln!(f, "  {i:3}. {name}")?;
        }
        writeln!(f, "edges:")?;
        for (from, to) in &self.edges {
            writeln!(f, "  {from} -> {to}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentSpec;
    use crate::error::ComponentError;
    use async_trait::async_trait;
    use std::any::Any;
    use std::sync::Mutex;

    type CallLog = Arc<Mutex<Vec<String>>>;

    fn log(calls: &CallLog, name: &str, hook: &str) {
        calls
            .lock()
            .expect("call log poisoned")
            .push(format!("{name}.{hook}"));
    }

    fn calls_of(calls: &CallLog) -> Vec<String> {
        calls.lock().expect("call log poisoned").clone()
    }

    fn test_config() -> Config {
        Config {
            handle_signals: false,
            ..Config::default()
        }
    }

    macro_rules! logged_component {
        ($ty:ident, $name:expr) => {
            struct $ty {
                calls: CallLog,
            }

            #[async_trait]
            impl Component for $ty {
                fn name(&self) -> &str {
                    $name
                }
                fn as_any(&self) -> &dyn Any {
                    self
                }
                async fn collect_options(&self, _: &Orchestrator) -> Result<(), ComponentError> {
                    log(&self.calls, $name, "collect_options");
                    Ok(())
                }
                async fn validate_options(&self, _: &Orchestrator) -> Result<(), ComponentError> {
                    log(&self.calls, $name, "validate_options");
                    Ok(())
                }
                async fn prepare(&self, _: &Orchestrator) -> Result<(), ComponentError> {
                    log(&self.calls, $name, "prepare");
                    Ok(())
                }
                async fn start(&self, _: &Orchestrator) -> Result<(), ComponentError> {
                    log(&self.calls, $name, "start");
                    Ok(())
                }
                async fn begin_shutdown(&self, _: &Orchestrator) -> Result<(), ComponentError> {
                    log(&self.calls, $name, "begin_shutdown");
                    Ok(())
                }
                async fn stop(&self, _: &Orchestrator) -> Result<(), ComponentError> {
                    log(&self.calls, $name, "stop");
                    Ok(())
                }
                async fn unprepare(&self, _: &Orchestrator) -> Result<(), ComponentError> {
                    log(&self.calls, $name, "unprepare");
                    Ok(())
                }
            }
        };
    }

    logged_component!(Storage, "storage");
    logged_component!(Network, "network");
    logged_component!(Replication, "replication");

    fn three_tier(calls: &CallLog) -> Arc<Orchestrator> {
        Orchestrator::builder(test_config())
            .add(ComponentSpec::new(Replication {
                calls: calls.clone(),
            })
            .starts_after::<Storage>()
            .starts_after::<Network>()
            .optional())
            .unwrap()
            .add(ComponentSpec::new(Network {
                calls: calls.clone(),
            })
            .starts_after::<Storage>())
            .unwrap()
            .add(ComponentSpec::new(Storage {
                calls: calls.clone(),
            }))
            .unwrap()
            .build()
    }

    #[tokio::test]
    async fn test_full_lifecycle_runs_phases_in_dependency_order() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let orch = three_tier(&calls);

        orch.begin_shutdown();
        orch.run().await.unwrap();

        let seen = calls_of(&calls);
        // collect_options runs in registration order over everything.
        assert_eq!(seen[0], "replication.collect_options");
        assert_eq!(seen[1], "network.collect_options");
        assert_eq!(seen[2], "storage.collect_options");
        // Forward phases respect edges: storage before network before
        // replication.
        let prepare: Vec<&String> = seen.iter().filter(|c| c.ends_with(".prepare")).collect();
        assert_eq!(
            prepare,
            vec!["storage.prepare", "network.prepare", "replication.prepare"]
        );
        let start: Vec<&String> = seen.iter().filter(|c| c.ends_with(".start")).collect();
        assert_eq!(
            start,
            vec!["storage.start", "network.start", "replication.start"]
        );
        // Teardown phases run the pure reverse.
        let stop: Vec<&String> = seen.iter().filter(|c| c.ends_with(".stop")).collect();
        assert_eq!(stop, vec!["replication.stop", "network.stop", "storage.stop"]);
        let unprepare: Vec<&String> = seen.iter().filter(|c| c.ends_with(".unprepare")).collect();
        assert_eq!(
            unprepare,
            vec![
                "replication.unprepare",
                "network.unprepare",
                "storage.unprepare"
            ]
        );
        // begin_shutdown hooks run before any stop.
        let first_begin = seen
            .iter()
            .position(|c| c.ends_with(".begin_shutdown"))
            .unwrap();
        let first_stop = seen.iter().position(|c| c.ends_with(".stop")).unwrap();
        assert!(first_begin < first_stop);
    }

    struct FailsOnStart {
        calls: CallLog,
    }

    #[async_trait]
    impl Component for FailsOnStart {
        fn name(&self) -> &str {
            "flaky"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        async fn prepare(&self, _: &Orchestrator) -> Result<(), ComponentError> {
            log(&self.calls, "flaky", "prepare");
            Ok(())
        }
        async fn start(&self, _: &Orchestrator) -> Result<(), ComponentError> {
            log(&self.calls, "flaky", "start");
            Err(ComponentError::failed("port in use"))
        }
        async fn stop(&self, _: &Orchestrator) -> Result<(), ComponentError> {
            log(&self.calls, "flaky", "stop");
            Ok(())
        }
        async fn unprepare(&self, _: &Orchestrator) -> Result<(), ComponentError> {
            log(&self.calls, "flaky", "unprepare");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_start_failure_unwinds_started_prefix_only() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let orch = Orchestrator::builder(test_config())
            .add(ComponentSpec::new(Storage {
                calls: calls.clone(),
            }))
            .unwrap()
            .add(ComponentSpec::new(FailsOnStart {
                calls: calls.clone(),
            })
            .starts_after::<Storage>())
            .unwrap()
            .add(ComponentSpec::new(Network {
                calls: calls.clone(),
            })
            .starts_after::<FailsOnStart>())
            .unwrap()
            .build();

        let err = orch.run().await.unwrap_err();
        assert!(matches!(err, RuntimeError::Phase { .. }));
        assert!(err.to_string().contains("flaky"));

        let seen = calls_of(&calls);
        // network never reached start, so it is never stopped.
        assert!(seen.contains(&"storage.start".to_string()));
        assert!(!seen.contains(&"network.start".to_string()));
        assert!(seen.contains(&"storage.stop".to_string()));
        assert!(!seen.contains(&"flaky.stop".to_string()));
        assert!(!seen.contains(&"network.stop".to_string()));
        // The unwind covers only the prefix ahead of the failure: the
        // failing component and the never-started one keep whatever prepare
        // allocated.
        let unprepared = seen
            .iter()
            .filter(|c| **c == "storage.unprepare")
            .count();
        assert_eq!(unprepared, 1);
        assert!(!seen.contains(&"flaky.unprepare".to_string()));
        assert!(!seen.contains(&"network.unprepare".to_string()));
    }

    #[tokio::test]
    async fn test_start_failure_leaves_unreached_components_untouched() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let orch = Orchestrator::builder(test_config())
            .add(ComponentSpec::new(Storage {
                calls: calls.clone(),
            }))
            .unwrap()
            .add(ComponentSpec::new(FailsOnStart {
                calls: calls.clone(),
            })
            .starts_after::<Storage>())
            .unwrap()
            .add(ComponentSpec::new(Network {
                calls: calls.clone(),
            })
            .starts_after::<FailsOnStart>())
            .unwrap()
            .build();

        orch.run().await.unwrap_err();

        let seen = calls_of(&calls);
        // Everything completed prepare before start began.
        assert_eq!(
            seen.iter().filter(|c| c.ends_with(".prepare")).count(),
            3
        );
        // After the failure, network sees no teardown hook at all.
        assert!(!seen.iter().any(|c| c.starts_with("network.")
            && (c.ends_with(".stop") || c.ends_with(".unprepare"))));
        let tail: Vec<&String> = seen
            .iter()
            .skip_while(|c| **c != "flaky.start")
            .skip(1)
            .collect();
        assert_eq!(tail, vec!["storage.stop", "storage.unprepare"]);
    }

    struct FailsOnPrepare;

    #[async_trait]
    impl Component for FailsOnPrepare {
        fn name(&self) -> &str {
            "broken"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        async fn prepare(&self, _: &Orchestrator) -> Result<(), ComponentError> {
            Err(ComponentError::failed("no disk"))
        }
    }

    #[tokio::test]
    async fn test_prepare_failure_unprepares_completed_prefix_only() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let orch = Orchestrator::builder(test_config())
            .add(ComponentSpec::new(Storage {
                calls: calls.clone(),
            }))
            .unwrap()
            .add(ComponentSpec::new(FailsOnPrepare).starts_after::<Storage>())
            .unwrap()
            .add(ComponentSpec::new(Network {
                calls: calls.clone(),
            })
            .starts_after::<Storage>())
            .unwrap()
            .build();

        let err = orch.run().await.unwrap_err();
        assert!(matches!(err, RuntimeError::Phase { .. }));

        let seen = calls_of(&calls);
        assert!(seen.contains(&"storage.prepare".to_string()));
        assert!(seen.contains(&"storage.unprepare".to_string()));
        // network is after the failing component in registration order and
        // never prepared; it must not be unprepared.
        assert!(!seen.contains(&"network.prepare".to_string()));
        assert!(!seen.contains(&"network.unprepare".to_string()));
        // start never ran for anyone.
        assert!(!seen.iter().any(|c| c.ends_with(".start")));
    }

    struct SelfDisabling {
        calls: CallLog,
    }

    #[async_trait]
    impl Component for SelfDisabling {
        fn name(&self) -> &str {
            "conditional"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        async fn collect_options(&self, _: &Orchestrator) -> Result<(), ComponentError> {
            log(&self.calls, "conditional", "collect_options");
            Ok(())
        }
        async fn validate_options(&self, ctx: &Orchestrator) -> Result<(), ComponentError> {
            ctx.disable_feature::<SelfDisabling>();
            Ok(())
        }
        async fn prepare(&self, _: &Orchestrator) -> Result<(), ComponentError> {
            log(&self.calls, "conditional", "prepare");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_self_disable_during_validation_skips_later_phases() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let orch = Orchestrator::builder(test_config())
            .add(ComponentSpec::new(Storage {
                calls: calls.clone(),
            }))
            .unwrap()
            .add(ComponentSpec::new(SelfDisabling {
                calls: calls.clone(),
            }))
            .unwrap()
            .build();

        orch.begin_shutdown();
        orch.run().await.unwrap();

        let seen = calls_of(&calls);
        assert!(seen.contains(&"conditional.collect_options".to_string()));
        assert!(!seen.contains(&"conditional.prepare".to_string()));
        assert!(seen.contains(&"storage.prepare".to_string()));
        assert!(!orch.is_enabled::<SelfDisabling>());
    }

    #[tokio::test]
    async fn test_collect_options_runs_for_disabled_components() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let orch = Orchestrator::builder(test_config())
            .add(ComponentSpec::new(Storage {
                calls: calls.clone(),
            })
            .disabled())
            .unwrap()
            .build();

        orch.begin_shutdown();
        orch.run().await.unwrap();

        let seen = calls_of(&calls);
        assert!(seen.contains(&"storage.collect_options".to_string()));
        assert!(!seen.contains(&"storage.validate_options".to_string()));
        assert!(!seen.contains(&"storage.prepare".to_string()));
    }

    #[tokio::test]
    async fn test_disablement_cascades_to_optional_dependents() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let orch = Orchestrator::builder(test_config())
            .add(ComponentSpec::new(Storage {
                calls: calls.clone(),
            })
            .disabled())
            .unwrap()
            .add(ComponentSpec::new(Replication {
                calls: calls.clone(),
            })
            .starts_after::<Storage>()
            .optional())
            .unwrap()
            .build();

        orch.begin_shutdown();
        orch.run().await.unwrap();

        assert!(!orch.is_enabled::<Replication>());
        let seen = calls_of(&calls);
        assert!(!seen.contains(&"replication.prepare".to_string()));
    }

    #[tokio::test]
    async fn test_required_dependent_of_disabled_component_fails() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let orch = Orchestrator::builder(test_config())
            .add(ComponentSpec::new(Storage {
                calls: calls.clone(),
            })
            .disabled())
            .unwrap()
            .add(ComponentSpec::new(Network {
                calls: calls.clone(),
            })
            .starts_after::<Storage>())
            .unwrap()
            .build();

        let err = orch.run().await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::RequiredDependencyDisabled { .. })
        ));
    }

    #[tokio::test]
    async fn test_cycle_surfaces_as_config_error() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let orch = Orchestrator::builder(test_config())
            .add(ComponentSpec::new(Storage {
                calls: calls.clone(),
            })
            .starts_after::<Network>())
            .unwrap()
            .add(ComponentSpec::new(Network {
                calls: calls.clone(),
            })
            .starts_after::<Storage>())
            .unwrap()
            .build();

        let err = orch.run().await.unwrap_err();
        match err {
            RuntimeError::Config(ConfigError::DependencyCycle { cycle }) => {
                assert_eq!(cycle.len(), 2);
            }
            other => panic!("expected cycle error, got {other}"),
        }
    }

    struct Loner;

    #[async_trait]
    impl Component for Loner {
        fn name(&self) -> &str {
            "loner"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct NeverRegistered;

    #[async_trait]
    impl Component for NeverRegistered {
        fn name(&self) -> &str {
            "never"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[tokio::test]
    async fn test_soft_edge_to_absent_component_is_skipped() {
        let orch = Orchestrator::builder(test_config())
            .add(ComponentSpec::new(Loner).soft_starts_after::<NeverRegistered>())
            .unwrap()
            .build();

        orch.begin_shutdown();
        orch.run().await.unwrap();
        assert!(!orch.has_feature::<NeverRegistered>());
    }

    struct FatalOnStart;

    #[async_trait]
    impl Component for FatalOnStart {
        fn name(&self) -> &str {
            "fatal"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        async fn start(&self, ctx: &Orchestrator) -> Result<(), ComponentError> {
            ctx.fatal_shutdown("disk corruption");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fatal_shutdown_aborts_with_reason() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let orch = Orchestrator::builder(test_config())
            .add(ComponentSpec::new(Storage {
                calls: calls.clone(),
            }))
            .unwrap()
            .add(ComponentSpec::new(FatalOnStart).starts_after::<Storage>())
            .unwrap()
            .build();

        let err = orch.run().await.unwrap_err();
        match err {
            RuntimeError::Aborted { reason } => assert_eq!(reason, "disk corruption"),
            other => panic!("expected abort, got {other}"),
        }
        // Best-effort teardown still ran.
        let seen = calls_of(&calls);
        assert!(seen.contains(&"storage.stop".to_string()));
        assert!(seen.contains(&"storage.unprepare".to_string()));
        // The clean-shutdown hook is skipped on the fatal path.
        assert!(!seen.contains(&"storage.begin_shutdown".to_string()));
    }

    #[tokio::test]
    async fn test_shutdown_triggers_are_idempotent() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let orch = three_tier(&calls);

        orch.begin_shutdown();
        orch.begin_shutdown();
        orch.run().await.unwrap();

        let seen = calls_of(&calls);
        let stops = seen.iter().filter(|c| *c == "storage.stop").count();
        assert_eq!(stops, 1);
    }

    #[tokio::test]
    async fn test_typed_lookup_from_hooks_and_outside() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let orch = three_tier(&calls);

        assert!(orch.has_feature::<Storage>());
        assert!(orch.is_enabled::<Network>());
        assert_eq!(orch.feature::<Storage>().name(), "storage");
        assert!(orch.try_feature::<NeverRegistered>().is_none());
    }

    #[tokio::test]
    async fn test_dependency_report_lists_order_and_edges() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let orch = three_tier(&calls);

        let report = orch.dependency_report().unwrap();
        assert_eq!(report.order, vec!["storage", "network", "replication"]);
        assert!(report
            .edges
            .contains(&("storage".to_string(), "network".to_string())));
        assert!(report
            .edges
            .contains(&("network".to_string(), "replication".to_string())));

        let rendered = report.to_string();
        assert!(rendered.contains("storage -> network"));
    }

    #[tokio::test]
    async fn test_dump_mode_stops_before_prepare() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let cfg = Config {
            handle_signals: false,
            dump_dependencies: true,
            ..Config::default()
        };
        let orch = Orchestrator::builder(cfg)
            .add(ComponentSpec::new(Storage {
                calls: calls.clone(),
            }))
            .unwrap()
            .build();

        orch.run().await.unwrap();

        let seen = calls_of(&calls);
        assert!(seen.contains(&"storage.collect_options".to_string()));
        assert!(!seen.iter().any(|c| c.ends_with(".prepare")));
    }

    struct StateRecorder {
        states: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl crate::subscribers::Subscribe for StateRecorder {
        async fn on_event(&self, ev: &crate::events::Event) {
            if let Some(state) = ev.state {
                self.states
                    .lock()
                    .expect("state log poisoned")
                    .push(state.to_string());
            }
        }
        fn name(&self) -> &'static str {
            "state-recorder"
        }
    }

    #[tokio::test]
    async fn test_subscribers_observe_terminal_state() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let states = Arc::new(Mutex::new(Vec::new()));
        let orch = Orchestrator::builder(test_config())
            .add(ComponentSpec::new(Storage {
                calls: calls.clone(),
            }))
            .unwrap()
            .with_subscribers(vec![Arc::new(StateRecorder {
                states: states.clone(),
            }) as Arc<dyn crate::subscribers::Subscribe>])
            .build();

        orch.begin_shutdown();
        orch.run().await.unwrap();

        // run() returns only after the bus is flushed and the queues are
        // drained, so the last state event must have been delivered.
        let seen = states.lock().expect("state log poisoned").clone();
        assert_eq!(seen.last().map(String::as_str), Some("stopped"));
        assert!(seen.iter().any(|s| s == "running"));
    }

    #[tokio::test]
    #[should_panic(expected = "frozen")]
    async fn test_disable_after_freeze_panics() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let orch = three_tier(&calls);
        orch.begin_shutdown();
        orch.run().await.unwrap();
        orch.disable_feature::<Replication>();
    }
}
