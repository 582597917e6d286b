//! # compvisor
//!
//! **Compvisor** is a component lifecycle orchestration library for Rust.
//!
//! It provides primitives to register independent subsystems ("components"),
//! declare ordering constraints between them, and drive them through a
//! multi-phase startup/shutdown state machine in a deterministic,
//! dependency-respecting order. The crate is designed as the boot and
//! teardown backbone for multi-subsystem services (database servers, daemons,
//! network nodes).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//!     │ ComponentSpec │   │ ComponentSpec │   │ ComponentSpec │
//!     │  (subsystem)  │   │  (subsystem)  │   │  (subsystem)  │
//!     └──────┬────────┘   └──────┬────────┘   └──────┬────────┘
//!            ▼                   ▼                   ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Orchestrator                                                    │
//! │  - Registry (owns components, keyed by ComponentId)              │
//! │  - DepGraph (edges from starts_after / starts_before)            │
//! │  - Scheduler (deterministic topological order)                   │
//! │  - Propagator (cascading disablement, fixed point)               │
//! │  - LifecycleDriver (phase state machine)                         │
//! │  - ShutdownCoordinator (idempotent cross-task wake)              │
//! │  - Bus (broadcast events) + SubscriberSet (observability)        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! builder.add(spec) ... build() ──► Orchestrator::run()
//!
//! run():
//!   ├─► COLLECTING_OPTIONS   collect_options  (all registered, fwd)
//!   ├─► build graph, propagate disablement, provisional order
//!   ├─► VALIDATING_OPTIONS   validate_options (enabled only, fwd)
//!   ├─► re-propagate, freeze execution order
//!   ├─► PREPARING            prepare          (enabled, fwd)
//!   ├─► STARTING             start            (enabled, fwd)
//!   ├─► RUNNING              park on ShutdownCoordinator
//!   ├─► SHUTTING_DOWN        begin_shutdown   (enabled, rev)
//!   ├─► STOPPING             stop             (enabled, rev)
//!   ├─► UNPREPARING          unprepare        (enabled, rev)
//!   └─► STOPPED
//!
//! A `prepare`/`start` failure unwinds only the components ahead of the
//! failing one in the frozen order, in reverse; the failing component and
//! ones not yet reached are never torn down. run() then returns the
//! originating error. A fatal shutdown request moves the driver to
//! ABORTED and still performs best-effort stop/unprepare.
//! ```
//!
//! ## Guarantees
//! - **Determinism**: for a fixed registration sequence and edge set, the
//!   execution order is identical across runs (ties break by registration
//!   order, never by map iteration order).
//! - **Topological validity**: for every edge `A → B` with both components
//!   enabled, phase P of `B` never begins before phase P of `A` completed.
//! - **Reverse teardown**: teardown phases walk the exact reverse of the
//!   frozen forward order.
//! - **Cycle safety**: a dependency cycle among enabled components fails
//!   configuration with one concrete cycle (`A -> B -> C -> A`) reported.
//! - **Idempotent shutdown**: any number of concurrent shutdown requests
//!   result in exactly one wake of the parked run loop.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use compvisor::{Component, ComponentError, ComponentSpec, Config, Orchestrator};
//!
//! struct Storage;
//!
//! #[async_trait]
//! impl Component for Storage {
//!     fn name(&self) -> &str { "storage" }
//!     fn as_any(&self) -> &dyn std::any::Any { self }
//!
//!     async fn start(&self, _ctx: &Orchestrator) -> Result<(), ComponentError> {
//!         // open engines, spawn worker threads...
//!         Ok(())
//!     }
//! }
//!
//! struct Network;
//!
//! #[async_trait]
//! impl Component for Network {
//!     fn name(&self) -> &str { "network" }
//!     fn as_any(&self) -> &dyn std::any::Any { self }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut cfg = Config::default();
//! cfg.handle_signals = false;
//!
//! let orch = Orchestrator::builder(cfg)
//!     .add(ComponentSpec::new(Storage))?
//!     .add(ComponentSpec::new(Network).starts_after::<Storage>())?
//!     .build();
//!
//! // Somewhere else: orch.begin_shutdown() unparks the run loop.
//! orch.begin_shutdown();
//!
//! let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
//! rt.block_on(orch.run())?;
//! # Ok(())
//! # }
//! ```
mod components;
mod core;
mod error;
mod events;
mod subscribers;

// ---- Public re-exports ----

pub use components::{Component, ComponentId, ComponentRef, ComponentSpec};
pub use core::{
    Config, DependencyReport, Orchestrator, OrchestratorBuilder, Phase, ShutdownCoordinator, State,
};
pub use error::{ComponentError, ConfigError, RuntimeError};
pub use events::{Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in stdout event writer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
