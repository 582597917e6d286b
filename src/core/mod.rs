//! Orchestrator core: registry, scheduling, and lifecycle.
//!
//! This module contains the embedded implementation of the compvisor
//! runtime. The public API from this module is [`Orchestrator`] (plus its
//! builder, config, and the lifecycle vocabulary types); everything else is
//! internal machinery.
//!
//! Internal modules:
//! - [`registry`]: owns components, keyed by identity, registration order;
//! - [`graph`]: derives the directed edge set from component declarations;
//! - [`scheduler`]: deterministic topological order plus cycle reporting;
//! - [`propagate`]: fixed-point cascading disablement;
//! - [`driver`]: the multi-phase lifecycle state machine;
//! - [`shutdown`]: idempotent shutdown coordination and OS signal handling.

mod builder;
mod config;
mod driver;
mod graph;
mod orchestrator;
mod propagate;
mod registry;
mod scheduler;
mod shutdown;

pub use builder::OrchestratorBuilder;
pub use config::Config;
pub use driver::{Phase, State};
pub use orchestrator::{DependencyReport, Orchestrator};
pub use shutdown::ShutdownCoordinator;
