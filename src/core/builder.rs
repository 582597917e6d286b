//! # Builder for the [`Orchestrator`].
//!
//! Registration happens here, before any lifecycle phase runs: every
//! component must be added up front, then [`OrchestratorBuilder::build`]
//! produces the shared `Arc<Orchestrator>`.
//!
//! ## Rules
//! - duplicate registrations of the same component type are rejected
//! - a self-dependency is rejected at registration time
//! - dangling dependency names surface later, when the graph is built

use std::sync::Arc;

use super::config::Config;
use super::orchestrator::Orchestrator;
use super::registry::Registry;
use crate::components::ComponentSpec;
use crate::error::ConfigError;
use crate::events::Bus;
use crate::subscribers::{Subscribe, SubscriberSet};

pub struct OrchestratorBuilder {
    cfg: Config,
    registry: Registry,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl OrchestratorBuilder {
    pub(crate) fn new(cfg: Config) -> Self {
        Self {
            cfg,
            registry: Registry::new(),
            subscribers: Vec::new(),
        }
    }

    /// Registers a component. Registration order is the deterministic
    /// tie-break for scheduling, so order matters when components share no
    /// dependency path.
    pub fn add(mut self, spec: ComponentSpec) -> Result<Self, ConfigError> {
        self.registry.add(spec)?;
        Ok(self)
    }

    /// Attaches event subscribers; each gets its own bounded queue and
    /// worker task once the orchestrator runs.
    pub fn with_subscribers(mut self, subs: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subs;
        self
    }

    pub fn build(self) -> Arc<Orchestrator> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        Arc::new(Orchestrator::new_internal(self.cfg, self.registry, bus, subs))
    }
}
