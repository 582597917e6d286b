//! Error types used by the compvisor orchestrator and components.
//!
//! This module defines three main error enums:
//!
//! - [`ConfigError`] — configuration errors detected before any phase runs
//!   (duplicate registration, unknown dependency, cycle, required dependency
//!   disabled). Always fatal, never retried.
//! - [`ComponentError`] — errors raised by a component's lifecycle hooks.
//! - [`RuntimeError`] — errors surfaced by [`Orchestrator::run`]
//!   (configuration failures, phase failures, fatal aborts).
//!
//! All types provide helper methods (`as_label`, `as_message`) for
//! logging/metrics.
//!
//! [`Orchestrator::run`]: crate::Orchestrator::run

use thiserror::Error;

use crate::core::Phase;

/// # Configuration errors.
///
/// Detected during registration or while resolving the dependency graph,
/// before any phase executes observable side effects. Each variant carries
/// the offending component names so the configuration can be fixed.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A component with the same identity was registered twice.
    #[error("component '{component}' is already registered")]
    DuplicateComponent {
        /// Name of the component that was registered twice.
        component: String,
    },

    /// A component declared an ordering edge on its own identity.
    #[error("component '{component}' declares a dependency on itself")]
    SelfDependency {
        /// Name of the offending component.
        component: String,
    },

    /// A hard edge references an identity absent from the registry.
    #[error("component '{component}' depends on unregistered component '{dependency}'")]
    UnknownDependency {
        /// Name of the declaring component.
        component: String,
        /// Type name of the missing dependency.
        dependency: String,
    },

    /// The enabled subgraph contains a dependency cycle.
    #[error("dependency cycle detected: {}", render_cycle(.cycle))]
    DependencyCycle {
        /// One concrete cycle, in edge direction, first node not repeated.
        cycle: Vec<String>,
    },

    /// A non-optional component requires a component that is disabled.
    #[error("component '{component}' is required but its dependency '{dependency}' is disabled")]
    RequiredDependencyDisabled {
        /// Name of the non-optional dependent.
        component: String,
        /// Name of the disabled dependency.
        dependency: String,
    },
}

/// Renders a cycle as `A -> B -> C -> A`.
fn render_cycle(cycle: &[String]) -> String {
    let mut out = cycle.join(" -> ");
    if let Some(first) = cycle.first() {
        out.push_str(" -> ");
        out.push_str(first);
    }
    out
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use compvisor::ConfigError;
    ///
    /// let err = ConfigError::DependencyCycle { cycle: vec!["a".into(), "b".into()] };
    /// assert_eq!(err.as_label(), "config_dependency_cycle");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::DuplicateComponent { .. } => "config_duplicate_component",
            ConfigError::SelfDependency { .. } => "config_self_dependency",
            ConfigError::UnknownDependency { .. } => "config_unknown_dependency",
            ConfigError::DependencyCycle { .. } => "config_dependency_cycle",
            ConfigError::RequiredDependencyDisabled { .. } => "config_required_disabled",
        }
    }
}

/// # Errors produced by component lifecycle hooks.
///
/// Returned from [`Component`](crate::Component) hook implementations. During
/// forward phases these are fatal for the whole process; during teardown
/// phases they are published as events and teardown continues best-effort.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ComponentError {
    /// The component rejected its own parsed configuration.
    #[error("invalid options: {reason}")]
    InvalidOptions {
        /// Field/reason description for the operator.
        reason: String,
    },

    /// The hook failed while executing.
    #[error("execution failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },
}

impl ComponentError {
    /// Creates an [`ComponentError::InvalidOptions`] with the given reason.
    pub fn invalid_options(reason: impl Into<String>) -> Self {
        ComponentError::InvalidOptions {
            reason: reason.into(),
        }
    }

    /// Creates a [`ComponentError::Failed`] with the given message.
    pub fn failed(error: impl Into<String>) -> Self {
        ComponentError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ComponentError::InvalidOptions { .. } => "component_invalid_options",
            ComponentError::Failed { .. } => "component_failed",
        }
    }
}

/// # Errors surfaced by the orchestrator run loop.
///
/// These propagate all the way out of [`Orchestrator::run`] and determine the
/// process exit status; they are never swallowed inside the orchestrator.
///
/// [`Orchestrator::run`]: crate::Orchestrator::run
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be resolved into a valid execution order.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A component failed during a forward lifecycle phase.
    #[error("component '{component}' failed during {phase}: {source}")]
    Phase {
        /// Name of the failing component.
        component: String,
        /// Phase in which the failure occurred.
        phase: Phase,
        /// The component's own error.
        source: ComponentError,
    },

    /// The process aborted due to an unrecoverable internal error.
    #[error("fatal shutdown requested: {reason}")]
    Aborted {
        /// Reason supplied by the fatal shutdown trigger.
        reason: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use compvisor::RuntimeError;
    ///
    /// let err = RuntimeError::Aborted { reason: "disk full".into() };
    /// assert_eq!(err.as_label(), "runtime_aborted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Config(e) => e.as_label(),
            RuntimeError::Phase { .. } => "runtime_phase_failed",
            RuntimeError::Aborted { .. } => "runtime_aborted",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::Config(e) => e.to_string(),
            RuntimeError::Phase {
                component,
                phase,
                source,
            } => format!("phase={phase} component={component} error={source}"),
            RuntimeError::Aborted { reason } => format!("aborted: {reason}"),
        }
    }
}
