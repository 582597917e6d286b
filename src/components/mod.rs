//! Component abstractions: the lifecycle trait, identity tokens, and
//! declaration specs.
//!
//! - [`Component`]: the async lifecycle trait every subsystem implements;
//! - [`ComponentId`]: stable type-derived identity used for registry keys and
//!   dependency edges;
//! - [`ComponentSpec`]: declaration builder binding a component instance to
//!   its ordering edges and enabled/optional flags.

mod component;
mod spec;

pub use component::{Component, ComponentId, ComponentRef};
pub use spec::ComponentSpec;

pub(crate) use spec::Dependency;
