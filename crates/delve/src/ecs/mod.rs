//! # Turn-Based ECS Core
//!
//! A deliberately small, synchronous Entity Component System. There are no
//! archetypes and no parallel scheduling: one sparse column per component
//! kind, a dependency-tracked query cache and a priority-ordered list of
//! systems run to completion once per step.
//!
//! ## Module Overview
//!
//! - [`entity`] — Monotonic entity ids, never reused
//! - [`component`] — The closed set of component kinds, `KindSet`, bundles
//! - [`query`] — Tuple queries and the query cache
//! - [`world`] — Central store (components, tags, deferred deletion)
//! - [`system`] — System trait and priority schedule

pub mod component;
pub mod entity;
pub mod query;
pub mod system;
pub mod world;

pub use component::{AnyComponent, Bundle, Component, ComponentKind, KindSet};
pub use entity::Entity;
pub use query::{CacheStats, Query};
pub use system::{Schedule, System};
pub use world::{Tag, World};
