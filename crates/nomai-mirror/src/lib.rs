//! Nomai Mirror -- Incremental client-side mirror of a remote entity world.
//!
//! The remote world streams partial mutation events; this crate rebuilds and
//! maintains a shadow of its entities, component values, disabled flags and
//! parent links, and derives display names and a parent/child tree from it.
//!
//! Registries are passed explicitly through a [`MirrorContext`] so every
//! operation runs against the registry snapshot the caller currently holds.
//!
//! # Quick Start
//!
//! ```
//! use nomai_mirror::prelude::*;
//! use nomai_reflect::registry::TypeRegistry;
//! use serde_json::json;
//!
//! let components: ComponentRegistry = [
//!     ComponentInfo::new(1, "bevy_core::name::Name"),
//!     ComponentInfo::new(2, "bevy_hierarchy::components::parent::Parent"),
//! ]
//! .into_iter()
//! .collect();
//! let types = TypeRegistry::new();
//! let ctx = MirrorContext::new(&components, &types);
//!
//! let mut mirror = WorldMirror::new();
//! let root = EntityId::new(0, 0);
//! let child = EntityId::new(1, 0);
//!
//! let spawn_root: EntityMutation = serde_json::from_value(json!({
//!     "kind": "change", "changes": [[1, false, "Scene"]], "removes": []
//! })).unwrap();
//! let spawn_child: EntityMutation = serde_json::from_value(json!({
//!     "kind": "change", "changes": [[2, false, root.to_raw()]], "removes": []
//! })).unwrap();
//! mirror.apply(ctx, root, &spawn_root);
//! mirror.apply(ctx, child, &spawn_child);
//!
//! let forest = build_hierarchy(&mirror, &components);
//! assert_eq!(forest[0].id, root);
//! assert_eq!(forest[0].children[0].id, child);
//! assert_eq!(mirror.name(root), Some("Scene"));
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod hierarchy;
pub mod mirror;
pub mod mutation;
pub mod naming;
pub mod snapshot;

pub use mirror::MirrorContext;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{ComponentId, ComponentInfo, ComponentRegistry};
    pub use crate::entity::EntityId;
    pub use crate::hierarchy::{build_hierarchy, EntityTreeNode};
    pub use crate::mirror::{
        AddableComponent, ComponentMap, ComponentState, MirrorContext, WorldMirror,
    };
    pub use crate::mutation::{ComponentChange, ComponentRemoval, EntityMutation, MutationOutcome};
    pub use crate::naming::{entity_name, FALLBACK_NAME};
    pub use crate::snapshot::{EntitySnapshot, MirrorSnapshot};
}
