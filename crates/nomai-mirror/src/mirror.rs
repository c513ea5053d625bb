//! The client-side shadow of the remote world.
//!
//! [`WorldMirror`] holds three maps keyed by [`EntityId`]: the component
//! values of each entity, its parent link, and its cached display name. The
//! three key sets are always equal. Each map lives behind an [`Arc`] and is
//! copied on write, so a consumer holding an earlier snapshot can detect a
//! change with [`Arc::ptr_eq`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use nomai_reflect::registry::TypeRegistry;
use nomai_reflect::type_names::is_hidden_component;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::component::{ComponentId, ComponentRegistry};
use crate::entity::EntityId;
use crate::naming::entity_name;

/// Last known value of one component on one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentState {
    pub value: Value,
    /// A disabled component keeps its last known value.
    pub disabled: bool,
}

/// Components of one entity, in ascending id order.
pub type ComponentMap = BTreeMap<ComponentId, ComponentState>;

pub type EntityMap = HashMap<EntityId, ComponentMap>;
pub type ParentMap = HashMap<EntityId, Option<EntityId>>;
pub type NameMap = HashMap<EntityId, String>;

/// The registries a mirror operation reads, passed explicitly so callers
/// always supply the snapshot they currently hold.
#[derive(Debug, Clone, Copy)]
pub struct MirrorContext<'a> {
    pub components: &'a ComponentRegistry,
    pub types: &'a TypeRegistry,
}

impl<'a> MirrorContext<'a> {
    pub fn new(components: &'a ComponentRegistry, types: &'a TypeRegistry) -> Self {
        Self { components, types }
    }
}

/// A component an entity could still receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddableComponent {
    pub id: ComponentId,
    pub name: String,
    /// Short display name.
    pub label: String,
}

/// Client-side mirror of the remote entity graph.
#[derive(Debug, Clone, Default)]
pub struct WorldMirror {
    pub(crate) entities: Arc<EntityMap>,
    pub(crate) parents: Arc<ParentMap>,
    pub(crate) names: Arc<NameMap>,
}

impl WorldMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every entity, e.g. after reconnecting to the remote world.
    pub fn reset(&mut self) {
        debug!(entities = self.entities.len(), "resetting world mirror");
        *self = Self::default();
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// All tracked entities, sorted by index.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.keys().copied().collect();
        ids.sort_by_key(|id| id.sort_key());
        ids
    }

    pub fn components(&self, entity: EntityId) -> Option<&ComponentMap> {
        self.entities.get(&entity)
    }

    pub fn component(&self, entity: EntityId, component: ComponentId) -> Option<&ComponentState> {
        self.entities.get(&entity)?.get(&component)
    }

    /// Parent of a tracked entity, `None` for roots and unknown entities.
    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.parents.get(&entity).copied().flatten()
    }

    /// Cached display name of a tracked entity.
    pub fn name(&self, entity: EntityId) -> Option<&str> {
        self.names.get(&entity).map(String::as_str)
    }

    pub fn entities_snapshot(&self) -> Arc<EntityMap> {
        Arc::clone(&self.entities)
    }

    pub fn parents_snapshot(&self) -> Arc<ParentMap> {
        Arc::clone(&self.parents)
    }

    pub fn names_snapshot(&self) -> Arc<NameMap> {
        Arc::clone(&self.names)
    }

    /// Whether the entity currently carries an observer or system-id marker
    /// component. Such entities are engine plumbing and stay out of views.
    pub fn is_hidden(&self, entity: EntityId, components: &ComponentRegistry) -> bool {
        self.entities.get(&entity).is_some_and(|map| {
            map.keys()
                .filter_map(|id| components.name(*id))
                .any(is_hidden_component)
        })
    }

    /// Recompute every cached display name. Needed when the component or
    /// type registry is replaced after entities have already arrived.
    pub fn refresh_names(&mut self, ctx: MirrorContext<'_>) {
        let names: NameMap = self
            .entities
            .iter()
            .map(|(id, components)| (*id, entity_name(ctx, components)))
            .collect();
        if *self.names != names {
            self.names = Arc::new(names);
        }
    }

    /// Reflected components the entity does not carry yet, sorted by label.
    pub fn addable_components(
        &self,
        entity: EntityId,
        ctx: MirrorContext<'_>,
    ) -> Vec<AddableComponent> {
        let Some(present) = self.entities.get(&entity) else {
            return Vec::new();
        };
        let mut addable: Vec<AddableComponent> = ctx
            .components
            .iter()
            .filter(|info| info.reflected && !present.contains_key(&info.id))
            .map(|info| AddableComponent {
                id: info.id,
                name: info.name.clone(),
                label: ctx.types.short_name(&info.name),
            })
            .collect();
        addable.sort_by(|a, b| a.label.cmp(&b.label).then(a.id.cmp(&b.id)));
        addable
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
