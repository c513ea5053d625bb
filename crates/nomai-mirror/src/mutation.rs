//! Entity mutation events and their application to the mirror.
//!
//! The remote world streams one [`EntityMutation`] per entity per frame:
//! either `remove`, or `change` with the components that were inserted or
//! updated and the components that were removed or disabled.
//!
//! ```json
//! { "kind": "change", "changes": [[3, false, 12.5]], "removes": [[4, true]] }
//! { "kind": "remove" }
//! ```
//!
//! Applying a mutation keeps the mirror's three maps consistent: the first
//! `change` for an unseen id creates the entity, and `remove` drops it from
//! every map at once.

use std::collections::btree_map::Entry;
use std::sync::Arc;

use nomai_reflect::type_names::{self, is_hidden_component};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::component::ComponentId;
use crate::entity::EntityId;
use crate::mirror::{ComponentMap, ComponentState, MirrorContext, WorldMirror};
use crate::naming::{entity_name, is_value_labelled};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// `[component, disabled, value]`. The value may be omitted on the wire and
/// is then `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentChange(
    pub ComponentId,
    pub bool,
    #[serde(default)] pub Value,
);

impl ComponentChange {
    pub fn new(id: ComponentId, disabled: bool, value: Value) -> Self {
        Self(id, disabled, value)
    }

    pub fn id(&self) -> ComponentId {
        self.0
    }

    pub fn disabled(&self) -> bool {
        self.1
    }

    pub fn value(&self) -> &Value {
        &self.2
    }
}

/// `[component, disabled]`: the component was disabled (`true`) or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRemoval(pub ComponentId, pub bool);

impl ComponentRemoval {
    pub fn id(&self) -> ComponentId {
        self.0
    }

    pub fn disabled(&self) -> bool {
        self.1
    }
}

/// One entity's mutation for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityMutation {
    Remove,
    Change {
        #[serde(default)]
        changes: Vec<ComponentChange>,
        #[serde(default)]
        removes: Vec<ComponentRemoval>,
    },
}

impl EntityMutation {
    pub fn change(changes: Vec<ComponentChange>, removes: Vec<ComponentRemoval>) -> Self {
        Self::Change { changes, removes }
    }
}

/// What applying a mutation did to the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Created,
    Updated,
    Removed,
    /// The mutation referred to an entity the mirror does not track.
    Ignored,
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

impl WorldMirror {
    /// Apply one mutation for `entity`.
    pub fn apply(
        &mut self,
        ctx: MirrorContext<'_>,
        entity: EntityId,
        mutation: &EntityMutation,
    ) -> MutationOutcome {
        trace!(entity = %entity, ?mutation, "applying entity mutation");
        match mutation {
            EntityMutation::Remove => self.remove_entity(entity),
            EntityMutation::Change { changes, removes } if self.contains(entity) => {
                self.update_entity(ctx, entity, changes, removes)
            }
            EntityMutation::Change { changes, removes } => {
                self.create_entity(ctx, entity, changes, removes)
            }
        }
    }

    fn remove_entity(&mut self, entity: EntityId) -> MutationOutcome {
        if !self.contains(entity) {
            debug!(entity = %entity, "remove for untracked entity ignored");
            return MutationOutcome::Ignored;
        }
        Arc::make_mut(&mut self.entities).remove(&entity);
        Arc::make_mut(&mut self.parents).remove(&entity);
        Arc::make_mut(&mut self.names).remove(&entity);
        MutationOutcome::Removed
    }

    fn create_entity(
        &mut self,
        ctx: MirrorContext<'_>,
        entity: EntityId,
        changes: &[ComponentChange],
        removes: &[ComponentRemoval],
    ) -> MutationOutcome {
        if !removes.is_empty() {
            warn!(
                entity = %entity,
                removes = ?removes,
                "received component removals for untracked entity"
            );
        }

        let components: ComponentMap = changes
            .iter()
            .map(|change| {
                let state = ComponentState {
                    value: change.value().clone(),
                    disabled: change.disabled(),
                };
                (change.id(), state)
            })
            .collect();

        let parent = match parent_component(ctx) {
            Some(parent_id) if !touches_hidden(ctx, changes) => {
                components.get(&parent_id).and_then(|state| {
                    if state.disabled {
                        None
                    } else {
                        parse_parent(entity, &state.value)
                    }
                })
            }
            _ => None,
        };
        let name = entity_name(ctx, &components);

        Arc::make_mut(&mut self.entities).insert(entity, components);
        Arc::make_mut(&mut self.parents).insert(entity, parent);
        Arc::make_mut(&mut self.names).insert(entity, name);
        MutationOutcome::Created
    }

    fn update_entity(
        &mut self,
        ctx: MirrorContext<'_>,
        entity: EntityId,
        changes: &[ComponentChange],
        removes: &[ComponentRemoval],
    ) -> MutationOutcome {
        let parent_id = parent_component(ctx);
        let hidden = touches_hidden(ctx, changes);
        let mut name_dirty = false;
        let mut parent_update: Option<Option<EntityId>> = None;

        let Some(components) = Arc::make_mut(&mut self.entities).get_mut(&entity) else {
            return MutationOutcome::Ignored;
        };

        for removal in removes {
            if Some(removal.id()) == parent_id {
                parent_update = Some(None);
            }
            if removal.disabled() {
                if let Some(state) = components.get_mut(&removal.id()) {
                    state.disabled = true;
                }
            } else if components.remove(&removal.id()).is_some() {
                name_dirty = true;
            }
        }

        for change in changes {
            let state = ComponentState {
                value: change.value().clone(),
                disabled: change.disabled(),
            };
            match components.entry(change.id()) {
                Entry::Occupied(mut slot) => {
                    slot.insert(state);
                    name_dirty |= is_value_labelled(ctx, change.id());
                }
                Entry::Vacant(slot) => {
                    slot.insert(state);
                    name_dirty = true;
                }
            }
            if Some(change.id()) == parent_id && !hidden {
                parent_update = Some(if change.disabled() {
                    None
                } else {
                    parse_parent(entity, change.value())
                });
            }
        }

        if let Some(parent) = parent_update {
            if self.parents.get(&entity) != Some(&parent) {
                Arc::make_mut(&mut self.parents).insert(entity, parent);
            }
        }
        if name_dirty {
            let name = self
                .entities
                .get(&entity)
                .map(|components| entity_name(ctx, components));
            if let Some(name) = name {
                if self.names.get(&entity) != Some(&name) {
                    Arc::make_mut(&mut self.names).insert(entity, name);
                }
            }
        }
        MutationOutcome::Updated
    }
}

fn parent_component(ctx: MirrorContext<'_>) -> Option<ComponentId> {
    ctx.components.lookup_by_name(type_names::PARENT)
}

/// Whether the event's changes include an observer or system-id marker.
fn touches_hidden(ctx: MirrorContext<'_>, changes: &[ComponentChange]) -> bool {
    changes
        .iter()
        .filter_map(|change| ctx.components.name(change.id()))
        .any(is_hidden_component)
}

fn parse_parent(entity: EntityId, value: &Value) -> Option<EntityId> {
    let parent = EntityId::from_value(value);
    if parent.is_none() {
        warn!(entity = %entity, value = %value, "parent link is not an entity reference");
    }
    parent
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentInfo, ComponentRegistry};
    use nomai_reflect::registry::TypeRegistry;
    use serde_json::json;

    const HEALTH: ComponentId = ComponentId(1);
    const PARENT: ComponentId = ComponentId(2);
    const NAME: ComponentId = ComponentId(3);
    const OBSERVER: ComponentId = ComponentId(4);

    fn components() -> ComponentRegistry {
        [
            ComponentInfo::new(1, "game::Health"),
            ComponentInfo::new(2, type_names::PARENT),
            ComponentInfo::new(3, type_names::NAME),
            ComponentInfo::new(4, type_names::OBSERVER),
        ]
        .into_iter()
        .collect()
    }

    fn change(id: ComponentId, disabled: bool, value: Value) -> ComponentChange {
        ComponentChange::new(id, disabled, value)
    }

    struct Fixture {
        components: ComponentRegistry,
        types: TypeRegistry,
        mirror: WorldMirror,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                components: components(),
                types: TypeRegistry::new(),
                mirror: WorldMirror::new(),
            }
        }

        fn apply(&mut self, entity: EntityId, mutation: EntityMutation) -> MutationOutcome {
            let ctx = MirrorContext::new(&self.components, &self.types);
            self.mirror.apply(ctx, entity, &mutation)
        }
    }

    // -- 1. Wire decoding --

    #[test]
    fn decode_change_with_omitted_value() {
        let mutation: EntityMutation = serde_json::from_value(json!({
            "kind": "change",
            "changes": [[1, false, 5], [2, true]],
            "removes": [[3, false]]
        }))
        .unwrap();
        assert_eq!(
            mutation,
            EntityMutation::change(
                vec![change(HEALTH, false, json!(5)), change(PARENT, true, Value::Null)],
                vec![ComponentRemoval(NAME, false)],
            )
        );

        let remove: EntityMutation = serde_json::from_value(json!({ "kind": "remove" })).unwrap();
        assert_eq!(remove, EntityMutation::Remove);
    }

    // -- 2. Creation --

    #[test]
    fn creation_with_parent_and_name() {
        let mut fx = Fixture::new();
        let parent = EntityId::new(7, 2);
        let child = EntityId::new(1, 1);

        let outcome = fx.apply(
            child,
            EntityMutation::change(
                vec![
                    change(PARENT, false, json!(parent.to_raw())),
                    change(NAME, false, json!("Hero")),
                ],
                Vec::new(),
            ),
        );

        assert_eq!(outcome, MutationOutcome::Created);
        assert_eq!(fx.mirror.parent(child), Some(parent));
        assert_eq!(fx.mirror.name(child), Some("Hero"));
        assert_eq!(fx.mirror.components(child).map(|c| c.len()), Some(2));
    }

    #[test]
    fn creation_ignores_removes() {
        let mut fx = Fixture::new();
        let e = EntityId::new(1, 0);
        fx.apply(
            e,
            EntityMutation::change(
                vec![change(HEALTH, false, json!(3))],
                vec![ComponentRemoval(NAME, false)],
            ),
        );
        assert!(fx.mirror.component(e, HEALTH).is_some());
        assert_eq!(fx.mirror.parent(e), None);
    }

    #[test]
    fn creation_with_hidden_component_has_no_parent() {
        let mut fx = Fixture::new();
        let e = EntityId::new(2, 0);
        fx.apply(
            e,
            EntityMutation::change(
                vec![
                    change(OBSERVER, false, json!({})),
                    change(PARENT, false, json!(EntityId::new(1, 0).to_raw())),
                ],
                Vec::new(),
            ),
        );
        assert!(fx.mirror.contains(e));
        assert_eq!(fx.mirror.parent(e), None);
    }

    #[test]
    fn creation_with_disabled_parent_has_no_parent() {
        let mut fx = Fixture::new();
        let e = EntityId::new(2, 0);
        fx.apply(
            e,
            EntityMutation::change(vec![change(PARENT, true, json!(5))], Vec::new()),
        );
        assert_eq!(fx.mirror.parent(e), None);
    }

    // -- 3. Updates --

    #[test]
    fn parent_removal_clears_link() {
        let mut fx = Fixture::new();
        let e = EntityId::new(3, 0);
        fx.apply(
            e,
            EntityMutation::change(vec![change(PARENT, false, json!(9))], Vec::new()),
        );
        assert_eq!(fx.mirror.parent(e), Some(EntityId::from_raw(9)));

        let outcome = fx.apply(
            e,
            EntityMutation::change(Vec::new(), vec![ComponentRemoval(PARENT, false)]),
        );
        assert_eq!(outcome, MutationOutcome::Updated);
        assert_eq!(fx.mirror.parent(e), None);
        assert!(fx.mirror.component(e, PARENT).is_none());
    }

    #[test]
    fn disabling_keeps_value() {
        let mut fx = Fixture::new();
        let e = EntityId::new(3, 0);
        fx.apply(
            e,
            EntityMutation::change(vec![change(HEALTH, false, json!(42))], Vec::new()),
        );
        fx.apply(
            e,
            EntityMutation::change(Vec::new(), vec![ComponentRemoval(HEALTH, true)]),
        );
        assert_eq!(
            fx.mirror.component(e, HEALTH),
            Some(&ComponentState {
                value: json!(42),
                disabled: true
            })
        );
    }

    #[test]
    fn reparent_through_change() {
        let mut fx = Fixture::new();
        let e = EntityId::new(3, 0);
        fx.apply(
            e,
            EntityMutation::change(vec![change(HEALTH, false, json!(1))], Vec::new()),
        );
        assert_eq!(fx.mirror.parent(e), None);

        fx.apply(
            e,
            EntityMutation::change(vec![change(PARENT, false, json!(11))], Vec::new()),
        );
        assert_eq!(fx.mirror.parent(e), Some(EntityId::from_raw(11)));
    }

    #[test]
    fn names_follow_component_changes() {
        let mut fx = Fixture::new();
        let e = EntityId::new(3, 0);
        fx.apply(
            e,
            EntityMutation::change(vec![change(HEALTH, false, json!(1))], Vec::new()),
        );
        assert_eq!(fx.mirror.name(e), Some("Health"));

        fx.apply(
            e,
            EntityMutation::change(vec![change(NAME, false, json!("Bob"))], Vec::new()),
        );
        assert_eq!(fx.mirror.name(e), Some("Bob"));

        fx.apply(
            e,
            EntityMutation::change(vec![change(NAME, false, json!("Alice"))], Vec::new()),
        );
        assert_eq!(fx.mirror.name(e), Some("Alice"));

        fx.apply(
            e,
            EntityMutation::change(Vec::new(), vec![ComponentRemoval(NAME, false)]),
        );
        assert_eq!(fx.mirror.name(e), Some("Health"));
    }

    // -- 4. Removal --

    #[test]
    fn remove_drops_all_maps_and_is_idempotent() {
        let mut fx = Fixture::new();
        let e = EntityId::new(3, 0);
        fx.apply(
            e,
            EntityMutation::change(vec![change(HEALTH, false, json!(1))], Vec::new()),
        );
        assert_eq!(fx.apply(e, EntityMutation::Remove), MutationOutcome::Removed);
        assert!(!fx.mirror.contains(e));
        assert!(fx.mirror.name(e).is_none());
        assert!(!fx.mirror.parents_snapshot().contains_key(&e));

        assert_eq!(fx.apply(e, EntityMutation::Remove), MutationOutcome::Ignored);
    }
}
