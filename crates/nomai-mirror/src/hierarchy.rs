//! Parent/child tree view derived from the mirror's flat parent map.

use std::collections::HashMap;

use serde::Serialize;

use crate::component::ComponentRegistry;
use crate::entity::EntityId;
use crate::mirror::WorldMirror;

/// One entity and its (recursively expanded) children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityTreeNode {
    pub id: EntityId,
    pub children: Vec<EntityTreeNode>,
}

impl EntityTreeNode {
    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(EntityTreeNode::size).sum::<usize>()
    }
}

/// Build the entity forest, siblings sorted by index.
///
/// Entities without a tracked parent are roots. Hidden entities are left out
/// together with everything beneath them. Entities caught in a parent cycle
/// are unreachable from any root and are left out as well.
pub fn build_hierarchy(
    mirror: &WorldMirror,
    components: &ComponentRegistry,
) -> Vec<EntityTreeNode> {
    let mut children_of: HashMap<Option<EntityId>, Vec<EntityId>> = HashMap::new();
    for (&entity, &parent) in mirror.parents_snapshot().iter() {
        if mirror.is_hidden(entity, components) {
            continue;
        }
        let parent = parent.filter(|p| mirror.contains(*p));
        children_of.entry(parent).or_default().push(entity);
    }
    for siblings in children_of.values_mut() {
        siblings.sort_by_key(|id| id.sort_key());
    }
    expand(&children_of, None)
}

fn expand(
    children_of: &HashMap<Option<EntityId>, Vec<EntityId>>,
    parent: Option<EntityId>,
) -> Vec<EntityTreeNode> {
    children_of
        .get(&parent)
        .map(|ids| {
            ids.iter()
                .map(|&id| EntityTreeNode {
                    id,
                    children: expand(children_of, Some(id)),
                })
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentId, ComponentInfo};
    use crate::mirror::MirrorContext;
    use crate::mutation::{ComponentChange, EntityMutation};
    use nomai_reflect::registry::TypeRegistry;
    use nomai_reflect::type_names;
    use serde_json::{json, Value};

    const PARENT: ComponentId = ComponentId(1);
    const MARKER: ComponentId = ComponentId(2);
    const OBSERVER: ComponentId = ComponentId(3);

    fn components() -> ComponentRegistry {
        [
            ComponentInfo::new(1, type_names::PARENT),
            ComponentInfo::new(2, "game::Marker"),
            ComponentInfo::new(3, type_names::OBSERVER),
        ]
        .into_iter()
        .collect()
    }

    fn add(
        mirror: &mut WorldMirror,
        reg: &ComponentRegistry,
        e: EntityId,
        parent: Option<EntityId>,
    ) {
        add_with(mirror, reg, e, parent, MARKER);
    }

    fn add_with(
        mirror: &mut WorldMirror,
        reg: &ComponentRegistry,
        e: EntityId,
        parent: Option<EntityId>,
        extra: ComponentId,
    ) {
        let types = TypeRegistry::new();
        let mut changes = vec![ComponentChange::new(extra, false, Value::Null)];
        if let Some(p) = parent {
            changes.push(ComponentChange::new(PARENT, false, json!(p.to_raw())));
        }
        mirror.apply(
            MirrorContext::new(reg, &types),
            e,
            &EntityMutation::change(changes, Vec::new()),
        );
    }

    fn ids(nodes: &[EntityTreeNode]) -> Vec<u32> {
        nodes.iter().map(|n| n.id.index()).collect()
    }

    // -- 1. Shape --

    #[test]
    fn groups_and_sorts_children() {
        let reg = components();
        let mut mirror = WorldMirror::new();
        let root = EntityId::new(1, 0);
        add(&mut mirror, &reg, root, None);
        add(&mut mirror, &reg, EntityId::new(5, 0), Some(root));
        add(&mut mirror, &reg, EntityId::new(3, 2), Some(root));
        add(&mut mirror, &reg, EntityId::new(4, 0), Some(EntityId::new(3, 2)));
        add(&mut mirror, &reg, EntityId::new(0, 0), None);

        let forest = build_hierarchy(&mirror, &reg);
        assert_eq!(ids(&forest), [0, 1]);
        assert_eq!(ids(&forest[1].children), [3, 5]);
        assert_eq!(ids(&forest[1].children[0].children), [4]);
        assert_eq!(forest.iter().map(EntityTreeNode::size).sum::<usize>(), 5);
    }

    #[test]
    fn untracked_parent_makes_root() {
        let reg = components();
        let mut mirror = WorldMirror::new();
        add(&mut mirror, &reg, EntityId::new(2, 0), Some(EntityId::new(40, 0)));
        assert_eq!(ids(&build_hierarchy(&mirror, &reg)), [2]);
    }

    // -- 2. Exclusions --

    #[test]
    fn hidden_subtree_is_excluded() {
        let reg = components();
        let mut mirror = WorldMirror::new();
        let hidden = EntityId::new(1, 0);
        add_with(&mut mirror, &reg, hidden, None, OBSERVER);
        add(&mut mirror, &reg, EntityId::new(2, 0), Some(hidden));
        add(&mut mirror, &reg, EntityId::new(3, 0), None);
        assert_eq!(ids(&build_hierarchy(&mirror, &reg)), [3]);
    }

    #[test]
    fn cycles_do_not_recurse() {
        let reg = components();
        let mut mirror = WorldMirror::new();
        let a = EntityId::new(1, 0);
        let b = EntityId::new(2, 0);
        add(&mut mirror, &reg, a, Some(b));
        add(&mut mirror, &reg, b, Some(a));
        add(&mut mirror, &reg, EntityId::new(3, 0), None);
        assert_eq!(ids(&build_hierarchy(&mirror, &reg)), [3]);
    }

    #[test]
    fn empty_mirror_has_no_roots() {
        assert!(build_hierarchy(&WorldMirror::new(), &components()).is_empty());
    }
}
