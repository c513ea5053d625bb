//! Choices for entity reference editors.

use nomai_mirror::component::ComponentRegistry;
use nomai_mirror::entity::EntityId;
use nomai_mirror::mirror::WorldMirror;
use nomai_mirror::naming::FALLBACK_NAME;
use serde::Serialize;

/// One pickable entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityChoice {
    pub id: EntityId,
    pub name: String,
    /// `name (IvG)`.
    pub label: String,
}

/// Visible entities whose name contains `query` (case-insensitive), in
/// index order. An empty query matches everything.
pub fn entity_choices(
    mirror: &WorldMirror,
    components: &ComponentRegistry,
    query: &str,
) -> Vec<EntityChoice> {
    let query = query.to_lowercase();
    mirror
        .entity_ids()
        .into_iter()
        .filter(|&id| !mirror.is_hidden(id, components))
        .filter_map(|id| {
            let name = mirror.name(id).unwrap_or(FALLBACK_NAME);
            if !name.to_lowercase().contains(&query) {
                return None;
            }
            Some(EntityChoice {
                id,
                name: name.to_owned(),
                label: format!("{name} ({id})"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomai_mirror::prelude::*;
    use nomai_reflect::registry::TypeRegistry;
    use nomai_reflect::type_names;
    use serde_json::json;

    #[test]
    fn filters_hidden_and_by_name() {
        let components: ComponentRegistry = [
            ComponentInfo::new(0, type_names::NAME),
            ComponentInfo::new(1, type_names::OBSERVER),
        ]
        .into_iter()
        .collect();
        let types = TypeRegistry::new();
        let ctx = MirrorContext::new(&components, &types);
        let mut mirror = WorldMirror::new();

        let named = |name: &str| {
            EntityMutation::change(
                vec![ComponentChange::new(ComponentId(0), false, json!(name))],
                vec![],
            )
        };
        mirror.apply(ctx, EntityId::new(3, 0), &named("Player"));
        mirror.apply(ctx, EntityId::new(1, 0), &named("Enemy"));
        mirror.apply(ctx, EntityId::new(2, 0), &named("playground"));
        mirror.apply(
            ctx,
            EntityId::new(4, 0),
            &EntityMutation::change(
                vec![ComponentChange::new(ComponentId(1), false, json!(null))],
                vec![],
            ),
        );

        let all = entity_choices(&mirror, &components, "");
        let ids: Vec<u32> = all.iter().map(|c| c.id.index()).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(all[0].label, "Enemy (1v0)");

        let matches = entity_choices(&mirror, &components, "PLAY");
        let names: Vec<&str> = matches.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["playground", "Player"]);
    }
}
