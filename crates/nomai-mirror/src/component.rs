//! Remote component metadata.
//!
//! The remote world announces its component types with numeric ids. The
//! [`ComponentRegistry`] keeps the id ↔ type-name mapping plus per-component
//! flags. Like the type registry it is replaced wholesale on every update:
//! [`ComponentRegistry::merged`] produces a new registry rather than editing
//! the shared one.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use nomai_reflect::registry::TypeRegistry;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ComponentId
// ---------------------------------------------------------------------------

/// Numeric identifier the remote world assigns to a component type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ComponentInfo
// ---------------------------------------------------------------------------

/// Metadata about a remote component type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub id: ComponentId,
    /// Full type path, which is also the component's name.
    pub name: String,
    /// Whether values of this component are visible through reflection.
    #[serde(default)]
    pub reflected: bool,
    #[serde(default)]
    pub serializable: bool,
    #[serde(default, alias = "requiredComponents")]
    pub required_components: Vec<ComponentId>,
}

impl ComponentInfo {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: ComponentId(id),
            name: name.into(),
            reflected: true,
            serializable: true,
            required_components: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Registry mapping remote component ids to their metadata.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    /// Name -> id for lookup of well-known components.
    by_name: HashMap<String, ComponentId>,
    /// Ordered by id so iteration is ascending.
    infos: BTreeMap<ComponentId, ComponentInfo>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the metadata for `info.id`.
    pub fn register(&mut self, info: ComponentInfo) {
        if let Some(previous) = self.infos.get(&info.id) {
            if previous.name != info.name {
                self.by_name.remove(&previous.name);
            }
        }
        self.by_name.insert(info.name.clone(), info.id);
        self.infos.insert(info.id, info);
    }

    /// A copy of this registry with `infos` upserted.
    pub fn merged(&self, infos: impl IntoIterator<Item = ComponentInfo>) -> Self {
        let mut next = self.clone();
        for info in infos {
            next.register(info);
        }
        next
    }

    /// Look up a component id by its type name.
    pub fn lookup_by_name(&self, name: &str) -> Option<ComponentId> {
        self.by_name.get(name).copied()
    }

    pub fn get_info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.infos.get(&id)
    }

    /// Type name of a component, if known.
    pub fn name(&self, id: ComponentId) -> Option<&str> {
        self.get_info(id).map(|info| info.name.as_str())
    }

    /// Display name of a component, resolved through the type registry.
    pub fn short_name(&self, id: ComponentId, types: &TypeRegistry) -> Option<String> {
        self.name(id).map(|name| types.short_name(name))
    }

    /// All components in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.infos.values()
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Returns the names of all registered components, sorted.
    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

impl FromIterator<ComponentInfo> for ComponentRegistry {
    fn from_iter<I: IntoIterator<Item = ComponentInfo>>(iter: I) -> Self {
        Self::new().merged(iter)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_and_lookup() {
        let reg: ComponentRegistry = [ComponentInfo::new(3, "game::Health")].into_iter().collect();
        assert_eq!(reg.lookup_by_name("game::Health"), Some(ComponentId(3)));
        assert_eq!(reg.name(ComponentId(3)), Some("game::Health"));
        assert_eq!(reg.lookup_by_name("game::Mana"), None);
    }

    #[test]
    fn merge_upserts_without_touching_source() {
        let base: ComponentRegistry = [ComponentInfo::new(1, "a::A")].into_iter().collect();
        let next = base.merged([
            ComponentInfo::new(1, "a::Renamed"),
            ComponentInfo::new(2, "a::B"),
        ]);

        assert_eq!(base.len(), 1);
        assert_eq!(base.name(ComponentId(1)), Some("a::A"));

        assert_eq!(next.len(), 2);
        assert_eq!(next.name(ComponentId(1)), Some("a::Renamed"));
        assert_eq!(next.lookup_by_name("a::A"), None);
        assert_eq!(next.registered_names(), ["a::B", "a::Renamed"]);
    }

    #[test]
    fn wire_defaults() {
        let info: ComponentInfo =
            serde_json::from_value(json!({ "id": 4, "name": "a::C", "reflected": true })).unwrap();
        assert!(info.reflected);
        assert!(!info.serializable);
        assert!(info.required_components.is_empty());

        let info: ComponentInfo = serde_json::from_value(json!({
            "id": 5, "name": "a::D", "requiredComponents": [4]
        }))
        .unwrap();
        assert!(!info.reflected);
        assert_eq!(info.required_components, [ComponentId(4)]);
    }

    #[test]
    fn iteration_is_ascending() {
        let reg: ComponentRegistry = [
            ComponentInfo::new(9, "a::Z"),
            ComponentInfo::new(2, "a::Y"),
            ComponentInfo::new(5, "a::X"),
        ]
        .into_iter()
        .collect();
        let ids: Vec<u32> = reg.iter().map(|info| info.id.0).collect();
        assert_eq!(ids, [2, 5, 9]);
    }

    #[test]
    fn short_name_uses_type_registry() {
        let reg: ComponentRegistry =
            [ComponentInfo::new(1, "game::stats::Health")].into_iter().collect();
        assert_eq!(
            reg.short_name(ComponentId(1), &TypeRegistry::new()),
            Some("Health".to_owned())
        );
        assert_eq!(reg.short_name(ComponentId(2), &TypeRegistry::new()), None);
    }
}
