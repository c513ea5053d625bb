//! Serializable dump of the mirror for diagnostics.
//!
//! Provides [`MirrorSnapshot`] -- a point-in-time copy of every tracked
//! entity with its name, parent and components keyed by component type name.
//! Entities are listed in index order and components in name order so two
//! snapshots of the same state serialize identically.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::component::ComponentRegistry;
use crate::entity::EntityId;
use crate::mirror::{ComponentState, WorldMirror};

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// Serializable snapshot of a single entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub entity_id: EntityId,
    pub name: String,
    pub parent: Option<EntityId>,
    /// Map from component name to its state. Components the registry does
    /// not know are keyed `#<id>`.
    pub components: BTreeMap<String, ComponentState>,
}

/// A complete, serializable snapshot of the mirror.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorSnapshot {
    /// Names of all known component types, sorted.
    pub component_names: Vec<String>,
    pub entities: Vec<EntitySnapshot>,
}

impl MirrorSnapshot {
    pub fn entity(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.entity_id == id)
    }

    /// blake3 hash (hex) of the snapshot's canonical JSON encoding. Two
    /// mirrors holding the same state hash identically.
    pub fn state_hash(&self) -> Result<String, serde_json::Error> {
        let json_bytes = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json_bytes).to_hex().to_string())
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

impl WorldMirror {
    /// Capture a snapshot of the current mirror state.
    pub fn capture_snapshot(&self, registry: &ComponentRegistry) -> MirrorSnapshot {
        let component_names = registry
            .registered_names()
            .into_iter()
            .map(str::to_owned)
            .collect();

        let entities = self
            .entity_ids()
            .into_iter()
            .map(|entity_id| {
                let components = self
                    .components(entity_id)
                    .into_iter()
                    .flatten()
                    .map(|(id, state)| {
                        let key = registry
                            .name(*id)
                            .map_or_else(|| format!("#{id}"), str::to_owned);
                        (key, state.clone())
                    })
                    .collect();
                EntitySnapshot {
                    entity_id,
                    name: self.name(entity_id).unwrap_or_default().to_owned(),
                    parent: self.parent(entity_id),
                    components,
                }
            })
            .collect();

        MirrorSnapshot {
            component_names,
            entities,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
