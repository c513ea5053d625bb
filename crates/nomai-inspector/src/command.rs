//! Outbound commands and response correlation.
//!
//! [`CommandDispatcher`] stamps each [`InspectorCommand`] with the next local
//! request id, queues it for the transport, and keeps an optional one-shot
//! callback per id. A response is delivered to its callback at most once;
//! responses with unknown ids are dropped.

use std::collections::HashMap;
use std::fmt;

use nomai_mirror::component::ComponentId;
use nomai_mirror::entity::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::protocol::RemoteError;

/// Result of a remote command.
pub type CommandResponse = Result<Value, RemoteError>;

type Callback = Box<dyn FnOnce(&CommandResponse)>;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// What to despawn along with an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DespawnKind {
    /// The entity and all its descendants.
    Recursive,
    /// Only the descendants.
    Descendant,
}

/// A request to change the remote world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum InspectorCommand {
    SpawnEntity {
        parent: Option<EntityId>,
    },
    DespawnEntity {
        entity: EntityId,
        kind: DespawnKind,
    },
    ReparentEntity {
        entity: EntityId,
        parent: Option<EntityId>,
    },
    InsertComponent {
        entity: EntityId,
        component: ComponentId,
        value: Value,
    },
    RemoveComponent {
        entity: EntityId,
        component: ComponentId,
    },
    UpdateComponent {
        entity: EntityId,
        component: ComponentId,
        value: Value,
    },
    ToggleComponent {
        entity: EntityId,
        component: ComponentId,
    },
    ToggleVisibility {
        entity: EntityId,
    },
}

impl InspectorCommand {
    /// Wire method name.
    pub fn method(&self) -> &'static str {
        match self {
            Self::SpawnEntity { .. } => "spawn_entity",
            Self::DespawnEntity { .. } => "despawn_entity",
            Self::ReparentEntity { .. } => "reparent_entity",
            Self::InsertComponent { .. } => "insert_component",
            Self::RemoveComponent { .. } => "remove_component",
            Self::UpdateComponent { .. } => "update_component",
            Self::ToggleComponent { .. } => "toggle_component",
            Self::ToggleVisibility { .. } => "toggle_visibility",
        }
    }
}

/// An outbound request: `{method, params, id, jsonrpc: "2.0"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRequest {
    #[serde(flatten)]
    pub command: InspectorCommand,
    pub id: String,
    pub jsonrpc: String,
}

/// The stream subscription request sent once per connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub method: String,
    pub id: String,
    pub jsonrpc: String,
}

pub(crate) const JSONRPC_VERSION: &str = "2.0";

// ---------------------------------------------------------------------------
// CommandDispatcher
// ---------------------------------------------------------------------------

/// Issues request ids, queues outbound requests and holds response callbacks.
pub struct CommandDispatcher {
    next_id: u64,
    pending: HashMap<String, Callback>,
    outbox: Vec<RemoteRequest>,
}

impl CommandDispatcher {
    pub fn new(first_id: u64) -> Self {
        Self {
            next_id: first_id,
            pending: HashMap::new(),
            outbox: Vec::new(),
        }
    }

    /// Queue a command without waiting for its response.
    pub fn dispatch(&mut self, command: InspectorCommand) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;
        trace!(id = %id, method = command.method(), "queueing command");
        self.outbox.push(RemoteRequest {
            command,
            id: id.clone(),
            jsonrpc: JSONRPC_VERSION.to_owned(),
        });
        id
    }

    /// Queue a command and register a callback for its response.
    pub fn dispatch_with(
        &mut self,
        command: InspectorCommand,
        callback: impl FnOnce(&CommandResponse) + 'static,
    ) -> String {
        let id = self.dispatch(command);
        self.pending.insert(id.clone(), Box::new(callback));
        id
    }

    /// Run and discard the callback for `id`. Returns whether one ran.
    pub fn deliver(&mut self, id: &str, response: &CommandResponse) -> bool {
        match self.pending.remove(id) {
            Some(callback) => {
                callback(response);
                true
            }
            None => {
                debug!(id, "no callback for response");
                false
            }
        }
    }

    /// Forget the callback for `id`. Returns whether one was pending.
    pub fn cancel(&mut self, id: &str) -> bool {
        self.pending.remove(id).is_some()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drain queued requests in dispatch order.
    pub fn take_outbound(&mut self) -> Vec<RemoteRequest> {
        std::mem::take(&mut self.outbox)
    }
}

impl fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("next_id", &self.next_id)
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .field("outbox", &self.outbox)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
