//! Nomai Inspector -- Client session for a remote, reflection-exposed world.
//!
//! An [`InspectorSession`](session::InspectorSession) sits between a
//! transport and the UI. The transport hands it every inbound text message;
//! the session decodes the envelope, applies stream events to its
//! [`WorldMirror`](nomai_mirror::mirror::WorldMirror) in order, routes command
//! responses to their callbacks, and queues user-visible notifications.
//! Outbound commands are queued as [`RemoteRequest`](command::RemoteRequest)s
//! for the transport to drain.
//!
//! # Quick Start
//!
//! ```
//! use nomai_inspector::prelude::*;
//! use serde_json::json;
//!
//! let mut session = InspectorSession::new(InspectorConfig::default());
//! let message = json!({
//!     "id": "1",
//!     "result": [
//!         { "kind": "component", "components": [
//!             { "id": 0, "name": "bevy_core::name::Name", "reflected": true }
//!         ] },
//!         { "kind": "entity", "entity": 4294967297u64, "mutation": {
//!             "kind": "change", "changes": [[0, false, "Player"]], "removes": []
//!         } }
//!     ]
//! });
//! session.handle_message(&message.to_string()).unwrap();
//!
//! let roots = session.hierarchy();
//! assert_eq!(roots.len(), 1);
//! assert_eq!(session.mirror().name(roots[0].id), Some("Player"));
//! ```

#![deny(unsafe_code)]

pub mod command;
pub mod config;
pub mod protocol;
pub mod session;

use std::path::PathBuf;

use nomai_editor::EditError;
use nomai_mirror::component::ComponentId;
use nomai_mirror::entity::EntityId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors decoding inbound messages. A message that fails to decode is
/// dropped as a whole; nothing from it is applied.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("malformed stream events: {0}")]
    StreamEvents(#[source] serde_json::Error),

    /// A message with neither an id nor an error.
    #[error("envelope has no id")]
    MissingId,
}

/// Errors from session-level operations.
#[derive(Debug, thiserror::Error)]
pub enum InspectorError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("entity {0} is not tracked")]
    UnknownEntity(EntityId),

    #[error("component {0:?} is not registered")]
    UnknownComponent(ComponentId),

    #[error("entity {entity} has no component {component:?}")]
    MissingComponent {
        entity: EntityId,
        component: ComponentId,
    },

    /// The component cannot be added because no value can be built for it.
    #[error("no default value available for {name}")]
    MissingDefault { name: String },

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[source] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::command::{
        CommandDispatcher, CommandResponse, DespawnKind, InspectorCommand, RemoteRequest,
        SubscribeRequest,
    };
    pub use crate::config::InspectorConfig;
    pub use crate::protocol::{Inbound, InboundEnvelope, RemoteError, StreamEvent};
    pub use crate::session::{InspectorSession, Notification};
    pub use crate::{InspectorError, ProtocolError};
}
