//! Inbound wire format.
//!
//! Every inbound message is an envelope `{id, result, error?}`. The envelope
//! whose id equals the stream subscription id carries an array of
//! [`StreamEvent`]s; any other id is the response to an outbound command.
//!
//! ```json
//! { "id": "1", "result": [
//!     { "kind": "type_registry", "types": [["f32", { "kind": "opaque" }]] },
//!     { "kind": "component", "components": [{ "id": 0, "name": "game::Health" }] },
//!     { "kind": "entity", "entity": 7, "mutation": { "kind": "remove" } }
//! ] }
//! ```

use nomai_mirror::component::ComponentInfo;
use nomai_mirror::entity::EntityId;
use nomai_mirror::mutation::EntityMutation;
use nomai_reflect::registry::TypeRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProtocolError;

/// Error payload of a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    pub code: i64,
    pub message: String,
}

/// The raw inbound envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEnvelope {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
}

/// One event of the world stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The complete type registry, replacing any previous one.
    TypeRegistry { types: TypeRegistry },
    /// Component metadata, merged into the component registry.
    Component { components: Vec<ComponentInfo> },
    Entity {
        entity: EntityId,
        mutation: EntityMutation,
    },
    /// Schedule graphs. Not consumed here.
    Schedules,
    /// Any kind this client does not know.
    #[serde(other)]
    Other,
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Stream(Vec<StreamEvent>),
    /// The subscription itself failed.
    StreamError(RemoteError),
    Response {
        id: String,
        outcome: Result<Value, RemoteError>,
    },
}

impl InboundEnvelope {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Envelope)
    }

    /// Classify the envelope against the stream subscription id.
    pub fn into_inbound(self, stream_id: &str) -> Result<Inbound, ProtocolError> {
        let is_stream = self.id.as_deref() == Some(stream_id);
        match (self.id, self.error) {
            (Some(_), Some(error)) if is_stream => Ok(Inbound::StreamError(error)),
            (Some(_), None) if is_stream => serde_json::from_value(self.result)
                .map(Inbound::Stream)
                .map_err(ProtocolError::StreamEvents),
            (Some(id), error) => Ok(Inbound::Response {
                id,
                outcome: match error {
                    Some(error) => Err(error),
                    None => Ok(self.result),
                },
            }),
            (None, Some(error)) => Ok(Inbound::StreamError(error)),
            (None, None) => Err(ProtocolError::MissingId),
        }
    }
}

/// Parse and classify one inbound text message.
pub fn decode(text: &str, stream_id: &str) -> Result<Inbound, ProtocolError> {
    InboundEnvelope::parse(text)?.into_inbound(stream_id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
