//! The inspector session.
//!
//! [`InspectorSession`] owns everything one connection to a remote world
//! needs: the type and component registries (held as [`Arc`] snapshots and
//! replaced wholesale), the [`WorldMirror`], the [`CommandDispatcher`] and a
//! queue of user-visible notifications.
//!
//! Each inbound message is decoded completely before anything is applied, so
//! a malformed message changes nothing. Stream events are then applied in
//! order within the same call.

use std::sync::Arc;

use nomai_editor::session::EditSession;
use nomai_editor::EditorContext;
use nomai_mirror::component::{ComponentId, ComponentRegistry};
use nomai_mirror::entity::EntityId;
use nomai_mirror::hierarchy::{build_hierarchy, EntityTreeNode};
use nomai_mirror::mirror::{AddableComponent, MirrorContext, WorldMirror};
use nomai_mirror::snapshot::MirrorSnapshot;
use nomai_reflect::registry::TypeRegistry;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::command::{
    CommandDispatcher, CommandResponse, DespawnKind, InspectorCommand, RemoteRequest,
    SubscribeRequest, JSONRPC_VERSION,
};
use crate::config::InspectorConfig;
use crate::protocol::{self, Inbound, StreamEvent};
use crate::{InspectorError, ProtocolError};

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// A message for the user, e.g. a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    /// The request this is about, if any.
    pub request: Option<String>,
}

impl Notification {
    fn new(message: impl Into<String>, request: Option<String>) -> Self {
        Self {
            message: message.into(),
            request,
        }
    }
}

// ---------------------------------------------------------------------------
// InspectorSession
// ---------------------------------------------------------------------------

/// Client-side state for one connection.
#[derive(Debug)]
pub struct InspectorSession {
    config: InspectorConfig,
    types: Arc<TypeRegistry>,
    components: Arc<ComponentRegistry>,
    mirror: WorldMirror,
    dispatcher: CommandDispatcher,
    notifications: Vec<Notification>,
}

impl Default for InspectorSession {
    fn default() -> Self {
        Self::new(InspectorConfig::default())
    }
}

impl InspectorSession {
    pub fn new(config: InspectorConfig) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(config.first_request_id),
            config,
            types: Arc::new(TypeRegistry::new()),
            components: Arc::new(ComponentRegistry::new()),
            mirror: WorldMirror::new(),
            notifications: Vec::new(),
        }
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    pub fn components(&self) -> &Arc<ComponentRegistry> {
        &self.components
    }

    pub fn mirror(&self) -> &WorldMirror {
        &self.mirror
    }

    pub fn dispatcher_mut(&mut self) -> &mut CommandDispatcher {
        &mut self.dispatcher
    }

    fn mirror_context(&self) -> MirrorContext<'_> {
        MirrorContext::new(&self.components, &self.types)
    }

    /// Context for rendering and editing values against the live world.
    pub fn editor_context(&self) -> EditorContext<'_> {
        EditorContext::new(&self.types)
            .with_world(&self.mirror, &self.components)
            .with_max_depth(self.config.max_depth)
    }

    // -- connection --

    /// The request that subscribes to the world stream.
    pub fn subscribe_request(&self) -> SubscribeRequest {
        SubscribeRequest {
            method: self.config.stream_method.clone(),
            id: self.config.stream_id.clone(),
            jsonrpc: JSONRPC_VERSION.to_owned(),
        }
    }

    /// A (re)connection was established. The remote side resends the whole
    /// world, so every mirrored entity is dropped. Registries are kept until
    /// replaced.
    pub fn on_connected(&mut self) {
        debug!("connected, resetting mirror");
        self.mirror.reset();
    }

    // -- inbound --

    /// Decode and apply one inbound message.
    ///
    /// A message that fails to decode is logged and dropped without touching
    /// any state; the error is returned for callers that want it.
    pub fn handle_message(&mut self, text: &str) -> Result<(), ProtocolError> {
        let inbound = match protocol::decode(text, &self.config.stream_id) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(error = %e, "dropping malformed message");
                return Err(e);
            }
        };
        self.handle_inbound(inbound);
        Ok(())
    }

    pub fn handle_inbound(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Stream(events) => {
                for event in events {
                    self.apply_event(event);
                }
            }
            Inbound::StreamError(error) => {
                warn!(code = error.code, reason = %error.message, "stream error");
                self.notifications.push(Notification::new(error.message, None));
            }
            Inbound::Response { id, outcome } => self.handle_response(id, outcome),
        }
    }

    fn apply_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::TypeRegistry { types } => {
                debug!(types = types.len(), "replacing type registry");
                self.types = Arc::new(types);
                self.refresh_names();
            }
            StreamEvent::Component { components } => {
                debug!(components = components.len(), "merging component registry");
                self.components = Arc::new(self.components.merged(components));
                self.refresh_names();
            }
            StreamEvent::Entity { entity, mutation } => {
                let ctx = MirrorContext::new(&self.components, &self.types);
                let outcome = self.mirror.apply(ctx, entity, &mutation);
                trace!(entity = %entity, ?outcome, "entity event");
            }
            StreamEvent::Schedules | StreamEvent::Other => {
                trace!("ignoring stream event");
            }
        }
    }

    fn refresh_names(&mut self) {
        let ctx = MirrorContext::new(&self.components, &self.types);
        self.mirror.refresh_names(ctx);
    }

    fn handle_response(&mut self, id: String, outcome: CommandResponse) {
        if let Err(error) = &outcome {
            debug!(id = %id, code = error.code, "command failed");
            self.notifications
                .push(Notification::new(error.message.clone(), Some(id.clone())));
        }
        self.dispatcher.deliver(&id, &outcome);
    }

    /// Drain queued notifications, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Drain queued outbound requests, in dispatch order.
    pub fn take_outbound(&mut self) -> Vec<RemoteRequest> {
        self.dispatcher.take_outbound()
    }

    // -- views --

    pub fn hierarchy(&self) -> Vec<EntityTreeNode> {
        build_hierarchy(&self.mirror, &self.components)
    }

    pub fn snapshot(&self) -> MirrorSnapshot {
        self.mirror.capture_snapshot(&self.components)
    }

    pub fn addable_components(&self, entity: EntityId) -> Vec<AddableComponent> {
        self.mirror.addable_components(entity, self.mirror_context())
    }

    // -- commands --

    pub fn spawn_entity(&mut self, parent: Option<EntityId>) -> String {
        self.dispatcher.dispatch(InspectorCommand::SpawnEntity { parent })
    }

    pub fn despawn_entity(&mut self, entity: EntityId, kind: DespawnKind) -> String {
        self.dispatcher
            .dispatch(InspectorCommand::DespawnEntity { entity, kind })
    }

    pub fn reparent_entity(&mut self, entity: EntityId, parent: Option<EntityId>) -> String {
        self.dispatcher
            .dispatch(InspectorCommand::ReparentEntity { entity, parent })
    }

    pub fn remove_component(&mut self, entity: EntityId, component: ComponentId) -> String {
        self.dispatcher
            .dispatch(InspectorCommand::RemoveComponent { entity, component })
    }

    pub fn toggle_component(&mut self, entity: EntityId, component: ComponentId) -> String {
        self.dispatcher
            .dispatch(InspectorCommand::ToggleComponent { entity, component })
    }

    pub fn toggle_visibility(&mut self, entity: EntityId) -> String {
        self.dispatcher
            .dispatch(InspectorCommand::ToggleVisibility { entity })
    }

    /// Insert a component with its default value.
    ///
    /// Rejected, with a notification, when no default can be built for the
    /// component's type.
    pub fn add_component(
        &mut self,
        entity: EntityId,
        component: ComponentId,
    ) -> Result<String, InspectorError> {
        if !self.mirror.contains(entity) {
            return Err(InspectorError::UnknownEntity(entity));
        }
        let name = self
            .components
            .name(component)
            .ok_or(InspectorError::UnknownComponent(component))?;
        let value = self.editor_context().resolver().resolve(name);
        let Some(value) = value else {
            let name = name.to_owned();
            let label = self
                .components
                .short_name(component, &self.types)
                .unwrap_or_else(|| name.clone());
            self.notifications.push(Notification::new(
                format!("{label} has no default value and cannot be added"),
                None,
            ));
            return Err(InspectorError::MissingDefault { name });
        };
        Ok(self.dispatcher.dispatch(InspectorCommand::InsertComponent {
            entity,
            component,
            value,
        }))
    }

    /// Open an edit session over a mirrored component value. Disabled
    /// components open read-only.
    pub fn edit_component(
        &self,
        entity: EntityId,
        component: ComponentId,
    ) -> Result<EditSession, InspectorError> {
        if !self.mirror.contains(entity) {
            return Err(InspectorError::UnknownEntity(entity));
        }
        let name = self
            .components
            .name(component)
            .ok_or(InspectorError::UnknownComponent(component))?;
        let state = self
            .mirror
            .component(entity, component)
            .ok_or(InspectorError::MissingComponent { entity, component })?;
        Ok(EditSession::new(name, state.value.clone()).with_read_only(state.disabled))
    }

    /// Send the edited value back to the remote world. The mirror is not
    /// updated until the change streams back.
    pub fn commit_component_edit(
        &mut self,
        entity: EntityId,
        component: ComponentId,
        edit: &EditSession,
    ) -> Result<String, InspectorError> {
        if self.mirror.component(entity, component).is_none() {
            return Err(InspectorError::MissingComponent { entity, component });
        }
        Ok(self.dispatcher.dispatch(InspectorCommand::UpdateComponent {
            entity,
            component,
            value: edit.value().clone(),
        }))
    }
}
