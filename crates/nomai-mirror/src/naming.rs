//! Display names for entities.
//!
//! Precedence:
//!
//! 1. a non-empty name component;
//! 2. a label for well-known engine components (cameras, lights, windows...);
//! 3. the short name of the first component (by id) outside the engine crates;
//! 4. the short name of the first component (by id) that is not a hierarchy
//!    link;
//! 5. `"Entity"`.

use nomai_reflect::type_names::{self, is_engine_type};
use serde_json::Value;

use crate::component::ComponentId;
use crate::mirror::{ComponentMap, MirrorContext};

/// Name used when nothing better is known.
pub const FALLBACK_NAME: &str = "Entity";

/// Well-known components and their labels, in precedence order.
const LABELS: [(&str, Label); 10] = [
    (type_names::CAMERA_3D, Label::Fixed("Camera3d")),
    (type_names::POINT_LIGHT, Label::Fixed("PointLight")),
    (type_names::MESH_3D, Label::Fixed("Mesh3d")),
    (type_names::OBSERVER, Label::Fixed("Observer")),
    (type_names::WINDOW, Label::Fixed("Window")),
    (type_names::PRIMARY_MONITOR, Label::Fixed("PrimaryMonitor")),
    (type_names::MONITOR, Label::Fixed("Monitor")),
    (type_names::POINTER_ID, Label::PointerId),
    (type_names::TEXT, Label::Fixed("Text")),
    (type_names::NODE, Label::Fixed("Node")),
];

#[derive(Clone, Copy)]
enum Label {
    Fixed(&'static str),
    /// Includes the component's value.
    PointerId,
}

impl Label {
    fn render(self, value: &Value) -> String {
        match self {
            Label::Fixed(label) => label.to_owned(),
            Label::PointerId => match value {
                Value::String(s) => format!("PointerId ({s})"),
                other => format!("PointerId ({other})"),
            },
        }
    }
}

/// Compute the display name of an entity with the given components.
pub fn entity_name(ctx: MirrorContext<'_>, components: &ComponentMap) -> String {
    let registry = ctx.components;

    if let Some(name) = registry
        .lookup_by_name(type_names::NAME)
        .and_then(|id| components.get(&id))
        .and_then(|state| state.value.as_str())
        .filter(|name| !name.is_empty())
    {
        return name.to_owned();
    }

    for (type_name, label) in LABELS {
        let state = registry
            .lookup_by_name(type_name)
            .and_then(|id| components.get(&id));
        if let Some(state) = state {
            return label.render(&state.value);
        }
    }

    let known = || {
        components
            .keys()
            .filter_map(|id| registry.name(*id).map(|name| (*id, name)))
    };

    if let Some((id, _)) = known().find(|(_, name)| !is_engine_type(name)) {
        if let Some(short) = registry.short_name(id, ctx.types) {
            return short;
        }
    }

    if let Some((id, _)) =
        known().find(|(_, name)| *name != type_names::PARENT && *name != type_names::CHILDREN)
    {
        if let Some(short) = registry.short_name(id, ctx.types) {
            return short;
        }
    }

    FALLBACK_NAME.to_owned()
}

/// Whether a change to this component's value alone can change the name.
pub(crate) fn is_value_labelled(ctx: MirrorContext<'_>, id: ComponentId) -> bool {
    matches!(
        ctx.components.name(id),
        Some(type_names::NAME | type_names::POINTER_ID)
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
