//! Well-known type paths and name-based type predicates.
//!
//! A handful of remote types get special treatment by path: the entity
//! reference and color types are edited by dedicated leaf editors, and the
//! hierarchy/name components drive the mirror. Numeric and optional types are
//! recognized purely by name because the registry describes them as opaque
//! values or ordinary enums.

/// Entity reference type.
pub const ENTITY: &str = "bevy_ecs::entity::Entity";
/// Parent link component.
pub const PARENT: &str = "bevy_hierarchy::components::parent::Parent";
/// Children link component.
pub const CHILDREN: &str = "bevy_hierarchy::components::children::Children";
/// Entity name component.
pub const NAME: &str = "bevy_core::name::Name";
pub const CAMERA_3D: &str = "bevy_core_pipeline::core_3d::camera_3d::Camera3d";
pub const POINT_LIGHT: &str = "bevy_pbr::light::point_light::PointLight";
pub const MESH_3D: &str = "bevy_render::mesh::components::Mesh3d";
pub const OBSERVER: &str = "bevy_ecs::observer::runner::Observer";
pub const WINDOW: &str = "bevy_window::window::Window";
pub const SYSTEM_ID_MARKER: &str = "bevy_ecs::system::system_registry::SystemIdMarker";
pub const MONITOR: &str = "bevy_window::monitor::Monitor";
pub const PRIMARY_MONITOR: &str = "bevy_window::monitor::PrimaryMonitor";
pub const POINTER_ID: &str = "bevy_picking::pointer::PointerId";
pub const NODE: &str = "bevy_ui::ui_node::Node";
pub const TEXT: &str = "bevy_ui::widget::text::Text";
/// Color enum edited through the color picker.
pub const COLOR: &str = "bevy_color::color::Color";
pub const STRING: &str = "alloc::string::String";
pub const BOOL: &str = "bool";

/// Components whose presence excludes an entity from the hierarchy.
pub const HIDDEN_COMPONENTS: [&str; 2] = [OBSERVER, SYSTEM_ID_MARKER];

/// Engine crates. Components defined in these namespaces are considered
/// internal when choosing an entity's display name.
pub const ENGINE_CRATES: &[&str] = &[
    "bevy_utils",
    "bevy_ptr",
    "bevy_macro_utils",
    "bevy_derive",
    "bevy_math",
    "bevy_color",
    "bevy_tasks",
    "bevy_reflect",
    "bevy_ecs",
    "bevy_state",
    "bevy_app",
    "bevy_time",
    "bevy_log",
    "bevy_asset",
    "bevy_audio",
    "bevy_core",
    "bevy_diagnostic",
    "bevy_hierarchy",
    "bevy_transform",
    "bevy_window",
    "bevy_render",
    "bevy_mikktspace",
    "bevy_image",
    "bevy_mesh",
    "bevy_core_pipeline",
    "bevy_input",
    "bevy_gilrs",
    "bevy_animation",
    "bevy_pbr",
    "bevy_gltf",
    "bevy_remote",
    "bevy_scene",
    "bevy_picking",
    "bevy_sprite",
    "bevy_gizmos",
    "bevy_text",
    "bevy_a11y",
    "bevy_ui",
    "bevy_winit",
    "bevy_dev_tools",
    "bevy_internal",
    "bevy_dylib",
];

const NUMBER_TYPES: [&str; 14] = [
    "u8", "i8", "u16", "i16", "u32", "i32", "u64", "i64", "u128", "i128", "usize", "isize", "f32",
    "f64",
];

const NON_ZERO_PREFIX: &str = "core::num::NonZero";

/// Whether `type_name` is an `Option<T>` wrapper.
pub fn is_option_type(type_name: &str) -> bool {
    type_name.starts_with("core::option::Option<")
}

/// Whether `type_name` is a primitive number or a `NonZero*` wrapper.
pub fn is_number_type(type_name: &str) -> bool {
    NUMBER_TYPES.contains(&type_name) || type_name.starts_with(NON_ZERO_PREFIX)
}

/// Whether `type_name` is an unsigned integer (including `NonZeroU*`).
pub fn is_unsigned_integer_type(type_name: &str) -> bool {
    integer_width(type_name).is_some_and(|(_, signed)| !signed)
}

/// Whether `type_name` is a `NonZero*` wrapper.
pub fn is_non_zero_type(type_name: &str) -> bool {
    type_name.starts_with(NON_ZERO_PREFIX)
}

/// Bit width and signedness of an integer type, `NonZero*` wrappers
/// included. Pointer-sized integers count as 64 bits. `None` for floats and
/// non-numbers.
///
/// Accepts both `core::num::NonZeroU8` and `core::num::NonZero<u8>`.
pub fn integer_width(type_name: &str) -> Option<(u32, bool)> {
    let primitive = match type_name.strip_prefix(NON_ZERO_PREFIX) {
        Some(rest) => rest
            .strip_prefix('<')
            .and_then(|inner| inner.strip_suffix('>'))
            .map_or_else(|| rest.to_ascii_lowercase(), str::to_owned),
        None => type_name.to_owned(),
    };
    let signed = match primitive.as_bytes().first() {
        Some(b'i') => true,
        Some(b'u') => false,
        _ => return None,
    };
    let bits = match &primitive[1..] {
        "size" => 64,
        digits => digits
            .parse::<u32>()
            .ok()
            .filter(|bits| matches!(*bits, 8 | 16 | 32 | 64 | 128))?,
    };
    Some((bits, signed))
}

/// Whether `type_name` is `f32` or `f64`.
pub fn is_float_type(type_name: &str) -> bool {
    matches!(type_name, "f32" | "f64")
}

/// Whether `type_name` is a number that only accepts whole values.
pub fn is_integer_type(type_name: &str) -> bool {
    is_number_type(type_name) && !is_float_type(type_name)
}

pub fn is_string_type(type_name: &str) -> bool {
    type_name == STRING
}

pub fn is_bool_type(type_name: &str) -> bool {
    type_name == BOOL
}

/// Whether `type_name` lives in one of the [`ENGINE_CRATES`].
pub fn is_engine_type(type_name: &str) -> bool {
    ENGINE_CRATES.iter().any(|krate| {
        type_name
            .strip_prefix(krate)
            .is_some_and(|rest| rest.starts_with("::"))
    })
}

/// Whether `type_name` is one of the [`HIDDEN_COMPONENTS`].
pub fn is_hidden_component(type_name: &str) -> bool {
    HIDDEN_COMPONENTS.contains(&type_name)
}

/// Shorten a full type path by dropping module paths, including inside
/// generic arguments, tuples and arrays.
///
/// ```
/// use nomai_reflect::type_names::pretty_type_name;
///
/// assert_eq!(pretty_type_name("alloc::vec::Vec<glam::Vec3>"), "Vec<Vec3>");
/// assert_eq!(pretty_type_name("(f32, alloc::string::String)"), "(f32, String)");
/// ```
pub fn pretty_type_name(type_name: &str) -> String {
    if let Some(base) = type_name.strip_suffix("::{{closure}}") {
        return format!("{}::{{{{closure}}}}", pretty_type_name(base));
    }

    const SPECIAL: [char; 8] = ['<', '>', '(', ')', '[', ']', ',', ';'];

    let mut short = String::with_capacity(type_name.len());
    let mut rest = type_name;
    while let Some(pos) = rest.find(SPECIAL) {
        let (path, tail) = rest.split_at(pos);
        short.push_str(last_segment(path));
        let separator = &tail[..1];
        short.push_str(separator);
        rest = &tail[1..];
        if separator == "," || separator == ";" {
            short.push(' ');
            rest = rest.trim_start();
        }
    }
    short.push_str(last_segment(rest));
    short
}

fn last_segment(path: &str) -> &str {
    path.rsplit(':').next().unwrap_or(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
