//! Nomai Editor -- Reflection-driven editing of runtime-typed values.
//!
//! An [`EditSession`](session::EditSession) wraps one dynamic value together
//! with its root type name. Rendering walks the type registry's descriptors
//! alongside the value and produces an [`EditorNode`](node::EditorNode) tree;
//! edits are [`EditAction`](session::EditAction)s addressed at nodes of that
//! tree and validated against it before the value is touched.
//!
//! Nothing here knows any concrete type at compile time. Entity references
//! and colors get dedicated leaf editors; every other shape is handled by one
//! dispatcher over the descriptor kinds.
//!
//! # Quick Start
//!
//! ```
//! use nomai_editor::prelude::*;
//! use nomai_reflect::prelude::*;
//! use serde_json::json;
//!
//! let types: TypeRegistry = serde_json::from_value(json!([
//!     ["f32", { "kind": "opaque" }],
//!     ["alloc::vec::Vec<f32>", { "kind": "array", "item": "f32", "capacity": null }],
//! ]))
//! .unwrap();
//! let ctx = EditorContext::new(&types);
//!
//! let mut session = EditSession::new("alloc::vec::Vec<f32>", json!([0.5]));
//! let outcome = session
//!     .apply(ctx, EditAction::AppendItem { address: Address::root() })
//!     .unwrap();
//!
//! assert_eq!(outcome, EditOutcome::Appended { index: 1 });
//! assert_eq!(session.value(), &json!([0.5, 1]));
//! ```

#![deny(unsafe_code)]

pub mod node;
pub mod picker;
pub mod render;
pub mod session;

use nomai_mirror::component::ComponentRegistry;
use nomai_mirror::mirror::WorldMirror;
use nomai_reflect::address::Address;
use nomai_reflect::defaults::{DefaultResolver, DEFAULT_MAX_DEPTH};
use nomai_reflect::registry::TypeRegistry;

/// Maximum nesting the renderer will follow before emitting a fault node.
pub const MAX_RENDER_DEPTH: usize = 64;

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Everything rendering and editing read besides the value itself.
///
/// The live mirror is optional; without it entity references render without
/// names and the entity picker is empty.
#[derive(Debug, Clone, Copy)]
pub struct EditorContext<'a> {
    pub types: &'a TypeRegistry,
    pub live: Option<LiveWorld<'a>>,
    /// Depth limit for default values built while editing.
    pub max_depth: usize,
}

/// The live entity world, for entity reference editors.
#[derive(Debug, Clone, Copy)]
pub struct LiveWorld<'a> {
    pub mirror: &'a WorldMirror,
    pub components: &'a ComponentRegistry,
}

impl<'a> EditorContext<'a> {
    pub fn new(types: &'a TypeRegistry) -> Self {
        Self {
            types,
            live: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_world(
        mut self,
        mirror: &'a WorldMirror,
        components: &'a ComponentRegistry,
    ) -> Self {
        self.live = Some(LiveWorld { mirror, components });
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// A default-value resolver bounded by this context's depth limit.
    pub fn resolver(&self) -> DefaultResolver<'a> {
        DefaultResolver::new(self.types).with_max_depth(self.max_depth)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by edit actions. A failed action never mutates the value.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// No node of the kind the action needs exists at the address.
    #[error("no {expected} editor at '{address}'")]
    NoEditor {
        address: Address,
        expected: &'static str,
    },

    /// The targeted node is read-only.
    #[error("'{address}' is read-only")]
    ReadOnly { address: Address },

    /// Numeric input was rejected for the field's number type.
    #[error("invalid number for '{address}': {reason}")]
    InvalidNumber {
        address: Address,
        reason: &'static str,
    },

    #[error("'{variant}' is not a variant of {type_name}")]
    UnknownVariant { type_name: String, variant: String },

    /// A fresh value was needed but the type has no default.
    #[error("no default value available for {type_name}")]
    MissingDefault { type_name: String },

    #[error("cannot add entries at '{address}': {reason}")]
    CannotAdd {
        address: Address,
        reason: &'static str,
    },

    #[error("an entry is already being added at '{address}'")]
    AlreadyStaged { address: Address },

    #[error("no entry is being added at '{address}'")]
    NotStaged { address: Address },

    /// The staged entry has not been given a value yet.
    #[error("the new entry at '{address}' has no value yet")]
    Unresolved { address: Address },

    #[error("key '{key}' already exists at '{address}'")]
    DuplicateKey { address: Address, key: String },

    #[error("the set at '{address}' already contains this value")]
    DuplicateItem { address: Address },

    /// Map keys must be strings or numbers.
    #[error("unsupported map key {key} at '{address}'")]
    InvalidKey { address: Address, key: String },

    #[error("entity {entity} cannot be referenced")]
    UnknownEntity { entity: nomai_mirror::entity::EntityId },

    #[error(transparent)]
    Address(#[from] nomai_reflect::AddressError),

    #[error(transparent)]
    Color(#[from] nomai_reflect::ColorError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::node::{Collection, EditorNode, FieldRow, MapEntry, NodeKind, StagedView};
    pub use crate::picker::{entity_choices, EntityChoice};
    pub use crate::session::{EditAction, EditOutcome, EditSession, StagedTarget};
    pub use crate::{EditError, EditorContext, LiveWorld};
}
