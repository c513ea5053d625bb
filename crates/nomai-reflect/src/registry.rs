//! Type descriptors and the runtime type registry.
//!
//! A [`TypeDescriptor`] is the structural description of one remote type:
//! its [`TypeShape`] (a closed tagged union over the eight kinds the remote
//! reflection layer can express) plus an optional explicit default value and
//! an optional display name.
//!
//! The [`TypeRegistry`] is never mutated in place by the inspector. Each
//! registry update from the remote side produces a brand-new registry that
//! replaces the previous one wholesale.
//!
//! # Wire format
//!
//! Descriptors arrive tagged by `kind` in snake_case:
//!
//! ```json
//! { "kind": "struct", "fields": [{ "name": "x", "type": "f32" }], "default": { "x": 0.0 } }
//! { "kind": "array", "item": "u8", "capacity": 4 }
//! { "kind": "enum", "variants": [{ "kind": "unit", "name": "None" }] }
//! ```
//!
//! The registry itself is a sequence of `[name, descriptor]` pairs.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::type_names::pretty_type_name;

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// A named field of a struct or struct-like variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedField {
    pub name: String,
    /// Full type path of the field. Empty when the remote side could not
    /// name the field's type.
    #[serde(rename = "type", deserialize_with = "null_as_empty")]
    pub type_name: String,
}

impl NamedField {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One variant of an enum type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Variant {
    Unit { name: String },
    Tuple { name: String, fields: Vec<String> },
    Struct { name: String, fields: Vec<NamedField> },
}

impl Variant {
    /// The variant's name as it appears in values.
    pub fn name(&self) -> &str {
        match self {
            Variant::Unit { name } | Variant::Tuple { name, .. } | Variant::Struct { name, .. } => {
                name
            }
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Variant::Unit { .. })
    }
}

/// The structural shape of a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeShape {
    /// Named fields, stored as a keyed value.
    Struct { fields: Vec<NamedField> },
    /// Positional fields. A single field is elided to the inner value.
    TupleStruct { fields: Vec<String> },
    /// Anonymous positional fields, stored as a sequence.
    Tuple { fields: Vec<String> },
    /// A homogeneous sequence, optionally with fixed capacity.
    Array {
        item: String,
        #[serde(default)]
        capacity: Option<usize>,
    },
    /// A sequence with unique items.
    Set { item: String },
    /// A keyed collection. Keys are stringified in values.
    Map { key: String, value: String },
    Enum { variants: Vec<Variant> },
    /// A value with no visible structure (primitives, strings, handles).
    Opaque,
}

/// Full description of one registered type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    #[serde(flatten)]
    pub shape: TypeShape,
    /// Explicit default value. `Some(Value::Null)` is a real default, distinct
    /// from no default at all.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl TypeDescriptor {
    pub fn new(shape: TypeShape) -> Self {
        Self {
            shape,
            default: None,
            short_name: None,
        }
    }

    /// Attach an explicit default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = Some(short_name.into());
        self
    }

    /// The wire tag of this descriptor's kind.
    pub fn kind(&self) -> &'static str {
        match self.shape {
            TypeShape::Struct { .. } => "struct",
            TypeShape::TupleStruct { .. } => "tuple_struct",
            TypeShape::Tuple { .. } => "tuple",
            TypeShape::Array { .. } => "array",
            TypeShape::Set { .. } => "set",
            TypeShape::Map { .. } => "map",
            TypeShape::Enum { .. } => "enum",
            TypeShape::Opaque => "opaque",
        }
    }
}

// ---------------------------------------------------------------------------
// TypeRegistry
// ---------------------------------------------------------------------------

/// Mapping from full type path to [`TypeDescriptor`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "Vec<(String, TypeDescriptor)>",
    into = "Vec<(String, TypeDescriptor)>"
)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type, replacing any previous descriptor under that name.
    pub fn insert(&mut self, type_name: impl Into<String>, descriptor: TypeDescriptor) {
        self.types.insert(type_name.into(), descriptor);
    }

    /// Builder form of [`insert`](Self::insert), handy for fixtures.
    pub fn with(mut self, type_name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.insert(type_name, descriptor);
        self
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over all registered types in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeDescriptor)> {
        self.types.iter().map(|(name, desc)| (name.as_str(), desc))
    }

    /// Display name of a type: the descriptor's own short name when it has
    /// one, otherwise the type path with module paths stripped.
    pub fn short_name(&self, type_name: &str) -> String {
        self.get(type_name)
            .and_then(|desc| desc.short_name.clone())
            .unwrap_or_else(|| pretty_type_name(type_name))
    }
}

impl From<Vec<(String, TypeDescriptor)>> for TypeRegistry {
    fn from(entries: Vec<(String, TypeDescriptor)>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<TypeRegistry> for Vec<(String, TypeDescriptor)> {
    fn from(registry: TypeRegistry) -> Self {
        let mut entries: Vec<_> = registry.types.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

impl FromIterator<(String, TypeDescriptor)> for TypeRegistry {
    fn from_iter<I: IntoIterator<Item = (String, TypeDescriptor)>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
