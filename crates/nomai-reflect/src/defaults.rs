//! Default value resolution.
//!
//! Builds a representative value for any registered type name from the
//! registry alone. The rules are applied in order:
//!
//! 1. an explicit descriptor default wins;
//! 2. numeric types resolve to the literal `1`;
//! 3. structs resolve per field (a field-less struct is `null`);
//! 4. single-field tuple structs are elided to their inner default;
//! 5. tuples (and multi-field tuple structs) resolve to a sequence;
//! 6. unbounded arrays are empty, fixed arrays repeat the item default;
//! 7. maps are empty keyed values, sets are empty sequences;
//! 8. `Option<T>` is `null`, other enums take their first variant.
//!
//! Anything unresolvable yields `None`, and a composite with any unresolvable
//! part is unresolvable as a whole.

use serde_json::{Map, Value};
use tracing::warn;

use crate::registry::{NamedField, TypeRegistry, TypeShape, Variant};
use crate::type_names::{is_number_type, is_option_type};

/// Recursion limit for self-referential type graphs.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Resolve the default value of `type_name` with the default depth limit.
pub fn resolve_default(registry: &TypeRegistry, type_name: &str) -> Option<Value> {
    DefaultResolver::new(registry).resolve(type_name)
}

/// Resolves default values against one registry snapshot.
#[derive(Debug, Clone, Copy)]
pub struct DefaultResolver<'a> {
    registry: &'a TypeRegistry,
    max_depth: usize,
}

impl<'a> DefaultResolver<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve the default value of `type_name`, or `None` when the type is
    /// unknown or has no representable default.
    pub fn resolve(&self, type_name: &str) -> Option<Value> {
        self.resolve_at(type_name, 0)
    }

    /// The value an enum takes when switched to `variant`: the bare name for
    /// unit variants, `{name: payload}` otherwise.
    pub fn resolve_variant(&self, variant: &Variant) -> Option<Value> {
        self.variant_value(variant, 0)
    }

    /// The payload `variant` carries, without the `{name: ...}` wrapper.
    /// Unit variants have no payload.
    pub fn resolve_variant_payload(&self, variant: &Variant) -> Option<Value> {
        self.variant_payload(variant, 0)
    }

    fn resolve_at(&self, type_name: &str, depth: usize) -> Option<Value> {
        if depth > self.max_depth {
            warn!(
                type_name,
                max_depth = self.max_depth,
                "default resolution exceeded depth limit"
            );
            return None;
        }

        let descriptor = self.registry.get(type_name)?;
        if let Some(default) = &descriptor.default {
            return Some(default.clone());
        }
        if is_number_type(type_name) {
            return Some(Value::from(1));
        }

        match &descriptor.shape {
            TypeShape::Struct { fields } if fields.is_empty() => Some(Value::Null),
            TypeShape::Struct { fields } => self.named_fields(fields, depth),
            TypeShape::TupleStruct { fields } => match fields.as_slice() {
                [inner] => self.resolve_at(inner, depth + 1),
                _ => self.positional_fields(fields, depth),
            },
            TypeShape::Tuple { fields } => self.positional_fields(fields, depth),
            TypeShape::Array { item, capacity } => match capacity {
                None | Some(0) => Some(Value::Array(Vec::new())),
                Some(n) => {
                    let item = self.resolve_at(item, depth + 1)?;
                    Some(Value::Array(vec![item; *n]))
                }
            },
            TypeShape::Set { .. } => Some(Value::Array(Vec::new())),
            TypeShape::Map { .. } => Some(Value::Object(Map::new())),
            TypeShape::Enum { .. } if is_option_type(type_name) => Some(Value::Null),
            TypeShape::Enum { variants } => self.variant_value(variants.first()?, depth),
            TypeShape::Opaque => None,
        }
    }

    fn named_fields(&self, fields: &[NamedField], depth: usize) -> Option<Value> {
        let mut map = Map::with_capacity(fields.len());
        for field in fields {
            let value = self.resolve_at(&field.type_name, depth + 1)?;
            map.insert(field.name.clone(), value);
        }
        Some(Value::Object(map))
    }

    fn positional_fields(&self, fields: &[String], depth: usize) -> Option<Value> {
        fields
            .iter()
            .map(|field| self.resolve_at(field, depth + 1))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array)
    }

    fn variant_value(&self, variant: &Variant, depth: usize) -> Option<Value> {
        if let Variant::Unit { name } = variant {
            return Some(Value::String(name.clone()));
        }
        let payload = self.variant_payload(variant, depth)?;
        let mut wrapper = Map::with_capacity(1);
        wrapper.insert(variant.name().to_owned(), payload);
        Some(Value::Object(wrapper))
    }

    fn variant_payload(&self, variant: &Variant, depth: usize) -> Option<Value> {
        match variant {
            Variant::Unit { .. } => None,
            Variant::Tuple { fields, .. } => match fields.as_slice() {
                [inner] => self.resolve_at(inner, depth + 1),
                _ => self.positional_fields(fields, depth),
            },
            Variant::Struct { fields, .. } => self.named_fields(fields, depth),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
