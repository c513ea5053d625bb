//! The render dispatcher.
//!
//! Walks a value alongside its type descriptor and produces the editor tree.
//! Entity references and colors are matched by type name before the
//! descriptor is consulted. A value that does not fit its type becomes a
//! [`NodeKind::Fault`] for that subtree only; siblings render normally.
//!
//! `null` (or a missing field) is treated as a blank value rather than a
//! mismatch, so staged editors seeded without a default can render.

use nomai_mirror::entity::EntityId;
use nomai_reflect::address::{value_kind, Address};
use nomai_reflect::color;
use nomai_reflect::registry::{NamedField, TypeShape, Variant};
use nomai_reflect::type_names::{
    self, is_bool_type, is_integer_type, is_number_type, is_option_type, is_string_type,
    is_unsigned_integer_type,
};
use serde_json::Value;

use crate::node::{Collection, EditorNode, FieldRow, MapEntry, NodeKind, StagedView};
use crate::session::EditSession;
use crate::{EditorContext, MAX_RENDER_DEPTH};

pub(crate) struct Renderer<'a> {
    ctx: EditorContext<'a>,
    session: &'a EditSession,
}

impl<'a> Renderer<'a> {
    pub(crate) fn new(ctx: EditorContext<'a>, session: &'a EditSession) -> Self {
        Self { ctx, session }
    }

    pub(crate) fn render_root(&self) -> EditorNode {
        let root = Address::root();
        let read_only = self.forced_read_only(&root, false);
        self.node(
            self.session.type_name(),
            root,
            Some(self.session.value()),
            read_only,
            0,
        )
    }

    fn forced_read_only(&self, address: &Address, inherited: bool) -> bool {
        inherited || self.session.is_read_only_at(address)
    }

    fn node(
        &self,
        type_name: &str,
        address: Address,
        value: Option<&Value>,
        read_only: bool,
        depth: usize,
    ) -> EditorNode {
        let read_only = self.forced_read_only(&address, read_only);
        let value = value.filter(|v| !v.is_null());
        let kind = if depth > MAX_RENDER_DEPTH {
            NodeKind::Fault {
                message: format!("{type_name} is nested too deeply"),
            }
        } else if type_name == type_names::ENTITY {
            self.entity_ref(value)
        } else if type_name == type_names::COLOR {
            color_leaf(value)
        } else {
            match self.ctx.types.get(type_name) {
                None => NodeKind::Unknown,
                Some(descriptor) => {
                    let shape = &descriptor.shape;
                    return self.shaped(type_name, shape, address, value, read_only, depth);
                }
            }
        };
        EditorNode {
            address,
            type_name: type_name.to_owned(),
            read_only: read_only || !is_editable_leaf(&kind),
            kind,
        }
    }

    fn shaped(
        &self,
        type_name: &str,
        shape: &TypeShape,
        address: Address,
        value: Option<&Value>,
        read_only: bool,
        depth: usize,
    ) -> EditorNode {
        let kind = match shape {
            TypeShape::Struct { fields } => {
                self.named_fields(type_name, fields, &address, value, read_only, depth)
            }
            TypeShape::TupleStruct { fields } if fields.len() == 1 => {
                return self.node(&fields[0], address, value, read_only, depth + 1);
            }
            TypeShape::TupleStruct { fields } | TypeShape::Tuple { fields } => {
                self.positional(type_name, fields, &address, value, read_only, depth)
            }
            TypeShape::Array { item, capacity } => self.list(
                type_name,
                item,
                Collection::Array,
                capacity.is_none(),
                &address,
                value,
                read_only,
                depth,
            ),
            TypeShape::Set { item } => self.list(
                type_name,
                item,
                Collection::Set,
                true,
                &address,
                value,
                read_only,
                depth,
            ),
            TypeShape::Map { key, value: value_type } => {
                self.map(type_name, key, value_type, &address, value, read_only, depth)
            }
            TypeShape::Enum { variants } => {
                self.enumeration(type_name, variants, &address, value, read_only, depth)
            }
            TypeShape::Opaque => opaque_leaf(type_name, value),
        };
        let read_only = read_only
            || matches!(kind, NodeKind::Fault { .. } | NodeKind::Raw { .. } | NodeKind::Unknown);
        EditorNode {
            address,
            type_name: type_name.to_owned(),
            read_only,
            kind,
        }
    }

    // -- composites --

    fn named_fields(
        &self,
        type_name: &str,
        fields: &[NamedField],
        address: &Address,
        value: Option<&Value>,
        read_only: bool,
        depth: usize,
    ) -> NodeKind {
        match value {
            Some(Value::Array(items)) if items.len() == fields.len() && !fields.is_empty() => {
                let fields = fields
                    .iter()
                    .zip(items)
                    .enumerate()
                    .map(|(i, (field, item))| FieldRow {
                        name: field.name.clone(),
                        node: self.node(
                            &field.type_name,
                            address.child(i),
                            Some(item),
                            read_only,
                            depth + 1,
                        ),
                    })
                    .collect();
                NodeKind::Struct {
                    fields,
                    inline: true,
                }
            }
            None | Some(Value::Object(_)) => {
                let fields = fields
                    .iter()
                    .map(|field| FieldRow {
                        name: field.name.clone(),
                        node: self.node(
                            &field.type_name,
                            address.child(field.name.as_str()),
                            value.and_then(|v| v.get(&field.name)),
                            read_only,
                            depth + 1,
                        ),
                    })
                    .collect();
                NodeKind::Struct {
                    fields,
                    inline: false,
                }
            }
            Some(other) => mismatch(type_name, "keyed value", other),
        }
    }

    fn positional(
        &self,
        type_name: &str,
        fields: &[String],
        address: &Address,
        value: Option<&Value>,
        read_only: bool,
        depth: usize,
    ) -> NodeKind {
        let items = match value {
            None => None,
            Some(Value::Array(items)) => Some(items),
            Some(other) => return mismatch(type_name, "sequence", other),
        };
        let items = fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let item = items.and_then(|items| items.get(i));
                self.node(field, address.child(i), item, read_only, depth + 1)
            })
            .collect();
        NodeKind::Tuple { items }
    }

    #[allow(clippy::too_many_arguments)]
    fn list(
        &self,
        type_name: &str,
        item_type: &str,
        collection: Collection,
        growable: bool,
        address: &Address,
        value: Option<&Value>,
        read_only: bool,
        depth: usize,
    ) -> NodeKind {
        let items = match value {
            None => &[][..],
            Some(Value::Array(items)) => items.as_slice(),
            Some(other) => return mismatch(type_name, "sequence", other),
        };
        let items_read_only = read_only || collection == Collection::Set;
        let items = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let item_address = address.child(i);
                self.node(item_type, item_address, Some(item), items_read_only, depth + 1)
            })
            .collect();
        NodeKind::List {
            collection,
            items,
            can_append: !read_only && growable,
            staged: self.staged(address),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn map(
        &self,
        type_name: &str,
        key_type: &str,
        value_type: &str,
        address: &Address,
        value: Option<&Value>,
        read_only: bool,
        depth: usize,
    ) -> NodeKind {
        let entries = match value {
            None => None,
            Some(Value::Object(entries)) => Some(entries),
            Some(other) => return mismatch(type_name, "keyed value", other),
        };
        let supported_key = is_string_type(key_type) || is_number_type(key_type);
        let entries_read_only = read_only || !supported_key;
        let entries = entries
            .into_iter()
            .flatten()
            .map(|(key, item)| MapEntry {
                key: key.clone(),
                value: self.node(
                    value_type,
                    address.child(key.as_str()),
                    Some(item),
                    entries_read_only,
                    depth + 1,
                ),
            })
            .collect();
        NodeKind::Map {
            entries,
            can_add: !entries_read_only,
            staged: self.staged(address),
        }
    }

    fn enumeration(
        &self,
        type_name: &str,
        variants: &[Variant],
        address: &Address,
        value: Option<&Value>,
        read_only: bool,
        depth: usize,
    ) -> NodeKind {
        let names = variants.iter().map(|v| v.name().to_owned()).collect();
        let optional = is_option_type(type_name);

        let (variant, payload_address, payload_value) = if optional {
            // `None` is stored as null, `Some(x)` as the bare payload.
            match value {
                None => (variants.iter().find(|v| v.is_unit()), None, None),
                Some(v) => (variants.iter().find(|v| !v.is_unit()), Some(address.clone()), Some(v)),
            }
        } else {
            match value {
                None => (None, None, None),
                Some(Value::String(name)) => match variants.iter().find(|v| v.name() == name) {
                    Some(variant) => (Some(variant), None, None),
                    None => return unknown_variant(type_name, name),
                },
                Some(other) => {
                    let Some((name, payload)) = single_entry(other) else {
                        return mismatch(type_name, "variant", other);
                    };
                    match variants.iter().find(|v| v.name() == name) {
                        Some(variant) => {
                            (Some(variant), Some(address.child(name.as_str())), Some(payload))
                        }
                        None => return unknown_variant(type_name, name),
                    }
                }
            }
        };

        let payload = match (variant, payload_address) {
            (Some(variant), Some(payload_address)) => self
                .variant_payload(
                    type_name,
                    variant,
                    payload_address,
                    payload_value,
                    read_only,
                    depth,
                )
                .map(Box::new),
            _ => None,
        };

        NodeKind::Enum {
            selected: variant.map(|v| v.name().to_owned()),
            variants: names,
            optional,
            payload,
        }
    }

    fn variant_payload(
        &self,
        type_name: &str,
        variant: &Variant,
        address: Address,
        value: Option<&Value>,
        read_only: bool,
        depth: usize,
    ) -> Option<EditorNode> {
        let payload_type = format!("{type_name}::{}", variant.name());
        let kind = match variant {
            Variant::Unit { .. } => return None,
            Variant::Tuple { fields, .. } if fields.len() == 1 => {
                return Some(self.node(&fields[0], address, value, read_only, depth + 1));
            }
            Variant::Tuple { fields, .. } => {
                self.positional(&payload_type, fields, &address, value, read_only, depth)
            }
            Variant::Struct { fields, .. } => {
                self.named_fields(&payload_type, fields, &address, value, read_only, depth)
            }
        };
        let read_only = read_only || matches!(kind, NodeKind::Fault { .. });
        Some(EditorNode {
            address,
            type_name: payload_type,
            read_only,
            kind,
        })
    }

    // -- leaves --

    fn entity_ref(&self, value: Option<&Value>) -> NodeKind {
        let entity = match value {
            None => None,
            Some(v) => match EntityId::from_value(v) {
                Some(entity) => Some(entity),
                None => return mismatch(type_names::ENTITY, "entity reference", v),
            },
        };
        let name = entity.and_then(|entity| {
            let live = self.ctx.live?;
            live.mirror.name(entity).map(str::to_owned)
        });
        NodeKind::EntityRef { entity, name }
    }

    fn staged(&self, address: &Address) -> Option<Box<StagedView>> {
        let entry = self.session.staged(address)?;
        Some(Box::new(StagedView {
            key: entry.key().map(|key| key.render(self.ctx)),
            value: entry.value().render(self.ctx),
            resolved: entry.is_resolved(self.ctx),
        }))
    }
}

fn color_leaf(value: Option<&Value>) -> NodeKind {
    match value {
        None => NodeKind::Color {
            space: None,
            channels: Value::Null,
        },
        Some(v) => match color::split(v) {
            Ok((space, channels)) => NodeKind::Color {
                space: Some(space),
                channels: channels.clone(),
            },
            Err(e) => NodeKind::Fault {
                message: e.to_string(),
            },
        },
    }
}

fn opaque_leaf(type_name: &str, value: Option<&Value>) -> NodeKind {
    if is_bool_type(type_name) {
        return match value {
            None => NodeKind::Bool { value: false },
            Some(Value::Bool(b)) => NodeKind::Bool { value: *b },
            Some(other) => mismatch(type_name, "bool", other),
        };
    }
    if is_number_type(type_name) {
        return match value {
            None => NodeKind::Number {
                value: None,
                unsigned: is_unsigned_integer_type(type_name),
                integer: is_integer_type(type_name),
            },
            Some(Value::Number(n)) => NodeKind::Number {
                value: Some(n.clone()),
                unsigned: is_unsigned_integer_type(type_name),
                integer: is_integer_type(type_name),
            },
            Some(other) => mismatch(type_name, "number", other),
        };
    }
    if is_string_type(type_name) {
        return match value {
            None => NodeKind::Text {
                value: String::new(),
            },
            Some(Value::String(s)) => NodeKind::Text { value: s.clone() },
            Some(other) => mismatch(type_name, "string", other),
        };
    }
    match value {
        None => NodeKind::Text {
            value: String::new(),
        },
        Some(Value::String(s)) => NodeKind::Text { value: s.clone() },
        Some(v @ (Value::Bool(_) | Value::Number(_))) => NodeKind::Text {
            value: v.to_string(),
        },
        Some(v) => NodeKind::Raw { value: v.clone() },
    }
}

/// The `(variant, payload)` of an externally tagged enum value.
fn single_entry(value: &Value) -> Option<(&String, &Value)> {
    match value {
        Value::Object(map) if map.len() == 1 => map.iter().next(),
        _ => None,
    }
}

fn is_editable_leaf(kind: &NodeKind) -> bool {
    !matches!(kind, NodeKind::Fault { .. } | NodeKind::Raw { .. } | NodeKind::Unknown)
}

fn mismatch(type_name: &str, expected: &str, found: &Value) -> NodeKind {
    NodeKind::Fault {
        message: format!(
            "expected {expected} for {type_name}, found {}",
            value_kind(found)
        ),
    }
}

fn unknown_variant(type_name: &str, name: &str) -> NodeKind {
    NodeKind::Fault {
        message: format!("'{name}' is not a variant of {type_name}"),
    }
}
