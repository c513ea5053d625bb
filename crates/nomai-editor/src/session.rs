//! Edit sessions and edit actions.
//!
//! An [`EditSession`] owns one value being edited plus any staged
//! sub-editors for collection entries that are still being composed. Each
//! [`EditAction`] names the address it targets; the session renders itself,
//! looks up the node of the expected kind at that address and validates the
//! action against it before anything is written.

use std::collections::BTreeMap;

use nomai_mirror::entity::EntityId;
use nomai_reflect::address::{self, Address};
use nomai_reflect::color::{self, ColorSpace};
use nomai_reflect::registry::TypeShape;
use nomai_reflect::type_names::{integer_width, is_non_zero_type, is_option_type};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::debug;

use crate::node::{Collection, EditorNode, NodeKind};
use crate::render::Renderer;
use crate::{EditError, EditorContext};

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Which half of a staged map entry an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagedTarget {
    Key,
    Value,
}

/// One user edit, addressed at a node of the rendered tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditAction {
    SetBool { address: Address, value: bool },
    SetNumber { address: Address, value: f64 },
    /// Free text for string and other text-like opaque values.
    SetText { address: Address, value: String },
    SetEntity { address: Address, entity: EntityId },
    SelectVariant { address: Address, variant: String },
    /// Append to an array or start composing a set entry.
    AppendItem { address: Address },
    /// Start composing a map entry.
    OpenMapEntry { address: Address },
    /// Edit inside the staged sub-editor of the collection at `address`.
    EditStaged {
        address: Address,
        target: StagedTarget,
        edit: Box<EditAction>,
    },
    CommitStaged { address: Address },
    CancelStaged { address: Address },
    /// Re-encode a color value in another space.
    SetColorSpace { address: Address, space: ColorSpace },
    /// Pick a color, given as sRGB channels, stored in the current space.
    SetColor { address: Address, srgba: [f64; 4] },
}

/// What a successful action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The value changed.
    Updated,
    /// An item was appended directly at `index`.
    Appended { index: usize },
    /// A staged sub-editor was opened for the new entry.
    Staged,
    /// A staged entry was written into the value.
    Committed,
    Cancelled,
}

// ---------------------------------------------------------------------------
// Staged entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StagedKind {
    ArrayItem,
    SetItem,
    MapEntry,
}

/// A collection entry being composed before it is added.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedEntry {
    kind: StagedKind,
    key: Option<Box<EditSession>>,
    value: Box<EditSession>,
}

impl StagedEntry {
    fn new(kind: StagedKind, item_type: &str, default: Option<Value>) -> Self {
        Self {
            kind,
            key: None,
            value: Box::new(EditSession::new(item_type, default.unwrap_or(Value::Null))),
        }
    }

    fn with_key(mut self, key_type: &str, default: Option<Value>) -> Self {
        let key = EditSession::new(key_type, default.unwrap_or(Value::Null));
        self.key = Some(Box::new(key));
        self
    }

    /// Key sub-editor, for map entries.
    pub fn key(&self) -> Option<&EditSession> {
        self.key.as_deref()
    }

    pub fn value(&self) -> &EditSession {
        &self.value
    }

    /// Whether every leaf of both halves holds a value, either from a
    /// default or an edit.
    pub fn is_resolved(&self, ctx: EditorContext<'_>) -> bool {
        self.key.as_ref().map_or(true, |key| key.is_complete(ctx)) && self.value.is_complete(ctx)
    }
}

// ---------------------------------------------------------------------------
// EditSession
// ---------------------------------------------------------------------------

/// One value under edit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    type_name: String,
    root: Value,
    staged: BTreeMap<Address, StagedEntry>,
    read_only_addresses: Vec<Address>,
    read_only: bool,
}

impl EditSession {
    pub fn new(type_name: impl Into<String>, root: Value) -> Self {
        Self {
            type_name: type_name.into(),
            root,
            staged: BTreeMap::new(),
            read_only_addresses: Vec::new(),
            read_only: false,
        }
    }

    /// Make the whole session read-only.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Make `address` and everything beneath it read-only.
    pub fn with_read_only_address(mut self, address: Address) -> Self {
        self.read_only_addresses.push(address);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn value(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    pub fn get(&self, address: &Address) -> Option<&Value> {
        address::get(&self.root, address)
    }

    /// Replace the whole value, e.g. when a newer one arrives from the
    /// remote side. Pending staged entries are dropped.
    pub fn replace_root(&mut self, root: Value) {
        self.root = root;
        self.staged.clear();
    }

    pub fn staged(&self, address: &Address) -> Option<&StagedEntry> {
        self.staged.get(address)
    }

    pub(crate) fn is_read_only_at(&self, address: &Address) -> bool {
        self.read_only
            || self
                .read_only_addresses
                .iter()
                .any(|prefix| address.starts_with(prefix))
    }

    /// Render the editor tree for the current value.
    pub fn render(&self, ctx: EditorContext<'_>) -> EditorNode {
        Renderer::new(ctx, self).render_root()
    }

    /// Addresses of rendered leaves that hold no value yet, e.g. fields of a
    /// type without a default that were never edited. Faulty subtrees count
    /// as blank.
    pub fn blank_addresses(&self, ctx: EditorContext<'_>) -> Vec<Address> {
        let mut out = Vec::new();
        collect_blanks(&self.render(ctx), &self.root, &mut out);
        out
    }

    /// Whether every rendered leaf holds a value.
    pub fn is_complete(&self, ctx: EditorContext<'_>) -> bool {
        self.blank_addresses(ctx).is_empty()
    }

    /// Validate and apply one action. On error the value is unchanged.
    pub fn apply(
        &mut self,
        ctx: EditorContext<'_>,
        action: EditAction,
    ) -> Result<EditOutcome, EditError> {
        let tree = self.render(ctx);
        let result = self.apply_to(ctx, &tree, action);
        if let Err(e) = &result {
            debug!(type_name = %self.type_name, error = %e, "edit rejected");
        }
        result
    }

    fn apply_to(
        &mut self,
        ctx: EditorContext<'_>,
        tree: &EditorNode,
        action: EditAction,
    ) -> Result<EditOutcome, EditError> {
        match action {
            EditAction::SetBool { address, value } => {
                editable(tree, &address, "toggle", |k| matches!(k, NodeKind::Bool { .. }))?;
                self.write(&address, Value::Bool(value))
            }
            EditAction::SetNumber { address, value } => {
                let node = editable(tree, &address, "number", |k| {
                    matches!(k, NodeKind::Number { .. })
                })?;
                let number = coerce_number(&address, &node.type_name, value)?;
                self.write(&address, Value::Number(number))
            }
            EditAction::SetText { address, value } => {
                editable(tree, &address, "text", |k| matches!(k, NodeKind::Text { .. }))?;
                self.write(&address, Value::String(value))
            }
            EditAction::SetEntity { address, entity } => {
                editable(tree, &address, "entity", |k| {
                    matches!(k, NodeKind::EntityRef { .. })
                })?;
                if let Some(live) = ctx.live {
                    let hidden = live.mirror.is_hidden(entity, live.components);
                    if !live.mirror.contains(entity) || hidden {
                        return Err(EditError::UnknownEntity { entity });
                    }
                }
                self.write(&address, Value::from(entity))
            }
            EditAction::SelectVariant { address, variant } => {
                let node = editable(tree, &address, "variant", |k| {
                    matches!(k, NodeKind::Enum { .. })
                })?;
                self.select_variant(ctx, &node.type_name, address, &variant)
            }
            EditAction::AppendItem { address } => {
                let node = editable(tree, &address, "list", |k| {
                    matches!(k, NodeKind::List { .. })
                })?;
                self.append_item(ctx, node)
            }
            EditAction::OpenMapEntry { address } => {
                let node = editable(tree, &address, "map", |k| {
                    matches!(k, NodeKind::Map { .. })
                })?;
                self.open_map_entry(ctx, node)
            }
            EditAction::EditStaged {
                address,
                target,
                edit,
            } => {
                let entry = self
                    .staged
                    .get_mut(&address)
                    .ok_or(EditError::NotStaged { address })?;
                let half = match target {
                    StagedTarget::Value => &mut entry.value,
                    StagedTarget::Key => entry.key.as_mut().ok_or(EditError::NoEditor {
                        address: Address::root(),
                        expected: "key",
                    })?,
                };
                half.apply(ctx, *edit)?;
                Ok(EditOutcome::Updated)
            }
            EditAction::CommitStaged { address } => self.commit_staged(ctx, address),
            EditAction::CancelStaged { address } => {
                self.staged
                    .remove(&address)
                    .ok_or(EditError::NotStaged { address })?;
                Ok(EditOutcome::Cancelled)
            }
            EditAction::SetColorSpace { address, space } => {
                editable(tree, &address, "color", |k| {
                    matches!(k, NodeKind::Color { .. })
                })?;
                let converted = match self.get(&address).filter(|v| !v.is_null()) {
                    Some(current) => color::convert_color(current, space)?,
                    None => {
                        let white = srgba_channels([1.0; 4]);
                        color::wrap(space, color::convert(&white, ColorSpace::Srgba, space)?)
                    }
                };
                self.write(&address, converted)
            }
            EditAction::SetColor { address, srgba } => {
                let node = editable(tree, &address, "color", |k| {
                    matches!(k, NodeKind::Color { .. })
                })?;
                let NodeKind::Color { space, .. } = node.kind else {
                    return Err(no_editor(address, "color"));
                };
                let space = space.unwrap_or(ColorSpace::Srgba);
                let channels = color::convert(&srgba_channels(srgba), ColorSpace::Srgba, space)?;
                self.write(&address, color::wrap(space, channels))
            }
        }
    }

    fn write(&mut self, address: &Address, value: Value) -> Result<EditOutcome, EditError> {
        address::set(&mut self.root, address, value)?;
        Ok(EditOutcome::Updated)
    }

    fn select_variant(
        &mut self,
        ctx: EditorContext<'_>,
        type_name: &str,
        address: Address,
        name: &str,
    ) -> Result<EditOutcome, EditError> {
        let variant = match ctx.types.get(type_name).map(|d| &d.shape) {
            Some(TypeShape::Enum { variants }) => variants.iter().find(|v| v.name() == name),
            _ => None,
        }
        .ok_or_else(|| EditError::UnknownVariant {
            type_name: type_name.to_owned(),
            variant: name.to_owned(),
        })?;

        let optional = is_option_type(type_name);
        let value = if variant.is_unit() {
            if optional {
                Value::Null
            } else {
                Value::String(name.to_owned())
            }
        } else {
            let payload = ctx
                .resolver()
                .resolve_variant_payload(variant)
                .ok_or_else(|| EditError::MissingDefault {
                    type_name: format!("{type_name}::{name}"),
                })?;
            if optional {
                payload
            } else {
                let mut wrapper = serde_json::Map::with_capacity(1);
                wrapper.insert(name.to_owned(), payload);
                Value::Object(wrapper)
            }
        };

        address::set(&mut self.root, &address, value)?;
        self.staged.retain(|staged_at, _| !staged_at.starts_with(&address));
        Ok(EditOutcome::Updated)
    }

    fn append_item(
        &mut self,
        ctx: EditorContext<'_>,
        node: &EditorNode,
    ) -> Result<EditOutcome, EditError> {
        let NodeKind::List {
            collection,
            can_append,
            items,
            ..
        } = &node.kind
        else {
            return Err(no_editor(node.address.clone(), "list"));
        };
        if !can_append {
            return Err(EditError::CannotAdd {
                address: node.address.clone(),
                reason: "the array has a fixed capacity",
            });
        }
        if self.staged.contains_key(&node.address) {
            return Err(EditError::AlreadyStaged {
                address: node.address.clone(),
            });
        }

        let item_type = match ctx.types.get(&node.type_name).map(|d| &d.shape) {
            Some(TypeShape::Array { item, .. } | TypeShape::Set { item }) => item.clone(),
            _ => return Err(no_editor(node.address.clone(), "list")),
        };
        let default = ctx.resolver().resolve(&item_type);

        match (collection, default) {
            (Collection::Array, Some(default)) => {
                let index = items.len();
                address::set(&mut self.root, &node.address.child(index), default)?;
                Ok(EditOutcome::Appended { index })
            }
            (collection, default) => {
                let kind = match collection {
                    Collection::Array => StagedKind::ArrayItem,
                    Collection::Set => StagedKind::SetItem,
                };
                let entry = StagedEntry::new(kind, &item_type, default);
                self.staged.insert(node.address.clone(), entry);
                Ok(EditOutcome::Staged)
            }
        }
    }

    fn open_map_entry(
        &mut self,
        ctx: EditorContext<'_>,
        node: &EditorNode,
    ) -> Result<EditOutcome, EditError> {
        let NodeKind::Map { can_add, .. } = &node.kind else {
            return Err(no_editor(node.address.clone(), "map"));
        };
        if !can_add {
            return Err(EditError::CannotAdd {
                address: node.address.clone(),
                reason: "only string or number keys can be added",
            });
        }
        if self.staged.contains_key(&node.address) {
            return Err(EditError::AlreadyStaged {
                address: node.address.clone(),
            });
        }
        let (key_type, value_type) = match ctx.types.get(&node.type_name).map(|d| &d.shape) {
            Some(TypeShape::Map { key, value }) => (key.clone(), value.clone()),
            _ => return Err(no_editor(node.address.clone(), "map")),
        };
        let resolver = ctx.resolver();
        let entry =
            StagedEntry::new(StagedKind::MapEntry, &value_type, resolver.resolve(&value_type))
                .with_key(&key_type, resolver.resolve(&key_type));
        self.staged.insert(node.address.clone(), entry);
        Ok(EditOutcome::Staged)
    }

    fn commit_staged(
        &mut self,
        ctx: EditorContext<'_>,
        address: Address,
    ) -> Result<EditOutcome, EditError> {
        let entry = self
            .staged
            .get(&address)
            .ok_or_else(|| EditError::NotStaged {
                address: address.clone(),
            })?;
        if !entry.is_resolved(ctx) {
            return Err(EditError::Unresolved { address });
        }
        let value = entry.value.value().clone();
        let current = self.get(&address).filter(|v| !v.is_null());

        let target = match entry.kind {
            StagedKind::ArrayItem | StagedKind::SetItem => {
                let items = current.and_then(Value::as_array);
                let duplicate = items.is_some_and(|items| items.contains(&value));
                if entry.kind == StagedKind::SetItem && duplicate {
                    return Err(EditError::DuplicateItem { address });
                }
                address.child(items.map_or(0, Vec::len))
            }
            StagedKind::MapEntry => {
                let key = match entry.key.as_ref().map(|k| k.value()) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    other => {
                        return Err(EditError::InvalidKey {
                            address,
                            key: other.map_or_else(|| "null".to_owned(), Value::to_string),
                        });
                    }
                };
                if current.and_then(|map| map.get(&key)).is_some() {
                    return Err(EditError::DuplicateKey { address, key });
                }
                address.child(key)
            }
        };

        address::set(&mut self.root, &target, value)?;
        self.staged.remove(&address);
        Ok(EditOutcome::Committed)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Find the node of the expected kind at `address` and require it editable.
fn editable<'t>(
    tree: &'t EditorNode,
    address: &Address,
    expected: &'static str,
    pred: fn(&NodeKind) -> bool,
) -> Result<&'t EditorNode, EditError> {
    let node = tree
        .find(address, pred)
        .ok_or_else(|| no_editor(address.clone(), expected))?;
    if node.read_only {
        return Err(EditError::ReadOnly {
            address: address.clone(),
        });
    }
    Ok(node)
}

fn no_editor(address: Address, expected: &'static str) -> EditError {
    EditError::NoEditor { address, expected }
}

/// Walk `node` and record leaves with no value in `root`.
fn collect_blanks(node: &EditorNode, root: &Value, out: &mut Vec<Address>) {
    match &node.kind {
        NodeKind::Fault { .. } => {
            out.push(node.address.clone());
            return;
        }
        // `None` is a value of its own.
        NodeKind::Enum {
            optional: true,
            payload: None,
            ..
        } => return,
        NodeKind::Struct { fields, .. } if fields.is_empty() => return,
        NodeKind::Tuple { items } if items.is_empty() => return,
        _ => {}
    }
    let children = node.children();
    if children.is_empty() {
        if address::get(root, &node.address).map_or(true, Value::is_null) {
            out.push(node.address.clone());
        }
        return;
    }
    for child in children {
        collect_blanks(child, root, out);
    }
}

/// Turn raw numeric input into a number that fits `type_name`.
///
/// Integers wider than 64 bits are limited to the 64-bit range, which is
/// all a JSON number can carry exactly.
fn coerce_number(address: &Address, type_name: &str, value: f64) -> Result<Number, EditError> {
    let invalid = |reason| EditError::InvalidNumber {
        address: address.clone(),
        reason,
    };
    if !value.is_finite() {
        return Err(invalid("value must be finite"));
    }
    let Some((bits, signed)) = integer_width(type_name) else {
        if type_name == "f32" && value.abs() > f64::from(f32::MAX) {
            return Err(invalid("value is out of range"));
        }
        return Number::from_f64(value).ok_or_else(|| invalid("value must be finite"));
    };
    if value.fract() != 0.0 {
        return Err(invalid("value must be a whole number"));
    }
    if !signed && value < 0.0 {
        return Err(invalid("value must not be negative"));
    }
    if value == 0.0 && is_non_zero_type(type_name) {
        return Err(invalid("value must not be zero"));
    }

    let bits = bits.min(64) as i32;
    if signed {
        let limit = 2f64.powi(bits - 1);
        if value < -limit || value >= limit {
            return Err(invalid("value is out of range"));
        }
        Ok(Number::from(value as i64))
    } else {
        if value >= 2f64.powi(bits) {
            return Err(invalid("value is out of range"));
        }
        Ok(Number::from(value as u64))
    }
}

fn srgba_channels([red, green, blue, alpha]: [f64; 4]) -> Value {
    serde_json::json!({ "red": red, "green": green, "blue": blue, "alpha": alpha })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use nomai_reflect::registry::TypeRegistry;
    use serde_json::json;

    // -- 1. Numbers --

    #[test]
    fn coerce_number_by_kind() {
        let at = Address::root();
        assert_eq!(coerce_number(&at, "u32", 3.0).unwrap(), Number::from(3u64));
        assert_eq!(coerce_number(&at, "i16", -3.0).unwrap(), Number::from(-3i64));
        assert_eq!(coerce_number(&at, "f64", 0.5).unwrap().as_f64(), Some(0.5));

        assert!(coerce_number(&at, "u8", -1.0).is_err());
        assert!(coerce_number(&at, "i32", 2.5).is_err());
        assert!(coerce_number(&at, "f32", f64::INFINITY).is_err());
    }

    #[test]
    fn integers_are_checked_against_their_width() {
        let at = Address::root();
        assert_eq!(coerce_number(&at, "u8", 255.0).unwrap(), Number::from(255u64));
        assert!(coerce_number(&at, "u8", 256.0).is_err());
        assert!(coerce_number(&at, "u8", 300.0).is_err());
        assert_eq!(coerce_number(&at, "i8", -128.0).unwrap(), Number::from(-128i64));
        assert!(coerce_number(&at, "i8", 128.0).is_err());
        assert!(coerce_number(&at, "i64", 1e20).is_err());
        assert!(coerce_number(&at, "u64", 2f64.powi(64)).is_err());
        assert!(coerce_number(&at, "u128", 1e20).is_err());
        assert!(coerce_number(&at, "f32", 1e39).is_err());

        assert!(coerce_number(&at, "core::num::NonZeroU16", 0.0).is_err());
        assert!(coerce_number(&at, "core::num::NonZeroU16", 70_000.0).is_err());
        assert_eq!(
            coerce_number(&at, "core::num::NonZero<i32>", -5.0).unwrap(),
            Number::from(-5i64)
        );
    }

    // -- 2. Staged entries --

    #[test]
    fn staged_entries_track_resolution() {
        let types: TypeRegistry = serde_json::from_value(json!([
            ["f32", { "kind": "opaque" }],
            ["game::Key", { "kind": "opaque" }]
        ]))
        .unwrap();
        let ctx = EditorContext::new(&types);

        let mut entry = StagedEntry::new(StagedKind::MapEntry, "f32", Some(Value::from(1)))
            .with_key("game::Key", None);
        assert!(!entry.is_resolved(ctx));
        assert_eq!(entry.value().value(), &Value::from(1));
        assert_eq!(entry.key().map(EditSession::type_name), Some("game::Key"));

        entry.key = Some(Box::new(EditSession::new("game::Key", json!("k"))));
        assert!(entry.is_resolved(ctx));
    }

    // -- 3. Wire format --

    #[test]
    fn nested_staged_edits_round_trip() {
        let action = EditAction::EditStaged {
            address: Address::root().child("tags"),
            target: StagedTarget::Key,
            edit: Box::new(EditAction::SetText {
                address: Address::root(),
                value: "k".into(),
            }),
        };
        let encoded = serde_json::to_value(&action).unwrap();
        assert_eq!(encoded["action"], json!("edit_staged"));
        assert_eq!(encoded["edit"]["action"], json!("set_text"));
        assert_eq!(serde_json::from_value::<EditAction>(encoded).unwrap(), action);
    }
}
