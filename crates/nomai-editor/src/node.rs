//! The rendered editor tree.
//!
//! An [`EditorNode`] is a headless description of what a UI would draw for
//! one value: which widget, at which address, and whether it may be edited.
//! Every node carries the [`Address`] that edits to it must target.

use nomai_mirror::entity::EntityId;
use nomai_reflect::address::Address;
use nomai_reflect::color::ColorSpace;
use serde::Serialize;
use serde_json::Value;

/// One node of the rendered editor tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorNode {
    pub address: Address,
    /// Full type path the node was rendered for.
    pub type_name: String,
    pub read_only: bool,
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// Which widget a node is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum NodeKind {
    /// Labeled field rows, or positional fields when the value arrived as a
    /// sequence (`inline`).
    Struct { fields: Vec<FieldRow>, inline: bool },
    Tuple { items: Vec<EditorNode> },
    Enum {
        /// `None` when the value does not name a variant yet.
        selected: Option<String>,
        variants: Vec<String>,
        optional: bool,
        payload: Option<Box<EditorNode>>,
    },
    List {
        collection: Collection,
        items: Vec<EditorNode>,
        can_append: bool,
        staged: Option<Box<StagedView>>,
    },
    Map {
        entries: Vec<MapEntry>,
        can_add: bool,
        staged: Option<Box<StagedView>>,
    },
    Bool { value: bool },
    Number {
        value: Option<serde_json::Number>,
        unsigned: bool,
        integer: bool,
    },
    Text { value: String },
    EntityRef {
        entity: Option<EntityId>,
        /// Display name from the live mirror, when the entity is tracked.
        name: Option<String>,
    },
    Color {
        space: Option<ColorSpace>,
        channels: Value,
    },
    /// A structured value of an opaque type, shown as JSON.
    Raw { value: Value },
    /// The type is not in the registry.
    Unknown,
    /// The value does not fit its type. Only this subtree is affected.
    Fault { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Array,
    Set,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRow {
    pub name: String,
    pub node: EditorNode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapEntry {
    pub key: String,
    pub value: EditorNode,
}

/// A pending sub-editor for a new collection entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagedView {
    /// Key editor, for map entries only.
    pub key: Option<EditorNode>,
    pub value: EditorNode,
    /// Whether the entry can be committed.
    pub resolved: bool,
}

impl EditorNode {
    /// Direct children in display order. Staged sub-editors are separate
    /// trees and are not included.
    pub fn children(&self) -> Vec<&EditorNode> {
        match &self.kind {
            NodeKind::Struct { fields, .. } => fields.iter().map(|row| &row.node).collect(),
            NodeKind::Tuple { items } | NodeKind::List { items, .. } => items.iter().collect(),
            NodeKind::Enum { payload, .. } => payload.iter().map(|p| p.as_ref()).collect(),
            NodeKind::Map { entries, .. } => entries.iter().map(|e| &e.value).collect(),
            _ => Vec::new(),
        }
    }

    /// Depth-first search for the first node at `address` matching `pred`.
    pub fn find(
        &self,
        address: &Address,
        pred: impl Fn(&NodeKind) -> bool + Copy,
    ) -> Option<&EditorNode> {
        if &self.address == address && pred(&self.kind) {
            return Some(self);
        }
        if !address.starts_with(&self.address) {
            return None;
        }
        self.children()
            .into_iter()
            .find_map(|child| child.find(address, pred))
    }

    /// Addresses of all nodes without children, depth first.
    pub fn leaf_addresses(&self) -> Vec<Address> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<Address>) {
        let children = self.children();
        if children.is_empty() {
            out.push(self.address.clone());
        }
        for child in children {
            child.collect_leaves(out);
        }
    }

    /// All fault nodes in this tree.
    pub fn faults(&self) -> Vec<&EditorNode> {
        let mut out = Vec::new();
        self.collect_faults(&mut out);
        out
    }

    fn collect_faults<'a>(&'a self, out: &mut Vec<&'a EditorNode>) {
        if matches!(self.kind, NodeKind::Fault { .. }) {
            out.push(self);
        }
        for child in self.children() {
            child.collect_faults(out);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
