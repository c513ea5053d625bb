//! First-class addresses into dynamic values.
//!
//! An [`Address`] is an ordered list of field-name or index steps from the
//! root of a value. Reads and writes always operate on whole subtrees: [`set`]
//! replaces the addressed node with a new value and creates intermediate
//! containers as needed.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::AddressError;

/// One step of an [`Address`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Field(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::Field(name) => f.write_str(name),
        }
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Field(name.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        PathSegment::Field(name)
    }
}

/// A path from the root of a value to one of its nodes.
///
/// Addresses order lexicographically by segment, so every address sorts
/// directly before the addresses beneath it.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(Vec<PathSegment>);

impl Address {
    /// The address of the root value.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A new address one step below this one.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// The address one step above, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.0.split_last()?;
        Some(Self(parent.to_vec()))
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Whether this address is `prefix` or lies beneath it.
    pub fn starts_with(&self, prefix: &Address) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.0 {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

impl FromIterator<PathSegment> for Address {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<S: Into<PathSegment>, const N: usize> From<[S; N]> for Address {
    fn from(segments: [S; N]) -> Self {
        segments.into_iter().map(Into::into).collect()
    }
}

// ---------------------------------------------------------------------------
// Value access
// ---------------------------------------------------------------------------

/// Short name of a value's shape, for diagnostics.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "keyed value",
    }
}

/// Read the node at `address`, or `None` when any step is missing.
///
/// Index steps also address keyed values by their stringified index, which
/// is how maps with numeric keys are stored.
pub fn get<'v>(value: &'v Value, address: &Address) -> Option<&'v Value> {
    address
        .segments()
        .iter()
        .try_fold(value, |node, segment| match (node, segment) {
            (Value::Object(map), PathSegment::Field(name)) => map.get(name),
            (Value::Object(map), PathSegment::Index(i)) => map.get(&i.to_string()),
            (Value::Array(items), PathSegment::Index(i)) => items.get(*i),
            _ => None,
        })
}

/// Replace the node at `address` with `new_value`.
///
/// Missing fields are inserted, an index equal to a sequence's length
/// appends, and null or primitive intermediates are replaced by a fresh
/// container of the kind the next step needs. Stepping into a sequence by
/// field name, or past the end of a sequence, is an error and leaves `value`
/// untouched.
pub fn set(value: &mut Value, address: &Address, new_value: Value) -> Result<(), AddressError> {
    check_path(value, address.segments(), &Address::root())?;
    let mut node = value;
    for segment in address.segments() {
        node = step_or_create(node, segment);
    }
    *node = new_value;
    Ok(())
}

/// Validate the whole path before anything is written.
fn check_path(value: &Value, segments: &[PathSegment], at: &Address) -> Result<(), AddressError> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(());
    };
    let next = match (value, segment) {
        (Value::Array(_), PathSegment::Field(_)) => {
            return Err(AddressError::TypeMismatch {
                address: at.to_string(),
                expected: "keyed value",
                found: "sequence",
            });
        }
        (Value::Array(items), PathSegment::Index(i)) if *i > items.len() => {
            return Err(AddressError::IndexOutOfRange {
                address: at.to_string(),
                index: *i,
                len: items.len(),
            });
        }
        (Value::Array(items), PathSegment::Index(i)) => items.get(*i),
        (Value::Object(map), PathSegment::Field(name)) => map.get(name),
        (Value::Object(map), PathSegment::Index(i)) => map.get(&i.to_string()),
        (_, PathSegment::Index(i)) if *i > 0 => {
            return Err(AddressError::IndexOutOfRange {
                address: at.to_string(),
                index: *i,
                len: 0,
            });
        }
        _ => None,
    };
    match next {
        Some(child) => check_path(child, rest, &at.child(segment.clone())),
        None => check_fresh(rest, &at.child(segment.clone())),
    }
}

/// Steps below a node that does not exist yet only ever create containers,
/// so only leading indices past zero can fail.
fn check_fresh(segments: &[PathSegment], at: &Address) -> Result<(), AddressError> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(());
    };
    if let PathSegment::Index(i) = segment {
        if *i > 0 {
            return Err(AddressError::IndexOutOfRange {
                address: at.to_string(),
                index: *i,
                len: 0,
            });
        }
    }
    check_fresh(rest, &at.child(segment.clone()))
}

fn step_or_create<'v>(node: &'v mut Value, segment: &PathSegment) -> &'v mut Value {
    match (node, segment) {
        (Value::Object(map), PathSegment::Field(name)) => {
            map.entry(name.clone()).or_insert(Value::Null)
        }
        (Value::Object(map), PathSegment::Index(i)) => {
            map.entry(i.to_string()).or_insert(Value::Null)
        }
        (Value::Array(items), PathSegment::Index(i)) => {
            if *i >= items.len() {
                items.resize(*i + 1, Value::Null);
            }
            &mut items[*i]
        }
        (node, segment) => {
            *node = match segment {
                PathSegment::Field(_) => Value::Object(Map::new()),
                PathSegment::Index(_) => Value::Array(Vec::new()),
            };
            step_or_create(node, segment)
        }
    }
}

/// Addresses of every leaf (non-container or empty container) in `value`,
/// in depth-first order.
pub fn leaf_addresses(value: &Value) -> Vec<Address> {
    let mut out = Vec::new();
    collect_leaves(value, Address::root(), &mut out);
    out
}

fn collect_leaves(value: &Value, at: Address, out: &mut Vec<Address>) {
    match value {
        Value::Array(items) if !items.is_empty() => {
            for (i, item) in items.iter().enumerate() {
                collect_leaves(item, at.child(i), out);
            }
        }
        Value::Object(map) if !map.is_empty() => {
            for (key, item) in map {
                collect_leaves(item, at.child(key.as_str()), out);
            }
        }
        _ => out.push(at),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- 1. Reading --

    #[test]
    fn get_walks_fields_and_indices() {
        let value = json!({ "a": [10, { "b": true }], "m": { "3": "x" } });
        assert_eq!(get(&value, &Address::from(["a"])), Some(&json!([10, { "b": true }])));
        assert_eq!(
            get(&value, &Address::root().child("a").child(1).child("b")),
            Some(&json!(true))
        );
        assert_eq!(get(&value, &Address::root().child("m").child(3)), Some(&json!("x")));
        assert_eq!(get(&value, &Address::root().child("a").child(5)), None);
        assert_eq!(get(&value, &Address::root()), Some(&value));
    }

    // -- 2. Writing --

    #[test]
    fn set_replaces_subtree() {
        let mut value = json!({ "pos": { "x": 1, "y": 2 } });
        set(&mut value, &Address::from(["pos"]), json!([0, 0])).unwrap();
        assert_eq!(value, json!({ "pos": [0, 0] }));
    }

    #[test]
    fn set_creates_intermediate_containers() {
        let mut value = Value::Null;
        set(&mut value, &Address::from(["Walk"]), json!([1, 1])).unwrap();
        assert_eq!(value, json!({ "Walk": [1, 1] }));

        let mut value = json!("Idle");
        set(&mut value, &Address::root().child("Run").child(0), json!(2)).unwrap();
        assert_eq!(value, json!({ "Run": [2] }));
    }

    #[test]
    fn set_at_length_appends() {
        let mut value = json!([1, 2]);
        set(&mut value, &Address::root().child(2), json!(3)).unwrap();
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[test]
    fn set_past_end_fails_without_mutation() {
        let mut value = json!({ "items": [1] });
        let err = set(&mut value, &Address::root().child("items").child(3), json!(0)).unwrap_err();
        assert!(matches!(err, AddressError::IndexOutOfRange { index: 3, len: 1, .. }));
        assert_eq!(value, json!({ "items": [1] }));
    }

    #[test]
    fn set_field_on_sequence_fails() {
        let mut value = json!([1]);
        let err = set(&mut value, &Address::from(["x"]), json!(0)).unwrap_err();
        assert!(matches!(err, AddressError::TypeMismatch { .. }));
        assert_eq!(value, json!([1]));
    }

    #[test]
    fn set_root_replaces_everything() {
        let mut value = json!({ "a": 1 });
        set(&mut value, &Address::root(), json!(7)).unwrap();
        assert_eq!(value, json!(7));
    }

    // -- 3. Address helpers --

    #[test]
    fn ordering_and_prefixes() {
        let a = Address::from(["items"]);
        let a0 = a.child(0);
        let b = Address::from(["other"]);
        assert!(a < a0 && a0 < b);
        assert!(a0.starts_with(&a));
        assert!(!b.starts_with(&a));
        assert_eq!(a0.parent(), Some(a.clone()));
        assert_eq!(a0.to_string(), "$.items.0");
        assert_eq!(Address::root().to_string(), "$");
    }

    #[test]
    fn leaves_of_nested_value() {
        let value = json!({ "a": [1, 2], "b": {}, "c": { "d": null } });
        let leaves: Vec<String> = leaf_addresses(&value).iter().map(ToString::to_string).collect();
        assert_eq!(leaves, ["$.a.0", "$.a.1", "$.b", "$.c.d"]);
    }
}
