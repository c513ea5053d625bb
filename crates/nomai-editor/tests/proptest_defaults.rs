//! Property tests tying default values to the editor tree.
//!
//! For every registered type with a default, the editor rendered for that
//! default must be fault-free and expose exactly the leaf addresses the
//! value itself has, with no blank leaves. Number edits at any leaf keep the
//! tree fault-free.

use nomai_editor::prelude::*;
use nomai_reflect::address::leaf_addresses;
use nomai_reflect::prelude::*;
use proptest::prelude::*;
use serde_json::json;

fn types() -> TypeRegistry {
    serde_json::from_value(json!([
        ["f32", { "kind": "opaque" }],
        ["u16", { "kind": "opaque" }],
        ["bool", { "kind": "opaque", "default": false }],
        ["alloc::string::String", { "kind": "opaque", "default": "" }],
        ["glam::Vec3", { "kind": "struct", "fields": [
            { "name": "x", "type": "f32" },
            { "name": "y", "type": "f32" },
            { "name": "z", "type": "f32" }
        ] }],
        ["game::Marker", { "kind": "struct", "fields": [] }],
        ["game::Health", { "kind": "tuple_struct", "fields": ["f32"] }],
        ["game::Range", { "kind": "tuple_struct", "fields": ["u16", "u16"] }],
        ["(f32, bool)", { "kind": "tuple", "fields": ["f32", "bool"] }],
        ["alloc::vec::Vec<glam::Vec3>", {
            "kind": "array", "item": "glam::Vec3", "capacity": null
        }],
        ["[game::Range; 2]", { "kind": "array", "item": "game::Range", "capacity": 2 }],
        ["game::Tags", { "kind": "set", "item": "alloc::string::String" }],
        ["game::Scores", { "kind": "map", "key": "alloc::string::String", "value": "f32" }],
        ["core::option::Option<f32>", { "kind": "enum", "variants": [
            { "kind": "unit", "name": "None" },
            { "kind": "tuple", "name": "Some", "fields": ["f32"] }
        ] }],
        ["game::Mode", { "kind": "enum", "variants": [
            { "kind": "tuple", "name": "Walk", "fields": ["f32", "f32"] },
            { "kind": "unit", "name": "Idle" }
        ] }],
        ["game::Shape", { "kind": "enum", "variants": [
            { "kind": "struct", "name": "Box", "fields": [
                { "name": "size", "type": "glam::Vec3" }, { "name": "solid", "type": "bool" }
            ] }
        ] }],
        ["game::Body", { "kind": "struct", "fields": [
            { "name": "shape", "type": "game::Shape" },
            { "name": "health", "type": "game::Health" },
            { "name": "mode", "type": "game::Mode" },
            { "name": "limits", "type": "[game::Range; 2]" },
            { "name": "pair", "type": "(f32, bool)" },
            { "name": "label", "type": "alloc::string::String" },
            { "name": "marker", "type": "game::Marker" },
            { "name": "tags", "type": "game::Tags" },
            { "name": "scores", "type": "game::Scores" },
            { "name": "boost", "type": "core::option::Option<f32>" },
            { "name": "path", "type": "alloc::vec::Vec<glam::Vec3>" }
        ] }],
    ]))
    .unwrap()
}

fn type_name_strategy() -> impl Strategy<Value = String> {
    let names: Vec<String> = types().iter().map(|(name, _)| name.to_owned()).collect();
    prop::sample::select(names)
}

fn sorted(mut addresses: Vec<Address>) -> Vec<Address> {
    addresses.sort();
    addresses
}

fn number_leaves(node: &EditorNode, out: &mut Vec<(Address, bool, bool)>) {
    if let NodeKind::Number { unsigned, integer, .. } = node.kind {
        if !node.read_only {
            out.push((node.address.clone(), unsigned, integer));
        }
    }
    for child in node.children() {
        number_leaves(child, out);
    }
}

proptest! {
    #[test]
    fn default_leaves_match_editor_leaves(type_name in type_name_strategy()) {
        let types = types();
        let Some(default) = resolve_default(&types, &type_name) else {
            return Ok(());
        };
        let session = EditSession::new(type_name.clone(), default.clone());
        let tree = session.render(EditorContext::new(&types));

        prop_assert!(tree.faults().is_empty(), "faults in {}: {:?}", type_name, tree.faults());
        prop_assert_eq!(sorted(tree.leaf_addresses()), sorted(leaf_addresses(&default)));
        prop_assert!(session.is_complete(EditorContext::new(&types)));
    }

    #[test]
    fn number_edits_keep_the_tree_valid(
        pick in any::<prop::sample::Index>(),
        whole in 0u16..1000,
        fraction in 0.0f64..1.0,
    ) {
        let types = types();
        let ctx = EditorContext::new(&types);
        let default = resolve_default(&types, "game::Body").unwrap();
        let mut session = EditSession::new("game::Body", default);

        let mut leaves = Vec::new();
        number_leaves(&session.render(ctx), &mut leaves);
        prop_assert!(!leaves.is_empty());
        let (address, _, integer) = leaves[pick.index(leaves.len())].clone();

        let value = if integer { f64::from(whole) } else { f64::from(whole) + fraction };
        session
            .apply(ctx, EditAction::SetNumber { address: address.clone(), value })
            .unwrap();

        let written = session.get(&address).and_then(|v| v.as_f64()).unwrap();
        prop_assert!((written - value).abs() < 1e-9);
        prop_assert!(session.render(ctx).faults().is_empty());
    }
}
