//! Property tests: documents hand back exactly the data they were built from.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{Map, Value};
use tome_validator::{wrap, Node, StructuredView, TypeRegistry};

fn registry() -> Arc<TypeRegistry> {
    TypeRegistry::builder().build().unwrap()
}

/// Arbitrary JSON without floats, nested a few levels deep.
fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z0-9 ]{0,8}".prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("k[a-z]{0,5}", inner, 0..6)
                .prop_map(|map| Value::Object(map.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn arb_object() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("k[a-z]{0,5}", arb_json(), 0..6)
        .prop_map(|map| map.into_iter().collect())
}

proptest! {
    #[test]
    fn wrapped_documents_read_back_unchanged(value in arb_json()) {
        let slot = wrap(Node::conjure(value.clone()), None, &registry());
        prop_assert_eq!(slot.value_of(), Some(value));
    }

    #[test]
    fn to_json_parses_back_to_the_source(object in arb_object()) {
        let source = Value::Object(object);
        let slot = wrap(Node::conjure(source.clone()), None, &registry());
        let parsed: Value = serde_json::from_str(&slot.as_object().unwrap().to_json()).unwrap();
        prop_assert_eq!(parsed, source);
    }

    #[test]
    fn assignments_land_in_the_plain_value(
        object in arb_object(),
        key in "k[a-z]{0,5}",
        value in arb_json(),
    ) {
        let slot = wrap(Node::conjure(Value::Object(object.clone())), None, &registry());
        let view = slot.as_object().unwrap();
        view.set(&key, value.clone()).unwrap();

        let mut expected = object;
        expected.insert(key, value);
        prop_assert_eq!(view.value_of(), Value::Object(expected));
    }
}
