use serde_json::json;
use tome_validator::{Index, Node, StructuredView, TopicData, TopicsExt, TypeTag};

use crate::fixtures::{create, create_topic, registry, state};

#[test]
fn can_be_created_without_data() {
    let topic = create_topic("DefaultTomeTopic", TopicData::Empty);
    assert_eq!(topic.get("defaultValue").as_i64(), Some(1));
    assert!(topic.get("name").is_undefined());
    assert_eq!(topic.get("children").as_array().map(|a| a.len()), Some(0));
}

#[test]
fn can_be_created_with_plain_data() {
    let topic = create(json!({ "name": "ohai" }));
    assert_eq!(topic.get("name").as_str(), Some("ohai"));
}

#[test]
fn defaults_do_not_overwrite_existing_values() {
    let topic = create_topic("DefaultTomeTopic", json!({ "defaultValue": 3 }));
    assert_eq!(topic.get("defaultValue").as_i64(), Some(3));
}

#[test]
fn can_be_created_with_a_document() {
    let root = Node::conjure(json!({ "name": "ohai" }));
    let topic = create(root.clone());
    assert_eq!(topic.get("name").as_str(), Some("ohai"));
    assert!(topic.data().ptr_eq(&root));
}

#[test]
fn document_children_are_typed() {
    let root = Node::conjure(json!({ "name": "ohai", "children": [{ "childId": "1" }] }));
    let topic = create(root);
    let children = topic.get("children").into_array().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children.at(0).get("childId").as_str(), Some("1"));
    assert_eq!(
        children.at(0).as_object().unwrap().constructor(),
        TypeTag::class("TestTome")
    );
}

#[test]
fn nested_data_is_accessible() {
    let topic = create(Node::conjure(json!({
        "name": "ohai",
        "url": "http://google.com",
        "child": {
            "childId": "2",
            "children": [{
                "childId": "3",
                "children": [{ "childId": "4" }]
            }]
        }
    })));

    let child = topic.get("child");
    assert_eq!(child.get("childId").as_str(), Some("2"));
    assert_eq!(
        child.get("children").get("constructor").as_type(),
        Some(&TypeTag::Array)
    );
    assert_eq!(child.get("children").get("0").get("childId").as_str(), Some("3"));
    assert_eq!(
        child
            .get("children")
            .get("0")
            .get("children")
            .get("0")
            .get("childId")
            .as_str(),
        Some("4")
    );
}

#[test]
fn untyped_objects_read_as_generic_objects() {
    let topic = create(json!({
        "name": "ohai",
        "whatever": { "a": { "b": "hello" } }
    }));
    assert_eq!(topic.get("whatever").get("a").get("b").as_str(), Some("hello"));

    topic.set("untyped", json!({ "a": { "b": "x" } })).unwrap();
    let untyped = topic.get("untyped");
    assert_eq!(untyped.get("a").get("b").as_str(), Some("x"));
    assert_eq!(untyped.get("constructor").as_type(), Some(&TypeTag::Object));
}

#[test]
fn invalid_index_fails_creation() {
    let err = registry()
        .topic("TestTomeTopic")
        .unwrap()
        .create(&state(), Index::from([("id", "hello")]), TopicData::Empty)
        .unwrap_err();
    let validation = err.as_validation().unwrap();
    assert_eq!(validation.message, "Index validation failed");
    assert_eq!(validation.details.topic.as_deref(), Some("TestTomeTopic"));
    assert_eq!(validation.details.index, Some(Index::from([("id", "hello")])));
}

#[test]
fn non_object_data_is_rejected() {
    let result = registry()
        .topic("TestTomeTopic")
        .unwrap()
        .create(&state(), Index::from([("id", "1")]), json!([1, 2]));
    assert!(result.is_err());
}
