use serde_json::json;
use tome_validator::{Node, StructuredView, TopicData};

use crate::fixtures::create;

#[test]
fn delete_works_on_mutated_topics() {
    let topic = create(TopicData::Empty);
    topic.set("name", "hi").unwrap();
    assert!(topic.delete("name"));
    assert!(topic.get("name").is_undefined());
}

#[test]
fn delete_works_on_topics_created_with_data() {
    let topic = create(json!({ "name": "ohai" }));
    topic.delete("name");
    assert!(topic.get("name").is_undefined());

    let topic = create(Node::conjure(json!({ "name": "ohai" })));
    topic.delete("name");
    assert!(topic.get("name").is_undefined());
}

#[test]
fn deleting_an_absent_key_is_ignored() {
    let topic = create(TopicData::Empty);
    assert!(!topic.delete("name"));
    assert!(!topic.delete("name"));
    assert!(topic.keys().is_empty());

    topic.set("name", "hi").unwrap();
    topic.delete("name");
    topic.delete("name");
    assert!(topic.keys().is_empty());
}

#[test]
fn nested_values_are_deletable() {
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

    let child = topic.get("child").into_object().unwrap();
    let grandchild = child.get("children").get("0").into_object().unwrap();

    topic.delete("name");
    child.delete("childId");
    grandchild.delete("childId");
    grandchild.get("children").as_array().unwrap().pop();

    assert!(topic.get("name").is_undefined());
    assert!(topic.get("child").get("childId").is_undefined());
    assert!(topic
        .get("child")
        .get("children")
        .get("0")
        .get("childId")
        .is_undefined());
    assert_eq!(
        topic
            .get("child")
            .get("children")
            .get("0")
            .get("children")
            .get("length")
            .as_i64(),
        Some(0)
    );
}
