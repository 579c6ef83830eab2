use serde_json::json;
use tome_validator::{StructuredView, TopicData};

use crate::fixtures::create_topic;

#[test]
fn to_string_is_json() {
    let topic = create_topic("TestTopic", TopicData::Empty);
    topic.set("name", "my name").unwrap();
    topic.set("list", json!(["b", "c"])).unwrap();
    topic.set("num", 1i64).unwrap();

    let expected = r#"{"name":"my name","list":["b","c"],"num":1}"#;
    assert_eq!(topic.to_string(), expected);
    assert_eq!(
        topic.get("@@toStringTag").as_intrinsic().unwrap().call(&[]),
        json!(expected)
    );
    assert_eq!(
        topic.get("list").get("toString").as_intrinsic().unwrap().call(&[]),
        json!(r#"["b","c"]"#)
    );
}

#[test]
fn inspect_names_the_topic() {
    let topic = create_topic("TestTopic", TopicData::Empty);
    topic.set("name", "my name").unwrap();
    topic.set("list", json!(["b", "c"])).unwrap();

    let expanded = "TestTopic -> { name: 'my name', list: [ 'b', 'c' ] }";
    assert_eq!(
        topic.inspect(0),
        "TestTopic -> { name: 'my name', list: [Array] }"
    );
    assert_eq!(topic.inspect(1), expanded);
    assert_eq!(
        topic.get("@@inspect").as_intrinsic().unwrap().call(&[]),
        json!(expanded)
    );
}

#[test]
fn debug_output_uses_known_class_names() {
    let topic = create_topic(
        "TestTopic",
        json!({ "super": { "duper": { "nested": ["1"] } } }),
    );

    assert_eq!(
        format!("{:?}", topic),
        "TestTopic -> { super: { duper: { nested: [Array] } } }"
    );

    let sub = topic.get("super").into_object().unwrap();
    assert_eq!(
        format!("{:?}", sub),
        "SubClass -> { duper: { nested: [ '1' ] } }"
    );
    assert_eq!(
        format!("{:?}", sub.get("duper").into_object().unwrap()),
        "Object -> { nested: [ '1' ] }"
    );
    assert_eq!(
        format!("{:?}", sub.get("duper").get("nested").into_array().unwrap()),
        "Array -> [ '1' ]"
    );
}
