use serde_json::json;
use tome_validator::{Assigned, StructuredView, Topic, TopicData};

use crate::fixtures::{create, test_tome_type};

const MESSAGE: &str = "Validation failed";

fn assert_failed_validation(topic: &Topic) {
    let err = topic.validate_with(MESSAGE, "server").unwrap_err();
    assert_eq!(err.as_validation().unwrap().message, MESSAGE);
}

fn with_url() -> Topic {
    let topic = create(TopicData::Empty);
    topic.set("url", "https://google.com").unwrap();
    topic
}

#[test]
fn top_level_valid() {
    with_url().validate().unwrap();
}

#[test]
fn top_level_invalid() {
    let topic = create(TopicData::Empty);
    topic.set("url", "hi").unwrap();
    assert_failed_validation(&topic);
}

#[test]
fn missing_url_is_invalid() {
    let topic = create(TopicData::Empty);
    let err = topic.validate().unwrap_err();
    let validation = err.as_validation().unwrap();
    assert_eq!(validation.violations.len(), 1);

    let url = validation.violation("url").unwrap();
    assert_eq!(url.value, None);
    assert_eq!(
        url.constraints.get("isUrl").map(String::as_str),
        Some("url must be an URL address")
    );
}

#[test]
fn child_object_valid() {
    let topic = with_url();
    topic
        .set("child", Assigned::typed(json!({ "childId": "1" }), test_tome_type()))
        .unwrap();
    topic.validate().unwrap();
}

#[test]
fn child_object_invalid() {
    let topic = create(TopicData::Empty);
    topic
        .set(
            "child",
            Assigned::typed(json!({ "childId": "not a string number" }), test_tome_type()),
        )
        .unwrap();
    assert_failed_validation(&topic);

    let err = topic.validate().unwrap_err();
    assert!(err.as_validation().unwrap().violation("child.childId").is_some());
}

#[test]
fn child_array_valid() {
    let topic = with_url();
    topic.set("list", json!(["1"])).unwrap();
    topic.validate().unwrap();
}

#[test]
fn child_array_invalid() {
    let topic = create(TopicData::Empty);
    topic.set("list", json!(["invalid"])).unwrap();
    assert_failed_validation(&topic);
}

#[test]
fn child_array_of_objects_valid() {
    let topic = with_url();
    topic.set("children", json!([])).unwrap();
    topic
        .get("children")
        .as_array()
        .unwrap()
        .push(Assigned::typed(json!({ "childId": "1" }), test_tome_type()))
        .unwrap();
    topic.validate().unwrap();
}

#[test]
fn child_array_of_objects_invalid() {
    let topic = with_url();
    topic.set("children", json!([])).unwrap();
    topic
        .get("children")
        .as_array()
        .unwrap()
        .push(Assigned::typed(
            json!({ "childId": "not a string number" }),
            test_tome_type(),
        ))
        .unwrap();
    assert_failed_validation(&topic);

    let err = topic.validate().unwrap_err();
    assert!(err
        .as_validation()
        .unwrap()
        .violation("children.0.childId")
        .is_some());
}

#[test]
fn typed_value_on_an_untyped_field_validates_as_its_type() {
    let topic = create(TopicData::Empty);
    topic
        .set(
            "untypedChild",
            Assigned::typed(json!({ "childId": "not a string number" }), test_tome_type()),
        )
        .unwrap();

    let untyped = topic.get("untypedChild").into_object().unwrap();
    assert_eq!(untyped.validate().len(), 1);
}
