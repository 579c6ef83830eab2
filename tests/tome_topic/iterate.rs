use serde_json::json;
use tome_validator::{Assigned, Slot, StructuredView, TopicData};

use crate::fixtures::{create, test_tome_type};

const WORDS: [&str; 4] = ["a", "list", "of", "words"];

fn with_children() -> tome_validator::Topic {
    let topic = create(TopicData::Empty);
    topic
        .set("children", json!([{ "childId": "1" }, { "childId": "3" }]))
        .unwrap();
    topic
}

fn append_zero(entry: &Slot) {
    let child = entry.as_object().unwrap();
    let id = child.get("childId").as_str().unwrap_or_default().to_string();
    child.set("childId", format!("{}0", id)).unwrap();
}

fn assert_appended(topic: &tome_validator::Topic) {
    assert_eq!(topic.get("children").get("0").get("childId").as_str(), Some("10"));
    assert_eq!(topic.get("children").get("1").get("childId").as_str(), Some("30"));
}

#[test]
fn values_lists_top_level_values() {
    let topic = create(TopicData::Empty);
    topic.set("name", "hello").unwrap();
    topic.set("list", json!(["1"])).unwrap();

    let values = topic.root().values();
    assert_eq!(values[0].as_str(), Some("hello"));
    assert_eq!(values[1].get("0").as_str(), Some("1"));
}

#[test]
fn values_lists_nested_values() {
    let topic = create(TopicData::Empty);
    topic
        .set("child", Assigned::typed(json!({}), test_tome_type()))
        .unwrap();
    let child = topic.get("child").into_object().unwrap();
    child.set("childId", "2").unwrap();
    child.set("list", json!(["1"])).unwrap();

    let values = child.values();
    assert_eq!(values[0].as_str(), Some("2"));
    assert_eq!(values[1].get("0").as_str(), Some("1"));
}

#[test]
fn keys_are_the_stored_fields() {
    let topic = create(TopicData::Empty);
    topic.set("list", json!([])).unwrap();
    topic.set("children", json!([])).unwrap();

    assert_eq!(topic.keys(), vec!["list", "children"]);
    assert_eq!(topic.own_keys(), vec!["list", "children"]);
}

#[test]
fn nested_keys() {
    let topic = create(TopicData::Empty);
    topic
        .set("child", Assigned::typed(json!({ "childId": "1" }), test_tome_type()))
        .unwrap();
    topic.set("list", json!(["1"])).unwrap();

    assert_eq!(topic.get("child").as_object().unwrap().keys(), vec!["childId"]);
    assert_eq!(topic.get("list").as_array().unwrap().keys(), vec!["0"]);
}

#[test]
fn iterating_literals() {
    let topic = create(TopicData::Empty);
    topic.set("list", json!(WORDS)).unwrap();

    let list = topic.get("list").into_array().unwrap();
    let seen: Vec<String> = (&list)
        .into_iter()
        .map(|entry| entry.as_str().unwrap().to_string())
        .collect();
    assert_eq!(seen, WORDS);

    for (i, entry) in list.entries() {
        assert_eq!(entry.as_str(), Some(WORDS[i]));
    }
}

#[test]
fn iterating_objects() {
    let topic = with_children();
    let ids: Vec<String> = topic
        .get("children")
        .into_array()
        .unwrap()
        .iter()
        .map(|entry| entry.get("childId").as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["1", "3"]);
}

#[test]
fn mutating_objects_while_iterating() {
    let topic = with_children();
    for entry in &topic.get("children").into_array().unwrap() {
        append_zero(&entry);
    }
    assert_appended(&topic);

    let topic = with_children();
    for (_, entry) in topic.get("children").into_array().unwrap().entries() {
        append_zero(&entry);
    }
    assert_appended(&topic);
}

#[test]
fn for_each_delivers_writable_views() {
    let topic = with_children();
    topic
        .get("children")
        .as_array()
        .unwrap()
        .for_each(|entry, _| append_zero(&entry));
    assert_appended(&topic);
}

#[test]
fn map_passes_return_values_through() {
    let topic = create(TopicData::Empty);
    topic.set("list", json!(WORDS)).unwrap();

    let res = topic
        .get("list")
        .as_array()
        .unwrap()
        .map(|entry, _| format!("{} good", entry.as_str().unwrap()));
    assert_eq!(res, vec!["a good", "list good", "of good", "words good"]);
}

#[test]
fn includes_compares_plain_values() {
    let topic = create(json!({ "list": ["1"] }));
    let list = topic.get("list").into_array().unwrap();
    assert!(list.includes(&json!("1")));
    assert!(!list.includes(&json!(1)));

    let topic = with_children();
    let children = topic.get("children").into_array().unwrap();
    assert!(children.includes(&json!({ "childId": "3" })));
}

#[test]
fn find_and_filter_return_views() {
    let topic = with_children();
    let children = topic.get("children").into_array().unwrap();

    assert!(children
        .find(|entry, _| entry.get("childId").as_str() == Some("nope"))
        .is_none());

    let found = children
        .find(|entry, _| entry.get("childId").as_str() == Some("3"))
        .unwrap();
    found.as_object().unwrap().set("childId", "4").unwrap();
    assert_eq!(topic.get("children").get("1").get("childId").as_str(), Some("4"));

    let kept = children.filter(|entry, _| entry.get("childId").as_str() == Some("1"));
    assert_eq!(kept.len(), 1);
    kept[0].as_object().unwrap().set("childId", "5").unwrap();
    assert_eq!(topic.get("children").get("0").get("childId").as_str(), Some("5"));
}

#[test]
fn popping_a_child() {
    let topic = create(json!({ "children": [{ "childId": "1" }] }));
    let popped = topic.get("children").as_array().unwrap().pop();
    assert_eq!(popped.get("childId").as_str(), Some("1"));
    assert_eq!(topic.get("children").get("length").as_i64(), Some(0));
}
