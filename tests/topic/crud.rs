use serde_json::json;
use tome_validator::{
    ArchivistError, DiffOp, GetOptions, MediaType, OperationKind, StructuredView, TopicData,
    TopicError, WriteOptions,
};

use crate::fixtures::{id, state, topic};

#[test]
fn add_then_get_through_a_new_state() {
    let players = topic("Player");
    let state = state();
    let player = players.create(&state, id("1"), json!({ "name": "ohai" })).unwrap();
    player.record_add(WriteOptions::default()).unwrap();
    state.distribute().unwrap();

    let loaded = players.get(&state.sibling(), id("1")).unwrap();
    assert_eq!(loaded.value_of(), json!({ "name": "ohai" }));
    assert_eq!(loaded.index(), &id("1"));
}

#[test]
fn adding_twice_fails_the_distribution() {
    let players = topic("Player");
    let state = state();
    let player = players.create(&state, id("1"), TopicData::Empty).unwrap();

    player.record_add(WriteOptions::default()).unwrap();
    state.distribute().unwrap();
    player.record_add(WriteOptions::default()).unwrap();

    let err = state.distribute().unwrap_err();
    assert!(matches!(err, ArchivistError::AlreadyExists { .. }));
}

#[test]
fn set_overwrites_and_is_visible_before_distribution() {
    let players = topic("Player");
    let state = state();
    let player = players.create(&state, id("1"), json!({ "name": "a" })).unwrap();
    player.record_set(WriteOptions::default()).unwrap();

    player.set("name", "b").unwrap();
    player.record_set(WriteOptions::default()).unwrap();
    assert_eq!(state.staged().len(), 1);

    let staged = players.get(&state, id("1")).unwrap();
    assert_eq!(staged.get("name").as_str(), Some("b"));
}

#[test]
fn writes_are_validated() {
    let players = topic("Player");
    let state = state();
    let player = players.create(&state, id("1"), json!({ "url": "hi" })).unwrap();

    for (result, message) in [
        (player.record_add(WriteOptions::default()), "Validation failed on add"),
        (player.record_set(WriteOptions::default()), "Validation failed on set"),
        (player.record_touch(None), "Validation failed on touch"),
    ] {
        assert_eq!(result.unwrap_err().as_validation().unwrap().message, message);
    }
    assert!(state.staged().is_empty());
}

#[test]
fn touch_in_the_past_expires_the_value() {
    let players = topic("Player");
    let state = state();
    let player = players.create(&state, id("1"), TopicData::Empty).unwrap();
    player.record_set(WriteOptions::default()).unwrap();
    state.distribute().unwrap();

    player.record_touch(Some(1)).unwrap();
    assert_eq!(state.staged()[0].kind, OperationKind::Touch);
    state.distribute().unwrap();

    assert!(players.try_get(&state.sibling(), id("1")).unwrap().is_none());
}

#[test]
fn del_removes_the_value() {
    let players = topic("Player");
    let state = state();
    let player = players.create(&state, id("1"), TopicData::Empty).unwrap();
    player.record_set(WriteOptions::default()).unwrap();
    state.distribute().unwrap();

    player.record_del();
    assert!(players
        .fetch(&state, id("1"), GetOptions::optional())
        .unwrap()
        .is_none());
    state.distribute().unwrap();

    let err = players.get(&state.sibling(), id("1")).unwrap_err();
    assert!(matches!(err, TopicError::Archivist(ArchivistError::NotFound { .. })));
}

#[test]
fn tome_topics_stage_their_diff() {
    let inventories = topic("Inventory");
    let state = state();
    let index = tome_validator::Index::from([("playerId", "1"), ("slot", "2")]);
    let inventory = inventories.create(&state, index, TopicData::Empty).unwrap();
    assert_eq!(inventory.media_type(), MediaType::Tome);

    inventory.data().read_diff();
    inventory
        .get("items")
        .as_array()
        .unwrap()
        .push("sword")
        .unwrap();
    inventory.record_set(WriteOptions::default()).unwrap();

    let staged = state.staged();
    assert_eq!(staged[0].media_type, MediaType::Tome);
    assert_eq!(staged[0].diff.len(), 1);
    assert_eq!(staged[0].diff[0].path, vec!["items", "0"]);
    assert_eq!(staged[0].diff[0].op, DiffOp::Set(json!("sword")));
    assert!(!inventory.data().is_dirty());
}

#[test]
fn media_type_can_be_overridden_per_write() {
    let players = topic("Player");
    let state = state();
    let player = players.create(&state, id("1"), TopicData::Empty).unwrap();
    player
        .record_set(WriteOptions {
            media_type: Some(MediaType::Tome),
            expiration_time: None,
        })
        .unwrap();
    assert_eq!(state.staged()[0].media_type, MediaType::Tome);
}
