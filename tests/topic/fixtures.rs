use std::sync::Arc;

use serde_json::{json, Value};
use tome_validator::{
    ClassDef, FieldDef, Index, InMemoryVault, MediaType, ObjectView, Rule, State,
    StructuredView, TopicClass, TopicDef, TopicError, TopicsExt, TypeRegistry,
};

fn add_level(root: &ObjectView) -> Result<(), TopicError> {
    if !root.has("level") {
        root.set("level", 1i64)?;
    }
    Ok(())
}

fn rename_name(root: &ObjectView) -> Result<(), TopicError> {
    if let Some(name) = root.get("name").value_of() {
        root.set("displayName", name)?;
        root.delete("name");
    }
    Ok(())
}

fn key_check(key: &str, _: &Value) -> Result<(), String> {
    if key == "badkey" {
        return Err("bad key".into());
    }
    Ok(())
}

pub fn registry() -> Arc<TypeRegistry> {
    TypeRegistry::builder()
        .class(ClassDef::new("Child").field(FieldDef::new("id").rule(Rule::Positive)))
        .class(ClassDef::map_of("DynamicMap", "Child"))
        .topic(
            TopicDef::new(
                ClassDef::new("Player")
                    .field(FieldDef::new("name"))
                    .field(FieldDef::new("url").rule(Rule::Url).optional()),
            )
            .index_field("id", [Rule::NumberString]),
        )
        .topic(
            TopicDef::new(
                ClassDef::new("Inventory")
                    .field(FieldDef::new("items").with_default(json!([]))),
            )
            .index_field("playerId", [Rule::NumberString])
            .index_field("slot", [Rule::NumberString])
            .media_type(MediaType::Tome),
        )
        .topic(TopicDef::new(
            ClassDef::new("MapTopic")
                .field(FieldDef::new("map").of("DynamicMap").nested())
                .field(FieldDef::new("anonymousMap").map_of("Child").key_check(key_check)),
        ))
        .topic(
            TopicDef::new(ClassDef::new("Profile").field(FieldDef::new("displayName")))
                .index_field("id", [Rule::NumberString])
                .migration(1, add_level)
                .migration(2, rename_name),
        )
        .build()
        .unwrap()
}

pub fn state() -> State {
    State::new(Arc::new(InMemoryVault::new()))
}

pub fn topic(name: &str) -> TopicClass {
    registry().topic(name).unwrap()
}

pub fn id(id: &str) -> Index {
    Index::from([("id", id)])
}
