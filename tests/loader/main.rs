use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tome_validator::{
    ClassDef, LoaderConfig, LoaderError, RegistryError, TopicCatalog, TopicDef, TypeRegistry,
};

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

/// moduleOne has no topics directory, moduleTwo an empty one and
/// moduleThree a single topic next to a file of another kind.
fn modules() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("moduleOne")).unwrap();
    fs::create_dir_all(root.join("moduleTwo/topics")).unwrap();
    touch(&root.join("moduleThree/topics/topicOne.rs"));
    touch(&root.join("moduleThree/topics/notes.js"));
    dir
}

#[test]
fn modules_without_topics_are_skipped() {
    let dir = modules();
    let config = LoaderConfig::new(dir.path());
    let mut catalog = TopicCatalog::new();

    assert_eq!(catalog.load_module(&config, "moduleZero").unwrap(), 0);
    assert_eq!(catalog.load_module(&config, "moduleOne").unwrap(), 0);
    assert_eq!(catalog.load_module(&config, "moduleTwo").unwrap(), 0);
    assert!(catalog.is_empty());

    assert_eq!(catalog.load_module(&config, "moduleThree").unwrap(), 1);
    let found = catalog.get("topicOne").unwrap();
    assert_eq!(found.module, "moduleThree");
}

#[test]
fn every_module_is_loaded() {
    let dir = modules();
    touch(&dir.path().join("moduleFour/topics/topicTwo.rs"));
    let config = LoaderConfig::new(dir.path());

    let mut catalog = TopicCatalog::new();
    assert_eq!(catalog.load_modules(&config).unwrap(), 2);

    let names: Vec<_> = catalog.topics().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["topicTwo", "topicOne"]);
}

#[test]
fn duplicate_topics_across_modules_fail() {
    let dir = modules();
    touch(&dir.path().join("moduleFour/topics/topicOne.rs"));
    let config = LoaderConfig::new(dir.path());

    let err = TopicCatalog::new().load_modules(&config).unwrap_err();
    assert_eq!(
        err,
        LoaderError::DuplicateTopic {
            topic: "topicOne".into(),
            module: "moduleThree".into(),
            already_defined_by: "moduleFour".into(),
        }
    );
    assert!(err.to_string().starts_with("Topic is already defined!"));
}

#[test]
fn discovered_topics_need_a_definition() {
    let dir = modules();
    let mut catalog = TopicCatalog::new();
    catalog
        .load_modules(&LoaderConfig::new(dir.path()))
        .unwrap();

    let err = TypeRegistry::builder()
        .require_catalog(&catalog)
        .build()
        .err()
        .unwrap();
    assert_eq!(
        err,
        RegistryError::MissingTopic {
            topic: "topicOne".into(),
            module: "moduleThree".into(),
        }
    );

    let registry = TypeRegistry::builder()
        .topic(TopicDef::new(ClassDef::new("topicOne")))
        .require_catalog(&catalog)
        .build()
        .unwrap();
    let def = registry.topic_def("topicOne").unwrap();
    assert_eq!(def.module(), Some("moduleThree"));
}

#[test]
fn config_is_read_from_disk() {
    let dir = modules();
    fs::create_dir_all(dir.path().join("moduleThree/schemas")).unwrap();
    touch(&dir.path().join("moduleThree/schemas/topicThree.json"));

    let config_path = dir.path().join("loader.json");
    let config_json = serde_json::json!({
        "modulesDir": dir.path(),
        "topicsDir": "schemas",
        "extension": "json",
    });
    fs::write(&config_path, config_json.to_string()).unwrap();

    let config = LoaderConfig::from_path(&config_path).unwrap();
    let mut catalog = TopicCatalog::new();
    assert_eq!(catalog.load_modules(&config).unwrap(), 1);
    assert!(catalog.get("topicThree").is_some());
    assert!(catalog.get("topicOne").is_none());
}
