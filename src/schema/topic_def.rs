use std::collections::BTreeMap;

use super::class::ClassDef;
use super::rule::{Constraint, Rule};
use crate::archivist::MediaType;
use crate::error::TopicError;
use crate::view::ObjectView;

/// A schema migration step, applied to the topic root before its `_version`
/// is bumped to the step's version.
pub type Migration = fn(root: &ObjectView) -> Result<(), TopicError>;

/// One field of a topic's index.
#[derive(Debug, Clone)]
pub struct IndexField {
    name: String,
    constraints: Vec<Constraint>,
}

impl IndexField {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

/// A persisted topic: its class, index shape, media type and migrations.
#[derive(Clone)]
pub struct TopicDef {
    class: ClassDef,
    index: Vec<IndexField>,
    media_type: MediaType,
    migrations: BTreeMap<u32, Migration>,
    module: Option<String>,
}

impl TopicDef {
    pub fn new(class: ClassDef) -> Self {
        TopicDef {
            class,
            index: Vec::new(),
            media_type: MediaType::Tome,
            migrations: BTreeMap::new(),
            module: None,
        }
    }

    /// Declare an index field and the rules its value must satisfy.
    pub fn index_field(mut self, name: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Self {
        let name = name.into();
        self.index.retain(|f| f.name != name);
        self.index.push(IndexField {
            name,
            constraints: rules.into_iter().map(Constraint::new).collect(),
        });
        self
    }

    pub fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    pub fn migration(mut self, version: u32, migration: Migration) -> Self {
        self.migrations.insert(version, migration);
        self
    }

    pub(crate) fn set_module(&mut self, module: impl Into<String>) {
        self.module = Some(module.into());
    }

    pub fn name(&self) -> &str {
        self.class.name()
    }

    pub fn class(&self) -> &ClassDef {
        &self.class
    }

    pub fn index_fields(&self) -> &[IndexField] {
        &self.index
    }

    pub fn get_media_type(&self) -> MediaType {
        self.media_type
    }

    /// Module the topic was discovered in, if loaded from a catalog.
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// Highest declared migration version.
    pub fn latest_version(&self) -> Option<u32> {
        self.migrations.keys().next_back().copied()
    }

    /// Migrations newer than `version`, in ascending order.
    pub fn migrations_after(&self, version: u32) -> impl Iterator<Item = (u32, Migration)> + '_ {
        self.migrations
            .range(version.saturating_add(1)..)
            .map(|(v, m)| (*v, *m))
    }
}
