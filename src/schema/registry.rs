use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::class::{ClassDef, Method};
use super::topic_def::TopicDef;
use super::TypeTag;
use crate::loader::{DiscoveredTopic, TopicCatalog};

/// Error type for registry construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two classes (or a class and a topic) share a name.
    DuplicateClass(String),
    /// A field or map declaration references a class that was never registered.
    UnknownClass {
        owner: String,
        field: String,
        class: String,
    },
    /// A topic found on disk has no registered definition.
    MissingTopic { topic: String, module: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateClass(name) => write!(f, "class {} is already registered", name),
            RegistryError::UnknownClass {
                owner,
                field,
                class,
            } => write!(
                f,
                "{}.{} references unregistered class {}",
                owner, field, class
            ),
            RegistryError::MissingTopic { topic, module } => write!(
                f,
                "topic {} discovered in module {} has no definition",
                topic, module
            ),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Immutable lookup table of classes and topics.
pub struct TypeRegistry {
    classes: HashMap<Arc<str>, ClassDef>,
    topics: HashMap<Arc<str>, Arc<TopicDef>>,
}

impl TypeRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    pub fn topic_def(&self, name: &str) -> Option<&Arc<TopicDef>> {
        self.topics.get(name)
    }

    pub fn topic_names(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(|name| name.as_ref())
    }

    /// Declared type of `key` on instances of `owner`.
    pub fn lookup(&self, owner: &TypeTag, key: &str) -> Option<TypeTag> {
        match owner {
            TypeTag::Class(name) => {
                let class = self.classes.get(name)?;
                if let Some(element) = class.map_element() {
                    return Some(TypeTag::Class(element.clone()));
                }
                class.get_field(key).and_then(|field| field.ty().cloned())
            }
            TypeTag::MapOf(element) => Some(TypeTag::Class(element.clone())),
            TypeTag::Object | TypeTag::Array => None,
        }
    }

    /// Method `name` declared on `owner`'s class.
    pub fn method(&self, owner: &TypeTag, name: &str) -> Option<Method> {
        owner
            .class_name()
            .and_then(|class| self.classes.get(class))
            .and_then(|class| class.get_method(name))
    }
}

/// Collects class and topic declarations, then validates them into a registry.
#[derive(Default)]
pub struct RegistryBuilder {
    classes: Vec<ClassDef>,
    topics: Vec<TopicDef>,
    discovered: Vec<DiscoveredTopic>,
}

impl RegistryBuilder {
    pub fn class(mut self, class: ClassDef) -> Self {
        self.classes.push(class);
        self
    }

    pub fn topic(mut self, topic: TopicDef) -> Self {
        self.topics.push(topic);
        self
    }

    /// Require a definition for every topic in `catalog`, and tag each
    /// definition with the module it was found in.
    pub fn require_catalog(mut self, catalog: &TopicCatalog) -> Self {
        self.discovered.extend(catalog.topics().cloned());
        self
    }

    pub fn build(self) -> Result<Arc<TypeRegistry>, RegistryError> {
        let mut classes: HashMap<Arc<str>, ClassDef> = HashMap::new();
        let mut topics: HashMap<Arc<str>, Arc<TopicDef>> = HashMap::new();

        for class in self.classes {
            let name = class.name_arc().clone();
            if classes.insert(name.clone(), class).is_some() {
                return Err(RegistryError::DuplicateClass(name.to_string()));
            }
        }

        let mut topic_defs = self.topics;
        for found in &self.discovered {
            let def = topic_defs
                .iter_mut()
                .find(|def| def.name() == found.name)
                .ok_or_else(|| RegistryError::MissingTopic {
                    topic: found.name.clone(),
                    module: found.module.clone(),
                })?;
            def.set_module(found.module.clone());
        }

        for topic in topic_defs {
            let name = topic.class().name_arc().clone();
            if classes.insert(name.clone(), topic.class().clone()).is_some() {
                return Err(RegistryError::DuplicateClass(name.to_string()));
            }
            topics.insert(name, Arc::new(topic));
        }

        for class in classes.values() {
            if let Some(element) = class.map_element() {
                if !classes.contains_key(element) {
                    return Err(RegistryError::UnknownClass {
                        owner: class.name().to_string(),
                        field: "*".to_string(),
                        class: element.to_string(),
                    });
                }
            }
            for field in class.fields() {
                let referenced = match field.ty() {
                    Some(TypeTag::Class(name)) | Some(TypeTag::MapOf(name)) => name,
                    _ => continue,
                };
                if !classes.contains_key(referenced) {
                    return Err(RegistryError::UnknownClass {
                        owner: class.name().to_string(),
                        field: field.name().to_string(),
                        class: referenced.to_string(),
                    });
                }
            }
        }

        debug!(
            classes = classes.len(),
            topics = topics.len(),
            "type registry built"
        );

        Ok(Arc::new(TypeRegistry { classes, topics }))
    }
}
