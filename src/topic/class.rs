use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::instance::Topic;
use super::lock::LOCK_FIELD;
use super::migrate::VERSION_KEY;
use crate::archivist::{ArchivistError, GetOptions, Index, ListOptions, Query, State};
use crate::document::Node;
use crate::error::{ErrorDetails, TopicError, ValidationError};
use crate::schema::{check_field, Presence, TopicDef, TypeRegistry, TypeTag};

/// Data handed to [`TopicClass::create`].
#[derive(Debug, Clone)]
pub enum TopicData {
    /// A fresh instance, carrying its declared defaults.
    Empty,
    /// A plain object.
    Plain(Value),
    /// An existing document, used as the root as-is.
    Document(Node),
}

impl From<Value> for TopicData {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => TopicData::Empty,
            value => TopicData::Plain(value),
        }
    }
}

impl From<Option<Value>> for TopicData {
    fn from(value: Option<Value>) -> Self {
        value.map_or(TopicData::Empty, TopicData::from)
    }
}

impl From<Node> for TopicData {
    fn from(node: Node) -> Self {
        TopicData::Document(node)
    }
}

/// Look up registered topics by name.
pub trait TopicsExt {
    fn topic(&self, name: &str) -> Result<TopicClass, TopicError>;
}

impl TopicsExt for Arc<TypeRegistry> {
    fn topic(&self, name: &str) -> Result<TopicClass, TopicError> {
        TopicClass::new(self, name)
    }
}

/// The static side of a registered topic.
#[derive(Clone)]
pub struct TopicClass {
    registry: Arc<TypeRegistry>,
    def: Arc<TopicDef>,
}

impl TopicClass {
    pub fn new(registry: &Arc<TypeRegistry>, name: &str) -> Result<Self, TopicError> {
        let def = registry
            .topic_def(name)
            .cloned()
            .ok_or_else(|| TopicError::UnknownTopic(name.to_string()))?;
        Ok(TopicClass {
            registry: registry.clone(),
            def,
        })
    }

    pub fn name(&self) -> &str {
        self.def.name()
    }

    pub fn def(&self) -> &TopicDef {
        &self.def
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn tag(&self) -> TypeTag {
        TypeTag::class(self.name())
    }

    /// Check `index` against the declared index fields, keeping only those
    /// fields. Topics declaring no index fields accept any index.
    pub fn validate_index(&self, state: &State, index: &Index) -> Result<Index, TopicError> {
        let fields = self.def.index_fields();
        if fields.is_empty() {
            return Ok(index.clone());
        }

        let mut validated = Index::new();
        let mut violations = Vec::new();
        for field in fields {
            let value = index.get(field.name());
            let presence = if field.constraints().is_empty() {
                Presence::Optional
            } else {
                Presence::Required
            };
            if let Some(violation) =
                check_field(field.name(), field.name(), value, field.constraints(), presence)
            {
                violations.push(violation);
            }
            if let Some(value) = value {
                validated.insert(field.name(), value.clone());
            }
        }

        if violations.is_empty() {
            return Ok(validated);
        }

        warn!(topic = %self.name(), index = %index, "index validation failed");
        let details = ErrorDetails {
            actor_id: state.actor_id().map(str::to_string),
            user_command: state.description().map(str::to_string),
            topic: Some(self.name().to_string()),
            index: Some(index.clone()),
            received_data: None,
        };
        Err(ValidationError::new("Index validation failed", "server", details)
            .with_violations(violations)
            .into())
    }

    /// Build an instance over `data`.
    ///
    /// Without data, the root receives the declared field defaults and, for
    /// topics with migrations, the latest `_version`.
    pub fn create(
        &self,
        state: &State,
        index: Index,
        data: impl Into<TopicData>,
    ) -> Result<Topic, TopicError> {
        let (root, fresh) = match data.into() {
            TopicData::Empty => (Node::conjure(Value::Object(Map::new())), true),
            TopicData::Plain(value @ Value::Object(_)) => (Node::conjure(value), false),
            TopicData::Plain(other) => {
                return Err(TopicError::InvalidData(format!(
                    "Received data is not an object (received {})",
                    other
                )))
            }
            TopicData::Document(node) if node.is_object() => (node, false),
            TopicData::Document(node) => {
                return Err(TopicError::InvalidData(format!(
                    "Received data is not an object (received {})",
                    node.value_of()
                )))
            }
        };

        let index = self.validate_index(state, &index)?;
        let topic = Topic::new(self.clone(), root, index, state.clone());

        if fresh {
            topic.apply_defaults(self.def.class().defaults())?;
            if let Some(version) = self.def.latest_version() {
                topic.apply_defaults(Map::from_iter([(
                    VERSION_KEY.to_string(),
                    Value::from(version),
                )]))?;
            }
        }

        debug!(topic = %self.name(), index = %topic.index(), "topic instance created");
        Ok(topic)
    }

    fn load(&self, state: &State, index: Index, data: Value) -> Result<Topic, TopicError> {
        let topic = self.create(state, index, TopicData::Plain(data))?;
        if topic.version()? < self.def.latest_version().unwrap_or(0) {
            topic.migrate()?;
        }
        Ok(topic)
    }

    /// Load the instance stored at `index`, failing when there is none.
    pub fn get(&self, state: &State, index: Index) -> Result<Topic, TopicError> {
        let key = index.cache_key();
        self.fetch(state, index, GetOptions::default())?
            .ok_or_else(|| {
                ArchivistError::NotFound {
                    topic: self.name().to_string(),
                    index: key,
                }
                .into()
            })
    }

    /// Load the instance stored at `index`, if any.
    pub fn try_get(&self, state: &State, index: Index) -> Result<Option<Topic>, TopicError> {
        self.fetch(state, index, GetOptions::optional())
    }

    /// Load with explicit options; `Ok(None)` only when `options.optional`.
    pub fn fetch(
        &self,
        state: &State,
        index: Index,
        options: GetOptions,
    ) -> Result<Option<Topic>, TopicError> {
        let index = self.validate_index(state, &index)?;
        match state.get(self.name(), &index, options)? {
            Some(data) => self.load(state, index, data).map(Some),
            None => Ok(None),
        }
    }

    /// Load several instances, in index order. With `options.optional`,
    /// missing ones are skipped.
    pub fn mget(
        &self,
        state: &State,
        indexes: &[Index],
        options: GetOptions,
    ) -> Result<Vec<Topic>, TopicError> {
        let queries: Vec<Query> = indexes
            .iter()
            .map(|index| Query::new(self.name(), index.clone()))
            .collect();
        let values = state.mget(&queries, options)?;

        let mut topics = Vec::with_capacity(values.len());
        for (query, value) in queries.into_iter().zip(values) {
            if let Some(data) = value {
                topics.push(self.load(state, query.index, data)?);
            }
        }
        Ok(topics)
    }

    /// Indexes of stored instances matching `partial`. Lock entries are
    /// not instances and are left out.
    pub fn list(
        &self,
        state: &State,
        partial: &Index,
        options: ListOptions,
    ) -> Result<Vec<Index>, TopicError> {
        let mut indexes = state.list(self.name(), partial, ListOptions::default())?;
        indexes.retain(|index| index.get(LOCK_FIELD).is_none());
        let limit = options.limit.unwrap_or(usize::MAX);
        Ok(indexes
            .into_iter()
            .skip(options.offset)
            .take(limit)
            .collect())
    }

    /// [`list`](Self::list), then load every match.
    pub fn query(
        &self,
        state: &State,
        partial: &Index,
        options: ListOptions,
    ) -> Result<Vec<Topic>, TopicError> {
        let indexes = self.list(state, partial, options)?;
        self.mget(state, &indexes, GetOptions::default())
    }
}
