use std::fmt;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::class::TopicClass;
use crate::archivist::{Index, MediaType, Operation, OperationKind, State, WriteOptions};
use crate::document::{DocumentError, Node};
use crate::error::{ErrorDetails, TopicError, ValidationError};
use crate::schema::TypeTag;
use crate::view::{Assigned, ObjectView, Slot, StructuredView};

/// One topic instance: a root document plus its identity.
///
/// Field access goes through [`StructuredView`]; `keys` and `own_keys`
/// both list the stored fields only.
#[derive(Clone)]
pub struct Topic {
    class: TopicClass,
    root: ObjectView,
    index: Index,
    state: State,
}

impl Topic {
    pub(crate) fn new(class: TopicClass, root: Node, index: Index, state: State) -> Self {
        let root = ObjectView::new(root, class.tag(), class.registry().clone());
        Topic {
            class,
            root,
            index,
            state,
        }
    }

    pub fn name(&self) -> &str {
        self.class.name()
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn class(&self) -> &TopicClass {
        &self.class
    }

    /// The root document.
    pub fn data(&self) -> &Node {
        self.root.node()
    }

    /// The root as a plain object view.
    pub fn root(&self) -> &ObjectView {
        &self.root
    }

    pub fn media_type(&self) -> MediaType {
        self.class.def().get_media_type()
    }

    /// Call a class method with the live root as `this`.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value, TopicError> {
        self.root.call(method, args)
    }

    pub(crate) fn apply_defaults(&self, defaults: Map<String, Value>) -> Result<(), DocumentError> {
        for (key, value) in defaults {
            self.root.assign(&key, Assigned::from(value))?;
        }
        Ok(())
    }

    pub(crate) fn error_details(&self) -> ErrorDetails {
        ErrorDetails {
            actor_id: self.state.actor_id().map(str::to_string),
            user_command: self.state.description().map(str::to_string),
            topic: Some(self.name().to_string()),
            index: Some(self.index.clone()),
            received_data: None,
        }
    }

    /// Validate with the default message and code.
    pub fn validate(&self) -> Result<(), TopicError> {
        self.validate_with("Validation failed", "server")
    }

    pub fn validate_with(&self, message: &str, code: &str) -> Result<(), TopicError> {
        let violations = self.root.validate();
        if violations.is_empty() {
            return Ok(());
        }

        warn!(
            topic = %self.name(),
            index = %self.index,
            violations = violations.len(),
            "topic validation failed"
        );
        Err(ValidationError::new(message, code, self.error_details())
            .with_violations(violations)
            .into())
    }

    fn write(&self, kind: OperationKind, options: WriteOptions) -> Operation {
        let media_type = options.media_type.unwrap_or_else(|| self.media_type());
        let options = WriteOptions {
            media_type: Some(media_type),
            ..options
        };
        let op = Operation::new(kind, self.name(), self.index.clone())
            .with_data(self.root.value_of(), options);

        if media_type != MediaType::Tome {
            return op;
        }
        let root = self.data();
        let diff = root.read_diff();
        root.clean();
        op.with_diff(diff)
    }

    /// Validate, then stage an add on the instance's state.
    pub fn record_add(&self, options: WriteOptions) -> Result<(), TopicError> {
        self.validate_with("Validation failed on add", "server")?;
        self.state.stage(self.write(OperationKind::Add, options));
        debug!(topic = %self.name(), index = %self.index, "add staged");
        Ok(())
    }

    /// Validate, then stage a set on the instance's state.
    pub fn record_set(&self, options: WriteOptions) -> Result<(), TopicError> {
        self.validate_with("Validation failed on set", "server")?;
        self.state.stage(self.write(OperationKind::Set, options));
        debug!(topic = %self.name(), index = %self.index, "set staged");
        Ok(())
    }

    /// Validate, then stage an expiration update.
    pub fn record_touch(&self, expiration_time: Option<u64>) -> Result<(), TopicError> {
        self.validate_with("Validation failed on touch", "server")?;
        self.state
            .touch(self.name(), self.index.clone(), expiration_time);
        Ok(())
    }

    /// Stage a delete. Deleting is never validated.
    pub fn record_del(&self) {
        self.state.del(self.name(), self.index.clone());
    }
}

impl StructuredView for Topic {
    fn node(&self) -> &Node {
        self.root.node()
    }

    fn get(&self, key: &str) -> Slot {
        self.root.get(key)
    }

    fn assign(&self, key: &str, value: Assigned) -> Result<(), DocumentError> {
        self.root.assign(key, value)
    }

    fn delete(&self, key: &str) -> bool {
        self.root.delete(key)
    }

    fn keys(&self) -> Vec<String> {
        self.root.keys()
    }

    fn constructor(&self) -> TypeTag {
        self.class.tag()
    }

    fn own_keys(&self) -> Vec<String> {
        self.keys()
    }
}

impl From<&Topic> for Assigned {
    fn from(topic: &Topic) -> Self {
        Assigned::typed(topic.value_of(), topic.constructor())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect(2))
    }
}
