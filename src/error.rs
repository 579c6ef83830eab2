use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::archivist::{ArchivistError, Index};
use crate::document::DocumentError;

/// One failed property, with every constraint it broke.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Dotted path from the validated root (`children.0.childId`).
    pub property: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Constraint name to message.
    pub constraints: BTreeMap<String, String>,
}

impl Violation {
    pub fn new(property: impl Into<String>, value: Option<Value>) -> Self {
        Violation {
            property: property.into(),
            value,
            constraints: BTreeMap::new(),
        }
    }

    pub fn constraint(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.constraints.insert(name.into(), message.into());
        self
    }

    /// Prefix the property path, for violations found under a parent value.
    pub(crate) fn under(mut self, prefix: &str) -> Self {
        self.property = if self.property.is_empty() {
            prefix.to_string()
        } else {
            format!("{}.{}", prefix, self.property)
        };
        self
    }
}

/// Context attached to a validation failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<Index>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_data: Option<Value>,
}

/// A rejected value, with the code returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub message: String,
    pub code: String,
    pub details: ErrorDetails,
    #[serde(rename = "validationErrors")]
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, code: impl Into<String>, details: ErrorDetails) -> Self {
        ValidationError {
            message: message.into(),
            code: code.into(),
            details,
            violations: Vec::new(),
        }
    }

    pub fn with_violations(mut self, violations: Vec<Violation>) -> Self {
        self.violations = violations;
        self
    }

    /// Violation reported for `property`, if any.
    pub fn violation(&self, property: &str) -> Option<&Violation> {
        self.violations.iter().find(|v| v.property == property)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)?;
        if !self.violations.is_empty() {
            let properties: Vec<&str> =
                self.violations.iter().map(|v| v.property.as_str()).collect();
            write!(f, ": {}", properties.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Error type for topic and user command operations.
#[derive(Debug, Clone, PartialEq)]
pub enum TopicError {
    Validation(ValidationError),
    Archivist(ArchivistError),
    Document(DocumentError),
    /// Data handed to `create` was not a plain object.
    InvalidData(String),
    UnknownTopic(String),
    UnknownMethod { class: String, method: String },
    Locked { topic: String, index: Index },
    /// Failure raised by application code (methods, migrations, commands).
    Method(String),
}

impl TopicError {
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            TopicError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for TopicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicError::Validation(err) => write!(f, "validation error: {}", err),
            TopicError::Archivist(err) => write!(f, "archivist error: {}", err),
            TopicError::Document(err) => write!(f, "document error: {}", err),
            TopicError::InvalidData(message) => f.write_str(message),
            TopicError::UnknownTopic(name) => write!(f, "unknown topic {}", name),
            TopicError::UnknownMethod { class, method } => {
                write!(f, "{} has no method {}", class, method)
            }
            TopicError::Locked { topic, index } => {
                write!(f, "Topic is locked ({} {})", topic, index)
            }
            TopicError::Method(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for TopicError {}

impl From<ValidationError> for TopicError {
    fn from(err: ValidationError) -> Self {
        TopicError::Validation(err)
    }
}

impl From<ArchivistError> for TopicError {
    fn from(err: ArchivistError) -> Self {
        TopicError::Archivist(err)
    }
}

impl From<DocumentError> for TopicError {
    fn from(err: DocumentError) -> Self {
        TopicError::Document(err)
    }
}
