//! Archivist - keyed persistence behind a unit of work.
//!
//! Topics are stored under `(topic name, index)` keys in a [`Vault`]. All
//! reads and writes go through a [`State`], which stages writes and commits
//! them to the vault in one atomic batch on [`State::distribute`].
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use serde_json::json;
//! use tome_validator::{InMemoryVault, Index, State, WriteOptions};
//!
//! let vault = Arc::new(InMemoryVault::new());
//! let state = State::new(vault.clone());
//! state.set("Player", Index::from([("id", "1")]), json!({ "name": "ohai" }), WriteOptions::default());
//! state.distribute()?;
//! ```

mod in_memory;
mod state;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Diff;

pub use in_memory::InMemoryVault;
pub use state::State;

/// Key tuple identifying one topic instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index(BTreeMap<String, Value>);

impl Index {
    pub fn new() -> Self {
        Index::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Whether every field of `partial` is present here with the same value.
    pub fn matches(&self, partial: &Index) -> bool {
        partial
            .0
            .iter()
            .all(|(key, value)| self.0.get(key) == Some(value))
    }

    /// Stable string form, used as a storage key.
    pub fn cache_key(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Index {
    fn from(fields: [(K, V); N]) -> Self {
        fields.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Index {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Index(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Encoding of stored topic data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "application/json")]
    Json,
    #[serde(rename = "application/x-tome")]
    Tome,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Json => "application/json",
            MediaType::Tome => "application/x-tome",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchivistError {
    LockPoisoned(&'static str),
    NotFound { topic: String, index: String },
    AlreadyExists { topic: String, index: String },
    Storage(String),
}

impl fmt::Display for ArchivistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchivistError::LockPoisoned(operation) => {
                write!(f, "vault lock poisoned during {}", operation)
            }
            ArchivistError::NotFound { topic, index } => {
                write!(f, "{} {} not found", topic, index)
            }
            ArchivistError::AlreadyExists { topic, index } => {
                write!(f, "{} {} already exists", topic, index)
            }
            ArchivistError::Storage(message) => write!(f, "storage error: {}", message),
        }
    }
}

impl std::error::Error for ArchivistError {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Missing values read as `None` instead of failing.
    pub optional: bool,
}

impl GetOptions {
    pub fn optional() -> Self {
        GetOptions { optional: true }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub offset: usize,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Defaults to the topic's media type.
    pub media_type: Option<MediaType>,
    /// Unix time, in seconds, after which the value reads as absent.
    pub expiration_time: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Add,
    Set,
    Touch,
    Del,
}

/// One staged write.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub topic: String,
    pub index: Index,
    pub data: Option<Value>,
    pub media_type: MediaType,
    pub expiration_time: Option<u64>,
    /// Changes since the document was last persisted, for tome data.
    pub diff: Vec<Diff>,
}

impl Operation {
    pub fn new(kind: OperationKind, topic: impl Into<String>, index: Index) -> Self {
        Operation {
            kind,
            topic: topic.into(),
            index,
            data: None,
            media_type: MediaType::Json,
            expiration_time: None,
            diff: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: Value, options: WriteOptions) -> Self {
        self.data = Some(data);
        if let Some(media_type) = options.media_type {
            self.media_type = media_type;
        }
        self.expiration_time = options.expiration_time;
        self
    }

    pub fn with_diff(mut self, diff: Vec<Diff>) -> Self {
        self.diff = diff;
        self
    }

    pub(crate) fn key(&self) -> String {
        storage_key(&self.topic, &self.index)
    }
}

/// A value as held by a vault.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub data: Value,
    pub media_type: MediaType,
    pub expiration_time: Option<u64>,
}

/// A `(topic, index)` pair to fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub topic: String,
    pub index: Index,
}

impl Query {
    pub fn new(topic: impl Into<String>, index: Index) -> Self {
        Query {
            topic: topic.into(),
            index,
        }
    }
}

/// Storage backend.
pub trait Vault {
    fn read(&self, topic: &str, index: &Index) -> Result<Option<StoredValue>, ArchivistError>;

    /// Indexes of `topic` matching `partial`, in a stable order.
    fn list(&self, topic: &str, partial: &Index) -> Result<Vec<Index>, ArchivistError>;

    /// Apply `operations` atomically: all of them or none.
    fn commit(&self, operations: Vec<Operation>) -> Result<(), ArchivistError>;
}

pub(crate) fn storage_key(topic: &str, index: &Index) -> String {
    format!("{}:{}", topic, index.cache_key())
}
