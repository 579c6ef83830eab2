//! Topic - persisted, validated documents.
//!
//! A [`TopicClass`] is the static side of a registered topic: it validates
//! indexes, creates instances and loads them through a [`State`]. A
//! [`Topic`] is one instance. It reads and writes like its root object
//! view, while identity (`name`, `index`, `state`) and persistence
//! (`record_*`, `lock`, `migrate`) are plain methods that document fields
//! can never shadow.
//!
//! ## Example
//!
//! ```ignore
//! use serde_json::json;
//! use tome_validator::{Index, StructuredView, TopicsExt};
//!
//! let players = registry.topic("Player")?;
//! let player = players.create(&state, Index::from([("id", "1")]), json!({ "name": "ohai" }))?;
//! player.set("name", "hi")?;
//! player.record_set(Default::default())?;
//! state.distribute()?;
//! ```
//!
//! [`State`]: crate::archivist::State

mod class;
mod instance;
mod lock;
mod migrate;

pub use class::{TopicClass, TopicData, TopicsExt};
pub use instance::Topic;
pub use lock::LOCK_FIELD;
pub use migrate::VERSION_KEY;
