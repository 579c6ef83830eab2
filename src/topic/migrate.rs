use serde_json::Value;
use tracing::info;

use super::instance::Topic;
use crate::error::TopicError;
use crate::view::StructuredView;

/// Root field holding the schema version a document was last migrated to.
pub const VERSION_KEY: &str = "_version";

impl Topic {
    /// Stored schema version; documents without one are at version 0.
    pub fn version(&self) -> Result<u32, TopicError> {
        let stored = match self.root().get(VERSION_KEY).as_scalar() {
            None | Some(Value::Null) => return Ok(0),
            Some(stored) => stored.clone(),
        };
        stored
            .as_u64()
            .and_then(|version| u32::try_from(version).ok())
            .ok_or_else(|| {
                TopicError::InvalidData(format!(
                    "{} {} of {} {} is not a valid version",
                    VERSION_KEY,
                    stored,
                    self.name(),
                    self.index()
                ))
            })
    }

    /// Apply every migration newer than the stored version, in ascending
    /// order, bumping `_version` after each. Returns how many ran.
    pub fn migrate(&self) -> Result<usize, TopicError> {
        let pending: Vec<_> = self
            .class()
            .def()
            .migrations_after(self.version()?)
            .collect();

        for (version, migration) in &pending {
            migration(self.root())?;
            self.root().set(VERSION_KEY, i64::from(*version))?;
            info!(topic = %self.name(), index = %self.index(), version, "migration applied");
        }
        Ok(pending.len())
    }
}
