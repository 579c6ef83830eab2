use serde_json::Value;
use tracing::info;

use super::instance::Topic;
use crate::archivist::{GetOptions, Index, State, WriteOptions};
use crate::error::TopicError;

/// Index field marking a lock entry.
pub const LOCK_FIELD: &str = "mageValidatorLock";
const LOCKED: &str = "locked";

impl Topic {
    fn lock_index(&self) -> Index {
        self.index().clone().with(LOCK_FIELD, LOCKED)
    }

    /// Whether a lock is stored for this instance, read through `state`
    /// (a fresh unit of work when `None`).
    pub fn is_locked(&self, state: Option<&State>) -> Result<bool, TopicError> {
        let fresh;
        let state = match state {
            Some(state) => state,
            None => {
                fresh = self.state().sibling();
                &fresh
            }
        };
        let lock = state.get(self.name(), &self.lock_index(), GetOptions::optional())?;
        Ok(lock.is_some())
    }

    /// Store a lock for this instance, committed immediately on its own
    /// unit of work. With `auto_unlock`, a delete of the lock is staged on
    /// the instance's state so the lock goes away when that state is
    /// distributed.
    pub fn lock(&self, auto_unlock: bool) -> Result<(), TopicError> {
        let lock_state = self.state().sibling();
        if self.is_locked(Some(&lock_state))? {
            return Err(TopicError::Locked {
                topic: self.name().to_string(),
                index: self.index().clone(),
            });
        }

        let lock_index = self.lock_index();
        if auto_unlock {
            self.state().del(self.name(), lock_index.clone());
        }
        lock_state.set(
            self.name(),
            lock_index,
            Value::from(LOCKED),
            WriteOptions::default(),
        );
        lock_state.distribute()?;

        info!(topic = %self.name(), index = %self.index(), auto_unlock, "topic locked");
        Ok(())
    }

    /// Remove the lock, committed immediately on its own unit of work.
    pub fn unlock(&self) -> Result<(), TopicError> {
        let unlock_state = self.state().sibling();
        unlock_state.del(self.name(), self.lock_index());
        unlock_state.distribute()?;

        info!(topic = %self.name(), index = %self.index(), "topic unlocked");
        Ok(())
    }
}
