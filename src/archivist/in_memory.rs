//! InMemoryVault - HashMap-backed vault for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use super::{storage_key, ArchivistError, Index, Operation, OperationKind, StoredValue, Vault};

struct Entry {
    topic: String,
    index: Index,
    value: StoredValue,
}

impl Entry {
    fn is_live(&self, now: u64) -> bool {
        self.value.expiration_time.map_or(true, |at| at > now)
    }
}

/// In-memory vault.
///
/// Storage key is `"topic:{index json}"`. Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct InMemoryVault {
    storage: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> Result<usize, ArchivistError> {
        let now = unix_now();
        let storage = self
            .storage
            .read()
            .map_err(|_| ArchivistError::LockPoisoned("len"))?;
        Ok(storage.values().filter(|entry| entry.is_live(now)).count())
    }

    pub fn is_empty(&self) -> Result<bool, ArchivistError> {
        Ok(self.len()? == 0)
    }
}

impl Vault for InMemoryVault {
    fn read(&self, topic: &str, index: &Index) -> Result<Option<StoredValue>, ArchivistError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| ArchivistError::LockPoisoned("read"))?;
        Ok(storage
            .get(&storage_key(topic, index))
            .filter(|entry| entry.is_live(unix_now()))
            .map(|entry| entry.value.clone()))
    }

    fn list(&self, topic: &str, partial: &Index) -> Result<Vec<Index>, ArchivistError> {
        let now = unix_now();
        let storage = self
            .storage
            .read()
            .map_err(|_| ArchivistError::LockPoisoned("list"))?;
        let mut indexes: Vec<Index> = storage
            .values()
            .filter(|entry| entry.topic == topic && entry.is_live(now))
            .filter(|entry| entry.index.matches(partial))
            .map(|entry| entry.index.clone())
            .collect();
        indexes.sort_by_key(Index::cache_key);
        Ok(indexes)
    }

    fn commit(&self, operations: Vec<Operation>) -> Result<(), ArchivistError> {
        let now = unix_now();
        let mut storage = self
            .storage
            .write()
            .map_err(|_| ArchivistError::LockPoisoned("commit"))?;

        for op in &operations {
            if op.kind != OperationKind::Add {
                continue;
            }
            if storage.get(&op.key()).is_some_and(|entry| entry.is_live(now)) {
                return Err(ArchivistError::AlreadyExists {
                    topic: op.topic.clone(),
                    index: op.index.cache_key(),
                });
            }
        }

        let count = operations.len();
        for op in operations {
            let key = op.key();
            match op.kind {
                OperationKind::Add | OperationKind::Set => {
                    let value = StoredValue {
                        data: op.data.unwrap_or_default(),
                        media_type: op.media_type,
                        expiration_time: op.expiration_time,
                    };
                    storage.insert(
                        key,
                        Entry {
                            topic: op.topic,
                            index: op.index,
                            value,
                        },
                    );
                }
                OperationKind::Touch => {
                    if let Some(entry) = storage.get_mut(&key) {
                        entry.value.expiration_time = op.expiration_time;
                    }
                }
                OperationKind::Del => {
                    storage.remove(&key);
                }
            }
        }

        debug!(operations = count, "vault commit applied");
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
