use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::{
    storage_key, ArchivistError, GetOptions, Index, ListOptions, Operation, OperationKind, Query,
    Vault, WriteOptions,
};

/// A unit of work over a vault.
///
/// Writes are staged, last write per key wins, and reads observe staged
/// writes. Nothing reaches the vault until [`State::distribute`]. Clones
/// share the same staged operations.
#[derive(Clone)]
pub struct State {
    vault: Arc<dyn Vault>,
    staged: Rc<RefCell<Vec<Operation>>>,
    actor_id: Option<String>,
    description: Option<String>,
}

impl State {
    pub fn new(vault: Arc<dyn Vault>) -> Self {
        State {
            vault,
            staged: Rc::new(RefCell::new(Vec::new())),
            actor_id: None,
            description: None,
        }
    }

    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Name of the user command this unit of work serves.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn actor_id(&self) -> Option<&str> {
        self.actor_id.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// A fresh, empty unit of work on the same vault.
    pub fn sibling(&self) -> State {
        State::new(self.vault.clone())
    }

    fn staged_for(&self, topic: &str, index: &Index) -> Option<Operation> {
        let key = storage_key(topic, index);
        self.staged
            .borrow()
            .iter()
            .find(|op| op.key() == key)
            .cloned()
    }

    pub fn get(
        &self,
        topic: &str,
        index: &Index,
        options: GetOptions,
    ) -> Result<Option<Value>, ArchivistError> {
        let value = match self.staged_for(topic, index) {
            Some(op) if op.kind == OperationKind::Del => None,
            Some(Operation {
                data: Some(data), ..
            }) => Some(data),
            _ => self.vault.read(topic, index)?.map(|stored| stored.data),
        };

        match value {
            None if !options.optional => Err(ArchivistError::NotFound {
                topic: topic.to_string(),
                index: index.cache_key(),
            }),
            value => Ok(value),
        }
    }

    /// Values for each query, in query order.
    pub fn mget(
        &self,
        queries: &[Query],
        options: GetOptions,
    ) -> Result<Vec<Option<Value>>, ArchivistError> {
        queries
            .iter()
            .map(|query| self.get(&query.topic, &query.index, options))
            .collect()
    }

    /// Indexes of `topic` matching `partial`, staged writes included.
    pub fn list(
        &self,
        topic: &str,
        partial: &Index,
        options: ListOptions,
    ) -> Result<Vec<Index>, ArchivistError> {
        let mut indexes = self.vault.list(topic, partial)?;
        for op in self.staged.borrow().iter() {
            if op.topic != topic || !op.index.matches(partial) {
                continue;
            }
            let listed = indexes.iter().position(|index| *index == op.index);
            match (op.kind, listed) {
                (OperationKind::Del, Some(pos)) => {
                    indexes.remove(pos);
                }
                (OperationKind::Add | OperationKind::Set, None) => indexes.push(op.index.clone()),
                _ => {}
            }
        }
        indexes.sort_by_key(Index::cache_key);

        let limit = options.limit.unwrap_or(usize::MAX);
        Ok(indexes
            .into_iter()
            .skip(options.offset)
            .take(limit)
            .collect())
    }

    /// Stage an operation, replacing any staged one on the same key.
    pub(crate) fn stage(&self, op: Operation) {
        let key = op.key();
        let mut staged = self.staged.borrow_mut();
        staged.retain(|existing| existing.key() != key);
        staged.push(op);
    }

    pub fn add(&self, topic: &str, index: Index, data: Value, options: WriteOptions) {
        self.stage(Operation::new(OperationKind::Add, topic, index).with_data(data, options));
    }

    pub fn set(&self, topic: &str, index: Index, data: Value, options: WriteOptions) {
        self.stage(Operation::new(OperationKind::Set, topic, index).with_data(data, options));
    }

    /// Update the expiration of a value. Folds into a staged add or set, and
    /// leaves a staged delete in place.
    pub fn touch(&self, topic: &str, index: Index, expiration_time: Option<u64>) {
        let key = storage_key(topic, &index);
        {
            let mut staged = self.staged.borrow_mut();
            if let Some(op) = staged.iter_mut().find(|op| op.key() == key) {
                match op.kind {
                    OperationKind::Del => return,
                    OperationKind::Add | OperationKind::Set => {
                        op.expiration_time = expiration_time;
                        return;
                    }
                    OperationKind::Touch => {}
                }
            }
        }

        let mut op = Operation::new(OperationKind::Touch, topic, index);
        op.expiration_time = expiration_time;
        self.stage(op);
    }

    pub fn del(&self, topic: &str, index: Index) {
        self.stage(Operation::new(OperationKind::Del, topic, index));
    }

    /// Staged operations, in staging order.
    pub fn staged(&self) -> Vec<Operation> {
        self.staged.borrow().clone()
    }

    /// Commit every staged operation atomically. The staged set is cleared
    /// whether or not the commit succeeds.
    pub fn distribute(&self) -> Result<(), ArchivistError> {
        let operations = std::mem::take(&mut *self.staged.borrow_mut());
        if operations.is_empty() {
            return Ok(());
        }
        debug!(
            operations = operations.len(),
            actor = ?self.actor_id,
            "distributing staged operations"
        );
        self.vault.commit(operations)
    }
}
