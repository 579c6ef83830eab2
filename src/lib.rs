mod archivist;
mod command;
mod config;
mod document;
mod error;
mod loader;
mod schema;
mod topic;
mod view;

pub use archivist::{
    ArchivistError, GetOptions, InMemoryVault, Index, ListOptions, MediaType, Operation,
    OperationKind, Query, State, StoredValue, Vault, WriteOptions,
};
pub use command::{CommandArg, CommandOutput, Execute, Param, ParamKind, UserCommand};
pub use config::{ConfigError, LoaderConfig};
pub use document::{Diff, DiffOp, DocumentError, Node, NodeKind};
pub use error::{ErrorDetails, TopicError, ValidationError, Violation};
pub use loader::{DiscoveredTopic, LoaderError, TopicCatalog};
pub use schema::{
    validate_node, ClassDef, Constraint, FieldDef, IndexField, KeyCheck, Method, Migration,
    Presence, RegistryBuilder, RegistryError, Rule, TopicDef, TypeRegistry, TypeTag,
};
pub use topic::{Topic, TopicClass, TopicData, TopicsExt, LOCK_FIELD, VERSION_KEY};
pub use view::{
    inspect_value, wrap, ArrayView, Assigned, BoundMethod, Intrinsic, IntrinsicKind, ObjectView,
    Slot, StructuredView, BOOKKEEPING_KEYS, INSPECT_CUSTOM, ITERATOR, TO_STRING_TAG,
};
