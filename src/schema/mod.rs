//! Schema - the immutable type metadata registry.
//!
//! Classes, their fields, methods and validation rules, and the topics built
//! on them are declared once at startup through [`RegistryBuilder`]. The
//! resulting [`TypeRegistry`] is read-only and shared (`Arc`) by every view.
//!
//! ## Example
//!
//! ```ignore
//! use tome_validator::{ClassDef, FieldDef, Rule, TopicDef, TypeRegistry};
//!
//! let registry = TypeRegistry::builder()
//!     .class(
//!         ClassDef::new("Child")
//!             .field(FieldDef::new("childId").rule(Rule::NumberString))
//!             .field(FieldDef::new("children").of("Child").nested()),
//!     )
//!     .topic(
//!         TopicDef::new(ClassDef::new("Player").field(FieldDef::new("child").of("Child").nested()))
//!             .index_field("id", [Rule::NumberString]),
//!     )
//!     .build()?;
//! ```

mod class;
mod registry;
mod rule;
mod topic_def;
mod validate;

use std::fmt;
use std::sync::Arc;

pub use class::{ClassDef, FieldDef, KeyCheck, Method};
pub use registry::{RegistryBuilder, RegistryError, TypeRegistry};
pub use rule::{Constraint, Presence, Rule};
pub use topic_def::{IndexField, Migration, TopicDef};
pub use validate::validate_node;

pub(crate) use rule::check_field;

/// The effective constructor of a structured value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Generic object, used when nothing more specific is known.
    Object,
    Array,
    /// A declared class.
    Class(Arc<str>),
    /// An anonymous object whose every value is an instance of the element class.
    MapOf(Arc<str>),
}

impl TypeTag {
    pub fn class(name: impl AsRef<str>) -> Self {
        TypeTag::Class(Arc::from(name.as_ref()))
    }

    pub fn map_of(element: impl AsRef<str>) -> Self {
        TypeTag::MapOf(Arc::from(element.as_ref()))
    }

    /// Constructor name as seen by introspection.
    pub fn name(&self) -> &str {
        match self {
            TypeTag::Object | TypeTag::MapOf(_) => "Object",
            TypeTag::Array => "Array",
            TypeTag::Class(name) => name,
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeTag::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::MapOf(element) => write!(f, "MapOf<{}>", element),
            other => f.write_str(other.name()),
        }
    }
}
