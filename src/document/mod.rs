//! Document - a mutable, diff-tracking tree of plain values.
//!
//! A document is built from a plain `serde_json::Value` with [`Node::conjure`]
//! and turned back into one with [`Node::value_of`]. Every structural mutation
//! marks the touched node and its ancestors dirty, bumps their version, and
//! (when enabled on the root) appends a [`Diff`] to the root's diff log so a
//! persistence layer can ship changes instead of whole documents.
//!
//! ## Example
//!
//! ```ignore
//! use serde_json::json;
//! use tome_validator::Node;
//!
//! let root = Node::conjure(json!({ "name": "ohai", "list": ["a"] }));
//! root.set("name", json!("hi"))?;
//! root.child("list").unwrap().push(json!("b"))?;
//!
//! assert_eq!(root.value_of(), json!({ "name": "hi", "list": ["a", "b"] }));
//! assert_eq!(root.read_diff().len(), 2);
//! ```

mod diff;
mod node;

use std::fmt;

pub use diff::{Diff, DiffOp};
pub use node::{Node, NodeKind};
pub(crate) use node::parse_index;

/// Error type for refused document mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// A keyed write was attempted on a scalar leaf.
    NotAContainer { key: String },
    /// An array-only operation was attempted on a non-array node.
    NotAnArray,
    /// An array was addressed with a key that is not an index.
    InvalidIndex(String),
    /// An array write would leave a hole.
    IndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::NotAContainer { key } => {
                write!(f, "cannot set key {} on a scalar node", key)
            }
            DocumentError::NotAnArray => write!(f, "node is not an array"),
            DocumentError::InvalidIndex(key) => write!(f, "invalid array index: {}", key),
            DocumentError::IndexOutOfRange { index, len } => write!(
                f,
                "array index {} out of range (length {})",
                index, len
            ),
        }
    }
}

impl std::error::Error for DocumentError {}
