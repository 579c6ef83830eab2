use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};

use serde_json::{Map, Value};

use super::diff::{Diff, DiffOp};
use super::DocumentError;
use crate::schema::TypeTag;

/// The three shapes a document node can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Scalar,
    Object,
    Array,
}

enum Body {
    Scalar(Value),
    Object(Vec<(String, Node)>),
    Array(Vec<Node>),
}

struct NodeData {
    body: Body,
    parent: Weak<RefCell<NodeData>>,
    dirty: bool,
    version: u64,
    diff_enabled: bool,
    diffs: Vec<Diff>,
    /// Types of structured values assigned under keys that have no declared type.
    type_hints: HashMap<String, TypeTag>,
}

impl NodeData {
    fn new(body: Body) -> Self {
        NodeData {
            body,
            parent: Weak::new(),
            dirty: false,
            version: 0,
            diff_enabled: true,
            diffs: Vec::new(),
            type_hints: HashMap::new(),
        }
    }
}

/// Shared handle to a document node.
///
/// Cloning a `Node` clones the handle, not the subtree: every clone observes
/// and mutates the same underlying data.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

impl Node {
    /// Build a document tree from a plain value.
    pub fn conjure(value: Value) -> Node {
        let body = match value {
            Value::Object(map) => Body::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Node::conjure(value)))
                    .collect(),
            ),
            Value::Array(items) => Body::Array(items.into_iter().map(Node::conjure).collect()),
            scalar => Body::Scalar(scalar),
        };

        let node = Node(Rc::new(RefCell::new(NodeData::new(body))));
        for child in node.items() {
            child.attach(&node);
        }
        node
    }

    pub fn kind(&self) -> NodeKind {
        match self.0.borrow().body {
            Body::Scalar(_) => NodeKind::Scalar,
            Body::Object(_) => NodeKind::Object,
            Body::Array(_) => NodeKind::Array,
        }
    }

    pub fn is_object(&self) -> bool {
        self.kind() == NodeKind::Object
    }

    pub fn is_array(&self) -> bool {
        self.kind() == NodeKind::Array
    }

    pub fn is_scalar(&self) -> bool {
        self.kind() == NodeKind::Scalar
    }

    /// Whether two handles point at the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The scalar value held by a leaf, `None` for containers.
    pub fn scalar(&self) -> Option<Value> {
        match &self.0.borrow().body {
            Body::Scalar(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Child stored under `key` (an object key, or a decimal index for arrays).
    pub fn child(&self, key: &str) -> Option<Node> {
        match &self.0.borrow().body {
            Body::Object(entries) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, node)| node.clone()),
            Body::Array(items) => parse_index(key).ok().and_then(|i| items.get(i).cloned()),
            Body::Scalar(_) => None,
        }
    }

    pub fn at(&self, index: usize) -> Option<Node> {
        match &self.0.borrow().body {
            Body::Array(items) => items.get(index).cloned(),
            _ => None,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.child(key).is_some()
    }

    /// Structural keys, in document order. Arrays report their indices.
    pub fn keys(&self) -> Vec<String> {
        match &self.0.borrow().body {
            Body::Object(entries) => entries.iter().map(|(k, _)| k.clone()).collect(),
            Body::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
            Body::Scalar(_) => Vec::new(),
        }
    }

    /// Direct children, in document order.
    pub fn items(&self) -> Vec<Node> {
        match &self.0.borrow().body {
            Body::Object(entries) => entries.iter().map(|(_, n)| n.clone()).collect(),
            Body::Array(items) => items.clone(),
            Body::Scalar(_) => Vec::new(),
        }
    }

    pub fn entries(&self) -> Vec<(String, Node)> {
        match &self.0.borrow().body {
            Body::Object(entries) => entries.clone(),
            Body::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, n)| (i.to_string(), n.clone()))
                .collect(),
            Body::Scalar(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.0.borrow().body {
            Body::Object(entries) => entries.len(),
            Body::Array(items) => items.len(),
            Body::Scalar(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unwrap the subtree into a plain value.
    pub fn value_of(&self) -> Value {
        match &self.0.borrow().body {
            Body::Scalar(value) => value.clone(),
            Body::Object(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, node) in entries {
                    map.insert(key.clone(), node.value_of());
                }
                Value::Object(map)
            }
            Body::Array(items) => Value::Array(items.iter().map(Node::value_of).collect()),
        }
    }

    pub fn parent(&self) -> Option<Node> {
        self.0.borrow().parent.upgrade().map(Node)
    }

    pub fn root(&self) -> Node {
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }

    /// Key under which this node is stored in its parent.
    pub fn key(&self) -> Option<String> {
        self.parent().and_then(|parent| parent.key_of(self))
    }

    /// Keys from the root down to this node.
    pub fn path(&self) -> Vec<String> {
        let mut path = Vec::new();
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            if let Some(key) = parent.key_of(&node) {
                path.push(key);
            }
            node = parent;
        }
        path.reverse();
        path
    }

    pub fn is_dirty(&self) -> bool {
        self.0.borrow().dirty
    }

    pub fn version(&self) -> u64 {
        self.0.borrow().version
    }

    pub fn diff_enabled(&self) -> bool {
        self.0.borrow().diff_enabled
    }

    pub fn set_diff_enabled(&self, enabled: bool) {
        self.0.borrow_mut().diff_enabled = enabled;
    }

    /// Drain the diff log recorded on this node (meaningful on roots).
    pub fn read_diff(&self) -> Vec<Diff> {
        mem::take(&mut self.0.borrow_mut().diffs)
    }

    /// Reset dirty flags on this subtree.
    pub fn clean(&self) {
        self.0.borrow_mut().dirty = false;
        for child in self.items() {
            child.clean();
        }
    }

    pub fn type_hint(&self, key: &str) -> Option<TypeTag> {
        self.0.borrow().type_hints.get(key).cloned()
    }

    pub fn set_type_hint(&self, key: &str, tag: Option<TypeTag>) {
        let mut data = self.0.borrow_mut();
        match tag {
            Some(tag) => {
                data.type_hints.insert(key.to_string(), tag);
            }
            None => {
                data.type_hints.remove(key);
            }
        }
    }

    /// Store `value` under `key`, replacing any previous child.
    ///
    /// Arrays accept an existing index or `len` (append).
    pub fn set(&self, key: &str, value: Value) -> Result<(), DocumentError> {
        let child = Node::conjure(value.clone());
        let replaced = {
            let mut data = self.0.borrow_mut();
            match &mut data.body {
                Body::Object(entries) => match entries.iter_mut().find(|(k, _)| k == key) {
                    Some(entry) => Some(mem::replace(&mut entry.1, child.clone())),
                    None => {
                        entries.push((key.to_string(), child.clone()));
                        None
                    }
                },
                Body::Array(items) => {
                    let index = parse_index(key)?;
                    match index.cmp(&items.len()) {
                        Ordering::Less => Some(mem::replace(&mut items[index], child.clone())),
                        Ordering::Equal => {
                            items.push(child.clone());
                            None
                        }
                        Ordering::Greater => {
                            return Err(DocumentError::IndexOutOfRange {
                                index,
                                len: items.len(),
                            })
                        }
                    }
                }
                Body::Scalar(_) => {
                    return Err(DocumentError::NotAContainer {
                        key: key.to_string(),
                    })
                }
            }
        };

        child.attach(self);
        if let Some(old) = replaced {
            old.detach();
        }
        self.mark_changed(vec![key.to_string()], DiffOp::Set(value));
        Ok(())
    }

    /// Remove the child under `key`. Returns whether anything was removed;
    /// absent keys are not an error.
    pub fn del(&self, key: &str) -> bool {
        let removed = {
            let mut data = self.0.borrow_mut();
            match &mut data.body {
                Body::Object(entries) => entries
                    .iter()
                    .position(|(k, _)| k == key)
                    .map(|pos| entries.remove(pos).1),
                Body::Array(items) => match parse_index(key) {
                    Ok(index) if index < items.len() => Some(items.remove(index)),
                    _ => None,
                },
                Body::Scalar(_) => None,
            }
        };

        match removed {
            Some(old) => {
                old.detach();
                self.0.borrow_mut().type_hints.remove(key);
                self.mark_changed(vec![key.to_string()], DiffOp::Del);
                true
            }
            None => false,
        }
    }

    /// Append to an array, returning the new length.
    pub fn push(&self, value: Value) -> Result<usize, DocumentError> {
        let index = self.array_len()?;
        self.set(&index.to_string(), value)?;
        Ok(index + 1)
    }

    /// Prepend to an array, returning the new length.
    pub fn unshift(&self, value: Value) -> Result<usize, DocumentError> {
        let child = Node::conjure(value);
        let len = {
            let mut data = self.0.borrow_mut();
            match &mut data.body {
                Body::Array(items) => {
                    items.insert(0, child.clone());
                    items.len()
                }
                _ => return Err(DocumentError::NotAnArray),
            }
        };
        child.attach(self);
        self.mark_whole_changed();
        Ok(len)
    }

    pub fn pop(&self) -> Option<Node> {
        let (removed, index) = {
            let mut data = self.0.borrow_mut();
            match &mut data.body {
                Body::Array(items) => {
                    let removed = items.pop()?;
                    (removed, items.len())
                }
                _ => return None,
            }
        };
        removed.detach();
        self.mark_changed(vec![index.to_string()], DiffOp::Del);
        Some(removed)
    }

    pub fn shift(&self) -> Option<Node> {
        let removed = {
            let mut data = self.0.borrow_mut();
            match &mut data.body {
                Body::Array(items) if !items.is_empty() => items.remove(0),
                _ => return None,
            }
        };
        removed.detach();
        self.mark_whole_changed();
        Some(removed)
    }

    /// Remove `delete_count` elements starting at `start` and insert `insert`
    /// in their place. Returns the removed elements, now detached.
    pub fn splice(
        &self,
        start: usize,
        delete_count: usize,
        insert: Vec<Value>,
    ) -> Result<Vec<Node>, DocumentError> {
        let inserted: Vec<Node> = insert.into_iter().map(Node::conjure).collect();
        let removed: Vec<Node> = {
            let mut data = self.0.borrow_mut();
            match &mut data.body {
                Body::Array(items) => {
                    let start = start.min(items.len());
                    let end = start.saturating_add(delete_count).min(items.len());
                    items.splice(start..end, inserted.iter().cloned()).collect()
                }
                _ => return Err(DocumentError::NotAnArray),
            }
        };

        for node in &removed {
            node.detach();
        }
        for node in &inserted {
            node.attach(self);
        }
        if !removed.is_empty() || !inserted.is_empty() {
            self.mark_whole_changed();
        }
        Ok(removed)
    }

    /// Elements in `start..end`, sharing the underlying nodes.
    pub fn slice(&self, start: usize, end: usize) -> Vec<Node> {
        match &self.0.borrow().body {
            Body::Array(items) => {
                let end = end.min(items.len());
                if start >= end {
                    return Vec::new();
                }
                items[start..end].to_vec()
            }
            _ => Vec::new(),
        }
    }

    /// Rearrange array elements so that position `i` holds the element
    /// previously at `order[i]`. Orders that are not a permutation are ignored.
    pub fn reorder(&self, order: &[usize]) {
        let changed = {
            let mut data = self.0.borrow_mut();
            match &mut data.body {
                Body::Array(items) if is_permutation(order, items.len()) => {
                    let previous = mem::take(items);
                    *items = order.iter().map(|&i| previous[i].clone()).collect();
                    order.iter().enumerate().any(|(i, &j)| i != j)
                }
                _ => false,
            }
        };
        if changed {
            self.mark_whole_changed();
        }
    }

    fn array_len(&self) -> Result<usize, DocumentError> {
        match &self.0.borrow().body {
            Body::Array(items) => Ok(items.len()),
            _ => Err(DocumentError::NotAnArray),
        }
    }

    fn key_of(&self, child: &Node) -> Option<String> {
        match &self.0.borrow().body {
            Body::Object(entries) => entries
                .iter()
                .find(|(_, n)| n.ptr_eq(child))
                .map(|(k, _)| k.clone()),
            Body::Array(items) => items
                .iter()
                .position(|n| n.ptr_eq(child))
                .map(|i| i.to_string()),
            Body::Scalar(_) => None,
        }
    }

    fn attach(&self, parent: &Node) {
        self.0.borrow_mut().parent = Rc::downgrade(&parent.0);
    }

    fn detach(&self) {
        self.0.borrow_mut().parent = Weak::new();
    }

    fn mark_whole_changed(&self) {
        let value = self.value_of();
        self.mark_changed(Vec::new(), DiffOp::Set(value));
    }

    /// Flag this node and its ancestors as changed and log the diff on the root.
    fn mark_changed(&self, relative: Vec<String>, op: DiffOp) {
        let mut path = relative;
        let mut node = self.clone();
        loop {
            {
                let mut data = node.0.borrow_mut();
                data.dirty = true;
                data.version += 1;
            }
            match node.parent() {
                Some(parent) => {
                    if let Some(key) = parent.key_of(&node) {
                        path.insert(0, key);
                    }
                    node = parent;
                }
                None => break,
            }
        }

        let mut root = node.0.borrow_mut();
        if root.diff_enabled {
            root.diffs.push(Diff { path, op });
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("value", &self.value_of())
            .field("dirty", &self.is_dirty())
            .field("version", &self.version())
            .finish()
    }
}

/// Array keys are canonical decimals: no sign, no leading zeros.
pub(crate) fn parse_index(key: &str) -> Result<usize, DocumentError> {
    let canonical = !key.is_empty()
        && key.bytes().all(|b| b.is_ascii_digit())
        && (key == "0" || !key.starts_with('0'));
    if !canonical {
        return Err(DocumentError::InvalidIndex(key.to_string()));
    }
    key.parse::<usize>()
        .map_err(|_| DocumentError::InvalidIndex(key.to_string()))
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &i in order {
        if i >= len || seen[i] {
            return false;
        }
        seen[i] = true;
    }
    true
}
