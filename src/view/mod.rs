//! View - typed, writable projections over document nodes.
//!
//! A view pairs a [`Node`] with the type it should be read as. Reading a
//! structured child produces a fresh view over the child node; views are
//! never cached, so any number of them may wrap the same node at once and
//! all of them read and write the same data.
//!
//! Reads go through [`StructuredView::get`], which returns a [`Slot`]:
//! a plain scalar, a nested view, a bound class method, an introspection
//! hook, or the value's constructor.
//!
//! ## Example
//!
//! ```ignore
//! use serde_json::json;
//! use tome_validator::{wrap, Node, StructuredView};
//!
//! let root = wrap(Node::conjure(json!({ "children": [{ "childId": "1" }] })), None, &registry);
//! let children = root.get("children").into_array().unwrap();
//! children.for_each(|child, _| {
//!     child.as_object().unwrap().set("childId", "2").unwrap();
//! });
//! assert_eq!(root.value_of().unwrap(), json!({ "children": [{ "childId": "2" }] }));
//! ```

mod array;
mod inspect;
mod object;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::document::{DocumentError, Node, NodeKind};
use crate::error::TopicError;
use crate::schema::{Method, TypeRegistry, TypeTag};

pub use array::ArrayView;
pub use inspect::render as inspect_value;
pub use object::ObjectView;

/// Key of the string-tag hook (`Symbol.toStringTag`).
pub const TO_STRING_TAG: &str = "@@toStringTag";
/// Key of the custom inspect hook (`util.inspect.custom`).
pub const INSPECT_CUSTOM: &str = "@@inspect";
/// Key of the iteration protocol hook (`Symbol.iterator`).
pub const ITERATOR: &str = "@@iterator";

/// Document engine fields listed by [`StructuredView::own_keys`].
pub const BOOKKEEPING_KEYS: [&str; 7] = [
    "__dirty__",
    "__root__",
    "__diff__",
    "__diffEnabled__",
    "__version__",
    "__parent__",
    "__key__",
];

/// Wrap `node` as an instance of `declared`.
///
/// Arrays read `declared` as the type of every element. Objects fall back
/// to a generic object when nothing is declared.
pub fn wrap(node: Node, declared: Option<TypeTag>, registry: &Arc<TypeRegistry>) -> Slot {
    match node.kind() {
        NodeKind::Scalar => Slot::Scalar(node.scalar().unwrap_or(Value::Null)),
        NodeKind::Array => {
            let element = declared.filter(|tag| *tag != TypeTag::Array);
            Slot::Array(ArrayView::new(node, element, registry.clone()))
        }
        NodeKind::Object => {
            let ctor = match declared {
                Some(TypeTag::Array) | None => TypeTag::Object,
                Some(tag) => tag,
            };
            Slot::Object(ObjectView::new(node, ctor, registry.clone()))
        }
    }
}

/// Property access over a structured document value.
pub trait StructuredView {
    fn node(&self) -> &Node;

    /// Read `key`. Absent keys read as [`Slot::Undefined`].
    fn get(&self, key: &str) -> Slot;

    /// Write `value` under `key`, recording its type for later reads.
    fn assign(&self, key: &str, value: Assigned) -> Result<(), DocumentError>;

    /// Remove `key`. Returns whether anything was removed; never fails.
    fn delete(&self, key: &str) -> bool;

    /// Structural keys, in document order.
    fn keys(&self) -> Vec<String>;

    /// The effective constructor of this value.
    fn constructor(&self) -> TypeTag;

    fn set<V: Into<Assigned>>(&self, key: &str, value: V) -> Result<(), DocumentError>
    where
        Self: Sized,
    {
        self.assign(key, value.into())
    }

    /// Structural keys plus the engine's bookkeeping fields.
    fn own_keys(&self) -> Vec<String> {
        let mut keys = self.keys();
        keys.extend(BOOKKEEPING_KEYS.iter().map(|k| k.to_string()));
        keys
    }

    fn has(&self, key: &str) -> bool {
        self.node().has(key)
    }

    /// Prototype chain check: arrays are only arrays, everything else is
    /// its constructor and a generic object.
    fn instance_of(&self, tag: &TypeTag) -> bool {
        let ctor = self.constructor();
        match ctor {
            TypeTag::Array => *tag == TypeTag::Array,
            _ => *tag == ctor || *tag == TypeTag::Object,
        }
    }

    /// The plain value behind the view.
    fn value_of(&self) -> Value {
        self.node().value_of()
    }

    /// Name shown by introspection.
    fn type_name(&self) -> String {
        self.constructor().name().to_string()
    }

    /// JSON serialization of the plain value.
    fn to_json(&self) -> String {
        self.value_of().to_string()
    }

    /// `<TypeName> -> <rendered value>`, expanding containers `depth` levels deep.
    fn inspect(&self, depth: usize) -> String {
        format!("{} -> {}", self.type_name(), inspect::render(&self.value_of(), depth))
    }
}

/// Result of reading a key through a view.
#[derive(Debug, Clone)]
pub enum Slot {
    Undefined,
    Scalar(Value),
    Object(ObjectView),
    Array(ArrayView),
    Method(BoundMethod),
    Intrinsic(Intrinsic),
    Type(TypeTag),
}

impl Slot {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Slot::Undefined)
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Slot::Object(_) | Slot::Array(_))
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Slot::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar().and_then(Value::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_scalar().and_then(Value::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar().and_then(Value::as_bool)
    }

    pub fn as_object(&self) -> Option<&ObjectView> {
        match self {
            Slot::Object(view) => Some(view),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<ObjectView> {
        match self {
            Slot::Object(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayView> {
        match self {
            Slot::Array(view) => Some(view),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<ArrayView> {
        match self {
            Slot::Array(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&BoundMethod> {
        match self {
            Slot::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn as_intrinsic(&self) -> Option<&Intrinsic> {
        match self {
            Slot::Intrinsic(intrinsic) => Some(intrinsic),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeTag> {
        match self {
            Slot::Type(tag) => Some(tag),
            _ => None,
        }
    }

    /// Read `key` on a nested view; anything else reads as undefined.
    pub fn get(&self, key: &str) -> Slot {
        match self {
            Slot::Object(view) => view.get(key),
            Slot::Array(view) => view.get(key),
            _ => Slot::Undefined,
        }
    }

    /// The plain value, for data slots.
    pub fn value_of(&self) -> Option<Value> {
        match self {
            Slot::Scalar(value) => Some(value.clone()),
            Slot::Object(view) => Some(view.value_of()),
            Slot::Array(view) => Some(view.value_of()),
            _ => None,
        }
    }
}

/// A value being written through a view, with the type to remember for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Assigned {
    value: Value,
    tag: Option<TypeTag>,
}

impl Assigned {
    /// A plain value to be read back as `tag`.
    pub fn typed(value: Value, tag: TypeTag) -> Self {
        Assigned {
            value,
            tag: Some(tag),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn tag(&self) -> Option<&TypeTag> {
        self.tag.as_ref()
    }

    pub(crate) fn into_parts(self) -> (Value, Option<TypeTag>) {
        (self.value, self.tag)
    }
}

impl From<Value> for Assigned {
    fn from(value: Value) -> Self {
        let tag = match value {
            Value::Object(_) => Some(TypeTag::Object),
            Value::Array(_) => Some(TypeTag::Array),
            _ => None,
        };
        Assigned { value, tag }
    }
}

impl From<&str> for Assigned {
    fn from(value: &str) -> Self {
        Value::from(value).into()
    }
}

impl From<String> for Assigned {
    fn from(value: String) -> Self {
        Value::from(value).into()
    }
}

impl From<i64> for Assigned {
    fn from(value: i64) -> Self {
        Value::from(value).into()
    }
}

impl From<f64> for Assigned {
    fn from(value: f64) -> Self {
        Value::from(value).into()
    }
}

impl From<bool> for Assigned {
    fn from(value: bool) -> Self {
        Value::from(value).into()
    }
}

impl From<&ObjectView> for Assigned {
    fn from(view: &ObjectView) -> Self {
        Assigned::typed(view.value_of(), view.constructor())
    }
}

impl From<ObjectView> for Assigned {
    fn from(view: ObjectView) -> Self {
        Assigned::from(&view)
    }
}

impl From<&ArrayView> for Assigned {
    fn from(view: &ArrayView) -> Self {
        let tag = view.element().cloned().unwrap_or(TypeTag::Array);
        Assigned::typed(view.value_of(), tag)
    }
}

impl From<ArrayView> for Assigned {
    fn from(view: ArrayView) -> Self {
        Assigned::from(&view)
    }
}

impl From<Slot> for Assigned {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::Object(view) => view.into(),
            Slot::Array(view) => view.into(),
            Slot::Scalar(value) => value.into(),
            _ => Value::Null.into(),
        }
    }
}

/// A class method bound to the view it was read from.
#[derive(Clone)]
pub struct BoundMethod {
    name: String,
    this: ObjectView,
    method: Method,
}

impl BoundMethod {
    pub(crate) fn new(name: &str, this: ObjectView, method: Method) -> Self {
        BoundMethod {
            name: name.to_string(),
            this,
            method,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, TopicError> {
        (self.method)(&self.this, args)
    }
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrinsicKind {
    ToString,
    Inspect,
    Iterator,
}

impl IntrinsicKind {
    pub(crate) fn from_key(key: &str) -> Option<Self> {
        match key {
            "toString" | TO_STRING_TAG => Some(IntrinsicKind::ToString),
            "inspect" | INSPECT_CUSTOM => Some(IntrinsicKind::Inspect),
            ITERATOR => Some(IntrinsicKind::Iterator),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Target {
    Object(ObjectView),
    Array(ArrayView),
}

/// An introspection hook bound to a view, taking precedence over any
/// stored field of the same name.
#[derive(Debug, Clone)]
pub struct Intrinsic {
    kind: IntrinsicKind,
    target: Target,
}

impl Intrinsic {
    pub(crate) fn for_object(kind: IntrinsicKind, view: ObjectView) -> Self {
        Intrinsic {
            kind,
            target: Target::Object(view),
        }
    }

    pub(crate) fn for_array(kind: IntrinsicKind, view: ArrayView) -> Self {
        Intrinsic {
            kind,
            target: Target::Array(view),
        }
    }

    pub fn kind(&self) -> IntrinsicKind {
        self.kind
    }

    /// Invoke the hook. `inspect` takes an optional depth argument (default 1).
    pub fn call(&self, args: &[Value]) -> Value {
        match self.kind {
            IntrinsicKind::ToString => Value::String(self.to_json()),
            IntrinsicKind::Inspect => {
                let depth = args.first().and_then(Value::as_u64).unwrap_or(1) as usize;
                Value::String(self.inspect(depth))
            }
            IntrinsicKind::Iterator => Value::Array(
                self.iter()
                    .into_iter()
                    .filter_map(|slot| slot.value_of())
                    .collect(),
            ),
        }
    }

    /// Elements (arrays) or values (objects), wrapped.
    pub fn iter(&self) -> Vec<Slot> {
        match &self.target {
            Target::Object(view) => view.values(),
            Target::Array(view) => view.to_vec(),
        }
    }

    fn to_json(&self) -> String {
        match &self.target {
            Target::Object(view) => view.to_json(),
            Target::Array(view) => view.to_json(),
        }
    }

    fn inspect(&self, depth: usize) -> String {
        match &self.target {
            Target::Object(view) => view.inspect(depth),
            Target::Array(view) => view.inspect(depth),
        }
    }
}
