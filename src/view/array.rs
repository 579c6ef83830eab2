use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::{wrap, Assigned, Intrinsic, IntrinsicKind, Slot, StructuredView};
use crate::document::{parse_index, DocumentError, Node};
use crate::schema::{TypeRegistry, TypeTag};

/// View over an array node whose elements are all read as `element`.
///
/// Element callbacks receive wrapped elements, so writes made through them
/// land in the stored element. Searches compare plain values.
#[derive(Clone)]
pub struct ArrayView {
    node: Node,
    element: Option<TypeTag>,
    registry: Arc<TypeRegistry>,
}

impl ArrayView {
    pub fn new(node: Node, element: Option<TypeTag>, registry: Arc<TypeRegistry>) -> Self {
        ArrayView {
            node,
            element,
            registry,
        }
    }

    /// Declared element type, if any.
    pub fn element(&self) -> Option<&TypeTag> {
        self.element.as_ref()
    }

    pub fn len(&self) -> usize {
        self.node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node.is_empty()
    }

    fn wrap_item(&self, item: Node) -> Slot {
        wrap(item, self.element.clone(), &self.registry)
    }

    fn wrap_all(&self, items: Vec<Node>) -> Vec<Slot> {
        items.into_iter().map(|item| self.wrap_item(item)).collect()
    }

    /// Element at `index`, or undefined past the end.
    pub fn at(&self, index: usize) -> Slot {
        self.node
            .at(index)
            .map(|item| self.wrap_item(item))
            .unwrap_or(Slot::Undefined)
    }

    /// Wrapped elements, in order.
    pub fn to_vec(&self) -> Vec<Slot> {
        self.wrap_all(self.node.items())
    }

    pub fn iter(&self) -> std::vec::IntoIter<Slot> {
        self.to_vec().into_iter()
    }

    pub fn entries(&self) -> Vec<(usize, Slot)> {
        self.to_vec().into_iter().enumerate().collect()
    }

    /// Append, returning the new length.
    pub fn push<V: Into<Assigned>>(&self, value: V) -> Result<usize, DocumentError> {
        let (value, _) = value.into().into_parts();
        self.node.push(value)
    }

    /// Prepend, returning the new length.
    pub fn unshift<V: Into<Assigned>>(&self, value: V) -> Result<usize, DocumentError> {
        let (value, _) = value.into().into_parts();
        self.node.unshift(value)
    }

    /// Remove the last element. Undefined when empty.
    pub fn pop(&self) -> Slot {
        self.node
            .pop()
            .map(|item| self.wrap_item(item))
            .unwrap_or(Slot::Undefined)
    }

    /// Remove the first element. Undefined when empty.
    pub fn shift(&self) -> Slot {
        self.node
            .shift()
            .map(|item| self.wrap_item(item))
            .unwrap_or(Slot::Undefined)
    }

    /// Elements in `start..end`; negative bounds count from the end.
    pub fn slice(&self, start: isize, end: Option<isize>) -> Vec<Slot> {
        let len = self.len();
        let start = relative_index(start, len);
        let end = end.map_or(len, |end| relative_index(end, len));
        self.wrap_all(self.node.slice(start, end))
    }

    /// Remove `delete_count` elements at `start` (all remaining when `None`)
    /// and insert `items` in their place. Returns the removed elements.
    pub fn splice(
        &self,
        start: isize,
        delete_count: Option<usize>,
        items: Vec<Assigned>,
    ) -> Result<Vec<Slot>, DocumentError> {
        let len = self.len();
        let start = relative_index(start, len);
        let delete_count = delete_count.unwrap_or(len - start);
        let values = items
            .into_iter()
            .map(|item| item.into_parts().0)
            .collect();
        let removed = self.node.splice(start, delete_count, values)?;
        Ok(self.wrap_all(removed))
    }

    pub fn includes(&self, needle: &Value) -> bool {
        self.index_of(needle).is_some()
    }

    /// Position of the first element equal to `needle`, compared as plain values.
    pub fn index_of(&self, needle: &Value) -> Option<usize> {
        match self.node.value_of() {
            Value::Array(values) => values.iter().position(|value| same_value_zero(value, needle)),
            _ => None,
        }
    }

    /// Sort in place by string conversion.
    pub fn sort(&self) {
        let values: Vec<Value> = self.node.items().iter().map(Node::value_of).collect();
        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&a, &b| compare_as_strings(&values[a], &values[b]));
        self.node.reorder(&order);
    }

    /// Sort in place with a comparator over wrapped elements.
    pub fn sort_by<F>(&self, mut compare: F)
    where
        F: FnMut(&Slot, &Slot) -> Ordering,
    {
        let slots = self.to_vec();
        let mut order: Vec<usize> = (0..slots.len()).collect();
        order.sort_by(|&a, &b| compare(&slots[a], &slots[b]));
        self.node.reorder(&order);
    }

    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(Slot, usize),
    {
        for (i, slot) in self.entries() {
            f(slot, i);
        }
    }

    pub fn map<T, F>(&self, mut f: F) -> Vec<T>
    where
        F: FnMut(Slot, usize) -> T,
    {
        self.entries()
            .into_iter()
            .map(|(i, slot)| f(slot, i))
            .collect()
    }

    /// Matching elements, each still a view over the stored element.
    pub fn filter<F>(&self, mut predicate: F) -> Vec<Slot>
    where
        F: FnMut(&Slot, usize) -> bool,
    {
        self.entries()
            .into_iter()
            .filter(|(i, slot)| predicate(slot, *i))
            .map(|(_, slot)| slot)
            .collect()
    }

    pub fn every<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&Slot, usize) -> bool,
    {
        self.entries().iter().all(|(i, slot)| predicate(slot, *i))
    }

    pub fn some<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&Slot, usize) -> bool,
    {
        self.entries().iter().any(|(i, slot)| predicate(slot, *i))
    }

    pub fn reduce<T, F>(&self, init: T, mut f: F) -> T
    where
        F: FnMut(T, Slot, usize) -> T,
    {
        self.entries()
            .into_iter()
            .fold(init, |acc, (i, slot)| f(acc, slot, i))
    }

    pub fn reduce_right<T, F>(&self, init: T, mut f: F) -> T
    where
        F: FnMut(T, Slot, usize) -> T,
    {
        self.entries()
            .into_iter()
            .rev()
            .fold(init, |acc, (i, slot)| f(acc, slot, i))
    }

    /// First matching element; `None` when nothing matches.
    pub fn find<F>(&self, mut predicate: F) -> Option<Slot>
    where
        F: FnMut(&Slot, usize) -> bool,
    {
        self.entries()
            .into_iter()
            .find(|(i, slot)| predicate(slot, *i))
            .map(|(_, slot)| slot)
    }

    pub fn find_index<F>(&self, mut predicate: F) -> Option<usize>
    where
        F: FnMut(&Slot, usize) -> bool,
    {
        self.entries()
            .into_iter()
            .find(|(i, slot)| predicate(slot, *i))
            .map(|(i, _)| i)
    }

    /// Elements converted to strings and joined with `separator`.
    pub fn join(&self, separator: &str) -> String {
        match self.node.value_of() {
            Value::Array(values) => join_values(&values, separator),
            _ => String::new(),
        }
    }

    /// A new plain array: these elements followed by `others`' elements.
    pub fn concat(&self, others: &[Value]) -> Vec<Value> {
        let mut values = match self.node.value_of() {
            Value::Array(values) => values,
            _ => Vec::new(),
        };
        for other in others {
            match other {
                Value::Array(items) => values.extend(items.iter().cloned()),
                value => values.push(value.clone()),
            }
        }
        values
    }

    fn set_length(&self, value: &Value) -> Result<(), DocumentError> {
        let len = self.len();
        let target = value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| DocumentError::InvalidIndex(value.to_string()))?;
        match target.cmp(&len) {
            Ordering::Less => {
                self.node.splice(target, len - target, Vec::new())?;
                Ok(())
            }
            Ordering::Equal => Ok(()),
            Ordering::Greater => Err(DocumentError::IndexOutOfRange { index: target, len }),
        }
    }
}

impl StructuredView for ArrayView {
    fn node(&self) -> &Node {
        &self.node
    }

    fn get(&self, key: &str) -> Slot {
        if let Some(kind) = IntrinsicKind::from_key(key) {
            return Slot::Intrinsic(Intrinsic::for_array(kind, self.clone()));
        }
        match key {
            "constructor" => Slot::Type(TypeTag::Array),
            "length" => Slot::Scalar(Value::from(self.len())),
            _ => match parse_index(key) {
                Ok(index) => self.at(index),
                Err(_) => Slot::Undefined,
            },
        }
    }

    /// `length` truncates; any other key must be an index.
    fn assign(&self, key: &str, value: Assigned) -> Result<(), DocumentError> {
        let (value, _) = value.into_parts();
        if key == "length" {
            return self.set_length(&value);
        }
        self.node.set(key, value)
    }

    fn delete(&self, key: &str) -> bool {
        self.node.del(key)
    }

    fn keys(&self) -> Vec<String> {
        (0..self.len()).map(|i| i.to_string()).collect()
    }

    fn constructor(&self) -> TypeTag {
        TypeTag::Array
    }
}

impl IntoIterator for &ArrayView {
    type Item = Slot;
    type IntoIter = std::vec::IntoIter<Slot>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for ArrayView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

impl fmt::Debug for ArrayView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect(2))
    }
}

fn relative_index(index: isize, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs())
    } else {
        (index as usize).min(len)
    }
}

/// Equality where `1` and `1.0` match.
fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare_as_strings(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        _ => js_string(a).cmp(&js_string(b)),
    }
}

fn join_values(values: &[Value], separator: &str) -> String {
    values
        .iter()
        .map(|value| match value {
            Value::Null => String::new(),
            other => js_string(other),
        })
        .collect::<Vec<_>>()
        .join(separator)
}

/// String conversion of a plain value.
pub(crate) fn js_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_string(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => join_values(items, ","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

pub(crate) fn number_string(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}
