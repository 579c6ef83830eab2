use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::{wrap, Assigned, BoundMethod, Intrinsic, IntrinsicKind, Slot, StructuredView};
use crate::document::{DocumentError, Node};
use crate::error::{TopicError, Violation};
use crate::schema::{validate_node, TypeRegistry, TypeTag};

/// View over an object node, read as an instance of `ctor`.
#[derive(Clone)]
pub struct ObjectView {
    node: Node,
    ctor: TypeTag,
    registry: Arc<TypeRegistry>,
}

impl ObjectView {
    pub fn new(node: Node, ctor: TypeTag, registry: Arc<TypeRegistry>) -> Self {
        ObjectView {
            node,
            ctor,
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Type a structured child at `key` is read as: declared first, then
    /// whatever was last assigned there.
    pub fn child_type(&self, key: &str) -> Option<TypeTag> {
        self.registry
            .lookup(&self.ctor, key)
            .or_else(|| self.node.type_hint(key))
    }

    /// Call the class method `name` with this view as `this`.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, TopicError> {
        let method = self
            .registry
            .method(&self.ctor, name)
            .ok_or_else(|| TopicError::UnknownMethod {
                class: self.ctor.name().to_string(),
                method: name.to_string(),
            })?;
        method(self, args)
    }

    pub fn values(&self) -> Vec<Slot> {
        self.entries().into_iter().map(|(_, slot)| slot).collect()
    }

    pub fn entries(&self) -> Vec<(String, Slot)> {
        self.node
            .entries()
            .into_iter()
            .map(|(key, child)| {
                let slot = wrap(child, self.child_type(&key), &self.registry);
                (key, slot)
            })
            .collect()
    }

    /// Violations of this value against its class rules.
    pub fn validate(&self) -> Vec<Violation> {
        validate_node(&self.registry, &self.ctor, &self.node)
    }
}

impl StructuredView for ObjectView {
    fn node(&self) -> &Node {
        &self.node
    }

    fn get(&self, key: &str) -> Slot {
        if let Some(kind) = IntrinsicKind::from_key(key) {
            return Slot::Intrinsic(Intrinsic::for_object(kind, self.clone()));
        }
        if key == "constructor" {
            return Slot::Type(self.ctor.clone());
        }

        match self.node.child(key) {
            Some(child) => wrap(child, self.child_type(key), &self.registry),
            None => match self.registry.method(&self.ctor, key) {
                Some(method) => Slot::Method(BoundMethod::new(key, self.clone(), method)),
                None => Slot::Undefined,
            },
        }
    }

    fn assign(&self, key: &str, value: Assigned) -> Result<(), DocumentError> {
        let (value, tag) = value.into_parts();
        self.node.set(key, value)?;
        self.node.set_type_hint(key, tag);
        Ok(())
    }

    fn delete(&self, key: &str) -> bool {
        self.node.del(key)
    }

    fn keys(&self) -> Vec<String> {
        self.node.keys()
    }

    fn constructor(&self) -> TypeTag {
        self.ctor.clone()
    }
}

impl fmt::Display for ObjectView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

impl fmt::Debug for ObjectView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect(2))
    }
}
