use std::sync::Arc;

use serde_json::{Map, Value};

use super::rule::{Constraint, Presence, Rule};
use super::TypeTag;
use crate::error::TopicError;
use crate::view::ObjectView;

/// An instance method. `this` is the live view the method was read from, so
/// mutations made through it land in the document.
pub type Method = fn(this: &ObjectView, args: &[Value]) -> Result<Value, TopicError>;

/// Extra check applied to every `(key, value)` entry of a map-of value.
pub type KeyCheck = fn(key: &str, value: &Value) -> Result<(), String>;

/// A declared class: ordered fields, methods, and an optional map-of element.
#[derive(Clone)]
pub struct ClassDef {
    name: Arc<str>,
    fields: Vec<FieldDef>,
    methods: Vec<(String, Method)>,
    map_element: Option<Arc<str>>,
    key_check: Option<KeyCheck>,
}

impl ClassDef {
    pub fn new(name: impl AsRef<str>) -> Self {
        ClassDef {
            name: Arc::from(name.as_ref()),
            fields: Vec::new(),
            methods: Vec::new(),
            map_element: None,
            key_check: None,
        }
    }

    /// A class whose instances are string-keyed maps of `element` instances.
    pub fn map_of(name: impl AsRef<str>, element: impl AsRef<str>) -> Self {
        let mut class = ClassDef::new(name);
        class.map_element = Some(Arc::from(element.as_ref()));
        class
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.retain(|f| f.name != field.name);
        self.fields.push(field);
        self
    }

    pub fn method(mut self, name: impl Into<String>, method: Method) -> Self {
        let name = name.into();
        self.methods.retain(|(n, _)| *n != name);
        self.methods.push((name, method));
        self
    }

    /// Entry check for map classes.
    pub fn key_check(mut self, check: KeyCheck) -> Self {
        self.key_check = Some(check);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn get_method(&self, name: &str) -> Option<Method> {
        self.methods
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, method)| *method)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(|(n, _)| n.as_str())
    }

    pub fn map_element(&self) -> Option<&Arc<str>> {
        self.map_element.as_ref()
    }

    pub fn map_key_check(&self) -> Option<KeyCheck> {
        self.key_check
    }

    /// Declared defaults, as a fresh instance would carry them.
    pub fn defaults(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter_map(|f| f.default.clone().map(|value| (f.name.clone(), value)))
            .collect()
    }
}

/// A declared property.
#[derive(Clone)]
pub struct FieldDef {
    name: String,
    ty: Option<TypeTag>,
    constraints: Vec<Constraint>,
    nested: bool,
    presence: Presence,
    default: Option<Value>,
    key_check: Option<KeyCheck>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>) -> Self {
        FieldDef {
            name: name.into(),
            ty: None,
            constraints: Vec::new(),
            nested: false,
            presence: Presence::Checked,
            default: None,
            key_check: None,
        }
    }

    /// Declare the element class of this property (for arrays, of each element).
    pub fn of(mut self, class: impl AsRef<str>) -> Self {
        self.ty = Some(TypeTag::class(class));
        self
    }

    /// Declare this property as an anonymous map of `element` instances.
    /// Map entries are always validated.
    pub fn map_of(mut self, element: impl AsRef<str>) -> Self {
        self.ty = Some(TypeTag::map_of(element));
        self.nested = true;
        self
    }

    pub fn key_check(mut self, check: KeyCheck) -> Self {
        self.key_check = Some(check);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.constraints.push(Constraint::new(rule));
        self
    }

    /// Apply `rule` to every element when the value is an array.
    pub fn each(mut self, rule: Rule) -> Self {
        self.constraints.push(Constraint::each(rule));
        self
    }

    /// Validate the structured value against its resolved class.
    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }

    /// Allow the property to be absent (or null) without running its rules.
    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> Option<&TypeTag> {
        self.ty.as_ref()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_nested(&self) -> bool {
        self.nested
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn get_key_check(&self) -> Option<KeyCheck> {
        self.key_check
    }
}
