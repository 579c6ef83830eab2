use super::class::KeyCheck;
use super::registry::TypeRegistry;
use super::rule::check_field;
use super::TypeTag;
use crate::document::Node;
use crate::error::Violation;

/// Validate `node` as an instance of `tag`, returning every violation found.
///
/// Only declared classes carry rules; generic objects and arrays are
/// accepted as-is. Nested values are followed when their field is flagged
/// `nested` or declared as a map, using the declared type or, failing that,
/// the type last assigned at that key.
pub fn validate_node(registry: &TypeRegistry, tag: &TypeTag, node: &Node) -> Vec<Violation> {
    let mut violations = Vec::new();
    walk(registry, tag, node, "", None, &mut violations);
    violations
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Map-typed values are always validated, nested flag or not.
fn is_map(registry: &TypeRegistry, ty: Option<&TypeTag>) -> bool {
    match ty {
        Some(TypeTag::MapOf(_)) => true,
        Some(TypeTag::Class(name)) => registry
            .class(name)
            .is_some_and(|class| class.map_element().is_some()),
        _ => false,
    }
}

fn walk(
    registry: &TypeRegistry,
    tag: &TypeTag,
    node: &Node,
    prefix: &str,
    key_check: Option<KeyCheck>,
    out: &mut Vec<Violation>,
) {
    if !node.is_object() {
        return;
    }

    match tag {
        TypeTag::MapOf(element) => {
            walk_map(registry, element, node, prefix, key_check, out);
        }
        TypeTag::Class(name) => {
            let Some(class) = registry.class(name) else {
                return;
            };

            if let Some(element) = class.map_element() {
                let check = key_check.or(class.map_key_check());
                walk_map(registry, element, node, prefix, check, out);
                return;
            }

            for field in class.fields() {
                let path = join(prefix, field.name());
                let child = node.child(field.name());
                let value = child.as_ref().map(Node::value_of);

                if let Some(violation) = check_field(
                    &path,
                    field.name(),
                    value.as_ref(),
                    field.constraints(),
                    field.presence(),
                ) {
                    out.push(violation);
                }

                let follows = field.is_nested() || is_map(registry, field.ty());
                let Some(child) = child.filter(|_| follows) else {
                    continue;
                };
                let Some(child_tag) = field
                    .ty()
                    .cloned()
                    .or_else(|| node.type_hint(field.name()))
                else {
                    continue;
                };

                if child.is_array() {
                    for (i, item) in child.items().iter().enumerate() {
                        let item_path = join(&path, &i.to_string());
                        walk(registry, &child_tag, item, &item_path, field.get_key_check(), out);
                    }
                } else {
                    walk(registry, &child_tag, &child, &path, field.get_key_check(), out);
                }
            }
        }
        TypeTag::Object | TypeTag::Array => {}
    }
}

fn walk_map(
    registry: &TypeRegistry,
    element: &str,
    node: &Node,
    prefix: &str,
    key_check: Option<KeyCheck>,
    out: &mut Vec<Violation>,
) {
    let element = TypeTag::class(element);
    for (key, child) in node.entries() {
        let path = join(prefix, &key);
        walk(registry, &element, &child, &path, None, out);

        if let Some(check) = key_check {
            let value = child.value_of();
            if let Err(message) = check(&key, &value) {
                out.push(Violation::new(&path, Some(value)).constraint(
                    "mapOf",
                    format!("Validation error on {}: {}", path, message),
                ));
            }
        }
    }
}
