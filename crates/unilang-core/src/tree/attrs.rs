//! Cross-cutting declaration concerns and capability traits.
//!
//! Every node kind declares explicitly which capability sets it satisfies:
//!
//! | Node | [`HasAttributesAndTrivia`] | [`Variable`] | [`HasInitializer`] | [`HasInterfaceShape`] | [`HasCallableShape`] |
//! |------|:---:|:---:|:---:|:---:|:---:|
//! | `Import`          | ✓ | | | | |
//! | `Enum`            | ✓ | | | | |
//! | `Interface`       | ✓ | | | ✓ | |
//! | `Class`           | ✓ | | | ✓ | |
//! | `Field`           | ✓ | ✓ | ✓ | | |
//! | `Property`        | ✓ | ✓ | | | |
//! | `MethodParameter` | | ✓ | ✓ | | |
//! | `Constructor`     | ✓ | | | | ✓ |
//! | `Method`          | ✓ | | | | ✓ |

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::expr::{Block, Expression};
use super::ids::{CallableId, MethodId, NameMap, ParameterId};
use super::types::TypeRef;

/// Member access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// Value of an attribute attached by upstream tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A bare flag (`@mutates`).
    Flag(bool),
    /// A text-valued attribute (`@target typescript`).
    Text(String),
}

/// Ordered name → attribute value mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    entries: IndexMap<String, AttributeValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Attributes::default()
    }

    /// Set or replace an attribute; replacing keeps its position.
    pub fn set(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.entries.insert(name.into(), value);
    }

    /// Set a flag attribute.
    pub fn flag(&mut self, name: impl Into<String>) {
        self.set(name, AttributeValue::Flag(true));
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries.get(name)
    }

    /// Text of a text-valued attribute.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(AttributeValue::Text(t)) => Some(t),
            _ => None,
        }
    }

    /// Whether a flag is set (a text value also counts as present).
    pub fn has(&self, name: &str) -> bool {
        !matches!(self.get(name), None | Some(AttributeValue::Flag(false)))
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.entries.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, AttributeValue)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, AttributeValue)>>(iter: T) -> Self {
        let mut attrs = Attributes::new();
        for (name, value) in iter {
            attrs.set(name, value);
        }
        attrs
    }
}

// ============================================================================
// Capability Traits
// ============================================================================

/// Declarations that preserve formatting trivia and carry attributes.
pub trait HasAttributesAndTrivia {
    /// Comments and whitespace preceding the declaration.
    fn leading_trivia(&self) -> &str;
    fn attributes(&self) -> &Attributes;
}

/// A named, typed slot.
pub trait Variable {
    fn name(&self) -> &str;
    fn ty(&self) -> &TypeRef;
}

/// A variable with an optional default or initial value.
pub trait HasInitializer: Variable {
    fn initializer(&self) -> Option<&Expression>;
}

/// Structure shared by classes and interfaces.
pub trait HasInterfaceShape: HasAttributesAndTrivia {
    fn name(&self) -> &str;
    fn type_arguments(&self) -> &[String];
    fn base_interfaces(&self) -> &[TypeRef];
    fn methods(&self) -> &NameMap<MethodId>;
}

/// Structure shared by constructors and methods.
pub trait HasCallableShape: HasAttributesAndTrivia {
    fn callable_id(&self) -> CallableId;
    fn parameters(&self) -> &[ParameterId];
    /// `None` for abstract and interface methods.
    fn body(&self) -> Option<&Block>;
    /// Whether the callable may fail.
    fn throws(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_replace_in_place() {
        let mut attrs = Attributes::new();
        attrs.flag("mutates");
        attrs.set("target", AttributeValue::Text("ts".into()));
        attrs.set("mutates", AttributeValue::Flag(false));

        assert_eq!(attrs.iter().map(|(n, _)| n).collect::<Vec<_>>(), vec!["mutates", "target"]);
        assert!(!attrs.has("mutates"));
        assert!(attrs.has("target"));
        assert_eq!(attrs.text("target"), Some("ts"));
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut attrs: Attributes = ["a", "b", "c"]
            .into_iter()
            .map(|n| (n, AttributeValue::Flag(true)))
            .collect();
        assert_eq!(attrs.remove("a"), Some(AttributeValue::Flag(true)));
        assert!(attrs.remove("a").is_none());
        assert_eq!(attrs.iter().map(|(n, _)| n).collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn attributes_serialize_as_ordered_object() {
        let attrs: Attributes = [
            ("throws", AttributeValue::Flag(true)),
            ("lang", AttributeValue::Text("ts".to_string())),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(json, r#"{"throws":true,"lang":"ts"}"#);
        let back: Attributes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attrs);
    }
}
