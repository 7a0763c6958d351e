//! Node handles and name-keyed member maps.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

macro_rules! node_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn new(id: u32) -> Self {
                $name(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }
    };
}

node_id!(
    /// Handle of a source file within a [`SyntaxTree`](super::SyntaxTree).
    FileId,
    "file"
);
node_id!(ImportId, "imp");
node_id!(EnumId, "enum");
node_id!(EnumMemberId, "enum_member");
node_id!(InterfaceId, "iface");
node_id!(ClassId, "class");
node_id!(FieldId, "field");
node_id!(PropertyId, "prop");
node_id!(ConstructorId, "ctor");
node_id!(MethodId, "method");
node_id!(ParameterId, "param");

/// A constructor or method: anything with a [`HasCallableShape`](super::HasCallableShape).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CallableId {
    Constructor(ConstructorId),
    Method(MethodId),
}

/// Declaration that owns a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum MethodOwner {
    Class(ClassId),
    Interface(InterfaceId),
}

/// Any declaration that carries trivia and attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Import(ImportId),
    Enum(EnumId),
    Interface(InterfaceId),
    Class(ClassId),
    Field(FieldId),
    Property(PropertyId),
    Constructor(ConstructorId),
    Method(MethodId),
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Import(id) => write!(f, "{}", id),
            NodeRef::Enum(id) => write!(f, "{}", id),
            NodeRef::Interface(id) => write!(f, "{}", id),
            NodeRef::Class(id) => write!(f, "{}", id),
            NodeRef::Field(id) => write!(f, "{}", id),
            NodeRef::Property(id) => write!(f, "{}", id),
            NodeRef::Constructor(id) => write!(f, "{}", id),
            NodeRef::Method(id) => write!(f, "{}", id),
        }
    }
}

/// Name-keyed map of member handles, iterating in declaration order.
///
/// Names are unique; the tree rejects a duplicate before it is inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameMap<I> {
    entries: IndexMap<String, I>,
}

impl<I> Default for NameMap<I> {
    fn default() -> Self {
        NameMap {
            entries: IndexMap::new(),
        }
    }
}

impl<I: Copy> NameMap<I> {
    pub fn new() -> Self {
        NameMap::default()
    }

    pub fn get(&self, name: &str) -> Option<I> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, I)> + '_ {
        self.entries.iter().map(|(n, id)| (n.as_str(), *id))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        self.entries.values().copied()
    }

    /// Append an entry. Callers validate uniqueness first.
    pub(crate) fn push(&mut self, name: String, id: I) {
        debug_assert!(!self.contains(&name));
        self.entries.insert(name, id);
    }
}
