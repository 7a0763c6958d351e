//! Type references attached to declarations.
//!
//! Types are resolved before they reach the tree; the core performs no
//! inference and only carries what upstream tooling attached.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A resolved (or explicitly unknown) type reference.
///
/// # Examples
///
/// ```
/// use unilang_core::tree::TypeRef;
///
/// // OneMap<string, TsArray<number>>
/// let map = TypeRef::class_with_args(
///     "OneMap",
///     vec![
///         TypeRef::class("string"),
///         TypeRef::class_with_args("TsArray", vec![TypeRef::class("number")]),
///     ],
/// );
/// assert_eq!(map.to_string(), "OneMap<string, TsArray<number>>");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeRef {
    /// Accepts any value.
    Any,
    /// No value (method return type).
    Void,
    /// Not resolved by upstream tooling.
    #[default]
    Unknown,
    /// A generic type parameter in scope (e.g. `T`).
    Generic { name: String },
    /// An enum declared in some source file.
    Enum { name: String },
    /// A class type, possibly generic.
    Class {
        name: String,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        type_args: Vec<TypeRef>,
    },
    /// An interface type, possibly generic.
    Interface {
        name: String,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        type_args: Vec<TypeRef>,
    },
    /// A function type.
    Lambda {
        params: Vec<TypeRef>,
        returns: Box<TypeRef>,
    },
}

impl TypeRef {
    pub fn generic(name: impl Into<String>) -> Self {
        TypeRef::Generic { name: name.into() }
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        TypeRef::Enum { name: name.into() }
    }

    pub fn class(name: impl Into<String>) -> Self {
        TypeRef::Class {
            name: name.into(),
            type_args: vec![],
        }
    }

    pub fn class_with_args(name: impl Into<String>, type_args: Vec<TypeRef>) -> Self {
        TypeRef::Class {
            name: name.into(),
            type_args,
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        TypeRef::Interface {
            name: name.into(),
            type_args: vec![],
        }
    }

    pub fn interface_with_args(name: impl Into<String>, type_args: Vec<TypeRef>) -> Self {
        TypeRef::Interface {
            name: name.into(),
            type_args,
        }
    }

    pub fn lambda(params: Vec<TypeRef>, returns: TypeRef) -> Self {
        TypeRef::Lambda {
            params,
            returns: Box::new(returns),
        }
    }

    /// Declared name for named types.
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeRef::Generic { name }
            | TypeRef::Enum { name }
            | TypeRef::Class { name, .. }
            | TypeRef::Interface { name, .. } => Some(name),
            _ => None,
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[TypeRef]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    f.write_str("<")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", arg)?;
    }
    f.write_str(">")
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Any => f.write_str("any"),
            TypeRef::Void => f.write_str("void"),
            TypeRef::Unknown => f.write_str("?"),
            TypeRef::Generic { name } | TypeRef::Enum { name } => f.write_str(name),
            TypeRef::Class { name, type_args } | TypeRef::Interface { name, type_args } => {
                f.write_str(name)?;
                write_args(f, type_args)
            }
            TypeRef::Lambda { params, returns } => {
                f.write_str("(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") => {}", returns)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lambda() {
        let ty = TypeRef::lambda(vec![TypeRef::generic("T")], TypeRef::Void);
        assert_eq!(ty.to_string(), "(T) => void");
    }

    #[test]
    fn serializes_tagged() {
        let json = serde_json::to_string(&TypeRef::class("Foo")).unwrap();
        assert_eq!(json, r#"{"kind":"class","name":"Foo"}"#);
        let back: TypeRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TypeRef::class("Foo"));
    }
}
