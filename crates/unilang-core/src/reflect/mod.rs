//! Reflection registry.
//!
//! Maps a type identity to the structural description of that type (its
//! fields, properties and methods) so generic code can read, write and invoke
//! members of any registered type by name:
//!
//! ```
//! use unilang_core::reflect::{ClassDescription, FieldSpec, MethodSpec, Registry};
//! use unilang_core::value::Value;
//!
//! let mut registry = Registry::new();
//! let token = registry
//!     .register(
//!         ClassDescription::new("demo.Counter")
//!             .field(FieldSpec::new_static("count", Value::Int(0)))
//!             .method(MethodSpec::instance("increment", vec![], |call| {
//!                 let next = call.field("count")?.as_int()? + 1;
//!                 call.set_field("count", Value::Int(next))?;
//!                 Ok(Value::Int(next))
//!             })),
//!     )
//!     .unwrap();
//!
//! let counter = registry.instantiate(token).unwrap();
//! registry.call(&counter, "increment", &[]).unwrap();
//! assert_eq!(registry.get_field(&counter, "count").unwrap(), Value::Int(1));
//! ```
//!
//! # Identity
//!
//! Every registration is issued a fresh [`TypeToken`]; the qualified name in a
//! description is never used as the key. Registering a description whose
//! qualified name is already present is idempotent when the member outline is
//! identical and a [`CoreError::DuplicateDeclaration`] otherwise.
//!
//! # Lifecycle
//!
//! [`Registry::register`] takes `&mut self`; every read path takes `&self`.
//! Registration therefore completes before any reader holds the registry, and
//! descriptions are immutable once registered. Instance and static state live
//! in shared value handles, so member access does not need `&mut`.

mod descriptor;

pub use descriptor::{
    ClassDescription, ClassDescriptor, FieldDescriptor, FieldSpec, Invocation, MethodArgument,
    MethodBody, MethodDescriptor, MethodSpec, PropertyDescriptor, PropertySpec,
};

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use descriptor::MemberShape;

use crate::error::{CoreError, CoreResult};
use crate::value::{ObjectValue, Value};

// ============================================================================
// Type Token
// ============================================================================

/// Stable identity of a registered type, issued at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeToken(pub u32);

impl TypeToken {
    pub fn new(id: u32) -> Self {
        TypeToken(id)
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type_{}", self.0)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Catalog of registered type descriptions.
#[derive(Debug, Default)]
pub struct Registry {
    classes: BTreeMap<TypeToken, ClassDescriptor>,
    /// qualified name → token (idempotency check only)
    by_name: HashMap<String, TypeToken>,
    /// Property accessors currently running: (owner, property, target address).
    active_accessors: RefCell<Vec<(TypeToken, String, Option<usize>)>>,
    /// Re-registering an identical description fails instead of returning
    /// the existing token.
    strict: bool,
    next_token: u32,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// A registry that rejects every re-registration of a qualified name.
    pub fn strict() -> Self {
        Registry {
            strict: true,
            ..Registry::default()
        }
    }

    fn next_token(&mut self) -> TypeToken {
        let token = TypeToken::new(self.next_token);
        self.next_token += 1;
        token
    }

    /// Install a type description and return its token.
    ///
    /// Member names must be unique across fields, properties and methods.
    pub fn register(&mut self, description: ClassDescription) -> CoreResult<TypeToken> {
        description.validate()?;
        let shape = description.shape();

        if let Some(&existing) = self.by_name.get(&description.name) {
            let registered = self.get(existing)?;
            if registered.shape == shape && !self.strict {
                tracing::debug!(name = %description.name, token = %existing, "already registered");
                return Ok(existing);
            }
            tracing::warn!(name = %description.name, "conflicting re-registration");
            return Err(CoreError::duplicate("type", &description.name, "registry"));
        }

        Ok(self.install(description, shape))
    }

    /// Install a type description whose name must not be registered yet.
    ///
    /// Shapes do not cover method bodies, so descriptions built from source
    /// are never matched against an earlier registration.
    pub fn register_new(&mut self, description: ClassDescription) -> CoreResult<TypeToken> {
        description.validate()?;
        if self.by_name.contains_key(&description.name) {
            tracing::warn!(name = %description.name, "type name already registered");
            return Err(CoreError::duplicate("type", &description.name, "registry"));
        }
        let shape = description.shape();
        Ok(self.install(description, shape))
    }

    fn install(&mut self, description: ClassDescription, shape: Vec<MemberShape>) -> TypeToken {
        let token = self.next_token();
        let statics = ObjectValue::with_class(Some(token));
        let fields: Vec<FieldDescriptor> = description
            .fields
            .into_iter()
            .map(|spec| {
                if spec.is_static {
                    statics.insert(spec.name.clone(), spec.initial.deep_copy());
                }
                FieldDescriptor {
                    name: spec.name,
                    is_static: spec.is_static,
                    initial: spec.initial,
                    owner: token,
                }
            })
            .collect();
        let properties: Vec<PropertyDescriptor> = description
            .properties
            .into_iter()
            .map(|spec| PropertyDescriptor {
                name: spec.name,
                is_static: spec.is_static,
                getter: spec.getter,
                setter: spec.setter,
                owner: token,
            })
            .collect();
        let methods: Vec<MethodDescriptor> = description
            .methods
            .into_iter()
            .map(|spec| MethodDescriptor {
                name: spec.name,
                is_static: spec.is_static,
                args: spec.args,
                body: spec.body,
                owner: token,
            })
            .collect();

        tracing::debug!(name = %description.name, %token, "registered type");
        self.by_name.insert(description.name.clone(), token);
        self.classes.insert(
            token,
            ClassDescriptor {
                token,
                name: description.name,
                fields,
                properties,
                methods,
                statics,
                shape,
            },
        );
        token
    }

    /// Description registered under `token`.
    pub fn get(&self, token: TypeToken) -> CoreResult<&ClassDescriptor> {
        self.classes.get(&token).ok_or_else(|| CoreError::NotRegistered {
            type_name: token.to_string(),
        })
    }

    /// Description registered under a qualified name.
    pub fn by_name(&self, name: &str) -> Option<&ClassDescriptor> {
        self.by_name.get(name).and_then(|t| self.classes.get(t))
    }

    /// Resolve a runtime value to the description of its type.
    pub fn lookup(&self, value: &Value) -> CoreResult<&ClassDescriptor> {
        match value {
            Value::Object(object) => match object.class() {
                Some(token) => self.get(token),
                None => Err(CoreError::NotRegistered {
                    type_name: "untyped object".to_string(),
                }),
            },
            other => Err(CoreError::NotRegistered {
                type_name: other.kind().to_string(),
            }),
        }
    }

    /// Create an instance with every instance field at its initial value.
    pub fn instantiate(&self, token: TypeToken) -> CoreResult<Value> {
        let class = self.get(token)?;
        let object = ObjectValue::with_class(Some(token));
        for field in class.fields.iter().filter(|f| !f.is_static) {
            object.insert(field.name.clone(), field.initial.deep_copy());
        }
        Ok(Value::Object(object))
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Registered descriptions in registration order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.classes.values()
    }

    // ========================================================================
    // Name-based access
    // ========================================================================

    /// Read a field of `target` by name.
    pub fn get_field(&self, target: &Value, name: &str) -> CoreResult<Value> {
        self.lookup(target)?.field(name)?.get(self, target)
    }

    /// Write a field of `target` by name.
    pub fn set_field(&self, target: &Value, name: &str, value: Value) -> CoreResult<()> {
        self.lookup(target)?.field(name)?.set(self, target, value)
    }

    /// Read a property of `target` by name.
    pub fn get_property(&self, target: &Value, name: &str) -> CoreResult<Value> {
        self.lookup(target)?.property(name)?.get(self, target)
    }

    /// Write a property of `target` by name.
    pub fn set_property(&self, target: &Value, name: &str, value: Value) -> CoreResult<()> {
        self.lookup(target)?.property(name)?.set(self, target, value)
    }

    /// Invoke a method of `target`'s type with `target` as receiver.
    pub fn call(&self, target: &Value, name: &str, args: &[Value]) -> CoreResult<Value> {
        self.lookup(target)?.method(name)?.invoke(self, target, args)
    }

    /// Invoke a static method of the type registered under `token`.
    pub fn call_static(&self, token: TypeToken, name: &str, args: &[Value]) -> CoreResult<Value> {
        self.get(token)?.method(name)?.invoke(self, &Value::Null, args)
    }

    pub(crate) fn name_of(&self, token: TypeToken) -> String {
        self.classes
            .get(&token)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| token.to_string())
    }

    pub(crate) fn enter_accessor(
        &self,
        owner: TypeToken,
        property: &str,
        target: Option<usize>,
        class_name: &str,
    ) -> CoreResult<AccessorGuard<'_>> {
        let mut active = self.active_accessors.borrow_mut();
        if active
            .iter()
            .any(|(t, p, a)| *t == owner && p == property && *a == target)
        {
            return Err(CoreError::ReentrantAccessor {
                property: format!("{}::{}", class_name, property),
            });
        }
        active.push((owner, property.to_string(), target));
        Ok(AccessorGuard {
            registry: self,
            depth: active.len(),
        })
    }
}

/// Marks a property accessor as running until dropped.
pub(crate) struct AccessorGuard<'r> {
    registry: &'r Registry,
    depth: usize,
}

impl Drop for AccessorGuard<'_> {
    fn drop(&mut self) {
        self.registry
            .active_accessors
            .borrow_mut()
            .truncate(self.depth - 1);
    }
}

// ============================================================================
// Tests
// ============================================================================
