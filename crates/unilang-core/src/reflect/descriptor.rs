//! Structural descriptions and their registered descriptors.
//!
//! A [`ClassDescription`] is the registration input: it carries no identity.
//! [`Registry::register`](super::Registry::register) turns it into a
//! [`ClassDescriptor`] whose field, property and method descriptors each hold
//! the [`TypeToken`] of their owner as a lookup-only back-reference.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::{Registry, TypeToken};
use crate::error::{CoreError, CoreResult};
use crate::value::{ObjectValue, Value};

/// Implementation of a registered method or property accessor.
pub type MethodBody = Rc<dyn Fn(&Invocation<'_>) -> CoreResult<Value>>;

// ============================================================================
// Registration Input
// ============================================================================

/// Declared argument of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodArgument {
    pub name: String,
    /// Declared type name, as written by the describing code.
    pub type_name: String,
}

impl MethodArgument {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        MethodArgument {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Field registration input.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub is_static: bool,
    /// Initial slot value; copied into every new instance (or once into the
    /// static state for static fields).
    pub initial: Value,
}

impl FieldSpec {
    pub fn instance(name: impl Into<String>, initial: Value) -> Self {
        FieldSpec {
            name: name.into(),
            is_static: false,
            initial,
        }
    }

    pub fn new_static(name: impl Into<String>, initial: Value) -> Self {
        FieldSpec {
            name: name.into(),
            is_static: true,
            initial,
        }
    }
}

/// Method registration input.
#[derive(Clone)]
pub struct MethodSpec {
    pub name: String,
    pub is_static: bool,
    pub args: Vec<MethodArgument>,
    pub body: MethodBody,
}

impl MethodSpec {
    /// An instance method.
    pub fn instance(
        name: impl Into<String>,
        args: Vec<MethodArgument>,
        body: impl Fn(&Invocation<'_>) -> CoreResult<Value> + 'static,
    ) -> Self {
        MethodSpec {
            name: name.into(),
            is_static: false,
            args,
            body: Rc::new(body),
        }
    }

    /// A static method; the receiver passed at invocation is ignored.
    pub fn new_static(
        name: impl Into<String>,
        args: Vec<MethodArgument>,
        body: impl Fn(&Invocation<'_>) -> CoreResult<Value> + 'static,
    ) -> Self {
        MethodSpec {
            is_static: true,
            ..MethodSpec::instance(name, args, body)
        }
    }
}

/// Property registration input.
#[derive(Clone)]
pub struct PropertySpec {
    pub name: String,
    pub is_static: bool,
    pub getter: Option<MethodBody>,
    pub setter: Option<MethodBody>,
}

impl PropertySpec {
    pub fn new(name: impl Into<String>, is_static: bool) -> Self {
        PropertySpec {
            name: name.into(),
            is_static,
            getter: None,
            setter: None,
        }
    }

    pub fn with_getter(
        mut self,
        body: impl Fn(&Invocation<'_>) -> CoreResult<Value> + 'static,
    ) -> Self {
        self.getter = Some(Rc::new(body));
        self
    }

    /// The setter receives the new value as its single argument.
    pub fn with_setter(
        mut self,
        body: impl Fn(&Invocation<'_>) -> CoreResult<Value> + 'static,
    ) -> Self {
        self.setter = Some(Rc::new(body));
        self
    }
}

/// Structural description of one type, ready for registration.
#[derive(Clone)]
pub struct ClassDescription {
    /// Qualified name (e.g. `"app.models.Counter"`). Used for idempotency
    /// checks and diagnostics only; identity is the issued token.
    pub name: String,
    pub fields: Vec<FieldSpec>,
    pub properties: Vec<PropertySpec>,
    pub methods: Vec<MethodSpec>,
}

impl ClassDescription {
    pub fn new(name: impl Into<String>) -> Self {
        ClassDescription {
            name: name.into(),
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn property(mut self, property: PropertySpec) -> Self {
        self.properties.push(property);
        self
    }

    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    /// Reject two members sharing a name anywhere in the description.
    pub(crate) fn validate(&self) -> CoreResult<()> {
        let scope = format!("type {}", self.name);
        let mut seen: HashMap<&str, &'static str> = HashMap::new();
        let members = self
            .fields
            .iter()
            .map(|f| (f.name.as_str(), "field"))
            .chain(self.properties.iter().map(|p| (p.name.as_str(), "property")))
            .chain(self.methods.iter().map(|m| (m.name.as_str(), "method")));
        for (name, kind) in members {
            if seen.insert(name, kind).is_some() {
                return Err(CoreError::duplicate(kind, name, scope));
            }
        }
        for method in &self.methods {
            let mut args = HashMap::new();
            for arg in &method.args {
                if args.insert(arg.name.as_str(), ()).is_some() {
                    return Err(CoreError::duplicate(
                        "argument",
                        &arg.name,
                        format!("method {}::{}", self.name, method.name),
                    ));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn shape(&self) -> Vec<MemberShape> {
        let mut shape: Vec<MemberShape> = self
            .fields
            .iter()
            .map(|f| MemberShape::Field {
                name: f.name.clone(),
                is_static: f.is_static,
            })
            .chain(self.properties.iter().map(|p| MemberShape::Property {
                name: p.name.clone(),
                is_static: p.is_static,
                readable: p.getter.is_some(),
                writable: p.setter.is_some(),
            }))
            .chain(self.methods.iter().map(|m| MemberShape::Method {
                name: m.name.clone(),
                is_static: m.is_static,
                args: m.args.clone(),
            }))
            .collect();
        shape.sort_by(|a, b| a.name().cmp(b.name()));
        shape
    }
}

/// Comparable outline of a member, used for idempotent re-registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MemberShape {
    Field {
        name: String,
        is_static: bool,
    },
    Property {
        name: String,
        is_static: bool,
        readable: bool,
        writable: bool,
    },
    Method {
        name: String,
        is_static: bool,
        args: Vec<MethodArgument>,
    },
}

impl MemberShape {
    fn name(&self) -> &str {
        match self {
            MemberShape::Field { name, .. }
            | MemberShape::Property { name, .. }
            | MemberShape::Method { name, .. } => name,
        }
    }
}

// ============================================================================
// Registered Descriptors
// ============================================================================

/// A registered field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub is_static: bool,
    pub initial: Value,
    /// Owning registry entry (lookup only).
    pub owner: TypeToken,
}

impl FieldDescriptor {
    /// Read the slot from `target`, or from the owner's static state for a
    /// static field (in which case `target` is ignored).
    pub fn get(&self, registry: &Registry, target: &Value) -> CoreResult<Value> {
        let slots = self.slots(registry, target)?;
        slots
            .lookup(&self.name)
            .ok_or_else(|| CoreError::key_not_found(&self.name))
    }

    /// Write the slot on `target`, or on the owner's static state for a
    /// static field.
    pub fn set(&self, registry: &Registry, target: &Value, value: Value) -> CoreResult<()> {
        let slots = self.slots(registry, target)?;
        slots.insert(self.name.clone(), value);
        Ok(())
    }

    fn slots(&self, registry: &Registry, target: &Value) -> CoreResult<ObjectValue> {
        let class = registry.get(self.owner)?;
        if self.is_static {
            Ok(class.statics.clone())
        } else {
            Ok(class.check_instance(registry, target)?.clone())
        }
    }
}

/// A registered method.
#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: String,
    pub is_static: bool,
    pub args: Vec<MethodArgument>,
    pub body: MethodBody,
    /// Owning registry entry (lookup only).
    pub owner: TypeToken,
}

impl MethodDescriptor {
    /// Invoke with `receiver` bound as the call target.
    ///
    /// Arity is validated before anything else runs. For a static method the
    /// receiver is ignored. No coercion or argument defaulting happens here.
    pub fn invoke(
        &self,
        registry: &Registry,
        receiver: &Value,
        args: &[Value],
    ) -> CoreResult<Value> {
        let class = registry.get(self.owner)?;
        if args.len() != self.args.len() {
            return Err(CoreError::ArgumentCountMismatch {
                expected: self.args.len(),
                actual: args.len(),
                method: format!("{}::{}", class.name, self.name),
            });
        }
        let receiver = if self.is_static {
            None
        } else {
            class.check_instance(registry, receiver)?;
            Some(receiver)
        };
        tracing::trace!(class = %class.name, method = %self.name, "invoke");
        (self.body)(&Invocation {
            registry,
            class,
            receiver,
            args,
        })
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("is_static", &self.is_static)
            .field("args", &self.args)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// A registered property with optional accessors.
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub is_static: bool,
    pub getter: Option<MethodBody>,
    pub setter: Option<MethodBody>,
    /// Owning registry entry (lookup only).
    pub owner: TypeToken,
}

impl PropertyDescriptor {
    /// Run the getter against `target`.
    ///
    /// Fails with [`CoreError::ReentrantAccessor`] if this property is already
    /// being accessed on the same target further up the stack.
    pub fn get(&self, registry: &Registry, target: &Value) -> CoreResult<Value> {
        let getter = self.getter.as_ref().ok_or_else(|| {
            CoreError::unsupported(format!("get {}", self.name), "reflection")
        })?;
        self.run(registry, target, getter, &[])
    }

    /// Run the setter against `target` with `value`.
    pub fn set(&self, registry: &Registry, target: &Value, value: Value) -> CoreResult<()> {
        let setter = self.setter.as_ref().ok_or_else(|| {
            CoreError::unsupported(format!("set {}", self.name), "reflection")
        })?;
        self.run(registry, target, setter, &[value]).map(|_| ())
    }

    fn run(
        &self,
        registry: &Registry,
        target: &Value,
        body: &MethodBody,
        args: &[Value],
    ) -> CoreResult<Value> {
        let class = registry.get(self.owner)?;
        let (receiver, slot) = if self.is_static {
            (None, None)
        } else {
            let instance = class.check_instance(registry, target)?;
            (Some(target), Some(instance.addr()))
        };
        let _guard = registry.enter_accessor(self.owner, &self.name, slot, &class.name)?;
        body(&Invocation {
            registry,
            class,
            receiver,
            args,
        })
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("is_static", &self.is_static)
            .field("readable", &self.getter.is_some())
            .field("writable", &self.setter.is_some())
            .field("owner", &self.owner)
            .finish()
    }
}

/// A registered type.
pub struct ClassDescriptor {
    pub token: TypeToken,
    pub name: String,
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) properties: Vec<PropertyDescriptor>,
    pub(crate) methods: Vec<MethodDescriptor>,
    /// Singleton state holding the static field slots.
    pub(crate) statics: ObjectValue,
    pub(crate) shape: Vec<MemberShape>,
}

impl ClassDescriptor {
    /// Field descriptor by name.
    pub fn field(&self, name: &str) -> CoreResult<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| CoreError::unknown_member(&self.name, "field", name))
    }

    /// Method descriptor by name.
    pub fn method(&self, name: &str) -> CoreResult<&MethodDescriptor> {
        self.methods
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| CoreError::unknown_member(&self.name, "method", name))
    }

    /// Property descriptor by name.
    pub fn property(&self, name: &str) -> CoreResult<&PropertyDescriptor> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| CoreError::unknown_member(&self.name, "property", name))
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// The static state object. Reads and writes go through field descriptors.
    pub fn statics(&self) -> &ObjectValue {
        &self.statics
    }

    /// Resolve `target` to an instance of this type.
    fn check_instance<'v>(
        &self,
        registry: &Registry,
        target: &'v Value,
    ) -> CoreResult<&'v ObjectValue> {
        let object = target.as_object()?;
        match object.class() {
            Some(token) if token == self.token => Ok(object),
            Some(other) => Err(CoreError::type_mismatch(
                &self.name,
                registry.name_of(other),
            )),
            None => Err(CoreError::type_mismatch(&self.name, "untyped object")),
        }
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("token", &self.token)
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("properties", &self.properties)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Invocation Context
// ============================================================================

/// Context handed to a method or accessor body.
pub struct Invocation<'a> {
    pub registry: &'a Registry,
    /// Description of the type the member belongs to.
    pub class: &'a ClassDescriptor,
    /// Call target; `None` for static members.
    pub receiver: Option<&'a Value>,
    pub args: &'a [Value],
}

impl<'a> Invocation<'a> {
    /// The bound receiver.
    pub fn this(&self) -> CoreResult<&'a Value> {
        self.receiver.ok_or_else(|| {
            CoreError::type_mismatch("instance receiver", format!("static {}", self.class.name))
        })
    }

    /// Positional argument. Arity was checked before the body ran.
    pub fn arg(&self, index: usize) -> CoreResult<&'a Value> {
        self.args.get(index).ok_or_else(|| CoreError::ArgumentCountMismatch {
            expected: index + 1,
            actual: self.args.len(),
            method: self.class.name.clone(),
        })
    }

    /// Read a field of the owning type through the registry.
    pub fn field(&self, name: &str) -> CoreResult<Value> {
        let target = self.receiver.cloned().unwrap_or_default();
        self.class.field(name)?.get(self.registry, &target)
    }

    /// Write a field of the owning type through the registry.
    pub fn set_field(&self, name: &str, value: Value) -> CoreResult<()> {
        let target = self.receiver.cloned().unwrap_or_default();
        self.class.field(name)?.set(self.registry, &target, value)
    }

    /// Call another method of the owning type on the same receiver.
    pub fn call(&self, name: &str, args: &[Value]) -> CoreResult<Value> {
        let target = self.receiver.cloned().unwrap_or_default();
        self.class.method(name)?.invoke(self.registry, &target, args)
    }
}
