//! Tagged value model.
//!
//! A closed set of runtime values used wherever generic code must hold or
//! pass a value without knowing the node type it came from:
//! - scalars: [`Value::Null`], [`Value::Bool`], [`Value::Int`], [`Value::String`]
//! - containers: [`ArrayValue`] and [`ObjectValue`]
//! - [`CallableValue`]: anything invocable with an ordered argument list
//!
//! Consumers must discriminate the variant before using variant-specific
//! data. Using a value in a role its variant does not support fails with
//! [`CoreError::TypeMismatch`] naming both variants; there is no implicit
//! coercion.
//!
//! Containers are shared handles with internal mutability. They are only
//! mutated through the canonical container protocol ([`Container`]), so every
//! holder of a handle observes the same mutations regardless of which native
//! resolver produced it.

mod container;

pub use container::Container;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{CoreError, CoreResult};
use crate::reflect::TypeToken;

// ============================================================================
// Value Kind
// ============================================================================

/// Discriminant of a [`Value`], used in mismatch diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    String,
    Array,
    Object,
    Callable,
}

impl ValueKind {
    /// Lowercase name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Callable => "callable",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Value
// ============================================================================

/// A runtime value.
///
/// Scalars compare by value; containers and callables compare by identity.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    String(String),
    Array(ArrayValue),
    Object(ObjectValue),
    Callable(CallableValue),
}

impl Value {
    /// Create a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Create a fresh array holding `items`.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(ArrayValue::new(items))
    }

    /// Create a fresh untyped object from `(name, value)` pairs.
    ///
    /// Later pairs overwrite earlier ones with the same name.
    pub fn object<K: Into<String>>(props: impl IntoIterator<Item = (K, Value)>) -> Self {
        let object = ObjectValue::new();
        for (name, value) in props {
            object.insert(name, value);
        }
        Value::Object(object)
    }

    /// The variant of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
            Value::Callable(_) => ValueKind::Callable,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Expect a boolean.
    pub fn as_bool(&self) -> CoreResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(CoreError::type_mismatch(ValueKind::Bool, other.kind())),
        }
    }

    /// Expect an integer.
    pub fn as_int(&self) -> CoreResult<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(CoreError::type_mismatch(ValueKind::Int, other.kind())),
        }
    }

    /// Expect a string.
    pub fn as_str(&self) -> CoreResult<&str> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(CoreError::type_mismatch(ValueKind::String, other.kind())),
        }
    }

    /// Expect an array handle.
    pub fn as_array(&self) -> CoreResult<&ArrayValue> {
        match self {
            Value::Array(a) => Ok(a),
            other => Err(CoreError::type_mismatch(ValueKind::Array, other.kind())),
        }
    }

    /// Expect an object handle.
    pub fn as_object(&self) -> CoreResult<&ObjectValue> {
        match self {
            Value::Object(o) => Ok(o),
            other => Err(CoreError::type_mismatch(ValueKind::Object, other.kind())),
        }
    }

    /// Expect a callable.
    pub fn as_callable(&self) -> CoreResult<&CallableValue> {
        match self {
            Value::Callable(c) => Ok(c),
            other => Err(CoreError::type_mismatch(ValueKind::Callable, other.kind())),
        }
    }

    /// View this value through the canonical container protocol.
    pub fn as_container(&self) -> CoreResult<&dyn Container> {
        match self {
            Value::Array(a) => Ok(a),
            Value::Object(o) => Ok(o),
            other => Err(CoreError::type_mismatch("container", other.kind())),
        }
    }

    /// Truthiness used by conditions: only `false` and `null` are false.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    /// Copy containers recursively so the result shares no handle with `self`.
    ///
    /// Callables are shared; the class tag of objects is kept. A container
    /// reachable more than once is copied once, so cycles and sharing are
    /// reproduced in the copy.
    pub fn deep_copy(&self) -> Value {
        self.copy_into(&mut HashMap::new())
    }

    fn copy_into(&self, copies: &mut HashMap<usize, Value>) -> Value {
        match self {
            Value::Array(a) => {
                if let Some(copy) = copies.get(&a.addr()) {
                    return copy.clone();
                }
                let copy = ArrayValue::new(Vec::new());
                copies.insert(a.addr(), Value::Array(copy.clone()));
                for item in a.items() {
                    let item = item.copy_into(copies);
                    copy.items.borrow_mut().push(item);
                }
                Value::Array(copy)
            }
            Value::Object(o) => {
                if let Some(copy) = copies.get(&o.addr()) {
                    return copy.clone();
                }
                let copy = ObjectValue::with_class(o.class());
                copies.insert(o.addr(), Value::Object(copy.clone()));
                for (name, value) in o.entries() {
                    let value = value.copy_into(copies);
                    copy.insert(name, value);
                }
                Value::Object(copy)
            }
            other => other.clone(),
        }
    }

    /// `open` holds the containers currently being rendered; meeting one
    /// again renders `[...]` or `{...}`.
    fn render(
        &self,
        f: &mut fmt::Formatter<'_>,
        nested: bool,
        open: &mut Vec<usize>,
    ) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::String(s) if nested => write!(f, "{:?}", s),
            Value::String(s) => f.write_str(s),
            Value::Array(a) if open.contains(&a.addr()) => f.write_str("[...]"),
            Value::Array(a) => {
                open.push(a.addr());
                f.write_str("[")?;
                for (i, item) in a.items().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.render(f, true, open)?;
                }
                open.pop();
                f.write_str("]")
            }
            Value::Object(o) if open.contains(&o.addr()) => f.write_str("{...}"),
            Value::Object(o) => {
                open.push(o.addr());
                f.write_str("{")?;
                for (i, (name, value)) in o.entries().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: ", name)?;
                    value.render(f, true, open)?;
                }
                open.pop();
                f.write_str("}")
            }
            Value::Callable(c) => write!(f, "<fn {}>", c.name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Callable(a), Value::Callable(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, false, &mut Vec::new())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

// ============================================================================
// Array
// ============================================================================

/// Shared handle to an ordered sequence of values.
#[derive(Clone, Default)]
pub struct ArrayValue {
    items: Rc<RefCell<Vec<Value>>>,
}

impl ArrayValue {
    pub fn new(items: Vec<Value>) -> Self {
        ArrayValue {
            items: Rc::new(RefCell::new(items)),
        }
    }

    /// Snapshot of the current items.
    pub fn items(&self) -> Vec<Value> {
        self.items.borrow().clone()
    }

    /// Whether both handles refer to the same storage.
    pub fn ptr_eq(&self, other: &ArrayValue) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }

    /// Address of the shared storage, identifying this array while alive.
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.items) as usize
    }

    fn index_of(&self, key: &Value) -> CoreResult<usize> {
        let index = match key {
            Value::Int(i) => *i,
            other => return Err(CoreError::type_mismatch(ValueKind::Int, other.kind())),
        };
        let len = self.items.borrow().len();
        usize::try_from(index)
            .ok()
            .filter(|i| *i < len)
            .ok_or_else(|| CoreError::key_not_found(index))
    }
}

// ============================================================================
// Object
// ============================================================================

/// Name-keyed slots of an object, iterating in insertion order.
pub type PropertyMap = IndexMap<String, Value>;

#[derive(Default)]
struct ObjectData {
    class: Option<TypeToken>,
    props: PropertyMap,
}

/// Shared handle to a name-keyed, insertion-ordered mapping of values.
///
/// Objects created by the reflection registry carry the [`TypeToken`] of
/// their registered description; plain map objects carry none.
#[derive(Clone, Default)]
pub struct ObjectValue {
    data: Rc<RefCell<ObjectData>>,
}

impl ObjectValue {
    /// Create an empty untyped object.
    pub fn new() -> Self {
        ObjectValue::default()
    }

    /// Create an empty object tagged with a registered type.
    pub fn with_class(class: Option<TypeToken>) -> Self {
        ObjectValue {
            data: Rc::new(RefCell::new(ObjectData {
                class,
                props: PropertyMap::new(),
            })),
        }
    }

    /// Registered type of this object, if any.
    pub fn class(&self) -> Option<TypeToken> {
        self.data.borrow().class
    }

    /// Insert or replace a named slot.
    pub fn insert(&self, name: impl Into<String>, value: Value) {
        self.data.borrow_mut().props.insert(name.into(), value);
    }

    /// Read a named slot.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.data.borrow().props.get(name).cloned()
    }

    /// Whether a named slot exists.
    pub fn contains(&self, name: &str) -> bool {
        self.data.borrow().props.contains_key(name)
    }

    /// Snapshot of the current `(name, value)` entries in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.data
            .borrow()
            .props
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Whether both handles refer to the same storage.
    pub fn ptr_eq(&self, other: &ObjectValue) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    /// Address of the shared storage, identifying this object while alive.
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.data) as usize
    }

    fn key_of(key: &Value) -> CoreResult<&str> {
        match key {
            Value::String(s) => Ok(s),
            other => Err(CoreError::type_mismatch(ValueKind::String, other.kind())),
        }
    }
}

// Debug output goes through rendering so self-containing values terminate.
impl fmt::Debug for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArrayValue({})", Value::Array(self.clone()))
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class() {
            Some(token) => write!(f, "ObjectValue<{}>({})", token, Value::Object(self.clone())),
            None => write!(f, "ObjectValue({})", Value::Object(self.clone())),
        }
    }
}

// ============================================================================
// Callable
// ============================================================================

/// Anything invocable with an ordered list of argument values.
pub trait Callable {
    /// Name used in diagnostics and rendering.
    fn name(&self) -> &str;

    /// Call with `args`, producing one value.
    fn call(&self, args: &[Value]) -> CoreResult<Value>;
}

/// Shared handle to a [`Callable`].
#[derive(Clone)]
pub struct CallableValue(Rc<dyn Callable>);

impl CallableValue {
    pub fn new(callable: impl Callable + 'static) -> Self {
        CallableValue(Rc::new(callable))
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn call(&self, args: &[Value]) -> CoreResult<Value> {
        self.0.call(args)
    }

    /// Whether both handles refer to the same callable.
    pub fn ptr_eq(&self, other: &CallableValue) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for CallableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CallableValue").field(&self.name()).finish()
    }
}

/// A [`Callable`] backed by a Rust closure with a fixed arity.
pub struct NativeFunction {
    name: String,
    arity: usize,
    body: Box<dyn Fn(&[Value]) -> CoreResult<Value>>,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<String>,
        arity: usize,
        body: impl Fn(&[Value]) -> CoreResult<Value> + 'static,
    ) -> Self {
        NativeFunction {
            name: name.into(),
            arity,
            body: Box::new(body),
        }
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, args: &[Value]) -> CoreResult<Value> {
        if args.len() != self.arity {
            return Err(CoreError::ArgumentCountMismatch {
                expected: self.arity,
                actual: args.len(),
                method: self.name.clone(),
            });
        }
        (self.body)(args)
    }
}

impl From<NativeFunction> for Value {
    fn from(f: NativeFunction) -> Self {
        Value::Callable(CallableValue::new(f))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod variants {
        use super::*;

        #[test]
        fn accessors_reject_other_variants() {
            let err = Value::string("x").as_object().unwrap_err();
            match err {
                CoreError::TypeMismatch { expected, actual } => {
                    assert_eq!(expected, "object");
                    assert_eq!(actual, "string");
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(Value::Int(1).as_str().is_err());
            assert!(Value::Null.as_bool().is_err());
        }

        #[test]
        fn string_is_not_a_container() {
            let err = Value::string("abc").as_container().err().unwrap();
            assert!(matches!(err, CoreError::TypeMismatch { .. }));
        }

        #[test]
        fn containers_compare_by_identity() {
            let a = Value::array(vec![Value::Int(1)]);
            let b = Value::array(vec![Value::Int(1)]);
            assert_eq!(a, a.clone());
            assert_ne!(a, b);
            assert_eq!(Value::string("x"), Value::from("x"));
        }

        #[test]
        fn truthiness() {
            assert!(!Value::Null.is_truthy());
            assert!(!Value::Bool(false).is_truthy());
            assert!(Value::Int(0).is_truthy());
            assert!(Value::string("").is_truthy());
        }
    }

    mod handles {
        use super::*;

        #[test]
        fn clones_share_storage() {
            let original = ArrayValue::new(vec![]);
            let alias = original.clone();
            alias.add(Value::Int(7)).unwrap();
            assert_eq!(original.length(), 1);
        }

        #[test]
        fn deep_copy_detaches_storage() {
            let inner = Value::array(vec![Value::Int(1)]);
            let outer = Value::object([("items", inner.clone())]);
            let copy = outer.deep_copy();

            inner.as_array().unwrap().add(Value::Int(2)).unwrap();

            let copied_items = copy.as_object().unwrap().lookup("items").unwrap();
            assert_eq!(copied_items.as_array().unwrap().length(), 1);
        }

        #[test]
        fn deep_copy_reproduces_cycles() {
            let value = Value::array(vec![Value::Int(1)]);
            let array = value.as_array().unwrap();
            array.add(value.clone()).unwrap();

            let copy = value.deep_copy();
            let copied = copy.as_array().unwrap();
            assert!(!copied.ptr_eq(array));
            assert_eq!(copied.get(&Value::Int(1)).unwrap(), copy);
        }
    }

    mod callables {
        use super::*;

        #[test]
        fn native_function_checks_arity() {
            let double: Value = NativeFunction::new("double", 1, |args| {
                Ok(Value::Int(args[0].as_int()? * 2))
            })
            .into();
            let f = double.as_callable().unwrap();
            assert_eq!(f.call(&[Value::Int(21)]).unwrap(), Value::Int(42));
            assert!(matches!(
                f.call(&[]),
                Err(CoreError::ArgumentCountMismatch {
                    expected: 1,
                    actual: 0,
                    ..
                })
            ));
        }
    }

    mod rendering {
        use super::*;

        #[test]
        fn top_level_strings_render_raw() {
            assert_eq!(Value::string("hi").to_string(), "hi");
        }

        #[test]
        fn nested_values_render_like_literals() {
            let value = Value::object([(
                "a",
                Value::array(vec![Value::Int(1), Value::string("b"), Value::Null]),
            )]);
            assert_eq!(value.to_string(), r#"{"a": [1, "b", null]}"#);
        }

        #[test]
        fn self_containing_values_render_a_marker() {
            let list = Value::array(vec![Value::Int(1)]);
            list.as_array().unwrap().add(list.clone()).unwrap();
            assert_eq!(list.to_string(), "[1, [...]]");

            let map = Value::object([("n", Value::Int(1))]);
            map.as_object().unwrap().insert("me", map.clone());
            assert_eq!(map.to_string(), r#"{"n": 1, "me": {...}}"#);
            assert_eq!(format!("{:?}", map), r#"Object(ObjectValue({"n": 1, "me": {...}}))"#);
        }

        #[test]
        fn shared_but_acyclic_values_render_in_full() {
            let inner = Value::array(vec![Value::Int(1)]);
            let outer = Value::array(vec![inner.clone(), inner]);
            assert_eq!(outer.to_string(), "[[1], [1]]");
        }
    }
}
