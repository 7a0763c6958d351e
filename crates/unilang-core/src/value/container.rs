//! Canonical container protocol.
//!
//! Every native resolver reduces its target language's container surface
//! (`push`, `delete`, `in`, indexing, `Object.keys`, …) to these calls.
//!
//! | Operation | [`ArrayValue`] | [`ObjectValue`] |
//! |-----------|----------------|-----------------|
//! | `add`     | append         | type mismatch   |
//! | `remove`  | by index, shifts later items | by name |
//! | `has_key` | index in bounds | name present   |
//! | `get`/`set` | by index (in bounds) | by name (set inserts) |
//! | `keys`    | `0..len` as ints | names, insertion order |
//! | `values`  | items          | values, insertion order |
//!
//! Arrays take `Int` keys and objects take `String` keys; any other key
//! variant is a [`CoreError::TypeMismatch`]. Every operation validates before
//! it mutates.

use super::{ArrayValue, ObjectValue, Value, ValueKind};
use crate::error::{CoreError, CoreResult};

/// The single semantic ground truth for container operations.
pub trait Container {
    /// Append an item.
    fn add(&self, item: Value) -> CoreResult<()>;

    /// Remove an entry, returning its value.
    fn remove(&self, key: &Value) -> CoreResult<Value>;

    /// Whether an entry exists for `key`.
    fn has_key(&self, key: &Value) -> CoreResult<bool>;

    /// Read the entry for `key`.
    fn get(&self, key: &Value) -> CoreResult<Value>;

    /// Write the entry for `key`.
    fn set(&self, key: &Value, value: Value) -> CoreResult<()>;

    /// Keys in entry order.
    fn keys(&self) -> Vec<Value>;

    /// Values in entry order, positionally matching [`Container::keys`].
    fn values(&self) -> Vec<Value>;

    /// Number of entries.
    fn length(&self) -> usize;
}

impl Container for ArrayValue {
    fn add(&self, item: Value) -> CoreResult<()> {
        self.items.borrow_mut().push(item);
        Ok(())
    }

    fn remove(&self, key: &Value) -> CoreResult<Value> {
        let index = self.index_of(key)?;
        Ok(self.items.borrow_mut().remove(index))
    }

    fn has_key(&self, key: &Value) -> CoreResult<bool> {
        match self.index_of(key) {
            Ok(_) => Ok(true),
            Err(CoreError::KeyNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn get(&self, key: &Value) -> CoreResult<Value> {
        let index = self.index_of(key)?;
        Ok(self.items.borrow()[index].clone())
    }

    fn set(&self, key: &Value, value: Value) -> CoreResult<()> {
        let index = self.index_of(key)?;
        self.items.borrow_mut()[index] = value;
        Ok(())
    }

    fn keys(&self) -> Vec<Value> {
        (0..self.length() as i64).map(Value::Int).collect()
    }

    fn values(&self) -> Vec<Value> {
        self.items()
    }

    fn length(&self) -> usize {
        self.items.borrow().len()
    }
}

impl Container for ObjectValue {
    fn add(&self, _item: Value) -> CoreResult<()> {
        Err(CoreError::type_mismatch(ValueKind::Array, ValueKind::Object))
    }

    fn remove(&self, key: &Value) -> CoreResult<Value> {
        let name = ObjectValue::key_of(key)?;
        self.data
            .borrow_mut()
            .props
            .shift_remove(name)
            .ok_or_else(|| CoreError::key_not_found(name))
    }

    fn has_key(&self, key: &Value) -> CoreResult<bool> {
        let name = ObjectValue::key_of(key)?;
        Ok(self.contains(name))
    }

    fn get(&self, key: &Value) -> CoreResult<Value> {
        let name = ObjectValue::key_of(key)?;
        self.lookup(name)
            .ok_or_else(|| CoreError::key_not_found(name))
    }

    fn set(&self, key: &Value, value: Value) -> CoreResult<()> {
        let name = ObjectValue::key_of(key)?;
        self.insert(name, value);
        Ok(())
    }

    fn keys(&self) -> Vec<Value> {
        self.data
            .borrow()
            .props
            .keys()
            .map(|k| Value::String(k.to_string()))
            .collect()
    }

    fn values(&self) -> Vec<Value> {
        self.data.borrow().props.values().cloned().collect()
    }

    fn length(&self) -> usize {
        self.data.borrow().props.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Value {
        Value::string(s)
    }

    mod object_protocol {
        use super::*;

        #[test]
        fn set_get_remove_roundtrip() {
            let map = ObjectValue::new();
            map.set(&key("x"), Value::Int(1)).unwrap();
            assert_eq!(map.get(&key("x")).unwrap(), Value::Int(1));
            assert!(map.has_key(&key("x")).unwrap());

            assert_eq!(map.remove(&key("x")).unwrap(), Value::Int(1));
            assert!(!map.has_key(&key("x")).unwrap());
            assert!(matches!(
                map.get(&key("x")),
                Err(CoreError::KeyNotFound { .. })
            ));
            assert!(matches!(
                map.remove(&key("x")),
                Err(CoreError::KeyNotFound { .. })
            ));
        }

        #[test]
        fn keys_and_values_correspond_in_insertion_order() {
            let map = ObjectValue::new();
            map.set(&key("b"), Value::Int(2)).unwrap();
            map.set(&key("a"), Value::Int(1)).unwrap();
            map.set(&key("c"), Value::Int(3)).unwrap();
            map.set(&key("b"), Value::Int(20)).unwrap();

            let keys = map.keys();
            let values = map.values();
            assert_eq!(keys.len(), values.len());
            assert_eq!(keys, vec![key("b"), key("a"), key("c")]);
            assert_eq!(values, vec![Value::Int(20), Value::Int(1), Value::Int(3)]);
            assert_eq!(map.length(), 3);
        }

        #[test]
        fn remove_keeps_remaining_order() {
            let map = ObjectValue::new();
            for (name, value) in [("b", 1), ("a", 2), ("c", 3)] {
                map.set(&key(name), Value::Int(value)).unwrap();
            }

            assert_eq!(map.remove(&key("a")).unwrap(), Value::Int(2));
            assert_eq!(map.keys(), vec![key("b"), key("c")]);
            assert_eq!(map.get(&key("c")).unwrap(), Value::Int(3));
        }

        #[test]
        fn non_string_keys_are_rejected() {
            let map = ObjectValue::new();
            assert!(matches!(
                map.set(&Value::Int(0), Value::Null),
                Err(CoreError::TypeMismatch { .. })
            ));
            assert_eq!(map.length(), 0);
        }

        #[test]
        fn add_is_not_a_map_operation() {
            let map = ObjectValue::new();
            assert!(matches!(
                map.add(Value::Int(1)),
                Err(CoreError::TypeMismatch { .. })
            ));
        }
    }

    mod array_protocol {
        use super::*;

        #[test]
        fn add_appends_and_indices_are_keys() {
            let array = ArrayValue::new(vec![]);
            array.add(key("a")).unwrap();
            array.add(key("b")).unwrap();
            assert_eq!(array.keys(), vec![Value::Int(0), Value::Int(1)]);
            assert_eq!(array.values(), vec![key("a"), key("b")]);
            assert_eq!(array.length(), 2);
        }

        #[test]
        fn out_of_range_index_is_missing_key() {
            let array = ArrayValue::new(vec![Value::Int(1)]);
            assert!(!array.has_key(&Value::Int(1)).unwrap());
            assert!(!array.has_key(&Value::Int(-1)).unwrap());
            assert!(matches!(
                array.get(&Value::Int(5)),
                Err(CoreError::KeyNotFound { .. })
            ));
            assert!(matches!(
                array.set(&Value::Int(1), Value::Null),
                Err(CoreError::KeyNotFound { .. })
            ));
        }

        #[test]
        fn remove_shifts_later_items() {
            let array = ArrayValue::new(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
            assert_eq!(array.remove(&Value::Int(0)).unwrap(), Value::Int(1));
            assert_eq!(array.values(), vec![Value::Int(2), Value::Int(3)]);
        }

        #[test]
        fn string_key_is_type_mismatch() {
            let array = ArrayValue::new(vec![]);
            assert!(matches!(
                array.has_key(&key("0")),
                Err(CoreError::TypeMismatch { .. })
            ));
        }
    }
}
