//! Canonical operations every resolver mapping reduces to.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::console::Console;
use crate::error::{CoreError, CoreResult};
use crate::value::Value;

/// One call of the canonical container protocol, plus console output.
///
/// Operands are positional: the container comes first, then the key or
/// item, then the value (`set` only). `print` takes the single value to
/// write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalOp {
    Add,
    Remove,
    HasKey,
    Get,
    Set,
    Keys,
    Values,
    Length,
    Print,
}

impl CanonicalOp {
    pub fn name(&self) -> &'static str {
        match self {
            CanonicalOp::Add => "add",
            CanonicalOp::Remove => "remove",
            CanonicalOp::HasKey => "has_key",
            CanonicalOp::Get => "get",
            CanonicalOp::Set => "set",
            CanonicalOp::Keys => "keys",
            CanonicalOp::Values => "values",
            CanonicalOp::Length => "length",
            CanonicalOp::Print => "print",
        }
    }

    /// Number of operands the operation takes.
    pub fn arity(&self) -> usize {
        match self {
            CanonicalOp::Keys | CanonicalOp::Values | CanonicalOp::Length | CanonicalOp::Print => 1,
            CanonicalOp::Add | CanonicalOp::Remove | CanonicalOp::HasKey | CanonicalOp::Get => 2,
            CanonicalOp::Set => 3,
        }
    }

    /// Run the operation on operands already in canonical order.
    pub fn apply(&self, operands: &[Value], console: &dyn Console) -> CoreResult<Value> {
        match (self, operands) {
            (CanonicalOp::Print, [value]) => {
                console.print(value);
                Ok(Value::Null)
            }
            (CanonicalOp::Add, [target, item]) => {
                target.as_container()?.add(item.clone())?;
                Ok(Value::Null)
            }
            (CanonicalOp::Remove, [target, key]) => target.as_container()?.remove(key),
            (CanonicalOp::HasKey, [target, key]) => {
                target.as_container()?.has_key(key).map(Value::Bool)
            }
            (CanonicalOp::Get, [target, key]) => target.as_container()?.get(key),
            (CanonicalOp::Set, [target, key, value]) => {
                target.as_container()?.set(key, value.clone())?;
                Ok(Value::Null)
            }
            (CanonicalOp::Keys, [target]) => Ok(Value::array(target.as_container()?.keys())),
            (CanonicalOp::Values, [target]) => Ok(Value::array(target.as_container()?.values())),
            (CanonicalOp::Length, [target]) => {
                Ok(Value::Int(target.as_container()?.length() as i64))
            }
            _ => Err(CoreError::ArgumentCountMismatch {
                expected: self.arity(),
                actual: operands.len(),
                method: self.name().to_string(),
            }),
        }
    }
}

impl fmt::Display for CanonicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::BufferConsole;

    #[test]
    fn has_key_and_length() {
        let console = BufferConsole::new();
        let map = Value::object([("x", Value::Int(1))]);
        let found = CanonicalOp::HasKey
            .apply(&[map.clone(), Value::string("x")], &console)
            .unwrap();
        assert_eq!(found, Value::Bool(true));
        assert_eq!(
            CanonicalOp::Length.apply(&[map], &console).unwrap(),
            Value::Int(1)
        );
    }

    #[test]
    fn wrong_operand_count() {
        let console = BufferConsole::new();
        let err = CanonicalOp::Set
            .apply(&[Value::array(vec![]), Value::Int(0)], &console)
            .unwrap_err();
        assert_eq!(err.to_string(), "expected 3 arguments, but got 2 in set call");
    }

    #[test]
    fn scalar_target_is_type_mismatch() {
        let console = BufferConsole::new();
        let err = CanonicalOp::Keys
            .apply(&[Value::string("abc")], &console)
            .unwrap_err();
        assert!(matches!(err, CoreError::TypeMismatch { .. }));
    }

    #[test]
    fn print_writes_to_console() {
        let console = BufferConsole::new();
        CanonicalOp::Print
            .apply(&[Value::string("hello")], &console)
            .unwrap();
        assert_eq!(console.lines(), vec!["hello".to_string()]);
    }

    #[test]
    fn serde_names() {
        let op: CanonicalOp = serde_json::from_str(r#""has_key""#).unwrap();
        assert_eq!(op, CanonicalOp::HasKey);
    }
}
