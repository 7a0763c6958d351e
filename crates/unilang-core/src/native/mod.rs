//! Native resolver adapters.
//!
//! A [`NativeResolver`] translates one target language's built-in surface
//! (console output, array and map methods, static helpers such as
//! `Object.keys`, and infix operators) into the canonical container protocol
//! of [`crate::value::Container`]. Resolvers are built from data
//! ([`ResolverTable`](crate::config::ResolverTable)); an operation with no
//! mapping fails with [`CoreError::UnsupportedOperation`](crate::CoreError)
//! naming the operation and the language, never a silent no-op.
//!
//! Helpers that are types rather than table entries, such as `Regex`, are
//! host classes registered through [`regex_class`].
//!
//! ```
//! use unilang_core::native::{BufferConsole, ResolverSet};
//! use unilang_core::value::Value;
//!
//! let resolvers = ResolverSet::with_builtin().unwrap();
//! let ts = resolvers.get("typescript").unwrap();
//! let console = BufferConsole::new();
//!
//! let map = Value::object([("x", Value::Int(1))]);
//! ts.call_method(&map, "delete", &[Value::string("x")], &console).unwrap();
//! assert!(map.as_object().unwrap().entries().is_empty());
//! ```

mod canonical;
mod console;
mod resolver;
mod stdlib;

pub use canonical::CanonicalOp;
pub use console::{BufferConsole, Console, StdoutConsole};
pub use resolver::{NativeResolver, ResolverSet};
pub use stdlib::{match_from_index, regex_class, REGEX_CLASS};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Named operator overload hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorHook {
    /// `left in right`
    OpIn,
    /// `target[key]`
    OpGet,
    /// `target[key] = value`
    OpSet,
}

impl OperatorHook {
    pub const ALL: [OperatorHook; 3] =
        [OperatorHook::OpIn, OperatorHook::OpGet, OperatorHook::OpSet];

    pub fn name(&self) -> &'static str {
        match self {
            OperatorHook::OpIn => "op_in",
            OperatorHook::OpGet => "op_get",
            OperatorHook::OpSet => "op_set",
        }
    }

    /// Number of surface operands.
    pub fn arity(&self) -> usize {
        match self {
            OperatorHook::OpIn | OperatorHook::OpGet => 2,
            OperatorHook::OpSet => 3,
        }
    }
}

impl fmt::Display for OperatorHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
