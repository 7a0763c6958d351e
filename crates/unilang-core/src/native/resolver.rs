//! Table-driven resolvers and the per-language resolver set.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, trace};

use super::console::Console;
use super::OperatorHook;
use crate::config::{Mapping, MemberMapping, OperatorTable, ReceiverTypes, ResolverTable};
use crate::error::{CoreError, CoreResult};
use crate::value::Value;

/// owner → member → mapping
type MemberTable = HashMap<String, HashMap<String, Mapping>>;

fn index(entries: &[MemberMapping]) -> MemberTable {
    let mut table = MemberTable::new();
    for entry in entries {
        table
            .entry(entry.owner.clone())
            .or_default()
            .insert(entry.member.clone(), entry.mapping());
    }
    table
}

/// Resolves one target language's built-in surface onto canonical
/// operations.
#[derive(Debug, Clone)]
pub struct NativeResolver {
    language: String,
    receivers: ReceiverTypes,
    methods: MemberTable,
    properties: MemberTable,
    statics: MemberTable,
    operators: OperatorTable,
}

impl NativeResolver {
    /// Build a resolver from a table, validating it first.
    pub fn new(table: ResolverTable) -> CoreResult<Self> {
        table.validate()?;
        Ok(NativeResolver {
            methods: index(&table.methods),
            properties: index(&table.properties),
            statics: index(&table.statics),
            language: table.language,
            receivers: table.receivers,
            operators: table.operators,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    fn unsupported(&self, operation: impl Into<String>) -> CoreError {
        CoreError::unsupported(operation, self.language.clone())
    }

    /// Surface type a receiver presents as in this language.
    pub fn receiver_type(&self, receiver: &Value) -> CoreResult<&str> {
        let surface = match receiver {
            Value::Array(_) => self.receivers.array.as_deref(),
            Value::Object(_) => self.receivers.object.as_deref(),
            Value::String(_) => self.receivers.string.as_deref(),
            _ => None,
        };
        surface.ok_or_else(|| self.unsupported(format!("{} receiver", receiver.kind())))
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Mapping of `receiver.name(...)`.
    pub fn method(&self, receiver: &Value, name: &str) -> CoreResult<&Mapping> {
        let owner = self.receiver_type(receiver)?;
        lookup(&self.methods, owner, name)
            .ok_or_else(|| self.unsupported(format!("{}.{}", owner, name)))
    }

    /// Mapping of the property read `receiver.name`.
    pub fn property(&self, receiver: &Value, name: &str) -> CoreResult<&Mapping> {
        let owner = self.receiver_type(receiver)?;
        lookup(&self.properties, owner, name)
            .ok_or_else(|| self.unsupported(format!("{}.{}", owner, name)))
    }

    /// Mapping of the static call `owner.name(...)`.
    pub fn static_member(&self, owner: &str, name: &str) -> CoreResult<&Mapping> {
        lookup(&self.statics, owner, name)
            .ok_or_else(|| self.unsupported(format!("{}.{}", owner, name)))
    }

    pub fn operator(&self, hook: OperatorHook) -> CoreResult<&Mapping> {
        self.operators
            .get(hook)
            .ok_or_else(|| self.unsupported(hook.name()))
    }

    /// Whether `owner` names a static surface type of this language.
    pub fn has_static_owner(&self, owner: &str) -> bool {
        self.statics.contains_key(owner)
    }

    // ========================================================================
    // Invocation
    // ========================================================================

    /// Call a built-in method on `receiver`.
    pub fn call_method(
        &self,
        receiver: &Value,
        name: &str,
        args: &[Value],
        console: &dyn Console,
    ) -> CoreResult<Value> {
        let mapping = self.method(receiver, name)?;
        let operation = format!("{}.{}", self.receiver_type(receiver)?, name);
        let mut operands = Vec::with_capacity(args.len() + 1);
        operands.push(receiver.clone());
        operands.extend_from_slice(args);
        self.dispatch(&operation, mapping, &operands, 1, console)
    }

    /// Read a built-in property of `receiver`.
    pub fn get_property(
        &self,
        receiver: &Value,
        name: &str,
        console: &dyn Console,
    ) -> CoreResult<Value> {
        let mapping = self.property(receiver, name)?;
        let operation = format!("{}.{}", self.receiver_type(receiver)?, name);
        self.dispatch(&operation, mapping, std::slice::from_ref(receiver), 1, console)
    }

    /// Call a built-in static member.
    pub fn call_static(
        &self,
        owner: &str,
        name: &str,
        args: &[Value],
        console: &dyn Console,
    ) -> CoreResult<Value> {
        let mapping = self.static_member(owner, name)?;
        self.dispatch(&format!("{}.{}", owner, name), mapping, args, 0, console)
    }

    /// Evaluate an operator hook on its operands in surface order.
    pub fn apply_operator(
        &self,
        hook: OperatorHook,
        operands: &[Value],
        console: &dyn Console,
    ) -> CoreResult<Value> {
        let mapping = self.operator(hook)?;
        if operands.len() != hook.arity() {
            return Err(CoreError::ArgumentCountMismatch {
                expected: hook.arity(),
                actual: operands.len(),
                method: hook.name().to_string(),
            });
        }
        self.dispatch(hook.name(), mapping, operands, 0, console)
    }

    /// Reorder surface operands per `mapping` and run the canonical op.
    ///
    /// `leading` operands (the receiver) are excluded from arity reports.
    fn dispatch(
        &self,
        operation: &str,
        mapping: &Mapping,
        operands: &[Value],
        leading: usize,
        console: &dyn Console,
    ) -> CoreResult<Value> {
        let arity = mapping.surface_arity().max(leading);
        if operands.len() != arity {
            return Err(CoreError::ArgumentCountMismatch {
                expected: arity - leading,
                actual: operands.len().saturating_sub(leading),
                method: operation.to_string(),
            });
        }
        let canonical: Vec<Value> = mapping
            .positions()
            .into_iter()
            .map(|pos| operands[pos].clone())
            .collect();
        trace!(language = %self.language, operation, op = %mapping.op, "native dispatch");
        mapping.op.apply(&canonical, console)
    }
}

fn lookup<'t>(table: &'t MemberTable, owner: &str, name: &str) -> Option<&'t Mapping> {
    table.get(owner).and_then(|members| members.get(name))
}

// ============================================================================
// Resolver Set
// ============================================================================

/// Resolvers by target language, loaded before any resolution begins.
#[derive(Debug, Default)]
pub struct ResolverSet {
    resolvers: BTreeMap<String, NativeResolver>,
}

impl ResolverSet {
    pub fn new() -> Self {
        ResolverSet::default()
    }

    /// A set holding every table shipped with the crate.
    pub fn with_builtin() -> CoreResult<Self> {
        let mut set = ResolverSet::new();
        set.load(ResolverTable::typescript()?)?;
        Ok(set)
    }

    /// Add the resolver for a table's language.
    pub fn load(&mut self, table: ResolverTable) -> CoreResult<()> {
        if self.resolvers.contains_key(&table.language) {
            return Err(CoreError::duplicate(
                "resolver",
                table.language,
                "resolver set",
            ));
        }
        let resolver = NativeResolver::new(table)?;
        debug!(language = %resolver.language(), "loaded native resolver");
        self.resolvers
            .insert(resolver.language().to_string(), resolver);
        Ok(())
    }

    pub fn get(&self, language: &str) -> CoreResult<&NativeResolver> {
        self.resolvers
            .get(language)
            .ok_or_else(|| CoreError::unsupported("native resolution", language))
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.resolvers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}
