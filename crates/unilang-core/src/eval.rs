//! Structural evaluator.
//!
//! Executes expressions and straight-line statements over the tagged value
//! model. Built-in surface operations go through a [`NativeResolver`];
//! members of registered types go through the [`Registry`]. Loops, `throw`
//! and `break`/`continue` are rejected: this is a substrate for constant
//! folding and dispatch simulation, not a general interpreter.
//!
//! [`describe_class`] turns a tree class into a [`ClassDescription`] whose
//! method and accessor bodies run on this evaluator, which is how tree
//! classes register themselves. Tree classes register under
//! [`qualified_class_name`], so same-named classes of different files stay
//! distinct types.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::native::{Console, NativeResolver, OperatorHook};
use crate::reflect::{
    ClassDescription, FieldSpec, Invocation, MethodArgument, MethodSpec, PropertySpec, Registry,
    TypeToken,
};
use crate::tree::{
    BinaryOp, Block, CallableId, ClassId, Expression, FileId, Literal, Statement, SyntaxTree,
    TypeRef, UnaryOp,
};
use crate::value::Value;

/// Language reported for constructs the evaluator itself does not run.
const EVALUATOR: &str = "structural evaluator";

enum Flow {
    Normal,
    Return(Value),
}

fn unbound(name: &str) -> CoreError {
    CoreError::UnboundIdentifier {
        name: name.to_string(),
    }
}

fn is_registered(value: &Value) -> bool {
    matches!(value, Value::Object(object) if object.class().is_some())
}

/// Registry name of a class declared in the file at `path`.
pub fn qualified_class_name(path: &str, name: &str) -> String {
    format!("{path}::{name}")
}

/// Evaluates expressions against a registry and one target language.
pub struct Evaluator<'a> {
    registry: &'a Registry,
    resolver: &'a NativeResolver,
    console: &'a dyn Console,
    scopes: Vec<HashMap<String, Value>>,
    types: HashMap<String, TypeToken>,
    /// Path of the file whose code is running; its classes shadow host types.
    file: Option<String>,
    this: Option<Value>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        registry: &'a Registry,
        resolver: &'a NativeResolver,
        console: &'a dyn Console,
    ) -> Self {
        Evaluator {
            registry,
            resolver,
            console,
            scopes: vec![HashMap::new()],
            types: HashMap::new(),
            file: None,
            this: None,
        }
    }

    /// Resolve unbound type names against the classes of the file at `path`
    /// before the registry's host types.
    pub fn in_file(mut self, path: impl Into<String>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Bind `this` for method and accessor bodies.
    pub fn with_this(mut self, this: Value) -> Self {
        self.this = Some(this);
        self
    }

    /// Declare a variable in the innermost scope.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), value);
        }
    }

    /// Make a registered type reachable by a source-level name.
    ///
    /// Unbound names fall back to the current file's classes, then to the
    /// registry's names as given.
    pub fn bind_type(&mut self, name: impl Into<String>, token: TypeToken) {
        self.types.insert(name.into(), token);
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn rebind(&mut self, name: &str, value: Value) -> CoreResult<()> {
        let slot = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
            .ok_or_else(|| unbound(name))?;
        *slot = value;
        Ok(())
    }

    fn resolve_type(&self, name: &str) -> Option<TypeToken> {
        if let Some(&token) = self.types.get(name) {
            return Some(token);
        }
        self.file
            .as_deref()
            .and_then(|path| self.registry.by_name(&qualified_class_name(path, name)))
            .or_else(|| self.registry.by_name(name))
            .map(|class| class.token)
    }

    /// `Owner` in `Owner.member` when it names a type rather than a variable.
    fn static_owner<'e>(&self, expr: &'e Expression) -> Option<&'e str> {
        match expr {
            Expression::Identifier { name }
                if self.lookup(name).is_none()
                    && (self.resolve_type(name).is_some()
                        || self.resolver.has_static_owner(name)) =>
            {
                Some(name.as_str())
            }
            _ => None,
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Run a block; the value of its `return`, or null.
    pub fn run(&mut self, block: &Block) -> CoreResult<Value> {
        match self.exec_block(block)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Null),
        }
    }

    /// Run the top-level statements of a file.
    pub fn run_main(&mut self, tree: &SyntaxTree, file_id: FileId) -> CoreResult<Value> {
        let file = tree.file(file_id)?;
        debug!(file = %file_id, path = %file.path, "running main block");
        self.file = Some(file.path.clone());
        self.run(&file.main)
    }

    fn exec_block(&mut self, block: &Block) -> CoreResult<Flow> {
        self.scopes.push(HashMap::new());
        let result = self.exec_statements(&block.statements);
        self.scopes.pop();
        result
    }

    fn exec_statements(&mut self, statements: &[Statement]) -> CoreResult<Flow> {
        for statement in statements {
            if let Flow::Return(value) = self.exec(statement)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, statement: &Statement) -> CoreResult<Flow> {
        match statement {
            Statement::Expression { expr } => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            Statement::Variable {
                name, initializer, ..
            } => {
                let value = match initializer {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Null,
                };
                self.bind(name.clone(), value);
                Ok(Flow::Normal)
            }
            Statement::Return { value } => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Statement::If {
                condition,
                then,
                otherwise,
            } => {
                if self.eval(condition)?.is_truthy() {
                    self.exec_block(then)
                } else if let Some(otherwise) = otherwise {
                    self.exec_block(otherwise)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Statement::Block { block } => self.exec_block(block),
            other => Err(CoreError::unsupported(other.kind_name(), EVALUATOR)),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn eval(&mut self, expr: &Expression) -> CoreResult<Value> {
        match expr {
            Expression::Literal { value } => Ok(literal(value)),
            Expression::Identifier { name } => {
                self.lookup(name).cloned().ok_or_else(|| unbound(name))
            }
            Expression::This => self.this.clone().ok_or_else(|| unbound("this")),
            Expression::ArrayLiteral { items } => Ok(Value::array(self.eval_all(items)?)),
            Expression::MapLiteral { entries } => {
                let mut props = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    props.push((key.clone(), self.eval(value)?));
                }
                Ok(Value::object(props))
            }
            Expression::PropertyAccess { object, name } => self.read_property(object, name),
            Expression::ElementAccess { object, index } => {
                let target = self.eval(object)?;
                let key = self.eval(index)?;
                self.resolver
                    .apply_operator(OperatorHook::OpGet, &[target, key], self.console)
            }
            Expression::Call { callee, args } => {
                let callee = self.eval(callee)?;
                let args = self.eval_all(args)?;
                callee.as_callable()?.call(&args)
            }
            Expression::MethodCall {
                object,
                method,
                args,
            } => self.call_method(object, method, args),
            Expression::StaticCall {
                owner,
                method,
                args,
            } => {
                let args = self.eval_all(args)?;
                self.call_static(owner, method, &args)
            }
            Expression::New { ty, args } => self.construct(ty, args),
            Expression::Unary { op, operand } => {
                let value = self.eval(operand)?;
                unary(*op, &value)
            }
            Expression::Binary { op, left, right } => self.binary(*op, left, right),
            Expression::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if self.eval(condition)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expression::Assignment { target, value } => self.assign(target, value),
        }
    }

    fn eval_all(&mut self, exprs: &[Expression]) -> CoreResult<Vec<Value>> {
        exprs.iter().map(|expr| self.eval(expr)).collect()
    }

    fn binary(&mut self, op: BinaryOp, left: &Expression, right: &Expression) -> CoreResult<Value> {
        match op {
            BinaryOp::And => {
                let lhs = self.eval(left)?;
                if lhs.is_truthy() {
                    self.eval(right)
                } else {
                    Ok(lhs)
                }
            }
            BinaryOp::Or => {
                let lhs = self.eval(left)?;
                if lhs.is_truthy() {
                    Ok(lhs)
                } else {
                    self.eval(right)
                }
            }
            BinaryOp::In => {
                let key = self.eval(left)?;
                let container = self.eval(right)?;
                self.resolver
                    .apply_operator(OperatorHook::OpIn, &[key, container], self.console)
            }
            _ => {
                let lhs = self.eval(left)?;
                let rhs = self.eval(right)?;
                arithmetic(op, &lhs, &rhs)
            }
        }
    }

    // ========================================================================
    // Members
    // ========================================================================

    fn read_property(&mut self, object: &Expression, name: &str) -> CoreResult<Value> {
        if let Some(owner) = self.static_owner(object) {
            let token = self.resolve_type(owner).ok_or_else(|| {
                CoreError::unsupported(format!("{}.{}", owner, name), self.resolver.language())
            })?;
            let class = self.registry.get(token)?;
            return if class.fields().iter().any(|f| f.name == name) {
                class.field(name)?.get(self.registry, &Value::Null)
            } else {
                class.property(name)?.get(self.registry, &Value::Null)
            };
        }

        let target = self.eval(object)?;
        if is_registered(&target) {
            let class = self.registry.lookup(&target)?;
            if class.fields().iter().any(|f| f.name == name) {
                self.registry.get_field(&target, name)
            } else {
                self.registry.get_property(&target, name)
            }
        } else {
            self.resolver.get_property(&target, name, self.console)
        }
    }

    fn write_property(
        &self,
        target: &Value,
        token: TypeToken,
        name: &str,
        value: Value,
    ) -> CoreResult<()> {
        let class = self.registry.get(token)?;
        if class.fields().iter().any(|f| f.name == name) {
            class.field(name)?.set(self.registry, target, value)
        } else {
            class.property(name)?.set(self.registry, target, value)
        }
    }

    fn call_method(
        &mut self,
        object: &Expression,
        method: &str,
        args: &[Expression],
    ) -> CoreResult<Value> {
        if let Some(owner) = self.static_owner(object) {
            let args = self.eval_all(args)?;
            return self.call_static(owner, method, &args);
        }
        let target = self.eval(object)?;
        let args = self.eval_all(args)?;
        if is_registered(&target) {
            self.registry.call(&target, method, &args)
        } else {
            self.resolver
                .call_method(&target, method, &args, self.console)
        }
    }

    fn call_static(&mut self, owner: &str, method: &str, args: &[Value]) -> CoreResult<Value> {
        match self.resolve_type(owner) {
            Some(token) => self.registry.call_static(token, method, args),
            None => self
                .resolver
                .call_static(owner, method, args, self.console),
        }
    }

    /// `new T(args)`: instantiate, then run `constructor` if the type has one.
    fn construct(&mut self, ty: &TypeRef, args: &[Expression]) -> CoreResult<Value> {
        let name = ty
            .name()
            .ok_or_else(|| CoreError::type_mismatch("class type", ty))?;
        let token = self
            .resolve_type(name)
            .ok_or_else(|| CoreError::NotRegistered {
                type_name: name.to_string(),
            })?;
        let args = self.eval_all(args)?;
        let class = self.registry.get(token)?;
        let has_constructor = class.methods().iter().any(|m| m.name == "constructor");
        if !has_constructor && !args.is_empty() {
            return Err(CoreError::ArgumentCountMismatch {
                expected: 0,
                actual: args.len(),
                method: format!("{}::constructor", class.name),
            });
        }

        let instance = self.registry.instantiate(token)?;
        if has_constructor {
            self.registry.call(&instance, "constructor", &args)?;
        }
        Ok(instance)
    }

    fn assign(&mut self, target: &Expression, value: &Expression) -> CoreResult<Value> {
        match target {
            Expression::Identifier { name } => {
                let value = self.eval(value)?;
                self.rebind(name, value.clone())?;
                Ok(value)
            }
            Expression::PropertyAccess { object, name } => {
                if let Some(owner) = self.static_owner(object) {
                    let token = self.resolve_type(owner).ok_or_else(|| {
                        CoreError::unsupported(
                            format!("assign {}.{}", owner, name),
                            self.resolver.language(),
                        )
                    })?;
                    let value = self.eval(value)?;
                    self.write_property(&Value::Null, token, name, value.clone())?;
                    return Ok(value);
                }

                let object = self.eval(object)?;
                let value = self.eval(value)?;
                let token = match &object {
                    Value::Object(instance) => instance.class(),
                    _ => None,
                };
                match token {
                    Some(token) => {
                        self.write_property(&object, token, name, value.clone())?;
                        Ok(value)
                    }
                    None => Err(CoreError::unsupported(
                        format!("assign {}.{}", object.kind(), name),
                        self.resolver.language(),
                    )),
                }
            }
            Expression::ElementAccess { object, index } => {
                let container = self.eval(object)?;
                let key = self.eval(index)?;
                let value = self.eval(value)?;
                self.resolver.apply_operator(
                    OperatorHook::OpSet,
                    &[container, key, value.clone()],
                    self.console,
                )?;
                Ok(value)
            }
            _ => Err(CoreError::type_mismatch("assignable expression", "value")),
        }
    }
}

// ============================================================================
// Operators
// ============================================================================

fn literal(value: &Literal) -> Value {
    match value {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::Int(*i),
        Literal::String(s) => Value::string(s.clone()),
    }
}

fn unary(op: UnaryOp, value: &Value) -> CoreResult<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Neg => value
            .as_int()?
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| overflow("-")),
    }
}

fn overflow(symbol: &str) -> CoreError {
    CoreError::invalid_operand(symbol, "integer overflow")
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> CoreResult<Value> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(lhs == rhs)),
        BinaryOp::Ne => Ok(Value::Bool(lhs != rhs)),
        BinaryOp::Add => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_add(*b)
                .map(Value::Int)
                .ok_or_else(|| overflow(op.symbol())),
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::string(format!("{}{}", lhs, rhs)))
            }
            _ => Err(CoreError::type_mismatch(
                "int or string",
                format!("{} + {}", lhs.kind(), rhs.kind()),
            )),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            let a = lhs.as_int()?;
            let b = rhs.as_int()?;
            if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b == 0 {
                return Err(CoreError::invalid_operand(op.symbol(), "division by zero"));
            }
            let result = match op {
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div => a.checked_div(b),
                _ => a.checked_rem(b),
            };
            result.map(Value::Int).ok_or_else(|| overflow(op.symbol()))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (lhs, rhs) {
                (Value::Int(a), Value::Int(b)) => a.cmp(b),
                (Value::String(a), Value::String(b)) => a.cmp(b),
                _ => {
                    return Err(CoreError::type_mismatch(
                        "two ints or two strings",
                        format!("{} {} {}", lhs.kind(), op.symbol(), rhs.kind()),
                    ))
                }
            };
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        BinaryOp::And | BinaryOp::Or | BinaryOp::In => Err(CoreError::internal(format!(
            "operator '{}' evaluated eagerly",
            op.symbol()
        ))),
    }
}

// ============================================================================
// Tree Bridge
// ============================================================================

/// Build the reflection description of a tree class.
///
/// Field initializers are evaluated once, here, as constant expressions.
/// Method bodies and property accessors run on an [`Evaluator`] with `this`
/// bound to the receiver; a setter sees its new value as `value`. Bodiless
/// methods fail with `UnsupportedOperation` when called.
pub fn describe_class(
    tree: &SyntaxTree,
    class_id: ClassId,
    resolver: Rc<NativeResolver>,
    console: Rc<dyn Console>,
) -> CoreResult<ClassDescription> {
    let class = tree.class(class_id)?;
    let path = tree.file(class.file_id)?.path.clone();
    let mut description = ClassDescription::new(qualified_class_name(&path, &class.name));

    let scratch = Registry::new();
    for field_id in class.fields.ids() {
        let field = tree.field(field_id)?;
        let initial = match &field.initializer {
            Some(expr) => Evaluator::new(&scratch, &resolver, console.as_ref()).eval(expr)?,
            None => Value::Null,
        };
        description = description.field(if field.is_static {
            FieldSpec::new_static(field.name.clone(), initial)
        } else {
            FieldSpec::instance(field.name.clone(), initial)
        });
    }

    for property_id in class.properties.ids() {
        let property = tree.property(property_id)?;
        let mut spec = PropertySpec::new(property.name.clone(), property.is_static);
        if let Some(getter) = &property.getter {
            let body = body_runner(
                format!("get {}", property.name),
                Some(getter.clone()),
                Vec::new(),
                &path,
                Rc::clone(&resolver),
                Rc::clone(&console),
            );
            spec = spec.with_getter(body);
        }
        if let Some(setter) = &property.setter {
            let body = body_runner(
                format!("set {}", property.name),
                Some(setter.clone()),
                vec!["value".to_string()],
                &path,
                Rc::clone(&resolver),
                Rc::clone(&console),
            );
            spec = spec.with_setter(body);
        }
        description = description.property(spec);
    }

    for method_id in class.methods.ids() {
        let method = tree.method(method_id)?;
        let params = tree.parameters_of(CallableId::Method(method_id))?;
        let args: Vec<MethodArgument> = params
            .iter()
            .map(|p| MethodArgument::new(p.name.clone(), p.ty.to_string()))
            .collect();
        let names = params.iter().map(|p| p.name.clone()).collect();
        let body = body_runner(
            method.name.clone(),
            method.body.clone(),
            names,
            &path,
            Rc::clone(&resolver),
            Rc::clone(&console),
        );
        description = description.method(if method.is_static {
            MethodSpec::new_static(method.name.clone(), args, body)
        } else {
            MethodSpec::instance(method.name.clone(), args, body)
        });
    }

    if let Some(ctor_id) = class.constructor {
        let ctor = tree.constructor(ctor_id)?;
        let params = tree.parameters_of(CallableId::Constructor(ctor_id))?;
        let args: Vec<MethodArgument> = params
            .iter()
            .map(|p| MethodArgument::new(p.name.clone(), p.ty.to_string()))
            .collect();
        let names = params.iter().map(|p| p.name.clone()).collect();
        let body = body_runner(
            "constructor".to_string(),
            ctor.body.clone(),
            names,
            &path,
            Rc::clone(&resolver),
            Rc::clone(&console),
        );
        description = description.method(MethodSpec::instance("constructor", args, body));
    }

    Ok(description)
}

fn body_runner(
    name: String,
    body: Option<Block>,
    params: Vec<String>,
    file: &str,
    resolver: Rc<NativeResolver>,
    console: Rc<dyn Console>,
) -> impl Fn(&Invocation<'_>) -> CoreResult<Value> + 'static {
    let file = file.to_string();
    move |call: &Invocation<'_>| {
        let block = body
            .as_ref()
            .ok_or_else(|| CoreError::unsupported(format!("call bodiless {}", name), EVALUATOR))?;
        let mut eval =
            Evaluator::new(call.registry, &resolver, console.as_ref()).in_file(file.clone());
        if let Some(this) = call.receiver {
            eval.this = Some(this.clone());
        }
        for (param, arg) in params.iter().zip(call.args) {
            eval.bind(param.clone(), arg.clone());
        }
        eval.run(block)
    }
}

/// Register every class of a file, returning `(name, token)` in declaration
/// order.
///
/// Each class becomes a new type under its [`qualified_class_name`]; a name
/// that is already registered fails with `DuplicateDeclaration`.
pub fn register_file(
    registry: &mut Registry,
    tree: &SyntaxTree,
    file_id: FileId,
    resolver: Rc<NativeResolver>,
    console: Rc<dyn Console>,
) -> CoreResult<Vec<(String, TypeToken)>> {
    let file = tree.file(file_id)?;
    let mut descriptions = Vec::with_capacity(file.classes.len());
    for (name, class_id) in file.classes.iter() {
        let description =
            describe_class(tree, class_id, Rc::clone(&resolver), Rc::clone(&console))?;
        descriptions.push((name.to_string(), description));
    }

    let mut tokens = Vec::with_capacity(descriptions.len());
    for (name, description) in descriptions {
        tokens.push((name, registry.register_new(description)?));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverTable;
    use crate::native::BufferConsole;
    use crate::tree::{ClassDecl, FieldDecl, MethodDecl, PropertyDecl, SourceFileDecl};

    fn typescript() -> NativeResolver {
        NativeResolver::new(ResolverTable::typescript().unwrap()).unwrap()
    }

    fn int(i: i64) -> Expression {
        Expression::int(i)
    }

    mod expressions {
        use super::*;

        #[test]
        fn arithmetic_and_concatenation() {
            let registry = Registry::new();
            let ts = typescript();
            let console = BufferConsole::new();
            let mut eval = Evaluator::new(&registry, &ts, &console);

            let sum = Expression::binary(
                BinaryOp::Mul,
                Expression::binary(BinaryOp::Add, int(2), int(3)),
                int(4),
            );
            assert_eq!(eval.eval(&sum).unwrap(), Value::Int(20));

            let label = Expression::binary(BinaryOp::Add, Expression::string("n="), int(5));
            assert_eq!(eval.eval(&label).unwrap(), Value::string("n=5"));
        }

        #[test]
        fn division_by_zero_fails() {
            let registry = Registry::new();
            let ts = typescript();
            let console = BufferConsole::new();
            let mut eval = Evaluator::new(&registry, &ts, &console);
            let expr = Expression::binary(BinaryOp::Div, int(1), int(0));
            let err = eval.eval(&expr).unwrap_err();
            assert!(matches!(err, CoreError::InvalidOperand { .. }));
            assert_eq!(err.to_string(), "invalid operand for '/': division by zero");
        }

        #[test]
        fn overflow_fails() {
            let registry = Registry::new();
            let ts = typescript();
            let console = BufferConsole::new();
            let mut eval = Evaluator::new(&registry, &ts, &console);
            let expr = Expression::binary(BinaryOp::Add, int(i64::MAX), int(1));
            let err = eval.eval(&expr).unwrap_err();
            assert_eq!(err.to_string(), "invalid operand for '+': integer overflow");
            assert_eq!(err.error_code(), crate::ErrorCode::Value);
        }

        #[test]
        fn logical_operators_short_circuit() {
            let registry = Registry::new();
            let ts = typescript();
            let console = BufferConsole::new();
            let mut eval = Evaluator::new(&registry, &ts, &console);
            // The right side would fail if evaluated.
            let expr = Expression::binary(
                BinaryOp::Or,
                Expression::bool(true),
                Expression::ident("missing"),
            );
            assert_eq!(eval.eval(&expr).unwrap(), Value::Bool(true));
        }

        #[test]
        fn unbound_identifier() {
            let registry = Registry::new();
            let ts = typescript();
            let console = BufferConsole::new();
            let mut eval = Evaluator::new(&registry, &ts, &console);
            let err = eval.eval(&Expression::ident("nope")).unwrap_err();
            assert_eq!(err.to_string(), "unbound identifier 'nope'");
        }

        #[test]
        fn membership_and_indexing_use_the_resolver() {
            let registry = Registry::new();
            let ts = typescript();
            let console = BufferConsole::new();
            let mut eval = Evaluator::new(&registry, &ts, &console);
            eval.bind("m", Value::object([("x", Value::Int(1))]));

            let has_x =
                Expression::binary(BinaryOp::In, Expression::string("x"), Expression::ident("m"));
            assert_eq!(eval.eval(&has_x).unwrap(), Value::Bool(true));

            let store = Expression::assign(
                Expression::index(Expression::ident("m"), Expression::string("y")),
                int(2),
            );
            eval.eval(&store).unwrap();
            let read = Expression::index(Expression::ident("m"), Expression::string("y"));
            assert_eq!(eval.eval(&read).unwrap(), Value::Int(2));
        }
    }

    mod statements {
        use super::*;

        #[test]
        fn builtins_and_control() {
            let registry = Registry::new();
            let ts = typescript();
            let console = BufferConsole::new();
            let mut eval = Evaluator::new(&registry, &ts, &console);

            let block = Block::new(vec![
                Statement::variable("items", Expression::array(vec![])),
                Statement::expr(Expression::method_call(
                    Expression::ident("items"),
                    "push",
                    vec![int(1)],
                )),
                Statement::expr(Expression::method_call(
                    Expression::ident("items"),
                    "push",
                    vec![int(2)],
                )),
                Statement::expr(Expression::method_call(
                    Expression::ident("console"),
                    "log",
                    vec![Expression::property(Expression::ident("items"), "length")],
                )),
                Statement::If {
                    condition: Expression::binary(
                        BinaryOp::Gt,
                        Expression::property(Expression::ident("items"), "length"),
                        int(1),
                    ),
                    then: Block::new(vec![Statement::ret(Expression::string("many"))]),
                    otherwise: None,
                },
                Statement::ret(Expression::string("few")),
            ]);

            assert_eq!(eval.run(&block).unwrap(), Value::string("many"));
            assert_eq!(console.lines(), vec!["2".to_string()]);
        }

        #[test]
        fn loops_are_unsupported() {
            let registry = Registry::new();
            let ts = typescript();
            let console = BufferConsole::new();
            let mut eval = Evaluator::new(&registry, &ts, &console);
            let block = Block::new(vec![Statement::While {
                condition: Expression::bool(false),
                body: Block::default(),
            }]);
            let err = eval.run(&block).unwrap_err();
            assert_eq!(
                err.to_string(),
                "unsupported operation 'while' for structural evaluator"
            );
        }

        #[test]
        fn block_scopes_do_not_leak() {
            let registry = Registry::new();
            let ts = typescript();
            let console = BufferConsole::new();
            let mut eval = Evaluator::new(&registry, &ts, &console);
            let block = Block::new(vec![
                Statement::Block {
                    block: Block::new(vec![Statement::variable("inner", int(1))]),
                },
                Statement::ret(Expression::ident("inner")),
            ]);
            assert!(matches!(
                eval.run(&block),
                Err(CoreError::UnboundIdentifier { .. })
            ));
        }
    }

    mod bridge {
        use super::*;

        fn counter_file() -> SourceFileDecl {
            let this_count = || Expression::property(Expression::This, "count");
            SourceFileDecl::new("counter.ts").class(
                ClassDecl::new("Counter")
                    .field(
                        FieldDecl::new("count", TypeRef::class("number"))
                            .with_static()
                            .with_initializer(int(0)),
                    )
                    .property(
                        PropertyDecl::new("doubled", TypeRef::class("number")).with_getter(
                            Block::new(vec![Statement::ret(Expression::binary(
                                BinaryOp::Mul,
                                this_count(),
                                int(2),
                            ))]),
                        ),
                    )
                    .method(
                        MethodDecl::signature("increment", vec![], TypeRef::Void).with_body(
                            Block::new(vec![Statement::expr(Expression::assign(
                                this_count(),
                                Expression::binary(BinaryOp::Add, this_count(), int(1)),
                            ))]),
                        ),
                    ),
            )
        }

        #[test]
        fn tree_class_registers_and_runs() {
            let mut tree = SyntaxTree::new();
            let file_id = tree.insert_source_file(counter_file()).unwrap();
            let resolver = Rc::new(typescript());
            let console: Rc<dyn Console> = Rc::new(BufferConsole::new());

            let mut registry = Registry::new();
            let tokens =
                register_file(&mut registry, &tree, file_id, Rc::clone(&resolver), console)
                    .unwrap();
            let (name, token) = &tokens[0];
            assert_eq!(name, "Counter");

            let a = registry.instantiate(*token).unwrap();
            let b = registry.instantiate(*token).unwrap();
            registry.call(&a, "increment", &[]).unwrap();
            registry.call(&b, "increment", &[]).unwrap();

            assert_eq!(registry.get_field(&a, "count").unwrap(), Value::Int(2));
            assert_eq!(registry.get_property(&b, "doubled").unwrap(), Value::Int(4));
        }

        #[test]
        fn new_and_static_access_through_evaluator() {
            let mut tree = SyntaxTree::new();
            let file_id = tree.insert_source_file(counter_file()).unwrap();
            let resolver = Rc::new(typescript());
            let console = BufferConsole::new();

            let mut registry = Registry::new();
            register_file(
                &mut registry,
                &tree,
                file_id,
                Rc::clone(&resolver),
                Rc::new(BufferConsole::new()),
            )
            .unwrap();

            let mut eval = Evaluator::new(&registry, &resolver, &console).in_file("counter.ts");
            let block = Block::new(vec![
                Statement::variable(
                    "c",
                    Expression::New {
                        ty: TypeRef::class("Counter"),
                        args: vec![],
                    },
                ),
                Statement::expr(Expression::method_call(
                    Expression::ident("c"),
                    "increment",
                    vec![],
                )),
                Statement::ret(Expression::property(Expression::ident("Counter"), "count")),
            ]);
            assert_eq!(eval.run(&block).unwrap(), Value::Int(1));
        }

        fn greeter_file(path: &str, greeting: &str) -> SourceFileDecl {
            SourceFileDecl::new(path).class(
                ClassDecl::new("Greeter").method(
                    MethodDecl::signature("greet", vec![], TypeRef::class("string"))
                        .with_body(Block::new(vec![Statement::ret(Expression::string(greeting))])),
                ),
            )
        }

        #[test]
        fn same_class_name_in_two_files_stays_distinct() {
            let mut tree = SyntaxTree::new();
            let a = tree.insert_source_file(greeter_file("a.ts", "hello")).unwrap();
            let b = tree.insert_source_file(greeter_file("b.ts", "bonjour")).unwrap();
            let resolver = Rc::new(typescript());
            let console: Rc<dyn Console> = Rc::new(BufferConsole::new());

            let mut registry = Registry::new();
            let from_a =
                register_file(&mut registry, &tree, a, Rc::clone(&resolver), Rc::clone(&console))
                    .unwrap();
            let from_b =
                register_file(&mut registry, &tree, b, Rc::clone(&resolver), console).unwrap();
            assert_eq!(from_a[0].0, "Greeter");
            assert_eq!(from_b[0].0, "Greeter");
            assert_ne!(from_a[0].1, from_b[0].1);
            assert_eq!(registry.get(from_b[0].1).unwrap().name, "b.ts::Greeter");

            let greet = |path: &str| {
                let console = BufferConsole::new();
                let mut eval = Evaluator::new(&registry, &resolver, &console).in_file(path);
                let call = Expression::method_call(
                    Expression::New {
                        ty: TypeRef::class("Greeter"),
                        args: vec![],
                    },
                    "greet",
                    vec![],
                );
                eval.eval(&call).unwrap()
            };
            assert_eq!(greet("a.ts"), Value::string("hello"));
            assert_eq!(greet("b.ts"), Value::string("bonjour"));
        }

        #[test]
        fn registering_a_file_twice_is_rejected() {
            let mut tree = SyntaxTree::new();
            let file_id = tree.insert_source_file(greeter_file("a.ts", "hello")).unwrap();
            let resolver = Rc::new(typescript());
            let console: Rc<dyn Console> = Rc::new(BufferConsole::new());

            let mut registry = Registry::new();
            register_file(&mut registry, &tree, file_id, Rc::clone(&resolver), Rc::clone(&console))
                .unwrap();
            let err = register_file(&mut registry, &tree, file_id, resolver, console).unwrap_err();
            assert_eq!(err.to_string(), "duplicate type 'a.ts::Greeter' in registry");
            assert_eq!(registry.len(), 1);
        }

        #[test]
        fn bodiless_method_fails_when_called() {
            let mut tree = SyntaxTree::new();
            let file_id = tree
                .insert_source_file(
                    SourceFileDecl::new("a.ts").class(
                        ClassDecl::new("A")
                            .method(MethodDecl::signature("f", vec![], TypeRef::Void)),
                    ),
                )
                .unwrap();
            let mut registry = Registry::new();
            let tokens = register_file(
                &mut registry,
                &tree,
                file_id,
                Rc::new(typescript()),
                Rc::new(BufferConsole::new()),
            )
            .unwrap();
            let a = registry.instantiate(tokens[0].1).unwrap();
            assert!(matches!(
                registry.call(&a, "f", &[]),
                Err(CoreError::UnsupportedOperation { .. })
            ));
        }
    }
}
