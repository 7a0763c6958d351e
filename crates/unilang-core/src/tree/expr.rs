//! Executable structure: blocks, statements and expressions.
//!
//! These are owned value trees. They hold no back-references, so cloning or
//! dropping a block never touches the declarations that contain it.

use serde::{Deserialize, Serialize};

use super::types::TypeRef;

/// Ordered sequence of statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Block { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// Expression evaluated for its effect.
    Expression { expr: Expression },
    /// `let name: ty = initializer`
    Variable {
        name: String,
        #[serde(default)]
        ty: TypeRef,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        initializer: Option<Expression>,
    },
    Return {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        value: Option<Expression>,
    },
    If {
        condition: Expression,
        then: Block,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        otherwise: Option<Block>,
    },
    While { condition: Expression, body: Block },
    Foreach {
        item: String,
        items: Expression,
        body: Block,
    },
    Throw { value: Expression },
    Break,
    Continue,
    Block { block: Block },
}

impl Statement {
    pub fn expr(expr: Expression) -> Self {
        Statement::Expression { expr }
    }

    pub fn variable(name: impl Into<String>, initializer: Expression) -> Self {
        Statement::Variable {
            name: name.into(),
            ty: TypeRef::Unknown,
            initializer: Some(initializer),
        }
    }

    pub fn ret(value: Expression) -> Self {
        Statement::Return { value: Some(value) }
    }

    /// Short name of the statement kind for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Expression { .. } => "expression",
            Statement::Variable { .. } => "variable",
            Statement::Return { .. } => "return",
            Statement::If { .. } => "if",
            Statement::While { .. } => "while",
            Statement::Foreach { .. } => "foreach",
            Statement::Throw { .. } => "throw",
            Statement::Break => "break",
            Statement::Continue => "continue",
            Statement::Block { .. } => "block",
        }
    }
}

/// Literal constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    /// Containment test (`key in container`).
    In,
}

impl BinaryOp {
    /// Surface symbol of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::In => "in",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    Literal { value: Literal },
    Identifier { name: String },
    /// `this` inside a method body.
    This,
    ArrayLiteral { items: Vec<Expression> },
    /// Map literal; entries keep source order.
    MapLiteral { entries: Vec<(String, Expression)> },
    /// `object.name`
    PropertyAccess {
        object: Box<Expression>,
        name: String,
    },
    /// `object[index]`
    ElementAccess {
        object: Box<Expression>,
        index: Box<Expression>,
    },
    /// Call of a function-valued expression.
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },
    /// `object.method(args)`
    MethodCall {
        object: Box<Expression>,
        method: String,
        args: Vec<Expression>,
    },
    /// `Owner.method(args)` on a type name.
    StaticCall {
        owner: String,
        method: String,
        args: Vec<Expression>,
    },
    /// `new Type(args)`
    New { ty: TypeRef, args: Vec<Expression> },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `condition ? then : otherwise`
    Conditional {
        condition: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
    /// `target = value`
    Assignment {
        target: Box<Expression>,
        value: Box<Expression>,
    },
}

impl Expression {
    pub fn null() -> Self {
        Expression::Literal {
            value: Literal::Null,
        }
    }

    pub fn bool(b: bool) -> Self {
        Expression::Literal {
            value: Literal::Bool(b),
        }
    }

    pub fn int(i: i64) -> Self {
        Expression::Literal {
            value: Literal::Int(i),
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expression::Literal {
            value: Literal::String(s.into()),
        }
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expression::Identifier { name: name.into() }
    }

    pub fn array(items: Vec<Expression>) -> Self {
        Expression::ArrayLiteral { items }
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Expression)>) -> Self {
        Expression::MapLiteral {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn property(object: Expression, name: impl Into<String>) -> Self {
        Expression::PropertyAccess {
            object: Box::new(object),
            name: name.into(),
        }
    }

    pub fn index(object: Expression, index: Expression) -> Self {
        Expression::ElementAccess {
            object: Box::new(object),
            index: Box::new(index),
        }
    }

    pub fn call(callee: Expression, args: Vec<Expression>) -> Self {
        Expression::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn method_call(
        object: Expression,
        method: impl Into<String>,
        args: Vec<Expression>,
    ) -> Self {
        Expression::MethodCall {
            object: Box::new(object),
            method: method.into(),
            args,
        }
    }

    pub fn static_call(
        owner: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Expression>,
    ) -> Self {
        Expression::StaticCall {
            owner: owner.into(),
            method: method.into(),
            args,
        }
    }

    pub fn unary(op: UnaryOp, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn conditional(condition: Expression, then: Expression, otherwise: Expression) -> Self {
        Expression::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn assign(target: Expression, value: Expression) -> Self {
        Expression::Assignment {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    /// Whether this is a literal constant.
    pub fn is_literal(&self) -> bool {
        matches!(self, Expression::Literal { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_json_shape() {
        let expr =
            Expression::binary(BinaryOp::In, Expression::string("x"), Expression::ident("m"));
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(json["kind"], "binary");
        assert_eq!(json["op"], "in");
        assert_eq!(json["left"]["value"]["kind"], "string");
        let back: Expression = serde_json::from_value(json).unwrap();
        assert_eq!(back, expr);
    }

    #[test]
    fn variable_without_type_defaults_to_unknown() {
        let json = r#"{"kind":"variable","name":"x"}"#;
        let stmt: Statement = serde_json::from_str(json).unwrap();
        assert_eq!(
            stmt,
            Statement::Variable {
                name: "x".to_string(),
                ty: TypeRef::Unknown,
                initializer: None
            }
        );
    }
}
