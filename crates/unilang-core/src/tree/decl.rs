//! Declaration inputs for
//! [`SyntaxTree::insert_source_file`](super::SyntaxTree::insert_source_file).
//!
//! Decls mirror the node types without ids or back-references. A parser
//! builds them (directly or by deserializing JSON); the tree validates a
//! whole file and then allocates ids.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::attrs::{Attributes, Visibility};
use super::expr::{Block, Expression};
use super::types::TypeRef;
use crate::error::{CoreError, CoreResult};

// ============================================================================
// Validation
// ============================================================================

/// One namespace in which declaration names must be unique.
struct Namespace<'a> {
    scope: String,
    seen: HashSet<&'a str>,
}

impl<'a> Namespace<'a> {
    fn new(scope: impl Into<String>) -> Self {
        Namespace {
            scope: scope.into(),
            seen: HashSet::new(),
        }
    }

    fn claim(&mut self, kind: &str, name: &'a str) -> CoreResult<()> {
        if self.seen.insert(name) {
            Ok(())
        } else {
            Err(CoreError::duplicate(kind, name, self.scope.clone()))
        }
    }
}

fn validate_parameters(params: &[ParameterDecl], scope: String) -> CoreResult<()> {
    let mut ns = Namespace::new(scope);
    for param in params {
        ns.claim("parameter", &param.name)?;
    }
    Ok(())
}

// ============================================================================
// Source File
// ============================================================================

/// A compilation unit to insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFileDecl {
    pub path: String,
    pub imports: Vec<ImportDecl>,
    pub enums: Vec<EnumDecl>,
    pub interfaces: Vec<InterfaceDecl>,
    pub classes: Vec<ClassDecl>,
    pub main: Block,
}

impl SourceFileDecl {
    pub fn new(path: impl Into<String>) -> Self {
        SourceFileDecl {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn import(mut self, import: ImportDecl) -> Self {
        self.imports.push(import);
        self
    }

    pub fn enumeration(mut self, decl: EnumDecl) -> Self {
        self.enums.push(decl);
        self
    }

    pub fn interface(mut self, decl: InterfaceDecl) -> Self {
        self.interfaces.push(decl);
        self
    }

    pub fn class(mut self, decl: ClassDecl) -> Self {
        self.classes.push(decl);
        self
    }

    pub fn main(mut self, block: Block) -> Self {
        self.main = block;
        self
    }

    /// Check every namespace in the file.
    ///
    /// Interfaces, classes and enums share the file namespace. Each class
    /// has a single namespace across fields, properties and methods.
    pub fn validate(&self) -> CoreResult<()> {
        let mut ns = Namespace::new(format!("file '{}'", self.path));
        for decl in &self.interfaces {
            ns.claim("interface", &decl.name)?;
        }
        for decl in &self.classes {
            ns.claim("class", &decl.name)?;
        }
        for decl in &self.enums {
            ns.claim("enum", &decl.name)?;
        }

        for decl in &self.enums {
            decl.validate()?;
        }
        for decl in &self.interfaces {
            decl.validate()?;
        }
        for decl in &self.classes {
            decl.validate()?;
        }
        Ok(())
    }
}

/// `import { symbol } from package`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportDecl {
    pub package: String,
    pub symbol: String,
    pub leading_trivia: String,
    pub attributes: Attributes,
}

impl ImportDecl {
    pub fn new(package: impl Into<String>, symbol: impl Into<String>) -> Self {
        ImportDecl {
            package: package.into(),
            symbol: symbol.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<String>,
    pub leading_trivia: String,
    pub attributes: Attributes,
}

impl EnumDecl {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        members: impl IntoIterator<Item = S>,
    ) -> Self {
        EnumDecl {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    fn validate(&self) -> CoreResult<()> {
        let mut ns = Namespace::new(format!("enum '{}'", self.name));
        for member in &self.members {
            ns.claim("enum member", member)?;
        }
        Ok(())
    }
}

// ============================================================================
// Interfaces and Classes
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceDecl {
    pub name: String,
    pub type_arguments: Vec<String>,
    pub base_interfaces: Vec<TypeRef>,
    pub methods: Vec<MethodDecl>,
    pub leading_trivia: String,
    pub attributes: Attributes,
}

impl InterfaceDecl {
    pub fn new(name: impl Into<String>) -> Self {
        InterfaceDecl {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn method(mut self, decl: MethodDecl) -> Self {
        self.methods.push(decl);
        self
    }

    fn validate(&self) -> CoreResult<()> {
        let mut ns = Namespace::new(format!("interface '{}'", self.name));
        for method in &self.methods {
            ns.claim("method", &method.name)?;
            method.validate(&self.name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassDecl {
    pub name: String,
    pub type_arguments: Vec<String>,
    pub base_class: Option<TypeRef>,
    pub base_interfaces: Vec<TypeRef>,
    pub fields: Vec<FieldDecl>,
    pub properties: Vec<PropertyDecl>,
    pub constructor: Option<ConstructorDecl>,
    pub methods: Vec<MethodDecl>,
    pub leading_trivia: String,
    pub attributes: Attributes,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        ClassDecl {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn field(mut self, decl: FieldDecl) -> Self {
        self.fields.push(decl);
        self
    }

    pub fn property(mut self, decl: PropertyDecl) -> Self {
        self.properties.push(decl);
        self
    }

    pub fn constructor(mut self, decl: ConstructorDecl) -> Self {
        self.constructor = Some(decl);
        self
    }

    pub fn method(mut self, decl: MethodDecl) -> Self {
        self.methods.push(decl);
        self
    }

    fn validate(&self) -> CoreResult<()> {
        let mut ns = Namespace::new(format!("class '{}'", self.name));
        // Reflection registers the constructor as a member of this name.
        if self.constructor.is_some() {
            ns.claim("constructor", "constructor")?;
        }
        for field in &self.fields {
            ns.claim("field", &field.name)?;
        }
        for property in &self.properties {
            ns.claim("property", &property.name)?;
        }
        for method in &self.methods {
            ns.claim("method", &method.name)?;
            method.validate(&self.name)?;
        }
        if let Some(ctor) = &self.constructor {
            validate_parameters(
                &ctor.parameters,
                format!("constructor of '{}'", self.name),
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// Members
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    pub initializer: Option<Expression>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub leading_trivia: String,
    pub attributes: Attributes,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        FieldDecl {
            name: name.into(),
            ty,
            ..Default::default()
        }
    }

    pub fn with_initializer(mut self, expr: Expression) -> Self {
        self.initializer = Some(expr);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyDecl {
    pub name: String,
    pub ty: TypeRef,
    pub getter: Option<Block>,
    pub setter: Option<Block>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub leading_trivia: String,
    pub attributes: Attributes,
}

impl PropertyDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        PropertyDecl {
            name: name.into(),
            ty,
            ..Default::default()
        }
    }

    pub fn with_getter(mut self, body: Block) -> Self {
        self.getter = Some(body);
        self
    }

    pub fn with_setter(mut self, body: Block) -> Self {
        self.setter = Some(body);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructorDecl {
    pub parameters: Vec<ParameterDecl>,
    pub body: Option<Block>,
    pub throws: bool,
    pub leading_trivia: String,
    pub attributes: Attributes,
}

impl ConstructorDecl {
    pub fn new(parameters: Vec<ParameterDecl>, body: Block) -> Self {
        ConstructorDecl {
            parameters,
            body: Some(body),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodDecl {
    pub name: String,
    pub type_arguments: Vec<String>,
    pub parameters: Vec<ParameterDecl>,
    pub returns: TypeRef,
    pub body: Option<Block>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub throws: bool,
    pub mutates: bool,
    pub leading_trivia: String,
    pub attributes: Attributes,
}

impl MethodDecl {
    /// A method signature without a body.
    pub fn signature(
        name: impl Into<String>,
        parameters: Vec<ParameterDecl>,
        returns: TypeRef,
    ) -> Self {
        MethodDecl {
            name: name.into(),
            parameters,
            returns,
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: Block) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    fn validate(&self, owner: &str) -> CoreResult<()> {
        validate_parameters(
            &self.parameters,
            format!("method '{}::{}'", owner, self.name),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterDecl {
    pub name: String,
    pub ty: TypeRef,
    pub default: Option<Expression>,
}

impl ParameterDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        ParameterDecl {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn with_default(mut self, expr: Expression) -> Self {
        self.default = Some(expr);
        self
    }
}
