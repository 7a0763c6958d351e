//! Declaration nodes stored in a [`SyntaxTree`](super::SyntaxTree).
//!
//! Nodes are created only by the tree. Child lists are ownership edges;
//! `*_id` fields naming an enclosing declaration are lookup-only
//! back-references, set once at insertion.

use serde::Serialize;

use super::attrs::{
    Attributes, HasAttributesAndTrivia, HasCallableShape, HasInitializer, HasInterfaceShape,
    Variable, Visibility,
};
use super::expr::{Block, Expression};
use super::ids::{
    CallableId, ClassId, ConstructorId, EnumId, EnumMemberId, FieldId, FileId, ImportId,
    InterfaceId, MethodId, MethodOwner, NameMap, ParameterId, PropertyId,
};
use super::types::TypeRef;

macro_rules! impl_trivia {
    ($($node:ty),* $(,)?) => {
        $(
            impl HasAttributesAndTrivia for $node {
                fn leading_trivia(&self) -> &str {
                    &self.leading_trivia
                }

                fn attributes(&self) -> &Attributes {
                    &self.attributes
                }
            }
        )*
    };
}

impl_trivia!(Import, Enum, Interface, Class, Field, Property, Constructor, Method);

// ============================================================================
// Compilation Unit
// ============================================================================

/// One parsed compilation unit.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
    pub file_id: FileId,
    pub path: String,
    pub imports: Vec<ImportId>,
    pub interfaces: NameMap<InterfaceId>,
    pub classes: NameMap<ClassId>,
    pub enums: NameMap<EnumId>,
    /// Top-level program entry statements.
    pub main: Block,
}

/// `import { symbol } from package`
#[derive(Debug, Clone, Serialize)]
pub struct Import {
    pub import_id: ImportId,
    pub file_id: FileId,
    pub package: String,
    pub symbol: String,
    pub leading_trivia: String,
    pub attributes: Attributes,
}

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Enum {
    pub enum_id: EnumId,
    pub file_id: FileId,
    pub name: String,
    pub members: NameMap<EnumMemberId>,
    pub leading_trivia: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumMember {
    pub member_id: EnumMemberId,
    pub enum_id: EnumId,
    pub name: String,
}

// ============================================================================
// Interfaces and Classes
// ============================================================================

/// An interface: method signatures without bodies.
#[derive(Debug, Clone, Serialize)]
pub struct Interface {
    pub interface_id: InterfaceId,
    pub file_id: FileId,
    pub name: String,
    pub type_arguments: Vec<String>,
    pub base_interfaces: Vec<TypeRef>,
    pub methods: NameMap<MethodId>,
    pub leading_trivia: String,
    pub attributes: Attributes,
}

impl HasInterfaceShape for Interface {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_arguments(&self) -> &[String] {
        &self.type_arguments
    }

    fn base_interfaces(&self) -> &[TypeRef] {
        &self.base_interfaces
    }

    fn methods(&self) -> &NameMap<MethodId> {
        &self.methods
    }
}

/// A class declaration.
#[derive(Debug, Clone, Serialize)]
pub struct Class {
    pub class_id: ClassId,
    pub file_id: FileId,
    pub name: String,
    pub type_arguments: Vec<String>,
    pub base_class: Option<TypeRef>,
    pub base_interfaces: Vec<TypeRef>,
    pub fields: NameMap<FieldId>,
    pub properties: NameMap<PropertyId>,
    pub constructor: Option<ConstructorId>,
    pub methods: NameMap<MethodId>,
    pub leading_trivia: String,
    pub attributes: Attributes,
}

impl Class {
    /// Constructor followed by methods in declaration order.
    pub fn callables(&self) -> impl Iterator<Item = CallableId> + '_ {
        self.constructor
            .map(CallableId::Constructor)
            .into_iter()
            .chain(self.methods.ids().map(CallableId::Method))
    }
}

impl HasInterfaceShape for Class {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_arguments(&self) -> &[String] {
        &self.type_arguments
    }

    fn base_interfaces(&self) -> &[TypeRef] {
        &self.base_interfaces
    }

    fn methods(&self) -> &NameMap<MethodId> {
        &self.methods
    }
}

// ============================================================================
// Class Members
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub field_id: FieldId,
    pub class_id: ClassId,
    pub name: String,
    pub ty: TypeRef,
    pub initializer: Option<Expression>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub leading_trivia: String,
    pub attributes: Attributes,
}

impl Variable for Field {
    fn name(&self) -> &str {
        &self.name
    }

    fn ty(&self) -> &TypeRef {
        &self.ty
    }
}

impl HasInitializer for Field {
    fn initializer(&self) -> Option<&Expression> {
        self.initializer.as_ref()
    }
}

/// A property runs its getter or setter block on every access.
#[derive(Debug, Clone, Serialize)]
pub struct Property {
    pub property_id: PropertyId,
    pub class_id: ClassId,
    pub name: String,
    pub ty: TypeRef,
    pub getter: Option<Block>,
    pub setter: Option<Block>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub leading_trivia: String,
    pub attributes: Attributes,
}

impl Property {
    /// Has both accessors, so callers can treat it as a field.
    pub fn is_read_write(&self) -> bool {
        self.getter.is_some() && self.setter.is_some()
    }
}

impl Variable for Property {
    fn name(&self) -> &str {
        &self.name
    }

    fn ty(&self) -> &TypeRef {
        &self.ty
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Constructor {
    pub constructor_id: ConstructorId,
    pub class_id: ClassId,
    pub parameters: Vec<ParameterId>,
    pub body: Option<Block>,
    pub throws: bool,
    pub leading_trivia: String,
    pub attributes: Attributes,
}

impl HasCallableShape for Constructor {
    fn callable_id(&self) -> CallableId {
        CallableId::Constructor(self.constructor_id)
    }

    fn parameters(&self) -> &[ParameterId] {
        &self.parameters
    }

    fn body(&self) -> Option<&Block> {
        self.body.as_ref()
    }

    fn throws(&self) -> bool {
        self.throws
    }
}

/// A class method or interface method signature.
#[derive(Debug, Clone, Serialize)]
pub struct Method {
    pub method_id: MethodId,
    pub owner: MethodOwner,
    pub name: String,
    pub type_arguments: Vec<String>,
    pub parameters: Vec<ParameterId>,
    pub returns: TypeRef,
    pub body: Option<Block>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub throws: bool,
    /// Mutates its receiver.
    pub mutates: bool,
    pub leading_trivia: String,
    pub attributes: Attributes,
}

impl HasCallableShape for Method {
    fn callable_id(&self) -> CallableId {
        CallableId::Method(self.method_id)
    }

    fn parameters(&self) -> &[ParameterId] {
        &self.parameters
    }

    fn body(&self) -> Option<&Block> {
        self.body.as_ref()
    }

    fn throws(&self) -> bool {
        self.throws
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodParameter {
    pub parameter_id: ParameterId,
    /// Declaring constructor or method.
    pub callable: CallableId,
    pub name: String,
    pub ty: TypeRef,
    pub default: Option<Expression>,
}

impl Variable for MethodParameter {
    fn name(&self) -> &str {
        &self.name
    }

    fn ty(&self) -> &TypeRef {
        &self.ty
    }
}

impl HasInitializer for MethodParameter {
    fn initializer(&self) -> Option<&Expression> {
        self.default.as_ref()
    }
}
