//! Unified syntax tree for one or more compilation units.
//!
//! A [`SyntaxTree`] owns every declaration node. Nodes refer to each other
//! through typed ids: child id lists are ownership edges, while the ids
//! naming an enclosing declaration (`file_id`, `class_id`, `owner`, …) are
//! lookup-only back-references set exactly once when the file is inserted.
//!
//! Construction goes through declaration inputs ([`SourceFileDecl`] and
//! friends). A file is validated as a whole before any id is allocated:
//!
//! - interfaces, classes and enums share one namespace per file
//! - fields, properties and methods share one namespace per class
//! - enum members, interface methods and parameters are unique
//!
//! After insertion only attributes, leading trivia and the `throws` /
//! `mutates` flags may change.
//!
//! ```
//! use unilang_core::tree::{ClassDecl, FieldDecl, SourceFileDecl, SyntaxTree, TypeRef};
//!
//! let mut tree = SyntaxTree::new();
//! let file = tree
//!     .insert_source_file(
//!         SourceFileDecl::new("counter.ts")
//!             .class(ClassDecl::new("Counter").field(FieldDecl::new("count", TypeRef::Any))),
//!     )
//!     .unwrap();
//!
//! let class = tree.class_by_name(file, "Counter").unwrap().unwrap();
//! assert_eq!(tree.file_of_class(class.class_id).unwrap().path, "counter.ts");
//! ```

mod attrs;
mod decl;
mod expr;
mod ids;
mod nodes;
mod store;
mod types;

pub use attrs::{
    AttributeValue, Attributes, HasAttributesAndTrivia, HasCallableShape, HasInitializer,
    HasInterfaceShape, Variable, Visibility,
};
pub use decl::{
    ClassDecl, ConstructorDecl, EnumDecl, FieldDecl, ImportDecl, InterfaceDecl, MethodDecl,
    ParameterDecl, PropertyDecl, SourceFileDecl,
};
pub use expr::{BinaryOp, Block, Expression, Literal, Statement, UnaryOp};
pub use ids::{
    CallableId, ClassId, ConstructorId, EnumId, EnumMemberId, FieldId, FileId, ImportId,
    InterfaceId, MethodId, MethodOwner, NameMap, NodeRef, ParameterId, PropertyId,
};
pub use nodes::{
    Class, Constructor, Enum, EnumMember, Field, Import, Interface, Method, MethodParameter,
    Property, SourceFile,
};
pub use store::SyntaxTree;
pub use types::TypeRef;
