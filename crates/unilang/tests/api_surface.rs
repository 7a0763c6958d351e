//! Compile-only test to verify public API surface.
//!
//! If this file fails to compile, a public re-export of the facade has
//! regressed.

#![allow(unused_imports)]

// ============================================================================
// Core Modules (re-exported)
// ============================================================================

use unilang::config::{Mapping, MemberMapping, OperatorTable, ReceiverTypes, ResolverTable};
use unilang::eval::{describe_class, qualified_class_name, register_file, Evaluator};
use unilang::native::{
    match_from_index, regex_class, BufferConsole, CanonicalOp, Console, NativeResolver,
    OperatorHook, ResolverSet, StdoutConsole, REGEX_CLASS,
};
use unilang::reflect::{
    ClassDescription, ClassDescriptor, FieldDescriptor, FieldSpec, Invocation, MethodArgument,
    MethodDescriptor, MethodSpec, PropertyDescriptor, PropertySpec, Registry, TypeToken,
};
use unilang::tree::{
    AttributeValue, Attributes, Block, CallableId, ClassDecl, ClassId, Expression, FileId,
    HasAttributesAndTrivia, HasCallableShape, HasInitializer, HasInterfaceShape, MethodOwner,
    NodeRef, SourceFileDecl, Statement, SyntaxTree, TypeRef, Variable, Visibility,
};
use unilang::value::{ArrayValue, Container, ObjectValue, PropertyMap, Value, ValueKind};
use unilang::{CoreError, CoreResult, ErrorCode};

// ============================================================================
// Facade
// ============================================================================

use unilang::{init_tracing, LogLevel, Toolchain, ToolchainConfig, UnilangError, UnilangResult};

#[test]
fn api_surface_compiles() {
    let _ = std::any::type_name::<SyntaxTree>();
    let _ = std::any::type_name::<Registry>();
    let _ = std::any::type_name::<ResolverSet>();
    let _ = std::any::type_name::<Toolchain>();
    let _ = std::any::type_name::<UnilangError>();
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(ErrorCode::Declaration as u8, 2);
    assert_eq!(ErrorCode::Resolution as u8, 3);
    assert_eq!(ErrorCode::Invocation as u8, 4);
    assert_eq!(ErrorCode::Value as u8, 5);
    assert_eq!(ErrorCode::Configuration as u8, 6);
    assert_eq!(ErrorCode::Internal as u8, 10);
}
