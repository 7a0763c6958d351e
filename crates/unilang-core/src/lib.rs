//! Core infrastructure for unilang.
//!
//! This crate provides the language-neutral substrate of the toolchain:
//! - Syntax tree store with typed ids, name lookup and annotations
//! - Tagged runtime values with a shared container protocol
//! - Reflection registry for host-defined and tree-defined types
//! - Native resolvers mapping a target language's built-ins to containers
//! - Resolver tables loaded from JSON
//! - A structural evaluator for expressions and straight-line code
//! - Error types and error codes

pub mod config;
pub mod error;
pub mod eval;
pub mod native;
pub mod reflect;
pub mod tree;
pub mod value;

pub use error::{CoreError, CoreResult, ErrorCode};
