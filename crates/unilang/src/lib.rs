//! unilang: a language-neutral program model for cross-language tooling.
//!
//! This crate is the host-facing entry point. It re-exports
//! [`unilang_core`] and adds:
//! - [`ToolchainConfig`]: JSON configuration (log level, target language,
//!   extra resolver tables, registration policy)
//! - [`Toolchain`]: a registry, resolver set and syntax tree assembled from
//!   one configuration
//! - [`init_tracing`]: stderr logging with `RUST_LOG` overrides

pub mod logging;
pub mod toolchain;

pub use unilang_core as core;
pub use unilang_core::{config, eval, native, reflect, tree, value};
pub use unilang_core::{CoreError, CoreResult, ErrorCode};

pub use logging::{init_tracing, LogLevel};
pub use toolchain::{Toolchain, ToolchainConfig};

use thiserror::Error;

/// Failures surfaced by the facade.
#[derive(Debug, Error)]
pub enum UnilangError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A global tracing subscriber was already installed.
    #[error("failed to install tracing subscriber: {message}")]
    Logging { message: String },
}

impl UnilangError {
    /// Diagnostic class of the failure.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            UnilangError::Core(err) => err.error_code(),
            UnilangError::Logging { .. } => ErrorCode::Configuration,
        }
    }
}

pub type UnilangResult<T> = Result<T, UnilangError>;
