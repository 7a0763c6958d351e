//! Toolchain configuration and assembly.
//!
//! A [`Toolchain`] owns one [`Registry`], one [`ResolverSet`] and one
//! [`SyntaxTree`]. Source files loaded into it have their classes
//! registered immediately, so `main` blocks can instantiate them. The
//! registry starts out holding the host `Regex` type.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use unilang_core::config::ResolverTable;
use unilang_core::eval::{register_file, Evaluator};
use unilang_core::native::{regex_class, Console, NativeResolver, ResolverSet, StdoutConsole};
use unilang_core::reflect::{Registry, TypeToken};
use unilang_core::tree::{FileId, SourceFileDecl, SyntaxTree};
use unilang_core::value::Value;
use unilang_core::CoreError;

use crate::logging::{init_tracing, LogLevel};
use crate::{UnilangError, UnilangResult};

// ============================================================================
// Configuration
// ============================================================================

fn default_target_language() -> String {
    "typescript".to_string()
}

fn default_true() -> bool {
    true
}

/// Toolchain settings, read from JSON.
///
/// ```json
/// {
///   "log_level": "debug",
///   "target_language": "python",
///   "resolver_tables": ["tables/python.json"],
///   "accept_identical_registration": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainConfig {
    #[serde(default)]
    pub log_level: LogLevel,
    /// Language whose resolver drives evaluation.
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// Extra resolver tables, loaded after the built-in ones. Relative paths
    /// in a config file resolve against the file's directory.
    #[serde(default)]
    pub resolver_tables: Vec<PathBuf>,
    /// Host types re-registered with an identical description get the
    /// existing token back. Classes from source files always register as
    /// new types under their file-qualified name.
    #[serde(default = "default_true")]
    pub accept_identical_registration: bool,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        ToolchainConfig {
            log_level: LogLevel::default(),
            target_language: default_target_language(),
            resolver_tables: Vec::new(),
            accept_identical_registration: true,
        }
    }
}

impl ToolchainConfig {
    pub fn from_json_str(json: &str) -> UnilangResult<Self> {
        Ok(serde_json::from_str(json).map_err(CoreError::from)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> UnilangResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| CoreError::config(format!("{}: {}", path.display(), e)))?;
        let mut config = ToolchainConfig::from_json_str(&json)?;
        if let Some(dir) = path.parent() {
            for table in &mut config.resolver_tables {
                if table.is_relative() {
                    *table = dir.join(&*table);
                }
            }
        }
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> UnilangResult<String> {
        Ok(serde_json::to_string_pretty(self).map_err(CoreError::from)?)
    }
}

// ============================================================================
// Toolchain
// ============================================================================

/// A configured registry, resolver set and tree.
pub struct Toolchain {
    config: ToolchainConfig,
    registry: Registry,
    resolvers: ResolverSet,
    resolver: Rc<NativeResolver>,
    tree: SyntaxTree,
    console: Rc<dyn Console>,
}

impl Toolchain {
    /// Assemble a toolchain printing to stdout.
    pub fn new(config: ToolchainConfig) -> UnilangResult<Self> {
        Toolchain::with_console(config, Rc::new(StdoutConsole))
    }

    /// Install the stderr subscriber at the configured level, then assemble
    /// a toolchain printing to stdout.
    ///
    /// An already installed subscriber is kept.
    pub fn with_logging(config: ToolchainConfig) -> UnilangResult<Self> {
        match init_tracing(config.log_level) {
            Ok(()) => {}
            Err(UnilangError::Logging { message }) => {
                debug!(%message, "keeping existing tracing subscriber");
            }
            Err(err) => return Err(err),
        }
        Toolchain::new(config)
    }

    /// Assemble a toolchain printing to `console`.
    pub fn with_console(
        config: ToolchainConfig,
        console: Rc<dyn Console>,
    ) -> UnilangResult<Self> {
        let mut resolvers = ResolverSet::with_builtin()?;
        for path in &config.resolver_tables {
            let table = ResolverTable::from_path(path)?;
            debug!(path = %path.display(), language = %table.language, "loading resolver table");
            resolvers.load(table)?;
        }
        let resolver = Rc::new(resolvers.get(&config.target_language)?.clone());

        let mut registry = if config.accept_identical_registration {
            Registry::new()
        } else {
            Registry::strict()
        };
        registry.register(regex_class())?;

        info!(
            target_language = %config.target_language,
            languages = resolvers.len(),
            "toolchain ready"
        );
        Ok(Toolchain {
            config,
            registry,
            resolvers,
            resolver,
            tree: SyntaxTree::new(),
            console,
        })
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Host types register here before any program runs.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn resolvers(&self) -> &ResolverSet {
        &self.resolvers
    }

    /// Resolver of the target language.
    pub fn resolver(&self) -> &NativeResolver {
        &self.resolver
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// Annotation passes need mutable access.
    pub fn tree_mut(&mut self) -> &mut SyntaxTree {
        &mut self.tree
    }

    /// Insert a file and register its classes.
    ///
    /// If registration fails the file is removed again, leaving the tree
    /// as it was. Types registered before the failing one stay registered.
    pub fn load_file(
        &mut self,
        decl: SourceFileDecl,
    ) -> UnilangResult<(FileId, Vec<(String, TypeToken)>)> {
        let file_id = self.tree.insert_source_file(decl)?;
        match register_file(
            &mut self.registry,
            &self.tree,
            file_id,
            Rc::clone(&self.resolver),
            Rc::clone(&self.console),
        ) {
            Ok(tokens) => Ok((file_id, tokens)),
            Err(err) => {
                self.tree.remove_source_file(file_id)?;
                Err(err.into())
            }
        }
    }

    /// Run a file's top-level statements.
    pub fn run(&self, file_id: FileId) -> UnilangResult<Value> {
        let mut evaluator =
            Evaluator::new(&self.registry, &self.resolver, self.console.as_ref());
        Ok(evaluator.run_main(&self.tree, file_id)?)
    }
}
