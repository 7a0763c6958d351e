//! Resolver tables: native resolver mappings as data.
//!
//! A table names its target language, the surface types that arrays and
//! objects present as in that language, and one [`Mapping`] per supported
//! surface operation. The TypeScript table is embedded in the crate; other
//! tables load from JSON strings or files.
//!
//! ```json
//! {
//!   "language": "typescript",
//!   "receivers": { "array": "TsArray", "object": "TsMap" },
//!   "methods": [{ "owner": "TsMap", "member": "delete", "op": "remove" }],
//!   "operators": { "op_in": { "op": "has_key", "operands": [1, 0] } }
//! }
//! ```
//!
//! `operands` lists, for each canonical operand, its position in the
//! surface operand list. Surface operands are the receiver followed by the
//! arguments for methods and properties, the arguments alone for static
//! calls, and the hook's operands in order for operators. When omitted the
//! positions are `0..arity`.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::native::{CanonicalOp, OperatorHook};

/// The TypeScript resolver table shipped with the crate.
pub const TYPESCRIPT_TABLE: &str = include_str!("resolvers/typescript.json");

// ============================================================================
// Table Types
// ============================================================================

/// How one surface operation reduces to a canonical operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub op: CanonicalOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operands: Option<Vec<usize>>,
}

impl Mapping {
    pub fn new(op: CanonicalOp) -> Self {
        Mapping { op, operands: None }
    }

    pub fn with_operands(op: CanonicalOp, operands: Vec<usize>) -> Self {
        Mapping {
            op,
            operands: Some(operands),
        }
    }

    /// Surface position of each canonical operand.
    pub fn positions(&self) -> Vec<usize> {
        match &self.operands {
            Some(positions) => positions.clone(),
            None => (0..self.op.arity()).collect(),
        }
    }

    /// Number of surface operands the mapping consumes.
    pub fn surface_arity(&self) -> usize {
        self.positions().iter().max().map_or(0, |max| max + 1)
    }

    fn validate(&self, what: &str) -> CoreResult<()> {
        let positions = self.positions();
        if positions.len() != self.op.arity() {
            return Err(CoreError::config(format!(
                "{}: '{}' takes {} operands, mapping lists {}",
                what,
                self.op,
                self.op.arity(),
                positions.len()
            )));
        }
        Ok(())
    }
}

/// A method, property or static member mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberMapping {
    /// Surface type (`TsArray`) or static owner (`console`).
    pub owner: String,
    pub member: String,
    pub op: CanonicalOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operands: Option<Vec<usize>>,
}

impl MemberMapping {
    pub fn mapping(&self) -> Mapping {
        Mapping {
            op: self.op,
            operands: self.operands.clone(),
        }
    }

    /// `owner.member`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner, self.member)
    }
}

/// Surface type names of receivers, by value variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverTypes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
}

/// Operator hook mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorTable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op_in: Option<Mapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op_get: Option<Mapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op_set: Option<Mapping>,
}

impl OperatorTable {
    pub fn get(&self, hook: OperatorHook) -> Option<&Mapping> {
        match hook {
            OperatorHook::OpIn => self.op_in.as_ref(),
            OperatorHook::OpGet => self.op_get.as_ref(),
            OperatorHook::OpSet => self.op_set.as_ref(),
        }
    }
}

/// Every mapping of one target language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverTable {
    pub language: String,
    #[serde(default)]
    pub receivers: ReceiverTypes,
    #[serde(default)]
    pub methods: Vec<MemberMapping>,
    #[serde(default)]
    pub properties: Vec<MemberMapping>,
    #[serde(default)]
    pub statics: Vec<MemberMapping>,
    #[serde(default)]
    pub operators: OperatorTable,
}

// ============================================================================
// Loading
// ============================================================================

impl ResolverTable {
    /// An empty table for `language`.
    pub fn new(language: impl Into<String>) -> Self {
        ResolverTable {
            language: language.into(),
            receivers: ReceiverTypes::default(),
            methods: Vec::new(),
            properties: Vec::new(),
            statics: Vec::new(),
            operators: OperatorTable::default(),
        }
    }

    /// The embedded TypeScript table.
    pub fn typescript() -> CoreResult<Self> {
        ResolverTable::from_json_str(TYPESCRIPT_TABLE)
    }

    /// Parse and validate a table.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let table: ResolverTable = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Read, parse and validate a table file.
    pub fn from_path(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| CoreError::config(format!("{}: {}", path.display(), e)))?;
        ResolverTable::from_json_str(&json).map_err(|e| match e {
            CoreError::Config { message } => {
                CoreError::config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    pub fn to_json_pretty(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check operand counts and reject duplicate member mappings.
    pub fn validate(&self) -> CoreResult<()> {
        if self.language.trim().is_empty() {
            return Err(CoreError::config("resolver table has no language"));
        }

        for (section, entries) in [
            ("method", &self.methods),
            ("property", &self.properties),
            ("static", &self.statics),
        ] {
            let mut seen = HashSet::new();
            for entry in entries {
                let name = entry.qualified_name();
                if !seen.insert((entry.owner.as_str(), entry.member.as_str())) {
                    return Err(CoreError::config(format!(
                        "{}: duplicate {} mapping '{}'",
                        self.language, section, name
                    )));
                }
                let mapping = entry.mapping();
                mapping.validate(&name)?;
                if section == "property" && mapping.surface_arity() > 1 {
                    return Err(CoreError::config(format!(
                        "{}: property '{}' may only use its receiver",
                        self.language, name
                    )));
                }
            }
        }

        for hook in OperatorHook::ALL {
            if let Some(mapping) = self.operators.get(hook) {
                mapping.validate(hook.name())?;
                if mapping.surface_arity() > hook.arity() {
                    return Err(CoreError::config(format!(
                        "{}: {} has {} operands, mapping reads position {}",
                        self.language,
                        hook,
                        hook.arity(),
                        mapping.surface_arity() - 1
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn embedded_typescript_table_loads() {
        let table = ResolverTable::typescript().unwrap();
        assert_eq!(table.language, "typescript");
        assert_eq!(table.receivers.array.as_deref(), Some("TsArray"));
        assert_eq!(table.receivers.object.as_deref(), Some("TsMap"));
        let op_in = table.operators.get(OperatorHook::OpIn).unwrap();
        assert_eq!(op_in.op, CanonicalOp::HasKey);
        assert_eq!(op_in.positions(), vec![1, 0]);
    }

    #[test]
    fn omitted_operands_default_to_identity() {
        let mapping = Mapping::new(CanonicalOp::Set);
        assert_eq!(mapping.positions(), vec![0, 1, 2]);
        assert_eq!(mapping.surface_arity(), 3);
    }

    #[test]
    fn wrong_operand_count_rejected() {
        let json = r#"{ "language": "x",
            "methods": [{ "owner": "A", "member": "put", "op": "set", "operands": [0, 1] }] }"#;
        let err = ResolverTable::from_json_str(json).unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }));
        assert!(err.to_string().contains("A.put"));
    }

    #[test]
    fn duplicate_mapping_rejected() {
        let json = r#"{ "language": "x",
            "statics": [{ "owner": "io", "member": "out", "op": "print" },
                        { "owner": "io", "member": "out", "op": "print" }] }"#;
        let err = ResolverTable::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("duplicate static mapping 'io.out'"));
    }

    #[test]
    fn operator_reading_past_its_operands_rejected() {
        let json = r#"{ "language": "x",
            "operators": { "op_get": { "op": "get", "operands": [0, 2] } } }"#;
        assert!(ResolverTable::from_json_str(json).is_err());
    }

    #[test]
    fn malformed_json_is_config_error() {
        let err = ResolverTable::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let table = ResolverTable::typescript().unwrap();
        file.write_all(table.to_json_pretty().unwrap().as_bytes())
            .unwrap();

        let loaded = ResolverTable::from_path(file.path()).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = ResolverTable::from_path(&path).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
