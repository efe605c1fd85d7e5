//! Declarative rule catalog driven by TOML documents.
//!
//! # Architecture
//!
//! ```text
//! TOML text
//!   ↓ serde (DTO layer)
//! catalog_dto types
//!   ↓ validate + convert (loader)
//! Vec<RuleDefinition> (pure domain model)
//!   ↓ CatalogBuilder::register / build
//! RuleCatalog (immutable)
//! ```

use std::path::{Path, PathBuf};

pub mod catalog_dto;
pub mod loader;
pub mod model;
pub mod registry;
pub mod template;

pub use model::{
    Confidence, Exclusions, FixSpec, FollowingLines, MatchScope, MatchSpec, ModelError, Pattern,
    RegexPattern, RuleDefinition, RuleId, Structure,
};
pub use registry::{CatalogBuilder, DuplicateRuleError, RuleCatalog};
pub use template::{FixTemplate, TemplateError};

/// Errors from reading, parsing and registering catalog documents.
#[derive(Debug, thiserror::Error)]
pub enum LoadCatalogError {
    /// The document could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// Catalog file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// TOML deserialization failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Domain model validation failed.
    #[error("{0}")]
    Load(#[from] loader::LoadError),

    /// A `(language, id)` pair is already registered.
    #[error("{0}")]
    Duplicate(#[from] DuplicateRuleError),
}

/// Parses one catalog document into rule definitions.
///
/// # Errors
///
/// Returns an error if TOML parsing or model validation fails.
pub fn parse_rules(content: &str) -> Result<Vec<RuleDefinition>, LoadCatalogError> {
    let dto: catalog_dto::CatalogDto = toml::from_str(content)?;
    Ok(loader::load(dto)?)
}

/// Parses a catalog document and registers its rules into `builder`.
///
/// Returns the number of rules registered.
///
/// # Errors
///
/// Returns an error if parsing fails or a rule is already registered.
pub fn load_catalog_from_toml(
    builder: &mut CatalogBuilder,
    content: &str,
) -> Result<usize, LoadCatalogError> {
    let rules = parse_rules(content)?;
    let count = rules.len();
    builder.extend(rules)?;
    Ok(count)
}

/// Reads and parses a catalog file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read_rules(path: &Path) -> Result<Vec<RuleDefinition>, LoadCatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadCatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_rules(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    const DOC: &str = r#"
[[rule]]
id = "RUBY001"
name = "nil-comparison"
language = "ruby"
message = "Use .nil? instead of == nil"
match = { regex = '(?P<target>(?P<lhs>[A-Za-z_@][A-Za-z0-9_]*)\s*==\s*nil)\b' }
fix = { template = "${lhs}.nil?" }
"#;

    #[test]
    fn load_registers_rules() {
        let mut builder = CatalogBuilder::new();
        assert_eq!(load_catalog_from_toml(&mut builder, DOC).unwrap(), 1);
        let catalog = builder.build();
        assert!(catalog.get(Language::Ruby, "RUBY001").is_some());
    }

    #[test]
    fn loading_the_same_document_twice_is_a_duplicate() {
        let mut builder = CatalogBuilder::new();
        load_catalog_from_toml(&mut builder, DOC).unwrap();
        let err = load_catalog_from_toml(&mut builder, DOC).unwrap_err();
        assert!(matches!(err, LoadCatalogError::Duplicate(_)));
    }

    #[test]
    fn invalid_toml_is_reported() {
        let err = parse_rules("[[rule]\n").unwrap_err();
        assert!(matches!(err, LoadCatalogError::Toml(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_rules(Path::new("/nonexistent/pactfix/rules.toml")).unwrap_err();
        assert!(matches!(err, LoadCatalogError::Io { .. }));
    }
}
