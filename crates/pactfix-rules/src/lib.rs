//! # pactfix-rules
//!
//! Built-in rule catalog for pactfix.
//!
//! Rules are declarative TOML documents compiled into the binary, one per
//! language. They load through the same pipeline as user catalogs, so a
//! team catalog can add rules without touching any matcher.
//!
//! ## Catalogs
//!
//! | Language | Prefix | Document |
//! |----------|--------|----------|
//! | PHP | `PHP` | `catalog/php.toml` |
//! | JavaScript | `JS` | `catalog/javascript.toml` |
//! | TypeScript | `TS` | `catalog/typescript.toml` |
//! | C# | `CS` | `catalog/csharp.toml` |
//! | Ruby | `RUBY` | `catalog/ruby.toml` |
//! | Python | `PY` | `catalog/python.toml` |
//! | Go | `GO` | `catalog/go.toml` |
//! | Java | `JAVA` | `catalog/java.toml` |
//! | Rust | `RUST` | `catalog/rust.toml` |
//! | Bash | `BASH`, `SC` | `catalog/bash.toml` |
//! | Dockerfile | `DOCKER` | `catalog/dockerfile.toml` |
//! | SQL | `SQL` | `catalog/sql.toml` |
//! | YAML | `YAML` | `catalog/yaml.toml` |
//!
//! Bash rules that mirror a ShellCheck check keep its `SC` code.
//!
//! ## Usage
//!
//! ```ignore
//! use pactfix_core::Engine;
//! use pactfix_rules::builtin_catalog;
//!
//! let engine = Engine::builder()
//!     .catalog(builtin_catalog()?)
//!     .matchers(pactfix_lang::all_matchers())
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod presets;

use pactfix_core::{
    load_catalog_from_toml, parse_rules, CatalogBuilder, Language, LoadCatalogError,
    RuleCatalog, RuleDefinition,
};
use tracing::debug;

pub use presets::{Preset, UnknownPresetError};

/// One embedded catalog document.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinCatalog {
    /// Language every rule of the document belongs to.
    pub language: Language,
    /// Document name, used in error messages.
    pub name: &'static str,
    /// TOML source.
    pub source: &'static str,
}

const CATALOGS: &[BuiltinCatalog] = &[
    BuiltinCatalog {
        language: Language::Php,
        name: "php.toml",
        source: include_str!("catalog/php.toml"),
    },
    BuiltinCatalog {
        language: Language::JavaScript,
        name: "javascript.toml",
        source: include_str!("catalog/javascript.toml"),
    },
    BuiltinCatalog {
        language: Language::TypeScript,
        name: "typescript.toml",
        source: include_str!("catalog/typescript.toml"),
    },
    BuiltinCatalog {
        language: Language::CSharp,
        name: "csharp.toml",
        source: include_str!("catalog/csharp.toml"),
    },
    BuiltinCatalog {
        language: Language::Ruby,
        name: "ruby.toml",
        source: include_str!("catalog/ruby.toml"),
    },
    BuiltinCatalog {
        language: Language::Python,
        name: "python.toml",
        source: include_str!("catalog/python.toml"),
    },
    BuiltinCatalog {
        language: Language::Go,
        name: "go.toml",
        source: include_str!("catalog/go.toml"),
    },
    BuiltinCatalog {
        language: Language::Java,
        name: "java.toml",
        source: include_str!("catalog/java.toml"),
    },
    BuiltinCatalog {
        language: Language::Rust,
        name: "rust.toml",
        source: include_str!("catalog/rust.toml"),
    },
    BuiltinCatalog {
        language: Language::Bash,
        name: "bash.toml",
        source: include_str!("catalog/bash.toml"),
    },
    BuiltinCatalog {
        language: Language::Dockerfile,
        name: "dockerfile.toml",
        source: include_str!("catalog/dockerfile.toml"),
    },
    BuiltinCatalog {
        language: Language::Sql,
        name: "sql.toml",
        source: include_str!("catalog/sql.toml"),
    },
    BuiltinCatalog {
        language: Language::Yaml,
        name: "yaml.toml",
        source: include_str!("catalog/yaml.toml"),
    },
];

/// An embedded catalog document failed to load.
#[derive(Debug, thiserror::Error)]
#[error("built-in catalog {name}: {source}")]
pub struct BuiltinCatalogError {
    /// Document name.
    pub name: &'static str,
    /// Underlying load error.
    #[source]
    pub source: LoadCatalogError,
}

/// Returns the embedded catalog documents.
#[must_use]
pub fn builtin_catalogs() -> &'static [BuiltinCatalog] {
    CATALOGS
}

/// Parses every embedded document into rule definitions.
///
/// # Errors
///
/// Returns an error if a document fails to parse or validate.
pub fn builtin_rules() -> Result<Vec<RuleDefinition>, BuiltinCatalogError> {
    let mut rules = Vec::new();
    for catalog in CATALOGS {
        let parsed = parse_rules(catalog.source).map_err(|source| BuiltinCatalogError {
            name: catalog.name,
            source,
        })?;
        rules.extend(parsed);
    }
    Ok(rules)
}

/// Registers every embedded rule into `builder`.
///
/// Returns the number of rules registered.
///
/// # Errors
///
/// Returns an error if a document fails to load or a rule id is already
/// registered.
pub fn register_builtin(builder: &mut CatalogBuilder) -> Result<usize, BuiltinCatalogError> {
    let mut total = 0;
    for catalog in CATALOGS {
        let count = load_catalog_from_toml(builder, catalog.source).map_err(|source| {
            BuiltinCatalogError {
                name: catalog.name,
                source,
            }
        })?;
        debug!(catalog = catalog.name, rules = count, "loaded built-in catalog");
        total += count;
    }
    Ok(total)
}

/// Builds a catalog holding only the embedded rules.
///
/// # Errors
///
/// Returns an error if a document fails to load.
pub fn builtin_catalog() -> Result<RuleCatalog, BuiltinCatalogError> {
    let mut builder = CatalogBuilder::new();
    register_builtin(&mut builder)?;
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn prefixes(language: Language) -> &'static [&'static str] {
        match language {
            Language::Php => &["PHP"],
            Language::JavaScript => &["JS"],
            Language::TypeScript => &["TS"],
            Language::CSharp => &["CS"],
            Language::Ruby => &["RUBY"],
            Language::Python => &["PY"],
            Language::Go => &["GO"],
            Language::Java => &["JAVA"],
            Language::Rust => &["RUST"],
            Language::Bash => &["BASH", "SC"],
            Language::Dockerfile => &["DOCKER"],
            Language::Sql => &["SQL"],
            Language::Yaml => &["YAML"],
        }
    }

    #[test]
    fn every_document_loads() {
        for catalog in builtin_catalogs() {
            let rules = parse_rules(catalog.source)
                .unwrap_or_else(|e| panic!("{}: {e}", catalog.name));
            assert!(!rules.is_empty(), "{} is empty", catalog.name);
        }
    }

    #[test]
    fn documents_stay_within_their_language() {
        for catalog in builtin_catalogs() {
            for rule in parse_rules(catalog.source).unwrap() {
                assert_eq!(rule.language(), catalog.language, "{}", rule.id());
                let id = rule.id().as_str();
                let numbered = prefixes(catalog.language).iter().any(|prefix| {
                    id.strip_prefix(prefix).is_some_and(|digits| {
                        !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
                    })
                });
                assert!(numbered, "{id} does not follow {:?}", prefixes(catalog.language));
            }
        }
    }

    #[test]
    fn every_language_has_a_catalog() {
        let covered: BTreeSet<Language> = builtin_catalogs().iter().map(|c| c.language).collect();
        assert_eq!(covered.len(), Language::ALL.len());
    }

    #[test]
    fn catalog_builds_without_duplicates() {
        let catalog = builtin_catalog().unwrap();
        assert_eq!(catalog.len(), builtin_rules().unwrap().len());
        assert!(catalog.get(Language::Php, "PHP002").is_some_and(|r| r.fix().is_some()));
        assert!(catalog.get(Language::Php, "PHP003").is_some_and(|r| r.fix().is_none()));
    }

    #[test]
    fn loading_twice_is_a_duplicate() {
        let mut builder = CatalogBuilder::new();
        register_builtin(&mut builder).unwrap();
        let err = register_builtin(&mut builder).unwrap_err();
        assert_eq!(err.name, "php.toml");
        assert!(matches!(err.source, LoadCatalogError::Duplicate(_)));
    }
}
