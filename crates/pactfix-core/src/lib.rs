//! # pactfix-core
//!
//! Core engine for multi-language static analysis with mechanical fixes.
//!
//! This crate provides the building blocks the language and rule crates
//! plug into:
//!
//! - [`RuleCatalog`] holding declarative [`RuleDefinition`]s loaded from TOML
//! - [`LanguageClassifier`] mapping paths and content to a [`Language`]
//! - [`Matcher`] trait, one implementation per language
//! - [`collect`] turning matches into ordered [`Diagnostic`]s
//! - [`FixPass`] planning and applying non-overlapping rewrites
//! - [`Engine`] orchestrating the above across many files
//!
//! ## Example
//!
//! ```ignore
//! use pactfix_core::{Engine, RuleCatalog, SourceInput};
//!
//! let engine = Engine::builder()
//!     .catalog(catalog)
//!     .matcher(PhpMatcher)
//!     .build()?;
//!
//! let report = engine.scan(&[SourceInput::new("index.php", bytes)]);
//! for diagnostic in &report.diagnostics {
//!     println!("{diagnostic}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod collector;
mod config;
pub mod document;
mod engine;
pub mod fixer;
mod language;
pub mod matcher;
pub mod syntax;
mod types;

/// Utility modules for matcher implementations.
pub mod utils;

pub use catalog::{
    load_catalog_from_toml, parse_rules, read_rules, CatalogBuilder, DuplicateRuleError,
    LoadCatalogError, RuleCatalog, RuleDefinition,
};
pub use collector::{collect, select_fixes, Collected, FixCandidate};
pub use config::{Config, ConfigError, EngineConfig, RuleConfig, DEFAULT_MAX_FIX_PASSES};
pub use document::{DocumentError, LineIndex, Position, SourceDocument};
pub use engine::{Engine, EngineBuilder, EngineError, FixOutcome, FixReport, SourceInput};
pub use fixer::{AppliedFix, FixError, FixPass, FixState, FixWarning, PassOutcome, RejectedFix};
pub use language::{Language, LanguageClassifier};
pub use matcher::{scan_document, Block, Match, Matcher, MatcherBox, ScanContext};
pub use types::{
    Diagnostic, DiagnosticReport, FileNote, NoteKind, ScanReport, Severity, SeverityCounts, Span,
};
pub use utils::allowance::AllowCheck;
