//! # pactfix
//!
//! Multi-language static analysis with safe mechanical fixes.
//!
//! This is the facade crate that re-exports the engine, the language
//! matchers and the built-in rules, and knows how to assemble them from a
//! [`Config`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pactfix::{standard_engine, Config, SourceInput};
//!
//! let engine = standard_engine(Config::default(), Path::new("."))?;
//! let report = engine.scan(&[SourceInput::new("index.php", bytes)]);
//! ```
//!
//! ## Fixing
//!
//! ```rust,ignore
//! let outcome = engine.fix_document(SourceDocument::new("app.js", Language::JavaScript, text));
//! println!("{} fixes applied", outcome.applied.len());
//! ```

#![forbid(unsafe_code)]

pub use pactfix_core::*;

/// Per-language matchers.
pub mod lang {
    pub use pactfix_lang::*;
}

/// Built-in rules and presets.
pub mod rules {
    pub use pactfix_rules::*;
}

mod standard;

pub use standard::{available_catalog, standard_catalog, standard_engine, SetupError};
