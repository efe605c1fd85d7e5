//! # pactfix-lang
//!
//! One [`Matcher`] per registered language.
//!
//! Every matcher reuses the generic scan of `pactfix-core` and only
//! describes what differs between languages:
//!
//! - the block model (braces, `begin`/`end`, indentation, YAML nesting)
//! - the idioms structural predicates look for (string concatenation,
//!   interpolation markers, placeholder statements)
//! - how test files and test code are recognized

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::Path;

use pactfix_core::MatcherBox;

pub mod bash;
pub mod csharp;
pub mod dockerfile;
pub mod go;
pub mod java;
pub mod javascript;
pub mod php;
pub mod python;
pub mod ruby;
pub mod rust;
pub mod sql;
pub mod yaml;

pub use bash::BashMatcher;
pub use csharp::CSharpMatcher;
pub use dockerfile::DockerfileMatcher;
pub use go::GoMatcher;
pub use java::JavaMatcher;
pub use javascript::{JavaScriptMatcher, TypeScriptMatcher};
pub use php::PhpMatcher;
pub use python::PythonMatcher;
pub use ruby::RubyMatcher;
pub use rust::RustMatcher;
pub use sql::SqlMatcher;
pub use yaml::YamlMatcher;

/// Returns a matcher for every registered language.
#[must_use]
pub fn all_matchers() -> Vec<MatcherBox> {
    vec![
        Box::new(PhpMatcher),
        Box::new(JavaScriptMatcher),
        Box::new(TypeScriptMatcher),
        Box::new(CSharpMatcher),
        Box::new(RubyMatcher),
        Box::new(PythonMatcher),
        Box::new(GoMatcher),
        Box::new(JavaMatcher),
        Box::new(RustMatcher),
        Box::new(BashMatcher),
        Box::new(DockerfileMatcher),
        Box::new(SqlMatcher),
        Box::new(YamlMatcher),
    ]
}

/// File name of `path` as UTF-8, or an empty string.
pub(crate) fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

/// Returns true if a directory component of `path` is one of `dirs`.
pub(crate) fn in_directory(path: &Path, dirs: &[&str]) -> bool {
    path.parent()
        .is_some_and(|p| p.components().any(|c| dirs.iter().any(|d| c.as_os_str() == *d)))
}
