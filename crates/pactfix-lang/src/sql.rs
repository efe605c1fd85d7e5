//! SQL matcher.

use std::path::Path;

use pactfix_core::{Language, Matcher};

use crate::file_name;

/// Matches SQL scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlMatcher;

impl Matcher for SqlMatcher {
    fn language(&self) -> Language {
        Language::Sql
    }

    fn concatenation_operators(&self) -> &'static [&'static str] {
        &["||"]
    }

    fn is_test_path(&self, path: &Path) -> bool {
        let name = file_name(path);
        name.ends_with("_test.sql") || name.starts_with("test_")
    }
}
