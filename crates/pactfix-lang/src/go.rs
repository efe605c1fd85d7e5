//! Go matcher.

use std::path::Path;

use pactfix_core::{Language, Matcher};

use crate::file_name;

/// Matches Go sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoMatcher;

impl Matcher for GoMatcher {
    fn language(&self) -> Language {
        Language::Go
    }

    fn interpolation_markers(&self) -> &'static [&'static str] {
        &["fmt.Sprintf("]
    }

    fn is_test_path(&self, path: &Path) -> bool {
        file_name(path).ends_with("_test.go")
    }
}
