//! PHP matcher.

use std::path::Path;

use pactfix_core::{Language, Matcher};

use crate::file_name;

/// Matches PHP sources, including templates mixing HTML and PHP.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhpMatcher;

impl Matcher for PhpMatcher {
    fn language(&self) -> Language {
        Language::Php
    }

    fn concatenation_operators(&self) -> &'static [&'static str] {
        &["."]
    }

    fn interpolation_markers(&self) -> &'static [&'static str] {
        &["$"]
    }

    fn is_test_path(&self, path: &Path) -> bool {
        file_name(path).ends_with("Test.php")
    }
}
