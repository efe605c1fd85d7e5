//! Java matcher.

use std::path::Path;

use pactfix_core::{Language, Matcher};

use crate::file_name;

/// Matches Java sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaMatcher;

impl Matcher for JavaMatcher {
    fn language(&self) -> Language {
        Language::Java
    }

    fn concatenation_operators(&self) -> &'static [&'static str] {
        &["+", "String.format(", ".formatted("]
    }

    fn is_test_path(&self, path: &Path) -> bool {
        let name = file_name(path);
        if name.ends_with("Test.java") || name.ends_with("Tests.java") {
            return true;
        }
        // Maven and Gradle layouts keep tests under src/test.
        let parts: Vec<_> = path.components().map(|c| c.as_os_str()).collect();
        parts.windows(2).any(|w| w[0] == "src" && w[1] == "test")
    }
}
