//! Rust matcher.
//!
//! Besides `tests/` and `benches/`, code inside `#[cfg(test)]` modules and
//! `#[test]` functions counts as test code.

use std::path::Path;

use pactfix_core::{Language, Matcher, ScanContext};

use crate::in_directory;

const TEST_ATTRIBUTES: &[&str] = &["#[cfg(test)]", "#[test]", "::test]"];

/// Matches Rust sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustMatcher;

impl Matcher for RustMatcher {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn interpolation_markers(&self) -> &'static [&'static str] {
        &["format!("]
    }

    fn is_test_path(&self, path: &Path) -> bool {
        in_directory(path, &["tests", "benches"])
    }

    fn in_test_code(&self, context: &ScanContext<'_>, offset: usize) -> bool {
        self.is_test_path(context.document().path())
            || context
                .enclosing(offset)
                .any(|block| has_test_attribute(context.text(), block.header.start))
    }
}

fn is_test_attribute(line: &str) -> bool {
    TEST_ATTRIBUTES.iter().any(|a| line.contains(a))
}

/// Looks at the header line and the attribute or comment lines above it.
fn has_test_attribute(text: &str, header_start: usize) -> bool {
    let start = text[..header_start].rfind('\n').map_or(0, |p| p + 1);
    let end = text[header_start..]
        .find('\n')
        .map_or(text.len(), |p| header_start + p);
    if is_test_attribute(&text[start..end]) {
        return true;
    }

    let mut cursor = start;
    while cursor > 0 {
        let end = cursor - 1;
        let begin = text[..end].rfind('\n').map_or(0, |p| p + 1);
        let line = text[begin..end].trim();
        if !(line.starts_with("#[") || line.starts_with("//")) {
            break;
        }
        if is_test_attribute(line) {
            return true;
        }
        cursor = begin;
    }
    false
}
