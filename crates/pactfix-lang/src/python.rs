//! Python matcher.
//!
//! Blocks follow indentation; `pass` and `...` bodies count as empty.

use std::path::Path;

use pactfix_core::matcher::blocks;
use pactfix_core::{Block, Language, Matcher};

use crate::{file_name, in_directory};

/// Matches Python sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonMatcher;

impl Matcher for PythonMatcher {
    fn language(&self) -> Language {
        Language::Python
    }

    fn blocks(&self, code: &str) -> Vec<Block> {
        blocks::indentation_blocks(code)
    }

    fn concatenation_operators(&self) -> &'static [&'static str] {
        &["+", "%", ".format("]
    }

    fn interpolation_markers(&self) -> &'static [&'static str] {
        &["f\"", "f'"]
    }

    fn empty_body_fillers(&self) -> &'static [&'static str] {
        &["pass", "..."]
    }

    fn is_test_path(&self, path: &Path) -> bool {
        let name = file_name(path);
        (name.starts_with("test_") && name.ends_with(".py"))
            || name.ends_with("_test.py")
            || name == "conftest.py"
            || in_directory(path, &["tests"])
    }
}
