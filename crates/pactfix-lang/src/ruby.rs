//! Ruby matcher.
//!
//! Blocks are delimited by `begin`/`end` style keywords rather than braces.

use std::path::Path;

use pactfix_core::matcher::blocks;
use pactfix_core::{Block, Language, Matcher};

use crate::{file_name, in_directory};

/// Matches Ruby sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct RubyMatcher;

impl Matcher for RubyMatcher {
    fn language(&self) -> Language {
        Language::Ruby
    }

    fn blocks(&self, code: &str) -> Vec<Block> {
        blocks::ruby_blocks(code)
    }

    fn interpolation_markers(&self) -> &'static [&'static str] {
        &["#{"]
    }

    fn is_test_path(&self, path: &Path) -> bool {
        let name = file_name(path);
        name.ends_with("_spec.rb") || name.ends_with("_test.rb") || in_directory(path, &["spec"])
    }
}
