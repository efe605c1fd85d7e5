//! Dockerfile matcher.
//!
//! Instructions have no block structure; rules read whole instructions
//! through their backslash continuations instead.

use pactfix_core::{Block, Language, Matcher};

/// Matches Dockerfiles and Containerfiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerfileMatcher;

impl Matcher for DockerfileMatcher {
    fn language(&self) -> Language {
        Language::Dockerfile
    }

    fn blocks(&self, _code: &str) -> Vec<Block> {
        Vec::new()
    }

    fn concatenation_operators(&self) -> &'static [&'static str] {
        &[]
    }
}
