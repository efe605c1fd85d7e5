//! Source documents and their line index.

use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::language::Language;
use crate::types::Span;

/// A 1-indexed `(line, column)` pair. Columns count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

/// Byte offsets of every line start in a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Builds the index for `text`.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Number of lines. A trailing newline starts an empty final line.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Zero-based index of the line containing `offset`.
    #[must_use]
    pub fn line_of(&self, offset: usize) -> usize {
        let offset = offset.min(self.len);
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }

    /// Byte offset where the zero-based `line` starts.
    #[must_use]
    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts.get(line).copied().unwrap_or(self.len)
    }

    /// Byte range of the zero-based `line`, including its line terminator.
    #[must_use]
    pub fn line_range(&self, line: usize) -> Range<usize> {
        self.line_start(line)..self.line_start(line + 1)
    }

    /// Translates a byte offset into a 1-indexed position.
    #[must_use]
    pub fn position(&self, text: &str, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = self.line_of(offset);
        let start = self.line_start(line);
        let column = text
            .get(start..offset)
            .map_or(offset - start, |s| s.chars().count());
        Position {
            line: line + 1,
            column: column + 1,
        }
    }
}

/// Errors raised while turning raw bytes into a document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The bytes are not valid UTF-8 or could not be read.
    #[error("{path}: document unreadable: {reason}")]
    Unreadable {
        /// File that failed to decode.
        path: PathBuf,
        /// Why decoding failed.
        reason: String,
    },
}

/// A source file in a resolved language, with its line index.
///
/// The buffer is only replaced as a whole by the fix engine, which rebuilds
/// the index in the same step.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: PathBuf,
    language: Language,
    text: String,
    index: LineIndex,
    revision: usize,
}

impl SourceDocument {
    /// Creates a document from already decoded text.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, language: Language, text: impl Into<String>) -> Self {
        let text = text.into();
        let index = LineIndex::new(&text);
        Self {
            path: path.into(),
            language,
            text,
            index,
            revision: 0,
        }
    }

    /// Decodes raw bytes as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Unreadable`] if the bytes are not UTF-8.
    pub fn decode(
        path: impl Into<PathBuf>,
        language: Language,
        bytes: Vec<u8>,
    ) -> Result<Self, DocumentError> {
        let path = path.into();
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Self::new(path, language, text)),
            Err(e) => Err(DocumentError::Unreadable {
                reason: format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()),
                path,
            }),
        }
    }

    /// File path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolved language.
    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    /// Current buffer contents.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Line index of the current buffer.
    #[must_use]
    pub fn line_index(&self) -> &LineIndex {
        &self.index
    }

    /// Number of times the buffer has been rewritten.
    #[must_use]
    pub fn revision(&self) -> usize {
        self.revision
    }

    /// Translates a byte offset into a 1-indexed position.
    #[must_use]
    pub fn position(&self, offset: usize) -> Position {
        self.index.position(&self.text, offset)
    }

    /// Text covered by `span`, or an empty string if it is out of bounds.
    #[must_use]
    pub fn slice(&self, span: Span) -> &str {
        self.text.get(span.start..span.end).unwrap_or_default()
    }

    /// Byte range of the zero-based `line` without its terminator.
    #[must_use]
    pub fn line_bounds(&self, line: usize) -> Range<usize> {
        let range = self.index.line_range(line);
        let content = &self.text[range.clone()];
        let trimmed = content.trim_end_matches(['\n', '\r']);
        range.start..range.start + trimmed.len()
    }

    /// Text of the zero-based `line` without its terminator.
    #[must_use]
    pub fn line_text(&self, line: usize) -> &str {
        &self.text[self.line_bounds(line)]
    }

    /// Replaces the whole buffer and rebuilds the line index.
    pub(crate) fn replace_text(&mut self, text: String) {
        self.index = LineIndex::new(&text);
        self.text = text;
        self.revision += 1;
    }

    /// Consumes the document and returns its buffer.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_index_counts_lines() {
        let index = LineIndex::new("a\nbb\n\nccc");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.line_start(1), 2);
        assert_eq!(index.line_of(0), 0);
        assert_eq!(index.line_of(2), 1);
        assert_eq!(index.line_of(5), 2);
        assert_eq!(index.line_of(8), 3);
    }

    #[test]
    fn position_is_one_indexed() {
        let text = "let a = 1;\nvar counter = 0;\n";
        let doc = SourceDocument::new("a.js", Language::JavaScript, text);
        let offset = text.find("var").unwrap();
        assert_eq!(doc.position(offset), Position { line: 2, column: 1 });
        assert_eq!(doc.position(offset + 4), Position { line: 2, column: 5 });
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let text = "s = \"héllo\"; eval(x)";
        let doc = SourceDocument::new("a.js", Language::JavaScript, text);
        let offset = text.find("eval").unwrap();
        assert_eq!(doc.position(offset).column, 14);
    }

    #[test]
    fn position_past_end_is_clamped() {
        let doc = SourceDocument::new("a.py", Language::Python, "x = 1\n");
        assert_eq!(doc.position(100), Position { line: 2, column: 1 });
    }

    #[test]
    fn line_text_strips_crlf() {
        let doc = SourceDocument::new("a.cs", Language::CSharp, "one\r\ntwo\r\n");
        assert_eq!(doc.line_text(0), "one");
        assert_eq!(doc.line_text(1), "two");
        assert_eq!(doc.line_text(2), "");
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        let result = SourceDocument::decode("bad.php", Language::Php, vec![b'<', 0xff, 0xfe]);
        match result {
            Err(DocumentError::Unreadable { path, reason }) => {
                assert_eq!(path, PathBuf::from("bad.php"));
                assert!(reason.contains("byte 1"));
            }
            Ok(_) => panic!("expected decode failure"),
        }
    }

    #[test]
    fn replace_text_rebuilds_index() {
        let mut doc = SourceDocument::new("a.rb", Language::Ruby, "a\nb");
        doc.replace_text("a\n\n\nb".to_string());
        assert_eq!(doc.line_index().line_count(), 4);
        assert_eq!(doc.revision(), 1);
        assert_eq!(doc.line_text(3), "b");
    }
}
