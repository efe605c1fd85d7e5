//! Core types for diagnostics and scan results.

use miette::{LabeledSpan, NamedSource, SourceCode};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;

use crate::language::Language;

/// Severity level of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational finding.
    Info,
    /// Anti-idiom or likely bug that should be addressed.
    Warning,
    /// Defect that must be fixed.
    Error,
    /// Security-relevant defect.
    Security,
}

impl Severity {
    /// All severities, lowest first.
    pub const ALL: [Self; 4] = [Self::Info, Self::Warning, Self::Error, Self::Security];

    /// Parses the lowercase severity name used in catalogs and configuration.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            "security" => Some(Self::Security),
            _ => None,
        }
    }

    /// Returns the lowercase severity name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Security => "security",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A half-open byte range `[start, end)` into a document buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
}

impl Span {
    /// Creates a span. `end` is clamped so it never precedes `start`.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(self) -> usize {
        self.end - self.start
    }

    /// Returns true for a zero-width span.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Returns true if the two spans share at least one byte.
    ///
    /// A zero-width span overlaps another span only when it lies strictly
    /// inside it; two insertions at the same offset never overlap.
    #[must_use]
    pub fn overlaps(self, other: Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if `offset` falls inside the span.
    #[must_use]
    pub fn contains(self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A deduplicated, located finding of one rule in one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Rule identifier (e.g., "PHP002").
    pub rule_id: String,
    /// Rule name (e.g., "loose-null-comparison").
    pub rule_name: String,
    /// Language of the document.
    pub language: Language,
    /// File path as given to the engine.
    pub file: PathBuf,
    /// Start line (1-indexed).
    pub line: usize,
    /// Start column (1-indexed, in characters).
    pub column: usize,
    /// Line of the position just past the span.
    pub end_line: usize,
    /// Column of the position just past the span.
    pub end_column: usize,
    /// Byte offset of the span start.
    pub offset: usize,
    /// Byte length of the span.
    pub length: usize,
    /// Severity after configuration overrides.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// The matched text.
    pub snippet: String,
    /// Matcher confidence in `[0, 1]`.
    pub confidence: f32,
    /// Whether a fix for this diagnostic is selected in the current plan.
    pub fixable: bool,
    /// Identifier that stays stable when unrelated lines move.
    pub fingerprint: String,
}

impl Diagnostic {
    /// Returns the byte span of the finding.
    #[must_use]
    pub fn span(&self) -> Span {
        Span::new(self.offset, self.offset + self.length)
    }

    /// Total order used for reports: file, line, column, rule id, span end.
    #[must_use]
    pub fn report_order(&self, other: &Self) -> Ordering {
        self.file
            .cmp(&other.file)
            .then(self.line.cmp(&other.line))
            .then(self.column.cmp(&other.column))
            .then_with(|| self.rule_id.cmp(&other.rule_id))
            .then((self.offset + self.length).cmp(&(other.offset + other.length)))
    }

    /// Formats the diagnostic as a multi-line terminal block.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{} {} at {}:{}:{}\n",
            self.rule_id,
            self.rule_name,
            self.file.display(),
            self.line,
            self.column,
        );
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        let _ = writeln!(output, "  | {}", first_line(&self.snippet));
        if self.fixable {
            let _ = writeln!(output, "  = help: run `pactfix fix` to apply the rewrite");
        }
        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.file.display(),
            self.line,
            self.column,
            self.severity,
            self.rule_id,
            self.message
        )
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

/// Why a file produced no diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoteKind {
    /// The bytes could not be decoded or read.
    Unreadable,
    /// No registered language matched the file.
    UnknownLanguage,
}

/// A diagnostic-free note about a skipped file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNote {
    /// File the note is about.
    pub file: PathBuf,
    /// Note category.
    pub kind: NoteKind,
    /// Details for the user.
    pub message: String,
}

impl FileNote {
    /// Creates a new note.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, kind: NoteKind, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            kind,
            message: message.into(),
        }
    }

    /// Reporting level: unreadable files are warnings, unknown languages info.
    #[must_use]
    pub fn level(&self) -> Severity {
        match self.kind {
            NoteKind::Unreadable => Severity::Warning,
            NoteKind::UnknownLanguage => Severity::Info,
        }
    }
}

/// Diagnostic counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// Security findings.
    pub security: usize,
    /// Errors.
    pub error: usize,
    /// Warnings.
    pub warning: usize,
    /// Informational findings.
    pub info: usize,
}

impl SeverityCounts {
    /// Counts the given diagnostics.
    #[must_use]
    pub fn of<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) -> Self {
        let mut counts = Self::default();
        for d in diagnostics {
            match d.severity {
                Severity::Security => counts.security += 1,
                Severity::Error => counts.error += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Info => counts.info += 1,
            }
        }
        counts
    }

    /// Total number of diagnostics.
    #[must_use]
    pub fn total(&self) -> usize {
        self.security + self.error + self.warning + self.info
    }
}

impl fmt::Display for SeverityCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} security, {} error(s), {} warning(s), {} info(s)",
            self.security, self.error, self.warning, self.info
        )
    }
}

/// Result of scanning a set of inputs.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// All diagnostics in report order.
    pub diagnostics: Vec<Diagnostic>,
    /// Notes about skipped files.
    pub notes: Vec<FileNote>,
    /// Number of files that went through a matcher.
    pub files_scanned: usize,
    /// Number of files skipped (unknown language or unreadable).
    pub files_skipped: usize,
}

impl ScanReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if any diagnostic was reported.
    #[must_use]
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Counts diagnostics by severity.
    #[must_use]
    pub fn counts(&self) -> SeverityCounts {
        SeverityCounts::of(&self.diagnostics)
    }

    /// Returns diagnostics at or above the given severity.
    #[must_use]
    pub fn at_least(&self, severity: Severity) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity >= severity)
            .collect()
    }

    /// Sorts diagnostics and notes into their stable report order.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(Diagnostic::report_order);
        self.notes
            .sort_by(|a, b| a.file.cmp(&b.file).then(a.message.cmp(&b.message)));
    }

    /// Merges another report into this one. Call [`ScanReport::sort`] afterwards.
    pub fn extend(&mut self, other: Self) {
        self.diagnostics.extend(other.diagnostics);
        self.notes.extend(other.notes);
        self.files_scanned += other.files_scanned;
        self.files_skipped += other.files_skipped;
    }
}

/// Renders a [`Diagnostic`] through miette with the source text attached.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct DiagnosticReport {
    message: String,
    rule_id: String,
    rule_name: String,
    severity: Severity,
    fixable: bool,
    span: miette::SourceSpan,
    source_code: NamedSource<String>,
}

impl DiagnosticReport {
    /// Creates a report for `diagnostic` over the document text it was found in.
    #[must_use]
    pub fn new(diagnostic: &Diagnostic, source_text: String) -> Self {
        Self {
            message: diagnostic.message.clone(),
            rule_id: diagnostic.rule_id.clone(),
            rule_name: diagnostic.rule_name.clone(),
            severity: diagnostic.severity,
            fixable: diagnostic.fixable,
            span: miette::SourceSpan::from((diagnostic.offset, diagnostic.length)),
            source_code: NamedSource::new(diagnostic.file.display().to_string(), source_text),
        }
    }
}

impl miette::Diagnostic for DiagnosticReport {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.rule_id))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.severity {
            Severity::Info => miette::Severity::Advice,
            Severity::Warning => miette::Severity::Warning,
            Severity::Error | Severity::Security => miette::Severity::Error,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        if self.fixable {
            Some(Box::new("an automatic rewrite is available: run `pactfix fix`"))
        } else {
            None
        }
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.source_code)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = LabeledSpan::new_with_span(Some(self.rule_name.clone()), self.span);
        Some(Box::new(std::iter::once(label)))
    }
}
