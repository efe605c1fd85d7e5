//! Fix passes: planning and applying non-overlapping rewrites to a document.
//!
//! A pass moves through `Scanned → Planning → Applying → Applied | Aborted`.
//! Edits are spans into the buffer snapshot taken when the pass was planned;
//! they are applied rightmost first so earlier offsets stay valid, and the
//! document only sees the composed buffer once every edit went through.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::template::TemplateError;
use crate::collector::{Collected, FixCandidate};
use crate::document::SourceDocument;
use crate::syntax::{DelimiterBalance, LexicalSyntax};
use crate::types::{Diagnostic, Span};

/// Marker written in front of fix annotations.
const ANNOTATION_MARKER: &str = "pactfix:";

/// Lifecycle of one fix pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixState {
    /// Diagnostics are collected, nothing is planned.
    Scanned,
    /// Replacements are being rendered and verified.
    Planning,
    /// The buffer is being composed.
    Applying,
    /// The rewritten buffer replaced the document's.
    Applied,
    /// The pass was abandoned; the buffer is untouched.
    Aborted,
}

impl FixState {
    fn can_move_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Scanned, Self::Planning)
                | (Self::Planning, Self::Applying | Self::Aborted)
                | (Self::Applying, Self::Applied | Self::Aborted)
        )
    }
}

impl fmt::Display for FixState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scanned => "scanned",
            Self::Planning => "planning",
            Self::Applying => "applying",
            Self::Applied => "applied",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Errors raised while planning or applying fixes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixError {
    /// The rewritten lines no longer balance like the original ones.
    #[error("fix for {rule_id} at line {line} failed verification: {reason}")]
    VerificationFailed {
        /// Rule whose fix was dropped.
        rule_id: String,
        /// 1-indexed line of the fix.
        line: usize,
        /// What changed.
        reason: String,
    },

    /// The fix template could not be rendered.
    #[error("fix template of {rule_id} failed: {source}")]
    Template {
        /// Rule whose template failed.
        rule_id: String,
        /// Underlying template error.
        source: TemplateError,
    },

    /// A planned edit is unusable; the whole pass is abandoned.
    #[error("invalid edit at {span}: {reason}")]
    InvalidEdit {
        /// Span of the offending edit.
        span: Span,
        /// Why the edit was refused.
        reason: &'static str,
    },

    /// A pass was driven out of order.
    #[error("invalid fix pass transition from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: FixState,
        /// Requested state.
        to: FixState,
    },
}

/// A rewrite that made it into the buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFix {
    /// Rule whose fix was applied.
    pub rule_id: String,
    /// 1-indexed line of the fix in the buffer it was planned on.
    pub line: usize,
    /// Human-readable description of the rewrite.
    pub description: String,
    /// Affected lines before the rewrite.
    pub before: String,
    /// Affected lines after the rewrite.
    pub after: String,
}

/// A fix dropped during planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFix {
    /// Fingerprint of the diagnostic, never planned again in this run.
    pub fingerprint: String,
    /// Why it was dropped.
    pub error: FixError,
}

/// Non-fatal conditions reported with a fix outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FixWarning {
    /// A fix was dropped because its rewrite failed verification.
    VerificationFailed {
        /// Rule whose fix was dropped.
        rule_id: String,
        /// 1-indexed line of the fix.
        line: usize,
        /// Details.
        message: String,
    },
    /// The pass limit was reached while fixes were still possible.
    MaxFixPassesExceeded {
        /// Diagnostics that still had a selected fix.
        still_fixable: Vec<Diagnostic>,
    },
}

impl fmt::Display for FixWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VerificationFailed { message, .. } => f.write_str(message),
            Self::MaxFixPassesExceeded { still_fixable } => write!(
                f,
                "maximum fix passes reached with {} fixable diagnostic(s) left",
                still_fixable.len()
            ),
        }
    }
}

/// What one pass did.
#[derive(Debug, Clone, Default)]
pub struct PassOutcome {
    /// Fixes written into the buffer, in buffer order.
    pub applied: Vec<AppliedFix>,
    /// Fixes dropped during planning.
    pub rejected: Vec<RejectedFix>,
    /// Fixable diagnostics left for a later pass because of overlaps.
    pub deferred: usize,
}

#[derive(Debug)]
struct Edit {
    span: Span,
    replacement: String,
}

/// One planning-and-applying cycle over a document.
///
/// The pass borrows the document mutably for its whole lifetime, so nobody
/// can observe a partially rewritten buffer.
#[derive(Debug)]
pub struct FixPass<'d> {
    document: &'d mut SourceDocument,
    state: FixState,
    annotate: bool,
    edits: Vec<Edit>,
    outcome: PassOutcome,
}

impl<'d> FixPass<'d> {
    /// Starts a pass over a freshly scanned document.
    pub fn new(document: &'d mut SourceDocument) -> Self {
        Self {
            document,
            state: FixState::Scanned,
            annotate: false,
            edits: Vec::new(),
            outcome: PassOutcome::default(),
        }
    }

    /// Inserts a comment above every rewritten line.
    #[must_use]
    pub fn annotate(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> FixState {
        self.state
    }

    fn transition(&mut self, to: FixState) -> Result<(), FixError> {
        if !self.state.can_move_to(to) {
            return Err(FixError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    /// Renders and verifies the selected fixes of `collected`.
    ///
    /// A fix whose template fails or whose rewrite unbalances its lines is
    /// recorded as rejected; the rest of the plan proceeds.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::InvalidTransition`] unless the pass is `Scanned`.
    pub fn plan(mut self, collected: &Collected) -> Result<Self, FixError> {
        self.transition(FixState::Planning)?;
        self.outcome.deferred = collected.deferred.len();
        let syntax = LexicalSyntax::for_language(self.document.language());

        let mut annotated: Vec<(usize, String)> = Vec::new();
        for fix in &collected.fixes {
            match self.render(fix, syntax) {
                Ok((edit, applied)) => {
                    if self.annotate {
                        let line = self.document.line_index().line_of(edit.span.start);
                        annotated.push((line, applied.description.clone()));
                    }
                    self.edits.push(edit);
                    self.outcome.applied.push(applied);
                }
                Err(error) => {
                    warn!(rule = fix.rule_id(), line = fix.line, %error, "fix dropped");
                    self.outcome.rejected.push(RejectedFix {
                        fingerprint: fix.fingerprint.clone(),
                        error,
                    });
                }
            }
        }

        let mut annotated_lines: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for (line, description) in annotated {
            annotated_lines
                .entry(self.annotation_line(line))
                .or_default()
                .push(description);
        }
        for (line, descriptions) in annotated_lines {
            let edit = self.annotation(line, &descriptions.join("; "), syntax);
            self.edits.push(edit);
        }

        debug!(
            path = %self.document.path().display(),
            planned = self.outcome.applied.len(),
            rejected = self.outcome.rejected.len(),
            deferred = self.outcome.deferred,
            "fix pass planned"
        );
        Ok(self)
    }

    fn touched_lines(&self, span: Span) -> Range<usize> {
        let index = self.document.line_index();
        let first = index.line_of(span.start);
        let last = index.line_of(span.end.saturating_sub(1).max(span.start));
        index.line_start(first)..self.document.line_bounds(last).end
    }

    fn render(&self, fix: &FixCandidate, syntax: &LexicalSyntax) -> Result<(Edit, AppliedFix), FixError> {
        let rule_id = fix.rule_id().to_string();
        let Some(spec) = fix.rule.fix() else {
            return Err(FixError::InvalidEdit {
                span: fix.span,
                reason: "rule has no fix template",
            });
        };

        let text = self.document.text();
        let replacement = spec
            .template()
            .render(|name| {
                fix.captures
                    .get(name)
                    .and_then(|span| text.get(span.start..span.end))
            })
            .map_err(|source| FixError::Template {
                rule_id: rule_id.clone(),
                source,
            })?;

        let region = self.touched_lines(fix.span);
        let Some(before) = text.get(region.clone()) else {
            return Err(FixError::InvalidEdit {
                span: fix.span,
                reason: "span outside the buffer",
            });
        };
        let local = (fix.span.start - region.start)..(fix.span.end - region.start);
        let mut after = before.to_string();
        after.replace_range(local, &replacement);

        let old = DelimiterBalance::measure(before, syntax);
        let new = DelimiterBalance::measure(&after, syntax);
        if old != new {
            return Err(FixError::VerificationFailed {
                rule_id,
                line: fix.line,
                reason: describe_imbalance(old, new),
            });
        }

        let applied = AppliedFix {
            rule_id,
            line: fix.line,
            description: spec.description().to_string(),
            before: before.to_string(),
            after,
        };
        Ok((
            Edit {
                span: fix.span,
                replacement,
            },
            applied,
        ))
    }

    /// `line`, or the nearest line above it whose start no planned edit spans.
    fn annotation_line(&self, mut line: usize) -> usize {
        let index = self.document.line_index();
        loop {
            let start = index.line_start(line);
            match self
                .edits
                .iter()
                .find(|e| e.span.start < start && start < e.span.end)
            {
                Some(edit) => line = index.line_of(edit.span.start),
                None => return line,
            }
        }
    }

    fn annotation(&self, line: usize, description: &str, syntax: &LexicalSyntax) -> Edit {
        let start = self.document.line_index().line_start(line);
        let text = self.document.line_text(line);
        let indent = &text[..text.len() - text.trim_start().len()];
        Edit {
            span: Span::new(start, start),
            replacement: format!(
                "{indent}{} {ANNOTATION_MARKER} {description}\n",
                syntax.line_comment()
            ),
        }
    }

    /// Composes the planned edits and replaces the document's buffer.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::InvalidEdit`] if an edit is out of bounds, splits
    /// a character or overlaps another edit; the pass is then `Aborted` and
    /// the buffer untouched. Returns [`FixError::InvalidTransition`] unless
    /// the pass is `Planning`.
    pub fn apply(mut self) -> Result<PassOutcome, FixError> {
        self.transition(FixState::Applying)?;

        if let Err(e) = self.validate() {
            self.transition(FixState::Aborted)?;
            warn!(path = %self.document.path().display(), error = %e, "fix pass aborted");
            return Err(e);
        }

        if !self.edits.is_empty() {
            let mut text = self.document.text().to_string();
            let original = text.len();
            let expected = self.edits.iter().fold(original as i64, |len, e| {
                len + e.replacement.len() as i64 - e.span.len() as i64
            });

            self.edits
                .sort_by(|a, b| b.span.start.cmp(&a.span.start).then(b.span.end.cmp(&a.span.end)));
            for edit in &self.edits {
                text.replace_range(edit.span.start..edit.span.end, &edit.replacement);
            }

            if text.len() as i64 != expected {
                self.transition(FixState::Aborted)?;
                return Err(FixError::InvalidEdit {
                    span: Span::new(0, original),
                    reason: "composed length does not match the planned edits",
                });
            }
            self.document.replace_text(text);
        }

        self.transition(FixState::Applied)?;
        debug!(
            path = %self.document.path().display(),
            applied = self.outcome.applied.len(),
            revision = self.document.revision(),
            "fix pass applied"
        );
        Ok(self.outcome)
    }

    fn validate(&mut self) -> Result<(), FixError> {
        let text = self.document.text();
        for edit in &self.edits {
            if edit.span.end > text.len() {
                return Err(FixError::InvalidEdit {
                    span: edit.span,
                    reason: "span outside the buffer",
                });
            }
            if !text.is_char_boundary(edit.span.start) || !text.is_char_boundary(edit.span.end) {
                return Err(FixError::InvalidEdit {
                    span: edit.span,
                    reason: "span splits a character",
                });
            }
        }

        self.edits
            .sort_by(|a, b| a.span.start.cmp(&b.span.start).then(a.span.end.cmp(&b.span.end)));
        for (i, a) in self.edits.iter().enumerate() {
            if let Some(b) = self.edits[i + 1..].iter().find(|b| a.span.overlaps(b.span)) {
                return Err(FixError::InvalidEdit {
                    span: b.span,
                    reason: "edits overlap",
                });
            }
        }
        Ok(())
    }
}

fn describe_imbalance(old: DelimiterBalance, new: DelimiterBalance) -> String {
    let mut changes = Vec::new();
    for (name, before, after) in [
        ("parentheses", old.parens, new.parens),
        ("brackets", old.brackets, new.brackets),
        ("braces", old.braces, new.braces),
    ] {
        if before != after {
            changes.push(format!("{name} balance {before} -> {after}"));
        }
    }
    if old.unterminated != new.unterminated {
        changes.push("unterminated literal or comment".to_string());
    }
    changes.join(", ")
}
