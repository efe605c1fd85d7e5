//! Turns raw matches into ordered, fingerprinted diagnostics.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::catalog::model::RuleDefinition;
use crate::document::SourceDocument;
use crate::matcher::{Captures, Match};
use crate::types::{Diagnostic, Span};

/// A match whose rule carries a fix template.
#[derive(Debug, Clone)]
pub struct FixCandidate {
    /// Originating rule.
    pub rule: Arc<RuleDefinition>,
    /// Span in the buffer the candidate was collected from.
    pub span: Span,
    /// Captures available to the template.
    pub captures: Captures,
    /// Fingerprint of the matching diagnostic.
    pub fingerprint: String,
    /// 1-indexed line of the span start.
    pub line: usize,
}

impl FixCandidate {
    /// Id of the originating rule.
    #[must_use]
    pub fn rule_id(&self) -> &str {
        self.rule.id().as_str()
    }
}

/// Diagnostics of one document plus the fixes selected for the next pass.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    /// Diagnostics in report order.
    pub diagnostics: Vec<Diagnostic>,
    /// Non-overlapping fix candidates, ordered by start offset.
    pub fixes: Vec<FixCandidate>,
    /// Fixable candidates left out because they overlap a selected fix.
    pub deferred: Vec<FixCandidate>,
}

impl Collected {
    /// Returns true if no fix is selected.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.fixes.is_empty()
    }
}

/// Orders candidates by (precedence desc, span length asc, rule id asc,
/// start asc) and keeps each one that overlaps no earlier selection.
///
/// Returns `(selected, deferred)`; the selection is sorted by start offset.
#[must_use]
pub fn select_fixes(mut candidates: Vec<FixCandidate>) -> (Vec<FixCandidate>, Vec<FixCandidate>) {
    candidates.sort_by(|a, b| {
        b.rule
            .precedence()
            .cmp(&a.rule.precedence())
            .then(a.span.len().cmp(&b.span.len()))
            .then_with(|| a.rule_id().cmp(b.rule_id()))
            .then(a.span.start.cmp(&b.span.start))
            .then(a.span.end.cmp(&b.span.end))
    });

    let mut selected: Vec<FixCandidate> = Vec::new();
    let mut deferred = Vec::new();
    for candidate in candidates {
        if selected.iter().any(|s| s.span.overlaps(candidate.span)) {
            deferred.push(candidate);
        } else {
            selected.push(candidate);
        }
    }
    selected.sort_by_key(|c| (c.span.start, c.span.end));
    (selected, deferred)
}

/// Collects the matches of one document.
///
/// Matches sharing `(rule id, span)` collapse into the most confident one.
/// Candidates whose fingerprint is in `rejected` are never selected for a
/// fix and their diagnostics stay unfixable.
#[must_use]
pub fn collect(document: &SourceDocument, matches: Vec<Match>, rejected: &HashSet<String>) -> Collected {
    let mut unique: BTreeMap<(String, usize, usize), Match> = BTreeMap::new();
    for m in matches {
        let key = (m.rule_id().to_string(), m.span.start, m.span.end);
        match unique.get(&key) {
            Some(existing) if existing.confidence.value() >= m.confidence.value() => {}
            _ => {
                unique.insert(key, m);
            }
        }
    }

    let mut ordered: Vec<Match> = unique.into_values().collect();
    ordered.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then_with(|| a.rule_id().cmp(b.rule_id()))
            .then(a.span.end.cmp(&b.span.end))
    });

    let mut occurrences: HashMap<(String, String), usize> = HashMap::new();
    let mut diagnostics = Vec::with_capacity(ordered.len());
    let mut candidates = Vec::new();

    for m in ordered {
        let snippet = document.slice(m.span).to_string();
        let occurrence = occurrences
            .entry((m.rule_id().to_string(), snippet.clone()))
            .or_insert(0);
        let fingerprint = fingerprint(document, m.rule_id(), &snippet, *occurrence);
        *occurrence += 1;

        let start = document.position(m.span.start);
        let end = document.position(m.span.end);
        let rule = &m.rule;

        if rule.is_fixable() && !rejected.contains(&fingerprint) {
            candidates.push(FixCandidate {
                rule: Arc::clone(rule),
                span: m.span,
                captures: m.captures.clone(),
                fingerprint: fingerprint.clone(),
                line: start.line,
            });
        }

        diagnostics.push(Diagnostic {
            rule_id: rule.id().as_str().to_string(),
            rule_name: rule.name().to_string(),
            language: document.language(),
            file: document.path().to_path_buf(),
            line: start.line,
            column: start.column,
            end_line: end.line,
            end_column: end.column,
            offset: m.span.start,
            length: m.span.len(),
            severity: rule.severity(),
            message: rule.message().to_string(),
            snippet,
            confidence: m.confidence.value(),
            fixable: false,
            fingerprint,
        });
    }

    let (fixes, deferred) = select_fixes(candidates);
    let selected: HashSet<&str> = fixes.iter().map(|f| f.fingerprint.as_str()).collect();
    for diagnostic in &mut diagnostics {
        diagnostic.fixable = selected.contains(diagnostic.fingerprint.as_str());
    }
    diagnostics.sort_by(Diagnostic::report_order);

    Collected {
        diagnostics,
        fixes,
        deferred,
    }
}

fn fingerprint(document: &SourceDocument, rule_id: &str, snippet: &str, occurrence: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.language().id().as_bytes());
    hasher.update([0]);
    hasher.update(rule_id.as_bytes());
    hasher.update([0]);
    hasher.update(snippet.as_bytes());
    hasher.update([0]);
    hasher.update(occurrence.to_le_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_rules;
    use crate::catalog::model::Confidence;
    use crate::language::Language;

    const RULES: &str = r#"
[[rule]]
id = "PHP002"
name = "loose-null-comparison"
language = "php"
message = "Use strict comparison"
match = { regex = '(?P<target>==)\s*(?P<rhs>null|false)\b' }
fix = { template = "===" }

[[rule]]
id = "PHP099"
name = "wide"
language = "php"
message = "Wide rewrite"
match = { regex = '\$value\s*==\s*null' }
fix = { template = "is_null($$value)" }

[[rule]]
id = "PHP003"
name = "deprecated-mysql-api"
language = "php"
severity = "error"
message = "mysql_* is removed"
match = { regex = '\bmysql_connect\s*\(' }
"#;

    fn rule(id: &str) -> Arc<RuleDefinition> {
        parse_rules(RULES)
            .unwrap()
            .into_iter()
            .find(|r| r.id().as_str() == id)
            .map(Arc::new)
            .unwrap()
    }

    fn found(rule: &Arc<RuleDefinition>, start: usize, end: usize, confidence: f32) -> Match {
        let span = Span::new(start, end);
        let mut captures = Captures::new();
        captures.insert("0", span);
        Match {
            rule: Arc::clone(rule),
            span,
            captures,
            confidence: Confidence::new(confidence).unwrap(),
        }
    }

    fn doc(text: &str) -> SourceDocument {
        SourceDocument::new("a.php", Language::Php, text)
    }

    #[test]
    fn duplicates_keep_the_most_confident() {
        let d = doc("if ($value == null) {}");
        let r = rule("PHP002");
        let collected = collect(
            &d,
            vec![found(&r, 11, 13, 0.6), found(&r, 11, 13, 0.9)],
            &HashSet::new(),
        );
        assert_eq!(collected.diagnostics.len(), 1);
        assert!((collected.diagnostics[0].confidence - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn positions_are_one_based_and_end_exclusive() {
        let d = doc("<?php\n$conn = mysql_connect(\"h\");\n");
        let r = rule("PHP003");
        let collected = collect(&d, vec![found(&r, 14, 28, 1.0)], &HashSet::new());
        let diag = &collected.diagnostics[0];
        assert_eq!((diag.line, diag.column), (2, 9));
        assert_eq!((diag.end_line, diag.end_column), (2, 23));
        assert_eq!(diag.snippet, "mysql_connect(");
        assert!(!diag.fixable);
    }

    #[test]
    fn overlapping_fixes_prefer_the_smaller_span() {
        let d = doc("if ($value == null) {}");
        let narrow = rule("PHP002");
        let wide = rule("PHP099");
        let collected = collect(
            &d,
            vec![found(&wide, 4, 18, 1.0), found(&narrow, 11, 13, 1.0)],
            &HashSet::new(),
        );
        assert_eq!(collected.fixes.len(), 1);
        assert_eq!(collected.fixes[0].rule_id(), "PHP002");
        assert_eq!(collected.deferred.len(), 1);
        let fixable: Vec<_> = collected
            .diagnostics
            .iter()
            .map(|d| (d.rule_id.as_str(), d.fixable))
            .collect();
        assert_eq!(fixable, [("PHP099", false), ("PHP002", true)]);
    }

    #[test]
    fn rejected_fingerprints_are_not_selected() {
        let d = doc("if ($value == null) {}");
        let r = rule("PHP002");
        let first = collect(&d, vec![found(&r, 11, 13, 1.0)], &HashSet::new());
        let rejected: HashSet<String> = [first.diagnostics[0].fingerprint.clone()].into();
        let second = collect(&d, vec![found(&r, 11, 13, 1.0)], &rejected);
        assert!(second.fixes.is_empty());
        assert!(!second.diagnostics[0].fixable);
    }

    #[test]
    fn fingerprints_survive_inserted_lines() {
        let r = rule("PHP003");
        let before = doc("mysql_connect(1);\n");
        let after = doc("// new header\n\nmysql_connect(1);\n");
        let a = collect(&before, vec![found(&r, 0, 14, 1.0)], &HashSet::new());
        let b = collect(&after, vec![found(&r, 15, 29, 1.0)], &HashSet::new());
        assert_eq!(a.diagnostics[0].fingerprint, b.diagnostics[0].fingerprint);
    }

    #[test]
    fn repeated_snippets_get_distinct_fingerprints() {
        let r = rule("PHP003");
        let d = doc("mysql_connect(1);\nmysql_connect(1);\n");
        let collected = collect(
            &d,
            vec![found(&r, 18, 32, 1.0), found(&r, 0, 14, 1.0)],
            &HashSet::new(),
        );
        assert_eq!(collected.diagnostics.len(), 2);
        assert_eq!(collected.diagnostics[0].line, 1);
        assert_ne!(
            collected.diagnostics[0].fingerprint,
            collected.diagnostics[1].fingerprint
        );
    }

    #[test]
    fn zero_width_insert_touching_a_span_is_compatible() {
        let r = rule("PHP002");
        let (selected, deferred) = select_fixes(vec![
            FixCandidate {
                rule: Arc::clone(&r),
                span: Span::new(2, 4),
                captures: Captures::new(),
                fingerprint: "a".into(),
                line: 1,
            },
            FixCandidate {
                rule: Arc::clone(&r),
                span: Span::new(2, 2),
                captures: Captures::new(),
                fingerprint: "b".into(),
                line: 1,
            },
        ]);
        assert_eq!(selected.len(), 2);
        assert!(deferred.is_empty());
    }
}
