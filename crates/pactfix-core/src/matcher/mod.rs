//! The per-language matching capability and the generic scan.
//!
//! Every registered language has one [`Matcher`]. The trait carries the
//! language's lexical syntax, its block model and the idioms structural
//! predicates rely on; [`scan_document`] runs a rule set against a document
//! with those.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::trace;

use crate::catalog::model::{
    Confidence, MatchScope, Pattern, RegexPattern, RuleDefinition, ANCHOR_CAPTURE, SPAN_CAPTURE,
    TARGET_CAPTURE,
};
use crate::document::SourceDocument;
use crate::language::Language;
use crate::syntax::{CodeMask, LexicalSyntax, Region};
use crate::types::{Severity, Span};
use crate::utils::check_allow_with_reason;

pub mod blocks;
pub mod structural;

pub use blocks::Block;

/// Confidence factor for findings in test code.
const TEST_CODE_FACTOR: f32 = 0.5;

/// Named sub-spans of a match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures(BTreeMap<String, Span>);

impl Captures {
    /// Creates an empty capture set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a capture.
    pub fn insert(&mut self, name: impl Into<String>, span: Span) {
        self.0.insert(name.into(), span);
    }

    /// Looks a capture up.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Span> {
        self.0.get(name).copied()
    }

    /// Iterates captures by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Span)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// A single located occurrence of a rule, before deduplication.
#[derive(Debug, Clone)]
pub struct Match {
    /// Rule that matched.
    pub rule: Arc<RuleDefinition>,
    /// Reported span in the current buffer.
    pub span: Span,
    /// Named sub-spans for fix templates.
    pub captures: Captures,
    /// Confidence after every adjustment.
    pub confidence: Confidence,
}

impl Match {
    /// Id of the originating rule.
    #[must_use]
    pub fn rule_id(&self) -> &str {
        self.rule.id().as_str()
    }
}

/// A candidate produced by a pattern before filtering.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Reported span.
    pub span: Span,
    /// Whole matched text, at least as wide as `span`.
    pub extent: Span,
    /// Byte checked against the rule's scope.
    pub anchor: usize,
    /// Named sub-spans.
    pub captures: Captures,
    /// Multiplier applied to the rule's confidence.
    pub factor: f32,
}

impl Candidate {
    /// Creates a candidate anchored at the span start with factor 1.
    #[must_use]
    pub fn new(span: Span) -> Self {
        let mut captures = Captures::new();
        captures.insert(SPAN_CAPTURE, span);
        Self {
            span,
            extent: span,
            anchor: span.start,
            captures,
            factor: 1.0,
        }
    }

    /// Sets the matched text the reported span was narrowed from.
    #[must_use]
    pub fn with_extent(mut self, extent: Span) -> Self {
        self.extent = extent;
        self
    }

    /// Adds a capture.
    #[must_use]
    pub fn with_capture(mut self, name: &str, span: Span) -> Self {
        self.captures.insert(name, span);
        self
    }

    /// Sets the confidence factor.
    #[must_use]
    pub fn with_factor(mut self, factor: f32) -> Self {
        self.factor = factor;
        self
    }
}

/// Language idioms used by structural predicates.
#[derive(Debug, Clone, Copy)]
pub struct Idioms {
    /// Operators that build strings, checked in code.
    pub concatenation: &'static [&'static str],
    /// Interpolation markers, checked outside comments.
    pub interpolation: &'static [&'static str],
    /// Body lines that do not count as code.
    pub fillers: &'static [&'static str],
}

/// Everything a predicate needs about one document.
#[derive(Debug)]
pub struct ScanContext<'a> {
    document: &'a SourceDocument,
    mask: CodeMask,
    blocks: Vec<Block>,
    idioms: Idioms,
}

impl<'a> ScanContext<'a> {
    /// Lexes the document and builds its block model.
    pub fn new<M: Matcher + ?Sized>(matcher: &M, document: &'a SourceDocument) -> Self {
        let mask = CodeMask::new(document.text(), matcher.syntax());
        let blocks = matcher.blocks(mask.code_text());
        Self {
            document,
            mask,
            blocks,
            idioms: matcher.idioms(),
        }
    }

    /// The document.
    #[must_use]
    pub fn document(&self) -> &'a SourceDocument {
        self.document
    }

    /// The raw text.
    #[must_use]
    pub fn text(&self) -> &'a str {
        self.document.text()
    }

    /// The code-only view.
    #[must_use]
    pub fn code(&self) -> &str {
        self.mask.code_text()
    }

    /// The lexical mask.
    #[must_use]
    pub fn mask(&self) -> &CodeMask {
        &self.mask
    }

    /// Every block, ordered by body start.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Language idioms.
    #[must_use]
    pub fn idioms(&self) -> Idioms {
        self.idioms
    }

    /// Blocks whose body contains `offset`, innermost first.
    pub fn enclosing(&self, offset: usize) -> impl Iterator<Item = &Block> {
        self.blocks.iter().rev().filter(move |b| b.encloses(offset))
    }

    /// Code text of `span`.
    #[must_use]
    pub fn code_of(&self, span: Span) -> &str {
        self.code().get(span.start..span.end).unwrap_or_default()
    }
}

/// One matching strategy per registered language.
///
/// Implementations are pure: scanning never mutates the document and two
/// scans of the same snapshot yield the same matches.
pub trait Matcher: Send + Sync {
    /// The language this matcher scans.
    fn language(&self) -> Language;

    /// Comment and string syntax.
    fn syntax(&self) -> &'static LexicalSyntax {
        LexicalSyntax::for_language(self.language())
    }

    /// Builds the block model over the code-only view.
    fn blocks(&self, code: &str) -> Vec<Block> {
        blocks::brace_blocks(code)
    }

    /// Operators that build strings.
    fn concatenation_operators(&self) -> &'static [&'static str] {
        &["+"]
    }

    /// Markers of string interpolation.
    fn interpolation_markers(&self) -> &'static [&'static str] {
        &[]
    }

    /// Body lines that do not count as code in empty-block checks.
    fn empty_body_fillers(&self) -> &'static [&'static str] {
        &[]
    }

    /// Returns true if the path names a test file.
    fn is_test_path(&self, _path: &Path) -> bool {
        false
    }

    /// Returns true if `offset` lies in test code.
    fn in_test_code(&self, context: &ScanContext<'_>, _offset: usize) -> bool {
        self.is_test_path(context.document().path())
    }

    /// Bundles the idioms for predicates.
    fn idioms(&self) -> Idioms {
        Idioms {
            concatenation: self.concatenation_operators(),
            interpolation: self.interpolation_markers(),
            fillers: self.empty_body_fillers(),
        }
    }

    /// Scans `document` against `rules`.
    fn scan(&self, document: &SourceDocument, rules: &[Arc<RuleDefinition>]) -> Vec<Match> {
        scan_document(self, document, rules)
    }
}

/// A boxed matcher.
pub type MatcherBox = Box<dyn Matcher>;

/// Runs every rule of the document's language and returns the kept matches.
///
/// Rules of other languages are ignored. A candidate is kept when its anchor
/// lies in the rule's scope, no exclusion or allow directive applies, and its
/// confidence reaches the rule's threshold.
pub fn scan_document<M: Matcher + ?Sized>(
    matcher: &M,
    document: &SourceDocument,
    rules: &[Arc<RuleDefinition>],
) -> Vec<Match> {
    let context = ScanContext::new(matcher, document);
    let mut matches = Vec::new();

    for rule in rules {
        if rule.language() != document.language() {
            continue;
        }
        let spec = rule.match_spec();
        let exclusions = spec.exclusions();
        if exclusions
            .file_contains
            .iter()
            .any(|t| document.text().contains(t.as_str()))
        {
            continue;
        }

        let candidates = match spec.pattern() {
            Pattern::Literal(literal) => literal_candidates(document.text(), literal),
            Pattern::Regex(patterns) => regex_candidates(document.text(), patterns),
            Pattern::Structure(structure) => structural::evaluate(structure, &context),
        };

        for candidate in candidates {
            if let Some(m) = accept(matcher, &context, rule, candidate) {
                matches.push(m);
            }
        }
    }

    matches
}

fn accept<M: Matcher + ?Sized>(
    matcher: &M,
    context: &ScanContext<'_>,
    rule: &Arc<RuleDefinition>,
    candidate: Candidate,
) -> Option<Match> {
    let spec = rule.match_spec();
    let in_scope = match spec.scope() {
        MatchScope::Code => context.mask().is_code(candidate.anchor),
        MatchScope::Comment => context.mask().region_at(candidate.anchor) == Region::Comment,
        MatchScope::Interpolation => {
            context.mask().is_code(candidate.anchor)
                || context.mask().in_interpolation(candidate.anchor)
        }
        MatchScope::Any => true,
    };
    if !in_scope {
        return None;
    }
    if !captures_agree(context.text(), &candidate.captures, spec.equal_captures()) {
        return None;
    }

    let document = context.document();
    let line = document.line_index().line_of(candidate.span.start);
    if is_excluded(document, rule, line, candidate.extent) {
        return None;
    }

    let mut factor = candidate.factor;
    if rule.severity() != Severity::Security && matcher.in_test_code(context, candidate.span.start)
    {
        factor *= TEST_CODE_FACTOR;
    }
    let confidence = spec.confidence().scaled(factor);
    if confidence.value() < spec.threshold().value() {
        trace!(
            rule = rule.id().as_str(),
            confidence = confidence.value(),
            "dropped below threshold"
        );
        return None;
    }

    let allowed = check_allow_with_reason(document, context.mask(), line, rule.id().as_str());
    if allowed.is_allowed() {
        trace!(
            rule = rule.id().as_str(),
            line = line + 1,
            reason = allowed.reason().unwrap_or(""),
            "suppressed by allow directive"
        );
        return None;
    }

    Some(Match {
        rule: Arc::clone(rule),
        span: candidate.span,
        captures: candidate.captures,
        confidence,
    })
}

/// Every present capture named in `names` must cover the same text.
fn captures_agree(text: &str, captures: &Captures, names: &[String]) -> bool {
    let mut texts = names
        .iter()
        .filter_map(|n| captures.get(n))
        .map(|span| text.get(span.start..span.end).unwrap_or_default());
    match texts.next() {
        Some(first) => texts.all(|t| t == first),
        None => true,
    }
}

fn is_excluded(
    document: &SourceDocument,
    rule: &RuleDefinition,
    line: usize,
    extent: Span,
) -> bool {
    let exclusions = rule.match_spec().exclusions();
    if exclusions.is_empty() {
        return false;
    }
    let contains_any =
        |text: &str, needles: &[String]| needles.iter().any(|n| text.contains(n.as_str()));

    if contains_any(document.line_text(line), &exclusions.line_contains) {
        return true;
    }

    let matched = document.text().get(extent.start..extent.end).unwrap_or_default();
    if contains_any(matched, &exclusions.match_contains) {
        return true;
    }

    if !exclusions.previous_line_contains.is_empty() {
        let previous = (0..line)
            .rev()
            .map(|l| document.line_text(l))
            .find(|t| !t.trim().is_empty());
        if previous.is_some_and(|t| contains_any(t, &exclusions.previous_line_contains)) {
            return true;
        }
    }

    if let Some(following) = &exclusions.following_lines {
        let last = (line + following.within).min(document.line_index().line_count().saturating_sub(1));
        if (line + 1..=last).any(|l| contains_any(document.line_text(l), &following.text)) {
            return true;
        }
    }

    false
}

fn next_char_boundary(text: &str, offset: usize) -> usize {
    let mut next = offset + 1;
    while next < text.len() && !text.is_char_boundary(next) {
        next += 1;
    }
    next
}

fn literal_candidates(text: &str, literal: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let mut at = 0;
    while let Some(pos) = text.get(at..).and_then(|rest| rest.find(literal)) {
        let start = at + pos;
        candidates.push(Candidate::new(Span::new(start, start + literal.len())));
        at = next_char_boundary(text, start);
    }
    candidates
}

fn regex_candidates(text: &str, patterns: &[RegexPattern]) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for pattern in patterns {
        let regex = pattern.regex();
        let mut at = 0;
        while at <= text.len() {
            let Some(caps) = regex.captures_at(text, at) else {
                break;
            };
            let Some(whole) = caps.get(0) else {
                break;
            };

            let target = caps.name(TARGET_CAPTURE).unwrap_or(whole);
            let span = Span::new(target.start(), target.end());
            let mut candidate = Candidate::new(span)
                .with_extent(Span::new(whole.start(), whole.end()))
                .with_capture(TARGET_CAPTURE, span);
            for name in pattern.capture_names() {
                if name == TARGET_CAPTURE {
                    continue;
                }
                if let Some(group) = caps.name(name) {
                    candidate
                        .captures
                        .insert(name, Span::new(group.start(), group.end()));
                }
            }
            if let Some(anchor) = caps.name(ANCHOR_CAPTURE) {
                candidate.anchor = anchor.start();
            }
            candidates.push(candidate);

            at = next_char_boundary(text, whole.start());
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_rules;

    struct TestMatcher(Language);

    impl Matcher for TestMatcher {
        fn language(&self) -> Language {
            self.0
        }

        fn is_test_path(&self, path: &Path) -> bool {
            path.to_string_lossy().ends_with(".test.js")
        }
    }

    fn rules(toml: &str) -> Vec<Arc<RuleDefinition>> {
        parse_rules(toml).unwrap().into_iter().map(Arc::new).collect()
    }

    fn scan(language: Language, path: &str, text: &str, toml: &str) -> Vec<Match> {
        let doc = SourceDocument::new(path, language, text);
        TestMatcher(language).scan(&doc, &rules(toml))
    }

    const EVAL: &str = r#"
[[rule]]
id = "JS004"
name = "eval-usage"
language = "javascript"
severity = "security"
message = "Avoid eval"
match = { regex = '\beval\s*\(' }
"#;

    #[test]
    fn matches_in_comments_and_strings_are_suppressed() {
        let text = "// eval(x) is dangerous\nlet s = \"eval(y)\";\n";
        assert!(scan(Language::JavaScript, "a.js", text, EVAL).is_empty());
        let found = scan(Language::JavaScript, "a.js", "eval(z);\n", EVAL);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span, Span::new(0, 5));
    }

    #[test]
    fn rules_of_other_languages_are_ignored() {
        assert!(scan(Language::Php, "a.php", "eval($x);", EVAL).is_empty());
    }

    #[test]
    fn target_capture_narrows_the_span() {
        let toml = r#"
[[rule]]
id = "JS001"
name = "var-declaration"
language = "javascript"
message = "Use let"
match = { regex = '\b(?P<target>var)\s+[A-Za-z_$]' }
"#;
        let found = scan(Language::JavaScript, "a.js", "  var counter = 0;", toml);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span, Span::new(2, 5));
        assert_eq!(found[0].captures.get("0"), Some(Span::new(2, 5)));
    }

    #[test]
    fn overlapping_regex_occurrences_are_found() {
        let toml = r#"
[[rule]]
id = "T001"
name = "pair"
language = "go"
message = "pair"
match = { regex = 'aa' }
"#;
        let found = scan(Language::Go, "a.go", "aaa", toml);
        let spans: Vec<_> = found.iter().map(|m| m.span).collect();
        assert_eq!(spans, [Span::new(0, 2), Span::new(1, 3)]);
    }

    #[test]
    fn anchor_decides_the_scope() {
        let toml = r#"
[[rule]]
id = "JS008"
name = "hardcoded-secret"
language = "javascript"
severity = "security"
message = "Hardcoded secret"
match = { regex = '(?P<anchor>apiKey)\s*=\s*"[^"]+"' }
"#;
        let found = scan(Language::JavaScript, "a.js", "const apiKey = \"abc123\";", toml);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn comment_scope_requires_a_comment() {
        let toml = r#"
[[rule]]
id = "TS007"
name = "ts-ignore-without-reason"
language = "typescript"
message = "Explain the ignore"
match = { regex = '(?m)@ts-ignore[ \t]*$', scope = "comment" }
"#;
        let text = "// @ts-ignore\nconst s = \"@ts-ignore\";\n";
        let found = scan(Language::TypeScript, "a.ts", text, toml);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span.start, 3);
    }

    #[test]
    fn exclusions_suppress_matches() {
        let toml = r#"
[[rule]]
id = "GO001"
name = "unchecked-error"
language = "go"
message = "Check the error"
[rule.match]
regex = '(?m)^\s*(?P<target>\w+),\s*err\s*:?=\s*[^\n]+$'
unless-following-lines-contain = { within = 2, text = ["err != nil"] }
unless-line-contains = ["//nolint"]
"#;
        let checked = "a, err := f()\nif err != nil {\n}\n";
        assert!(scan(Language::Go, "a.go", checked, toml).is_empty());
        let unchecked = "a, err := f()\nuse(a)\n\n\nif err != nil {}\n";
        assert_eq!(scan(Language::Go, "a.go", unchecked, toml).len(), 1);
        let silenced = "a, err := f() //nolint\n";
        assert!(scan(Language::Go, "a.go", silenced, toml).is_empty());
    }

    #[test]
    fn previous_line_exclusion_skips_blank_lines() {
        let toml = r#"
[[rule]]
id = "RUST010"
name = "undocumented-unsafe"
language = "rust"
message = "Document unsafe"
match = { regex = '\bunsafe\s*\{', unless-previous-line-contains = ["SAFETY:"] }
"#;
        let text = "// SAFETY: pointer is valid\n\nunsafe { f() }\n";
        assert!(scan(Language::Rust, "a.rs", text, toml).is_empty());
        assert_eq!(scan(Language::Rust, "a.rs", "unsafe { f() }\n", toml).len(), 1);
    }

    #[test]
    fn threshold_drops_low_confidence_matches() {
        let toml = r#"
[[rule]]
id = "JS003"
name = "console-logging"
language = "javascript"
message = "Remove console logging"
match = { regex = '\bconsole\.log\s*\(' }
"#;
        assert_eq!(scan(Language::JavaScript, "app.js", "console.log(1)", toml).len(), 1);
        assert!(scan(Language::JavaScript, "app.test.js", "console.log(1)", toml).is_empty());
        // Security rules keep full confidence in tests.
        assert_eq!(scan(Language::JavaScript, "app.test.js", "eval(x)", EVAL).len(), 1);
    }

    #[test]
    fn allow_directive_suppresses() {
        let text = "// pactfix: allow(JS004) reason=\"sandboxed\"\neval(code);\n";
        assert!(scan(Language::JavaScript, "a.js", text, EVAL).is_empty());
    }

    #[test]
    fn literal_occurrences() {
        let toml = r#"
[[rule]]
id = "GO014"
name = "empty-interface"
language = "go"
severity = "info"
message = "Use any"
match = { literal = "interface{}" }
"#;
        let found = scan(Language::Go, "a.go", "func f(a interface{}, b interface{}) {}", toml);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn scan_is_deterministic() {
        let text = "eval(a); eval(b);\n";
        let first: Vec<_> = scan(Language::JavaScript, "a.js", text, EVAL)
            .into_iter()
            .map(|m| m.span)
            .collect();
        let second: Vec<_> = scan(Language::JavaScript, "a.js", text, EVAL)
            .into_iter()
            .map(|m| m.span)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn match_exclusion_reads_the_whole_match() {
        let toml = r#"
[[rule]]
id = "SQL003"
name = "unbounded-update"
language = "sql"
severity = "error"
message = "UPDATE without WHERE"
match = { regex = '(?is)\b(?P<target>update)\b[^;]*;', unless-match-contains = ["WHERE", "where"] }
"#;
        let text = "UPDATE users\nSET active = 0\nWHERE id = 1;\nUPDATE users SET active = 0;\n";
        let found = scan(Language::Sql, "a.sql", text, toml);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span.start, text.rfind("UPDATE").unwrap());
    }

    #[test]
    fn equal_captures_must_agree() {
        let toml = r#"
[[rule]]
id = "RUST013"
name = "redundant-closure"
language = "rust"
severity = "info"
message = "Pass the function directly"
match = { regex = '\|(?P<arg>\w+)\|\s*(?P<callee>[\w:]+)\((?P<use>\w+)\)', equal-captures = ["arg", "use"] }
"#;
        let text = "xs.map(|x| parse(x));\nys.map(|y| parse(z));\n";
        let found = scan(Language::Rust, "a.rs", text, toml);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span.start, text.find("|x|").unwrap());
    }

    #[test]
    fn interpolation_scope_reaches_into_expanding_strings() {
        let toml = r#"
[[rule]]
id = "BASH001"
name = "unbraced-variable"
language = "bash"
severity = "info"
message = "Brace the variable"
match = { regex = '\$(?P<name>[A-Za-z_]\w*)', scope = "interpolation" }
"#;
        let text = "echo \"$HOME\" '$USER' $PATH # $SHELL\n";
        let found = scan(Language::Bash, "a.sh", text, toml);
        let names: Vec<_> = found
            .iter()
            .map(|m| &text[m.span.start..m.span.end])
            .collect();
        assert_eq!(names, ["$HOME", "$PATH"]);
    }
}
