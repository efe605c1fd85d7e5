//! Pure domain model for catalog rules.
//!
//! This module contains no serde and no I/O. Every invariant is enforced at
//! construction time through validated newtypes.

use std::collections::BTreeSet;
use std::fmt;

use crate::language::Language;
use crate::types::Severity;

use super::template::{FixTemplate, TemplateError};

// ────────────────────────────────────────────
// Newtypes with validation
// ────────────────────────────────────────────

/// A validated rule id (`[A-Z][A-Z0-9_]*`, e.g. `PHP002`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(String);

impl RuleId {
    /// Creates a new rule id.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or not `[A-Z][A-Z0-9_]*`.
    pub fn new(id: &str) -> Result<Self, ModelError> {
        let mut chars = id.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_uppercase())
            && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(ModelError::InvalidRuleId { id: id.to_string() });
        }
        Ok(Self(id.to_string()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A probability in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Confidence(f32);

impl Confidence {
    /// Certain match.
    pub const CERTAIN: Self = Self(1.0);

    /// Creates a confidence value.
    ///
    /// # Errors
    ///
    /// Returns error if `value` is not a number in `[0, 1]`.
    pub fn new(value: f32) -> Result<Self, ModelError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ModelError::ConfidenceOutOfRange { value });
        }
        Ok(Self(value))
    }

    /// Returns the raw value.
    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }

    /// Multiplies by `factor`, clamped to `[0, 1]`.
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        Self((self.0 * factor).clamp(0.0, 1.0))
    }
}

/// Where the anchor of a match must lie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchScope {
    /// Outside comments and literals.
    #[default]
    Code,
    /// Inside a comment.
    Comment,
    /// In code, or inside a literal whose variables expand (`"$HOME"`).
    Interpolation,
    /// Anywhere.
    Any,
}

/// A compiled regular expression that never matches the empty string.
#[derive(Debug, Clone)]
pub struct RegexPattern {
    regex: regex::Regex,
}

impl RegexPattern {
    /// Compiles a pattern.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is invalid or matches the empty string.
    pub fn new(pattern: &str) -> Result<Self, ModelError> {
        let regex = regex::Regex::new(pattern).map_err(|e| ModelError::InvalidRegex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        if regex.is_match("") {
            return Err(ModelError::EmptyMatchRegex {
                pattern: pattern.to_string(),
            });
        }
        Ok(Self { regex })
    }

    /// The compiled regex.
    #[must_use]
    pub fn regex(&self) -> &regex::Regex {
        &self.regex
    }

    /// The pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Named capture groups of the pattern.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.regex.capture_names().flatten()
    }

    /// Returns true if the pattern has a group called `name`.
    #[must_use]
    pub fn has_capture(&self, name: &str) -> bool {
        self.capture_names().any(|n| n == name)
    }
}

impl PartialEq for RegexPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for RegexPattern {}

/// Placeholder a [`UsageTemplate`] substitutes with the bound name.
pub const NAME_PLACEHOLDER: &str = "${name}";

/// A regular expression written around a bound name, e.g.
/// `\b${name}\s*\.`. The name is escaped before substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageTemplate(String);

impl UsageTemplate {
    /// Validates a template by compiling it for a sample name.
    ///
    /// # Errors
    ///
    /// Returns error if `${name}` is missing or the expanded pattern is not
    /// a valid, non-empty regex.
    pub fn new(template: &str) -> Result<Self, ModelError> {
        if !template.contains(NAME_PLACEHOLDER) {
            return Err(ModelError::MissingNamePlaceholder {
                template: template.to_string(),
            });
        }
        RegexPattern::new(&template.replace(NAME_PLACEHOLDER, "sample_name"))?;
        Ok(Self(template.to_string()))
    }

    /// The template as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compiles the template for `name`.
    #[must_use]
    pub fn compile(&self, name: &str) -> Option<regex::Regex> {
        regex::Regex::new(&self.0.replace(NAME_PLACEHOLDER, &regex::escape(name))).ok()
    }
}

// ────────────────────────────────────────────
// Match description
// ────────────────────────────────────────────

/// A named structural predicate evaluated over a block model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Structure {
    /// A block whose header holds a keyword and whose body has no code.
    EmptyBlock {
        /// Header keywords, e.g. `catch`.
        keywords: Vec<String>,
    },
    /// An acquisition with no release later in the same block.
    UnreleasedResource {
        /// Acquisition tokens, e.g. `open(`.
        acquire: Vec<String>,
        /// Release tokens, e.g. `.close(`.
        release: Vec<String>,
        /// Tokens that make the acquisition safe, e.g. `with `.
        guards: Vec<String>,
    },
    /// A call whose arguments concatenate or interpolate strings.
    CallWithConcatenation {
        /// Callee tokens, e.g. `query`.
        callees: Vec<String>,
    },
    /// A statement inside a block with a given header.
    NestedIn {
        /// Statement keywords, e.g. `defer`.
        statements: Vec<String>,
        /// Enclosing header keywords, e.g. `for`.
        enclosing: Vec<String>,
        /// Header keywords that stop the search outwards, e.g. `func`.
        stop_at: Vec<String>,
    },
    /// A block that is longer than allowed.
    LongBlock {
        /// Opener keywords, e.g. `def`.
        openers: Vec<String>,
        /// Maximum number of body lines.
        max_lines: usize,
    },
    /// A declared name that no usage pattern finds again.
    UnusedBinding {
        /// Declaration pattern with a `name` group, or a `list` group the
        /// item pattern splits.
        declaration: RegexPattern,
        /// Pattern with a `name` group, run over each declared list.
        item: Option<RegexPattern>,
        /// Patterns that count as a use.
        usages: Vec<UsageTemplate>,
        /// Only look after the declaration, within its enclosing block.
        after_declaration: bool,
    },
    /// A use of a name before any guard, within the declaring block.
    UnguardedUse {
        /// Declaration pattern with a `name` group.
        declaration: RegexPattern,
        /// The risky use.
        usage: UsageTemplate,
        /// Checks or reassignments that make later uses safe.
        guards: Vec<UsageTemplate>,
    },
    /// A name that repeats an earlier one at the same column of the same
    /// block, such as a duplicated mapping key.
    RepeatedName {
        /// Pattern with a `name` group.
        pattern: RegexPattern,
    },
}

impl Structure {
    /// Predicate name as written in catalogs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyBlock { .. } => "empty-block",
            Self::UnreleasedResource { .. } => "unreleased-resource",
            Self::CallWithConcatenation { .. } => "call-with-concatenation",
            Self::NestedIn { .. } => "nested-in",
            Self::LongBlock { .. } => "long-block",
            Self::UnusedBinding { .. } => "unused-binding",
            Self::UnguardedUse { .. } => "unguarded-use",
            Self::RepeatedName { .. } => "repeated-name",
        }
    }

    /// Captures every match of this predicate provides.
    #[must_use]
    pub fn capture_names(&self) -> &'static [&'static str] {
        match self {
            Self::EmptyBlock { .. } => &["keyword", "body"],
            Self::UnreleasedResource { .. } => &["resource"],
            Self::CallWithConcatenation { .. } => &["callee", "args"],
            Self::NestedIn { .. } => &["statement"],
            Self::LongBlock { .. } => &["opener"],
            Self::UnusedBinding { .. } => &["name", "declaration"],
            Self::UnguardedUse { .. } => &["name", "use"],
            Self::RepeatedName { .. } => &["name", "first"],
        }
    }
}

/// What a rule looks for.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Every occurrence of the exact text.
    Literal(String),
    /// Any of several regular expressions.
    Regex(Vec<RegexPattern>),
    /// A structural predicate.
    Structure(Structure),
}

/// Capture naming the reported span.
pub const SPAN_CAPTURE: &str = "0";
/// Regex group that narrows the reported span.
pub const TARGET_CAPTURE: &str = "target";
/// Regex group whose start is checked against the code mask.
pub const ANCHOR_CAPTURE: &str = "anchor";

impl Pattern {
    /// Captures guaranteed to be present on every match of this pattern.
    #[must_use]
    pub fn capture_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::from([SPAN_CAPTURE.to_string()]);
        match self {
            Self::Literal(_) => {}
            Self::Regex(patterns) => {
                names.insert(TARGET_CAPTURE.to_string());
                let mut common: Option<BTreeSet<String>> = None;
                for pattern in patterns {
                    let own: BTreeSet<String> =
                        pattern.capture_names().map(str::to_string).collect();
                    common = Some(match common {
                        Some(prev) => prev.intersection(&own).cloned().collect(),
                        None => own,
                    });
                }
                names.extend(common.unwrap_or_default());
            }
            Self::Structure(structure) => {
                names.extend(structure.capture_names().iter().map(|s| (*s).to_string()));
            }
        }
        names
    }
}

/// A following-lines exclusion: suppress if any text appears within the
/// next `within` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowingLines {
    /// Number of lines after the match line to inspect.
    pub within: usize,
    /// Texts that suppress the match.
    pub text: Vec<String>,
}

/// Textual exclusion predicates evaluated after a pattern matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    /// Suppress if the match line contains any of these.
    pub line_contains: Vec<String>,
    /// Suppress if the whole matched text contains any of these.
    pub match_contains: Vec<String>,
    /// Suppress if the nearest non-blank line above contains any of these.
    pub previous_line_contains: Vec<String>,
    /// Suppress if the file contains any of these.
    pub file_contains: Vec<String>,
    /// Suppress if one of the following lines contains any text.
    pub following_lines: Option<FollowingLines>,
}

impl Exclusions {
    /// Returns true if no exclusion is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line_contains.is_empty()
            && self.match_contains.is_empty()
            && self.previous_line_contains.is_empty()
            && self.file_contains.is_empty()
            && self.following_lines.is_none()
    }
}

/// A pattern plus its filtering parameters.
#[derive(Debug, Clone)]
pub struct MatchSpec {
    pattern: Pattern,
    confidence: Confidence,
    threshold: Confidence,
    scope: MatchScope,
    exclusions: Exclusions,
    equal_captures: Vec<String>,
}

impl MatchSpec {
    /// Creates a match spec with certain confidence, code scope and no
    /// exclusions.
    #[must_use]
    pub fn new(pattern: Pattern) -> Self {
        Self {
            pattern,
            confidence: Confidence::CERTAIN,
            threshold: Confidence::CERTAIN,
            scope: MatchScope::Code,
            exclusions: Exclusions::default(),
            equal_captures: Vec::new(),
        }
    }

    /// Sets the confidence reported by matches.
    #[must_use]
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    /// Sets the threshold below which matches are dropped.
    #[must_use]
    pub fn with_threshold(mut self, threshold: Confidence) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the anchor scope.
    #[must_use]
    pub fn with_scope(mut self, scope: MatchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets the exclusion predicates.
    #[must_use]
    pub fn with_exclusions(mut self, exclusions: Exclusions) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Requires the named captures to match the same text.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern cannot provide one of the captures.
    pub fn with_equal_captures(mut self, names: Vec<String>) -> Result<Self, ModelError> {
        let available = self.pattern.capture_names();
        if let Some(name) = names.iter().find(|n| !available.contains(n.as_str())) {
            return Err(ModelError::UnknownCapture {
                name: name.clone(),
                available: available.into_iter().collect::<Vec<_>>().join(", "),
            });
        }
        self.equal_captures = names;
        Ok(self)
    }

    /// The pattern.
    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Base confidence.
    #[must_use]
    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Drop threshold.
    #[must_use]
    pub fn threshold(&self) -> Confidence {
        self.threshold
    }

    /// Anchor scope.
    #[must_use]
    pub fn scope(&self) -> MatchScope {
        self.scope
    }

    /// Exclusion predicates.
    #[must_use]
    pub fn exclusions(&self) -> &Exclusions {
        &self.exclusions
    }

    /// Captures that must match the same text.
    #[must_use]
    pub fn equal_captures(&self) -> &[String] {
        &self.equal_captures
    }
}

/// A rewrite for a rule's matches.
#[derive(Debug, Clone)]
pub struct FixSpec {
    template: FixTemplate,
    description: String,
}

impl FixSpec {
    /// Creates a fix spec.
    #[must_use]
    pub fn new(template: FixTemplate, description: impl Into<String>) -> Self {
        Self {
            template,
            description: description.into(),
        }
    }

    /// The replacement template.
    #[must_use]
    pub fn template(&self) -> &FixTemplate {
        &self.template
    }

    /// Short description, used in fix annotations and reports.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

// ────────────────────────────────────────────
// Rule definition (aggregate root)
// ────────────────────────────────────────────

/// An immutable, language-scoped rule.
///
/// Identity is the `(language, id)` pair.
#[derive(Debug, Clone)]
pub struct RuleDefinition {
    id: RuleId,
    name: String,
    language: Language,
    severity: Severity,
    message: String,
    precedence: i32,
    match_spec: MatchSpec,
    fix: Option<FixSpec>,
}

impl RuleDefinition {
    /// Creates a rule without a fix.
    ///
    /// # Errors
    ///
    /// Returns error if `name` or `message` is empty.
    pub fn new(
        id: RuleId,
        name: impl Into<String>,
        language: Language,
        severity: Severity,
        message: impl Into<String>,
        match_spec: MatchSpec,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        let message = message.into();
        if name.trim().is_empty() {
            return Err(ModelError::EmptyName);
        }
        if message.trim().is_empty() {
            return Err(ModelError::EmptyMessage);
        }
        Ok(Self {
            id,
            name,
            language,
            severity,
            message,
            precedence: 0,
            match_spec,
            fix: None,
        })
    }

    /// Sets the fix precedence. Higher wins.
    #[must_use]
    pub fn with_precedence(mut self, precedence: i32) -> Self {
        self.precedence = precedence;
        self
    }

    /// Attaches a fix.
    ///
    /// # Errors
    ///
    /// Returns error if the template references a capture the pattern
    /// cannot provide.
    pub fn with_fix(mut self, fix: FixSpec) -> Result<Self, ModelError> {
        let available = self.match_spec.pattern().capture_names();
        if let Some(name) = fix
            .template()
            .placeholders()
            .into_iter()
            .find(|name| !available.contains(*name))
        {
            return Err(ModelError::UnknownPlaceholder {
                name: name.to_string(),
                available: available.into_iter().collect::<Vec<_>>().join(", "),
            });
        }
        self.fix = Some(fix);
        Ok(self)
    }

    /// Overrides the severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Overrides the drop threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: Confidence) -> Self {
        self.match_spec = self.match_spec.with_threshold(threshold);
        self
    }

    /// Rule id.
    #[must_use]
    pub fn id(&self) -> &RuleId {
        &self.id
    }

    /// Kebab-case rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Language the rule applies to.
    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    /// Severity.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Diagnostic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Fix precedence.
    #[must_use]
    pub fn precedence(&self) -> i32 {
        self.precedence
    }

    /// Match description.
    #[must_use]
    pub fn match_spec(&self) -> &MatchSpec {
        &self.match_spec
    }

    /// Optional fix.
    #[must_use]
    pub fn fix(&self) -> Option<&FixSpec> {
        self.fix.as_ref()
    }

    /// Returns true if the rule carries a fix.
    #[must_use]
    pub fn is_fixable(&self) -> bool {
        self.fix.is_some()
    }
}

// ────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────

/// Validation errors of the domain model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Rule id is not `[A-Z][A-Z0-9_]*`.
    #[error("invalid rule id `{id}`: must be [A-Z][A-Z0-9_]*")]
    InvalidRuleId {
        /// The invalid id.
        id: String,
    },

    /// Rule name is empty.
    #[error("rule name must not be empty")]
    EmptyName,

    /// Rule message is empty.
    #[error("rule message must not be empty")]
    EmptyMessage,

    /// Confidence or threshold outside `[0, 1]`.
    #[error("confidence {value} is outside [0, 1]")]
    ConfidenceOutOfRange {
        /// The invalid value.
        value: f32,
    },

    /// A literal or regex list is empty.
    #[error("pattern must not be empty")]
    EmptyPattern,

    /// Regex failed to compile.
    #[error("invalid regex `{pattern}`: {reason}")]
    InvalidRegex {
        /// The pattern source.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// Regex matches the empty string.
    #[error("regex `{pattern}` matches the empty string")]
    EmptyMatchRegex {
        /// The pattern source.
        pattern: String,
    },

    /// A structural parameter list is empty.
    #[error("`{parameter}` must list at least one token")]
    EmptyParameterList {
        /// Parameter name.
        parameter: &'static str,
    },

    /// A numeric structural parameter is zero.
    #[error("`{parameter}` must be greater than zero")]
    ZeroParameter {
        /// Parameter name.
        parameter: &'static str,
    },

    /// A structural pattern lacks a required group.
    #[error("pattern `{pattern}` must define a `{group}` group")]
    MissingGroup {
        /// The pattern source.
        pattern: String,
        /// Required group name.
        group: &'static str,
    },

    /// A usage template does not mention `${name}`.
    #[error("usage pattern `{template}` must contain ${{name}}")]
    MissingNamePlaceholder {
        /// The template.
        template: String,
    },

    /// `equal-captures` names a capture the pattern cannot provide.
    #[error("equal-captures references `{name}`; available captures: {available}")]
    UnknownCapture {
        /// Capture name.
        name: String,
        /// Comma-separated capture names.
        available: String,
    },

    /// The fix template is malformed.
    #[error("invalid fix template: {0}")]
    Template(#[from] TemplateError),

    /// The fix template references an unavailable capture.
    #[error("fix template references `{name}`; available captures: {available}")]
    UnknownPlaceholder {
        /// Placeholder name.
        name: String,
        /// Comma-separated capture names.
        available: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regex_spec(patterns: &[&str]) -> MatchSpec {
        MatchSpec::new(Pattern::Regex(
            patterns.iter().map(|p| RegexPattern::new(p).unwrap()).collect(),
        ))
    }

    fn rule(spec: MatchSpec) -> RuleDefinition {
        RuleDefinition::new(
            RuleId::new("JS002").unwrap(),
            "loose-equality",
            Language::JavaScript,
            Severity::Warning,
            "Use strict equality",
            spec,
        )
        .unwrap()
    }

    #[test]
    fn rule_id_validation() {
        assert!(RuleId::new("PHP002").is_ok());
        assert!(RuleId::new("MY_RULE_1").is_ok());
        assert!(RuleId::new("php002").is_err());
        assert!(RuleId::new("2PHP").is_err());
        assert!(RuleId::new("").is_err());
    }

    #[test]
    fn confidence_range() {
        assert!(Confidence::new(0.0).is_ok());
        assert!(Confidence::new(1.0).is_ok());
        assert!(Confidence::new(1.5).is_err());
        assert!(Confidence::new(f32::NAN).is_err());
        assert!((Confidence::CERTAIN.scaled(0.5).value() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn regex_rejects_empty_matches() {
        assert!(matches!(
            RegexPattern::new("x*"),
            Err(ModelError::EmptyMatchRegex { .. })
        ));
        assert!(matches!(
            RegexPattern::new("(unclosed"),
            Err(ModelError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn regex_captures_are_intersected() {
        let spec = regex_spec(&["(?P<target>(?P<op>==))[^=]", "(?P<target>(?P<op>!=))(?P<x>[^=])"]);
        let names = spec.pattern().capture_names();
        assert!(names.contains("op"));
        assert!(names.contains("target"));
        assert!(names.contains("0"));
        assert!(!names.contains("x"));
    }

    #[test]
    fn fix_placeholders_are_validated() {
        let spec = regex_spec(&["(?P<target>(?P<op>==))[^=]"]);
        let ok = rule(spec.clone()).with_fix(FixSpec::new(
            FixTemplate::parse("${op}=").unwrap(),
            "use strict equality",
        ));
        assert!(ok.is_ok_and(|r| r.is_fixable()));

        let bad = rule(spec).with_fix(FixSpec::new(
            FixTemplate::parse("${rhs}").unwrap(),
            "broken",
        ));
        assert!(matches!(bad, Err(ModelError::UnknownPlaceholder { name, .. }) if name == "rhs"));
    }

    #[test]
    fn usage_templates_escape_the_name() {
        let usage = UsageTemplate::new(r"\b${name}\s*\.").unwrap();
        let regex = usage.compile("a.b").unwrap();
        assert!(regex.is_match("a.b .len()"));
        assert!(!regex.is_match("axb.len()"));
        assert!(matches!(
            UsageTemplate::new(r"\bfoo\b"),
            Err(ModelError::MissingNamePlaceholder { .. })
        ));
        assert!(UsageTemplate::new("${name}(").is_err());
    }

    #[test]
    fn equal_captures_must_exist() {
        let spec = regex_spec(&[r"\|(?P<arg>\w+)\|\s*\w+\((?P<use>\w+)\)"]);
        assert!(spec
            .clone()
            .with_equal_captures(vec!["arg".to_string(), "use".to_string()])
            .is_ok_and(|s| s.equal_captures().len() == 2));
        assert!(matches!(
            spec.with_equal_captures(vec!["callee".to_string()]),
            Err(ModelError::UnknownCapture { name, .. }) if name == "callee"
        ));
    }

    #[test]
    fn literal_rules_only_expose_the_span() {
        let spec = MatchSpec::new(Pattern::Literal("interface{}".to_string()));
        let names = spec.pattern().capture_names();
        assert_eq!(names.into_iter().collect::<Vec<_>>(), ["0"]);
    }

    #[test]
    fn empty_name_or_message_is_rejected() {
        let spec = || MatchSpec::new(Pattern::Literal("x".to_string()));
        let id = || RuleId::new("X1").unwrap();
        assert_eq!(
            RuleDefinition::new(id(), " ", Language::Go, Severity::Info, "m", spec()).err(),
            Some(ModelError::EmptyName)
        );
        assert_eq!(
            RuleDefinition::new(id(), "n", Language::Go, Severity::Info, "", spec()).err(),
            Some(ModelError::EmptyMessage)
        );
    }

    #[test]
    fn overrides_replace_severity_and_threshold() {
        let r = rule(regex_spec(&["=="]))
            .with_severity(Severity::Error)
            .with_threshold(Confidence::new(0.4).unwrap());
        assert_eq!(r.severity(), Severity::Error);
        assert!((r.match_spec().threshold().value() - 0.4).abs() < f32::EPSILON);
    }
}
