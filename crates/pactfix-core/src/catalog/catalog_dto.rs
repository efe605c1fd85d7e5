//! TOML deserialization types (DTO layer).
//!
//! These types exist solely for serde deserialization.
//! They are converted to domain model types via the loader.

use serde::Deserialize;

/// Raw TOML representation of a catalog document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogDto {
    /// `[[rule]]` tables.
    #[serde(rename = "rule", default)]
    pub rules: Vec<RuleDto>,
}

/// TOML representation of one rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDto {
    /// Rule id (e.g., "PHP002").
    pub id: String,
    /// Kebab-case rule name.
    pub name: String,
    /// Language id.
    pub language: String,
    /// Severity (default: "warning").
    #[serde(default = "default_severity_str")]
    pub severity: String,
    /// Diagnostic message.
    pub message: String,
    /// Fix precedence.
    #[serde(default)]
    pub precedence: i32,
    /// Match description.
    #[serde(rename = "match")]
    pub match_spec: MatchDto,
    /// Optional fix.
    #[serde(default)]
    pub fix: Option<FixDto>,
}

/// A single value or a list of values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// `regex = "…"`
    One(String),
    /// `regex = ["…", "…"]`
    Many(Vec<String>),
}

impl OneOrMany {
    /// Flattens into a list.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// TOML representation of `[rule.match]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MatchDto {
    /// Exact text.
    #[serde(default)]
    pub literal: Option<String>,
    /// One or more regular expressions.
    #[serde(default)]
    pub regex: Option<OneOrMany>,
    /// Structural predicate.
    #[serde(default)]
    pub structure: Option<StructureDto>,
    /// Base confidence (default: 1.0).
    #[serde(default)]
    pub confidence: Option<f32>,
    /// Drop threshold (default: 1.0).
    #[serde(default)]
    pub threshold: Option<f32>,
    /// Anchor scope (default: "code").
    #[serde(default)]
    pub scope: Option<String>,
    /// Line exclusions.
    #[serde(default)]
    pub unless_line_contains: Vec<String>,
    /// Exclusions checked against the whole matched text.
    #[serde(default)]
    pub unless_match_contains: Vec<String>,
    /// Previous-line exclusions.
    #[serde(default)]
    pub unless_previous_line_contains: Vec<String>,
    /// File exclusions.
    #[serde(default)]
    pub unless_file_contains: Vec<String>,
    /// Following-lines exclusion.
    #[serde(default)]
    pub unless_following_lines_contain: Option<FollowingLinesDto>,
    /// Captures that must match the same text.
    #[serde(default)]
    pub equal_captures: Vec<String>,
}

/// TOML representation of `unless-following-lines-contain`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FollowingLinesDto {
    /// Number of lines to inspect.
    pub within: usize,
    /// Suppressing texts.
    pub text: Vec<String>,
}

/// TOML representation of `structure = { kind = "…", … }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StructureDto {
    /// `kind = "empty-block"`
    EmptyBlock {
        /// Header keywords.
        keywords: Vec<String>,
    },
    /// `kind = "unreleased-resource"`
    UnreleasedResource {
        /// Acquisition tokens.
        acquire: Vec<String>,
        /// Release tokens.
        release: Vec<String>,
        /// Guard tokens.
        #[serde(default)]
        guards: Vec<String>,
    },
    /// `kind = "call-with-concatenation"`
    CallWithConcatenation {
        /// Callee tokens.
        callees: Vec<String>,
    },
    /// `kind = "nested-in"`
    NestedIn {
        /// Statement keywords.
        statement: OneOrMany,
        /// Enclosing header keywords.
        enclosing: Vec<String>,
        /// Header keywords that stop the outward search.
        #[serde(default, rename = "stop-at")]
        stop_at: Vec<String>,
    },
    /// `kind = "long-block"`
    LongBlock {
        /// Opener keywords.
        opener: OneOrMany,
        /// Maximum body lines.
        #[serde(rename = "max-lines")]
        max_lines: usize,
    },
    /// `kind = "unused-binding"`
    UnusedBinding {
        /// Declaration regex.
        declaration: String,
        /// Item regex run over the `list` group.
        #[serde(default)]
        item: Option<String>,
        /// Usage patterns (default: the name as a whole word).
        #[serde(default)]
        usage: Option<OneOrMany>,
        /// Only search after the declaration.
        #[serde(default, rename = "after-declaration")]
        after_declaration: bool,
    },
    /// `kind = "unguarded-use"`
    UnguardedUse {
        /// Declaration regex.
        declaration: String,
        /// Risky use pattern.
        usage: String,
        /// Guard patterns.
        #[serde(default)]
        guards: Vec<String>,
    },
    /// `kind = "repeated-name"`
    RepeatedName {
        /// Regex with a `name` group.
        pattern: String,
    },
}

/// TOML representation of `[rule.fix]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixDto {
    /// Replacement template.
    pub template: String,
    /// Short description (default: derived from the template).
    #[serde(default)]
    pub description: Option<String>,
}

fn default_severity_str() -> String {
    "warning".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_empty() {
        let dto: CatalogDto = toml::from_str("").unwrap();
        assert!(dto.rules.is_empty());
    }

    #[test]
    fn deserialize_regex_rule_with_fix() {
        let toml_str = r#"
[[rule]]
id = "PHP002"
name = "loose-null-comparison"
language = "php"
message = "Use === when comparing against null or false"

[rule.match]
regex = '(?P<target>==\s*null)'
unless-line-contains = ["phpcs:ignore"]

[rule.fix]
template = "=== null"
"#;
        let dto: CatalogDto = toml::from_str(toml_str).unwrap();
        assert_eq!(dto.rules.len(), 1);
        let rule = &dto.rules[0];
        assert_eq!(rule.severity, "warning");
        assert_eq!(rule.precedence, 0);
        assert!(matches!(rule.match_spec.regex, Some(OneOrMany::One(_))));
        assert_eq!(rule.match_spec.unless_line_contains, ["phpcs:ignore"]);
        assert!(rule.fix.as_ref().is_some_and(|f| f.description.is_none()));
    }

    #[test]
    fn deserialize_regex_list_and_structure() {
        let toml_str = r#"
[[rule]]
id = "JS002"
name = "loose-equality"
language = "javascript"
message = "m"
match = { regex = ["==", "!="] }

[[rule]]
id = "GO007"
name = "defer-in-loop"
language = "go"
message = "m"
match = { structure = { kind = "nested-in", statement = "defer", enclosing = ["for"], stop-at = ["func"] } }
"#;
        let dto: CatalogDto = toml::from_str(toml_str).unwrap();
        assert_eq!(
            dto.rules[0].match_spec.regex.clone().map(OneOrMany::into_vec),
            Some(vec!["==".to_string(), "!=".to_string()])
        );
        assert_eq!(
            dto.rules[1].match_spec.structure,
            Some(StructureDto::NestedIn {
                statement: OneOrMany::One("defer".to_string()),
                enclosing: vec!["for".to_string()],
                stop_at: vec!["func".to_string()],
            })
        );
    }

    #[test]
    fn unknown_match_key_is_rejected() {
        let toml_str = r#"
[[rule]]
id = "X1"
name = "x"
language = "go"
message = "m"
match = { regexp = "x" }
"#;
        assert!(toml::from_str::<CatalogDto>(toml_str).is_err());
    }
}
