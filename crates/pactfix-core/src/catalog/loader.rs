//! DTO → Domain model conversion with validation.

use crate::language::Language;
use crate::types::Severity;

use super::catalog_dto::{CatalogDto, FixDto, MatchDto, OneOrMany, RuleDto, StructureDto};
use super::model::{
    Confidence, Exclusions, FixSpec, FollowingLines, MatchScope, MatchSpec, ModelError, Pattern,
    RegexPattern, RuleDefinition, RuleId, Structure, UsageTemplate,
};
use super::template::FixTemplate;

/// Errors during DTO → Domain conversion.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A field-level validation error.
    #[error("{context}: {source}")]
    Validation {
        /// Where the error occurred (e.g., "rule[3] (PHP002).match.regex[0]").
        context: String,
        /// The underlying model error.
        source: ModelError,
    },

    /// Unknown language id.
    #[error("{context}: unknown language `{value}`, expected one of: {}", known_languages())]
    UnknownLanguage {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },

    /// Unknown severity string.
    #[error("{context}: unknown severity `{value}`, expected: info, warning, error, security")]
    UnknownSeverity {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },

    /// Unknown match scope.
    #[error("{context}: unknown scope `{value}`, expected: code, comment, interpolation, any")]
    UnknownScope {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },

    /// Zero or several of `literal`, `regex` and `structure` are set.
    #[error("{context}: exactly one of `literal`, `regex` or `structure` must be set (found {found})")]
    PatternKind {
        /// Where the error occurred.
        context: String,
        /// Number of pattern kinds present.
        found: usize,
    },
}

fn known_languages() -> String {
    Language::ALL
        .iter()
        .map(|l| l.id())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Converts a `CatalogDto` to validated rule definitions, in document order.
///
/// # Errors
///
/// Returns the first error encountered during conversion.
pub fn load(dto: CatalogDto) -> Result<Vec<RuleDefinition>, LoadError> {
    dto.rules
        .into_iter()
        .enumerate()
        .map(|(i, rule)| convert_rule(rule, i))
        .collect()
}

fn validation(context: &str) -> impl FnOnce(ModelError) -> LoadError + '_ {
    move |source| LoadError::Validation {
        context: context.to_string(),
        source,
    }
}

fn convert_rule(dto: RuleDto, index: usize) -> Result<RuleDefinition, LoadError> {
    let ctx = format!("rule[{index}] ({})", dto.id);

    let id = RuleId::new(&dto.id).map_err(validation(&format!("{ctx}.id")))?;
    let language = Language::from_id(&dto.language).ok_or_else(|| LoadError::UnknownLanguage {
        context: format!("{ctx}.language"),
        value: dto.language.clone(),
    })?;
    let severity = parse_severity(&dto.severity, &format!("{ctx}.severity"))?;
    let match_spec = convert_match(dto.match_spec, &format!("{ctx}.match"))?;

    let rule = RuleDefinition::new(id, dto.name, language, severity, dto.message, match_spec)
        .map_err(validation(&ctx))?
        .with_precedence(dto.precedence);

    match dto.fix {
        Some(fix) => {
            let fix_ctx = format!("{ctx}.fix");
            let spec = convert_fix(fix).map_err(validation(&fix_ctx))?;
            rule.with_fix(spec).map_err(validation(&fix_ctx))
        }
        None => Ok(rule),
    }
}

fn convert_match(dto: MatchDto, ctx: &str) -> Result<MatchSpec, LoadError> {
    let found = usize::from(dto.literal.is_some())
        + usize::from(dto.regex.is_some())
        + usize::from(dto.structure.is_some());
    let pattern = match (dto.literal, dto.regex, dto.structure) {
        (Some(literal), None, None) => {
            if literal.is_empty() {
                return Err(validation(&format!("{ctx}.literal"))(ModelError::EmptyPattern));
            }
            Pattern::Literal(literal)
        }
        (None, Some(regex), None) => {
            let sources = regex.into_vec();
            if sources.is_empty() {
                return Err(validation(&format!("{ctx}.regex"))(ModelError::EmptyPattern));
            }
            let patterns = sources
                .iter()
                .enumerate()
                .map(|(i, p)| RegexPattern::new(p).map_err(validation(&format!("{ctx}.regex[{i}]"))))
                .collect::<Result<Vec<_>, _>>()?;
            Pattern::Regex(patterns)
        }
        (None, None, Some(structure)) => Pattern::Structure(
            convert_structure(structure).map_err(validation(&format!("{ctx}.structure")))?,
        ),
        _ => {
            return Err(LoadError::PatternKind {
                context: ctx.to_string(),
                found,
            })
        }
    };

    let confidence = dto
        .confidence
        .map(Confidence::new)
        .transpose()
        .map_err(validation(&format!("{ctx}.confidence")))?
        .unwrap_or(Confidence::CERTAIN);
    let threshold = dto
        .threshold
        .map(Confidence::new)
        .transpose()
        .map_err(validation(&format!("{ctx}.threshold")))?
        .unwrap_or(Confidence::CERTAIN);
    let scope = match dto.scope.as_deref() {
        None | Some("code") => MatchScope::Code,
        Some("comment") => MatchScope::Comment,
        Some("interpolation") => MatchScope::Interpolation,
        Some("any") => MatchScope::Any,
        Some(other) => {
            return Err(LoadError::UnknownScope {
                context: format!("{ctx}.scope"),
                value: other.to_string(),
            })
        }
    };
    let exclusions = Exclusions {
        line_contains: dto.unless_line_contains,
        match_contains: dto.unless_match_contains,
        previous_line_contains: dto.unless_previous_line_contains,
        file_contains: dto.unless_file_contains,
        following_lines: dto.unless_following_lines_contain.map(|f| FollowingLines {
            within: f.within,
            text: f.text,
        }),
    };

    MatchSpec::new(pattern)
        .with_confidence(confidence)
        .with_threshold(threshold)
        .with_scope(scope)
        .with_exclusions(exclusions)
        .with_equal_captures(dto.equal_captures)
        .map_err(validation(&format!("{ctx}.equal-captures")))
}

fn non_empty(values: Vec<String>, parameter: &'static str) -> Result<Vec<String>, ModelError> {
    if values.is_empty() || values.iter().any(String::is_empty) {
        return Err(ModelError::EmptyParameterList { parameter });
    }
    Ok(values)
}

fn convert_structure(dto: StructureDto) -> Result<Structure, ModelError> {
    Ok(match dto {
        StructureDto::EmptyBlock { keywords } => Structure::EmptyBlock {
            keywords: non_empty(keywords, "keywords")?,
        },
        StructureDto::UnreleasedResource {
            acquire,
            release,
            guards,
        } => Structure::UnreleasedResource {
            acquire: non_empty(acquire, "acquire")?,
            release: non_empty(release, "release")?,
            guards,
        },
        StructureDto::CallWithConcatenation { callees } => Structure::CallWithConcatenation {
            callees: non_empty(callees, "callees")?,
        },
        StructureDto::NestedIn {
            statement,
            enclosing,
            stop_at,
        } => Structure::NestedIn {
            statements: non_empty(statement.into_vec(), "statement")?,
            enclosing: non_empty(enclosing, "enclosing")?,
            stop_at,
        },
        StructureDto::LongBlock { opener, max_lines } => {
            if max_lines == 0 {
                return Err(ModelError::ZeroParameter {
                    parameter: "max-lines",
                });
            }
            Structure::LongBlock {
                openers: non_empty(opener.into_vec(), "opener")?,
                max_lines,
            }
        }
        StructureDto::UnusedBinding {
            declaration,
            item,
            usage,
            after_declaration,
        } => {
            let declaration = RegexPattern::new(&declaration)?;
            let item = item.as_deref().map(RegexPattern::new).transpose()?;
            match &item {
                Some(item) => {
                    require_group(&declaration, "list")?;
                    require_group(item, "name")?;
                }
                None => require_group(&declaration, "name")?,
            }
            let usages = usage.map_or_else(
                || vec![r"\b${name}\b".to_string()],
                OneOrMany::into_vec,
            );
            Structure::UnusedBinding {
                declaration,
                item,
                usages: usage_templates(usages, "usage")?,
                after_declaration,
            }
        }
        StructureDto::UnguardedUse {
            declaration,
            usage,
            guards,
        } => {
            let declaration = RegexPattern::new(&declaration)?;
            require_group(&declaration, "name")?;
            Structure::UnguardedUse {
                declaration,
                usage: UsageTemplate::new(&usage)?,
                guards: guards
                    .iter()
                    .map(|g| UsageTemplate::new(g))
                    .collect::<Result<_, _>>()?,
            }
        }
        StructureDto::RepeatedName { pattern } => {
            let pattern = RegexPattern::new(&pattern)?;
            require_group(&pattern, "name")?;
            Structure::RepeatedName { pattern }
        }
    })
}

fn require_group(pattern: &RegexPattern, group: &'static str) -> Result<(), ModelError> {
    if pattern.has_capture(group) {
        Ok(())
    } else {
        Err(ModelError::MissingGroup {
            pattern: pattern.as_str().to_string(),
            group,
        })
    }
}

fn usage_templates(
    templates: Vec<String>,
    parameter: &'static str,
) -> Result<Vec<UsageTemplate>, ModelError> {
    non_empty(templates, parameter)?
        .iter()
        .map(|t| UsageTemplate::new(t))
        .collect()
}

fn convert_fix(dto: FixDto) -> Result<FixSpec, ModelError> {
    let template = FixTemplate::parse(&dto.template)?;
    let description = dto
        .description
        .unwrap_or_else(|| format!("rewrite to `{}`", dto.template));
    Ok(FixSpec::new(template, description))
}

fn parse_severity(value: &str, context: &str) -> Result<Severity, LoadError> {
    Severity::from_name(value).ok_or_else(|| LoadError::UnknownSeverity {
        context: context.to_string(),
        value: value.to_string(),
    })
}
