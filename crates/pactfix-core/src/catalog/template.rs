//! Fix templates: replacement text with capture placeholders.
//!
//! Syntax: `$name` or `${name}` inserts a capture, `${name:lower}` and
//! `${name:upper}` change its case, `$$` is a literal dollar. A `$` that is
//! not followed by a name, `{` or `$` is kept as is.

use std::collections::BTreeSet;
use std::fmt;

/// Errors raised while parsing or rendering a fix template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// A `${` has no closing `}`.
    #[error("unclosed placeholder at byte {offset}")]
    Unclosed {
        /// Offset of the `$`.
        offset: usize,
    },

    /// `${}` or `${:lower}`.
    #[error("empty placeholder name at byte {offset}")]
    EmptyName {
        /// Offset of the `$`.
        offset: usize,
    },

    /// The placeholder name contains characters other than `[A-Za-z0-9_]`.
    #[error("invalid placeholder name `{name}`")]
    InvalidName {
        /// The offending name.
        name: String,
    },

    /// A transform other than `lower` or `upper`.
    #[error("unknown transform `{transform}` on `{name}`")]
    UnknownTransform {
        /// Placeholder name.
        name: String,
        /// The offending transform.
        transform: String,
    },

    /// A placeholder names a capture the match does not provide.
    #[error("placeholder `{name}` has no capture")]
    MissingCapture {
        /// Placeholder name.
        name: String,
    },
}

/// Case transform applied to a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Lowercase.
    Lower,
    /// Uppercase.
    Upper,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Capture {
        name: String,
        transform: Option<Transform>,
    },
}

/// A parsed fix template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixTemplate {
    raw: String,
    segments: Vec<Segment>,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl FixTemplate {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] for malformed placeholders.
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut rest = raw;
        let mut offset = 0;

        while let Some(pos) = rest.find('$') {
            text.push_str(&rest[..pos]);
            let at = offset + pos;
            let after = &rest[pos + 1..];

            let consumed = if let Some(tail) = after.strip_prefix('$') {
                text.push('$');
                raw.len() - tail.len()
            } else if let Some(inner) = after.strip_prefix('{') {
                let close = inner.find('}').ok_or(TemplateError::Unclosed { offset: at })?;
                let body = &inner[..close];
                let (name, transform) = parse_braced(body, at)?;
                flush(&mut segments, &mut text);
                segments.push(Segment::Capture { name, transform });
                raw.len() - inner.len() + close + 1
            } else {
                let len = after
                    .char_indices()
                    .find(|&(_, c)| !is_name_char(c))
                    .map_or(after.len(), |(i, _)| i);
                if len == 0 {
                    text.push('$');
                } else {
                    flush(&mut segments, &mut text);
                    segments.push(Segment::Capture {
                        name: after[..len].to_string(),
                        transform: None,
                    });
                }
                raw.len() - after.len() + len
            };

            offset = consumed;
            rest = &raw[consumed..];
        }
        text.push_str(rest);
        flush(&mut segments, &mut text);

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The template as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of every capture the template references.
    #[must_use]
    pub fn placeholders(&self) -> BTreeSet<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Capture { name, .. } => Some(name.as_str()),
                Segment::Text(_) => None,
            })
            .collect()
    }

    /// Renders the template, resolving placeholders through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingCapture`] if `lookup` has no value
    /// for a placeholder.
    pub fn render<'a>(
        &self,
        lookup: impl Fn(&str) -> Option<&'a str>,
    ) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Capture { name, transform } => {
                    let value = lookup(name).ok_or_else(|| TemplateError::MissingCapture {
                        name: name.clone(),
                    })?;
                    match transform {
                        None => out.push_str(value),
                        Some(Transform::Lower) => out.push_str(&value.to_lowercase()),
                        Some(Transform::Upper) => out.push_str(&value.to_uppercase()),
                    }
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Display for FixTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn flush(segments: &mut Vec<Segment>, text: &mut String) {
    if !text.is_empty() {
        segments.push(Segment::Text(std::mem::take(text)));
    }
}

fn parse_braced(body: &str, offset: usize) -> Result<(String, Option<Transform>), TemplateError> {
    let (name, transform) = match body.split_once(':') {
        Some((name, transform)) => (name, Some(transform)),
        None => (body, None),
    };
    if name.is_empty() {
        return Err(TemplateError::EmptyName { offset });
    }
    if !name.chars().all(is_name_char) {
        return Err(TemplateError::InvalidName {
            name: name.to_string(),
        });
    }
    let transform = match transform {
        None => None,
        Some("lower") => Some(Transform::Lower),
        Some("upper") => Some(Transform::Upper),
        Some(other) => {
            return Err(TemplateError::UnknownTransform {
                name: name.to_string(),
                transform: other.to_string(),
            })
        }
    };
    Ok((name.to_string(), transform))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(template: &str, pairs: &[(&'static str, &'static str)]) -> String {
        FixTemplate::parse(template)
            .unwrap()
            .render(|name| pairs.iter().find(|(k, _)| *k == name).map(|(_, v)| *v))
            .unwrap()
    }

    #[test]
    fn plain_text_renders_unchanged() {
        assert_eq!(render("let", &[]), "let");
    }

    #[test]
    fn braced_and_bare_placeholders() {
        let pairs = [("ws", " "), ("rhs", "null")];
        assert_eq!(render("===${ws}${rhs}", &pairs), "=== null");
        assert_eq!(render("=== $rhs;", &pairs), "=== null;");
    }

    #[test]
    fn transforms_change_case() {
        let pairs = [("t", "String")];
        assert_eq!(render("${t:lower}", &pairs), "string");
        assert_eq!(render("${t:upper}", &pairs), "STRING");
    }

    #[test]
    fn dollars_are_escaped_or_literal() {
        assert_eq!(render("$$x", &[]), "$x");
        assert_eq!(render("cost: $ 5", &[]), "cost: $ 5");
        assert_eq!(render("end$", &[]), "end$");
    }

    #[test]
    fn placeholders_are_listed() {
        let template = FixTemplate::parse("${decl}.freeze $0 $$skip").unwrap();
        let names: Vec<_> = template.placeholders().into_iter().collect();
        assert_eq!(names, ["0", "decl"]);
    }

    #[test]
    fn malformed_templates_are_rejected() {
        assert_eq!(
            FixTemplate::parse("a ${b"),
            Err(TemplateError::Unclosed { offset: 2 })
        );
        assert!(matches!(
            FixTemplate::parse("${}"),
            Err(TemplateError::EmptyName { .. })
        ));
        assert!(matches!(
            FixTemplate::parse("${a-b}"),
            Err(TemplateError::InvalidName { .. })
        ));
        assert!(matches!(
            FixTemplate::parse("${a:title}"),
            Err(TemplateError::UnknownTransform { .. })
        ));
    }

    #[test]
    fn missing_capture_fails_render() {
        let template = FixTemplate::parse("${nope}").unwrap();
        assert_eq!(
            template.render(|_| None),
            Err(TemplateError::MissingCapture {
                name: "nope".to_string()
            })
        );
    }
}
