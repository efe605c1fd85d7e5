//! Comment-based allowance directives.
//!
//! Supports directives like:
//! ```text
//! // pactfix: allow(PHP005) reason="legacy template"
//! # pactfix: allow(PY011, PY012)
//! /* pactfix: allow(all) */
//! ```
//!
//! The directive must sit inside a comment of the document's language, on the
//! line of the match or on the line directly above it.

use std::collections::HashSet;

use crate::document::SourceDocument;
use crate::syntax::{CodeMask, Region};

const MARKER: &str = "pactfix:";

/// Result of checking for allow directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowCheck {
    /// Rule is not allowed.
    Denied,
    /// Rule is allowed with optional reason.
    Allowed {
        /// The reason provided (if any).
        reason: Option<String>,
    },
}

impl AllowCheck {
    /// Returns true if allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Returns the reason if allowed.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allowed { reason } => reason.as_deref(),
            Self::Denied => None,
        }
    }
}

/// Parsed allowance directive.
#[derive(Debug, Clone)]
pub struct AllowDirective {
    /// Rule ids that are allowed.
    pub rules: HashSet<String>,
    /// Optional reason for the allowance.
    pub reason: Option<String>,
}

/// Checks whether `rule_id` is allowed on the zero-based `line`, returning
/// the directive's reason.
#[must_use]
pub fn check_allow_with_reason(
    document: &SourceDocument,
    mask: &CodeMask,
    line: usize,
    rule_id: &str,
) -> AllowCheck {
    let candidates = [line.checked_sub(1), Some(line)];
    for check_line in candidates.into_iter().flatten() {
        if check_line >= document.line_index().line_count() {
            continue;
        }
        let bounds = document.line_bounds(check_line);
        let text = &document.text()[bounds.clone()];
        for (pos, _) in text.match_indices(MARKER) {
            if mask.region_at(bounds.start + pos) != Region::Comment {
                continue;
            }
            if let Some(directive) = parse_allow_directive(&text[pos + MARKER.len()..]) {
                if directive.rules.contains(rule_id) || directive.rules.contains("all") {
                    return AllowCheck::Allowed {
                        reason: directive.reason,
                    };
                }
            }
        }
    }

    AllowCheck::Denied
}

/// Parses `allow(ID, …) reason="…"` following the marker.
fn parse_allow_directive(rest: &str) -> Option<AllowDirective> {
    let allow_content = rest.trim_start().strip_prefix("allow(")?;

    let paren_end = allow_content.find(')')?;
    let rules: HashSet<String> = allow_content[..paren_end]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if rules.is_empty() {
        return None;
    }

    let tail = allow_content[paren_end + 1..].trim_start();
    let reason = tail
        .strip_prefix("reason=\"")
        .and_then(|r| r.find('"').map(|end| r[..end].to_string()));

    Some(AllowDirective { rules, reason })
}
