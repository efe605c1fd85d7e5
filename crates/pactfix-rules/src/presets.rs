//! Severity presets over the built-in catalog.

use std::fmt;
use std::str::FromStr;

use pactfix_core::{RuleDefinition, Severity};

/// Preset configurations for pactfix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// Security and error rules only, for gradual adoption.
    Minimal,
    /// Warning and above.
    #[default]
    Recommended,
    /// Every rule.
    Strict,
}

impl Preset {
    /// Every preset, smallest first.
    pub const ALL: [Self; 3] = [Self::Minimal, Self::Recommended, Self::Strict];

    /// The name used in configuration files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Recommended => "recommended",
            Self::Strict => "strict",
        }
    }

    /// Lowest severity a rule needs to be part of this preset.
    #[must_use]
    pub fn min_severity(self) -> Severity {
        match self {
            Self::Minimal => Severity::Error,
            Self::Recommended => Severity::Warning,
            Self::Strict => Severity::Info,
        }
    }

    /// Returns true if `rule` is part of this preset.
    #[must_use]
    pub fn includes(self, rule: &RuleDefinition) -> bool {
        rule.severity() >= self.min_severity()
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A preset name that is not one of `minimal`, `recommended` or `strict`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown preset `{0}` (expected minimal, recommended or strict)")]
pub struct UnknownPresetError(pub String);

impl FromStr for Preset {
    type Err = UnknownPresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownPresetError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin_rules;

    #[test]
    fn test_preset_names() {
        assert_eq!("strict".parse::<Preset>(), Ok(Preset::Strict));
        assert_eq!("Minimal".parse::<Preset>(), Ok(Preset::Minimal));
        assert!("lenient".parse::<Preset>().is_err());
        assert_eq!(Preset::default(), Preset::Recommended);
    }

    #[test]
    fn presets_are_nested() {
        let rules = builtin_rules().unwrap();
        let count = |p: Preset| rules.iter().filter(|r| p.includes(r)).count();
        assert!(count(Preset::Minimal) > 0);
        assert!(count(Preset::Minimal) < count(Preset::Recommended));
        assert!(count(Preset::Recommended) < count(Preset::Strict));
        assert_eq!(count(Preset::Strict), rules.len());
    }

    #[test]
    fn minimal_keeps_security_and_errors() {
        let rules = builtin_rules().unwrap();
        for rule in rules.iter().filter(|r| Preset::Minimal.includes(r)) {
            assert!(matches!(rule.severity(), Severity::Error | Severity::Security));
        }
    }
}
