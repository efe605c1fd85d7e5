//! The immutable rule catalog and its builder.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::language::Language;

use super::model::{RuleDefinition, RuleId};

/// A `(language, id)` pair was registered twice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("duplicate rule `{id}` for language `{language}`")]
pub struct DuplicateRuleError {
    /// Language of the duplicated rule.
    pub language: Language,
    /// The duplicated id.
    pub id: RuleId,
}

type RuleTable = BTreeMap<Language, BTreeMap<RuleId, Arc<RuleDefinition>>>;

/// Collects rules before the catalog is frozen.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    rules: RuleTable,
}

impl CatalogBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one rule.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateRuleError`] if `(language, id)` already exists.
    pub fn register(&mut self, rule: RuleDefinition) -> Result<&mut Self, DuplicateRuleError> {
        let per_language = self.rules.entry(rule.language()).or_default();
        if per_language.contains_key(rule.id()) {
            return Err(DuplicateRuleError {
                language: rule.language(),
                id: rule.id().clone(),
            });
        }
        per_language.insert(rule.id().clone(), Arc::new(rule));
        Ok(self)
    }

    /// Registers every rule, stopping at the first duplicate.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateRuleError`] on the first duplicate.
    pub fn extend(
        &mut self,
        rules: impl IntoIterator<Item = RuleDefinition>,
    ) -> Result<&mut Self, DuplicateRuleError> {
        for rule in rules {
            self.register(rule)?;
        }
        Ok(self)
    }

    /// Number of rules registered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.values().map(BTreeMap::len).sum()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freezes the catalog.
    #[must_use]
    pub fn build(self) -> RuleCatalog {
        let rules = self
            .rules
            .into_iter()
            .filter(|(_, rules)| !rules.is_empty())
            .map(|(language, rules)| (language, rules.into_values().collect()))
            .collect();
        RuleCatalog { rules }
    }
}

/// Immutable registry of rule definitions keyed by `(language, id)`.
///
/// There is no removal or mutation after [`CatalogBuilder::build`]; share
/// it between threads through an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: BTreeMap<Language, Vec<Arc<RuleDefinition>>>,
}

impl RuleCatalog {
    /// Starts a new catalog.
    #[must_use]
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Rules of `language` ordered by id. Empty for unregistered languages.
    #[must_use]
    pub fn rules_for(&self, language: Language) -> &[Arc<RuleDefinition>] {
        self.rules.get(&language).map_or(&[], Vec::as_slice)
    }

    /// Looks up one rule.
    #[must_use]
    pub fn get(&self, language: Language, id: &str) -> Option<&Arc<RuleDefinition>> {
        self.rules_for(language)
            .binary_search_by(|r| r.id().as_str().cmp(id))
            .ok()
            .map(|i| &self.rules_for(language)[i])
    }

    /// Languages with at least one rule.
    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.rules.keys().copied()
    }

    /// Every rule, ordered by language then id.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RuleDefinition>> {
        self.rules.values().flatten()
    }

    /// Total number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    /// Returns true if the catalog holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
