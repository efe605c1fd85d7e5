//! Engine orchestrating classification, scanning and fixing.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::model::RuleDefinition;
use crate::catalog::RuleCatalog;
use crate::collector::{collect, Collected};
use crate::config::Config;
use crate::document::SourceDocument;
use crate::fixer::{AppliedFix, FixError, FixPass, FixWarning, RejectedFix};
use crate::language::{Language, LanguageClassifier};
use crate::matcher::{Matcher, MatcherBox};
use crate::types::{Diagnostic, FileNote, NoteKind, ScanReport};

/// Errors that can occur while building an [`Engine`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// The worker pool could not be created.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Two matchers claim the same language.
    #[error("more than one matcher registered for {language}")]
    DuplicateMatcher {
        /// Language claimed twice.
        language: Language,
    },

    /// No matcher was registered.
    #[error("no matcher registered")]
    NoMatchers,

    /// `engine.force-language` names a language without a matcher.
    #[error("cannot force {language}: no matcher registered for it")]
    ForcedLanguageUnavailable {
        /// The forced language.
        language: Language,
    },
}

/// One file handed to the engine.
#[derive(Debug, Clone)]
pub struct SourceInput {
    /// Path as reported in diagnostics.
    pub path: PathBuf,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl SourceInput {
    /// Creates an input.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }
}

/// Result of fixing one document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixOutcome {
    /// File path.
    pub path: PathBuf,
    /// Language of the document.
    pub language: Language,
    /// Buffer after the last pass.
    #[serde(skip)]
    pub text: String,
    /// Whether the buffer differs from the input.
    pub changed: bool,
    /// Every fix written, in pass order.
    pub applied: Vec<AppliedFix>,
    /// Diagnostics of the final rescan.
    pub residual: Vec<Diagnostic>,
    /// Fixes dropped during planning.
    #[serde(skip)]
    pub rejected: Vec<RejectedFix>,
    /// Number of passes that ran.
    pub passes: usize,
    /// Non-fatal conditions.
    pub warnings: Vec<FixWarning>,
}

/// Result of fixing a set of inputs.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixReport {
    /// Outcomes ordered by path.
    pub outcomes: Vec<FixOutcome>,
    /// Notes about skipped files.
    pub notes: Vec<FileNote>,
    /// Number of files skipped.
    pub files_skipped: usize,
}

impl FixReport {
    /// Residual diagnostics across every document, in report order.
    #[must_use]
    pub fn residual(&self) -> Vec<&Diagnostic> {
        let mut all: Vec<&Diagnostic> = self.outcomes.iter().flat_map(|o| &o.residual).collect();
        all.sort_by(|a, b| a.report_order(b));
        all
    }

    /// Total number of applied fixes.
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.applied.len()).sum()
    }

    /// Outcomes whose buffer changed.
    pub fn changed(&self) -> impl Iterator<Item = &FixOutcome> {
        self.outcomes.iter().filter(|o| o.changed)
    }
}

/// Builder for configuring an [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
    catalog: Option<Arc<RuleCatalog>>,
    matchers: Vec<MatcherBox>,
    config: Option<Config>,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rule catalog.
    #[must_use]
    pub fn catalog(self, catalog: RuleCatalog) -> Self {
        self.shared_catalog(Arc::new(catalog))
    }

    /// Sets a catalog shared with other engines.
    #[must_use]
    pub fn shared_catalog(mut self, catalog: Arc<RuleCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Adds a matcher.
    #[must_use]
    pub fn matcher<M: Matcher + 'static>(self, matcher: M) -> Self {
        self.matcher_box(Box::new(matcher))
    }

    /// Adds a boxed matcher.
    #[must_use]
    pub fn matcher_box(mut self, matcher: MatcherBox) -> Self {
        self.matchers.push(matcher);
        self
    }

    /// Adds several boxed matchers.
    #[must_use]
    pub fn matchers(mut self, matchers: impl IntoIterator<Item = MatcherBox>) -> Self {
        self.matchers.extend(matchers);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the engine, applying rule overrides from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no matcher or two matchers for one language are
    /// registered, if the forced language has no matcher, or if the thread
    /// pool cannot be created.
    pub fn build(self) -> Result<Engine, EngineError> {
        if self.matchers.is_empty() {
            return Err(EngineError::NoMatchers);
        }
        let mut matchers = BTreeMap::new();
        for matcher in self.matchers {
            let language = matcher.language();
            if matchers.insert(language, matcher).is_some() {
                return Err(EngineError::DuplicateMatcher { language });
            }
        }

        let config = self.config.unwrap_or_default();
        if let Some(language) = config.engine.force_language {
            if !matchers.contains_key(&language) {
                return Err(EngineError::ForcedLanguageUnavailable { language });
            }
        }
        let catalog = self.catalog.unwrap_or_default();
        let rules: BTreeMap<Language, Vec<Arc<RuleDefinition>>> = matchers
            .keys()
            .map(|&language| {
                let configured = catalog
                    .rules_for(language)
                    .iter()
                    .filter_map(|rule| config.configure(rule))
                    .map(Arc::new)
                    .collect();
                (language, configured)
            })
            .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.engine.parallelism.unwrap_or(0))
            .build()?;

        let classifier = LanguageClassifier::new(matchers.keys().copied());
        Ok(Engine {
            catalog,
            classifier,
            matchers,
            rules,
            config,
            pool,
        })
    }
}

/// Runs matchers over documents and fixes them.
///
/// Use [`Engine::builder()`] to construct an instance.
pub struct Engine {
    catalog: Arc<RuleCatalog>,
    classifier: LanguageClassifier,
    matchers: BTreeMap<Language, MatcherBox>,
    rules: BTreeMap<Language, Vec<Arc<RuleDefinition>>>,
    config: Config,
    pool: rayon::ThreadPool,
}

impl Engine {
    /// Creates a new builder for configuring an engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// The catalog the engine was built from.
    #[must_use]
    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// The configuration in effect.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Languages with a registered matcher.
    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.matchers.keys().copied()
    }

    /// Enabled rules for `language` after configuration overrides.
    #[must_use]
    pub fn rules_for(&self, language: Language) -> &[Arc<RuleDefinition>] {
        self.rules.get(&language).map_or(&[], Vec::as_slice)
    }

    /// Returns the number of enabled rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    /// Classifies a file among the registered languages.
    ///
    /// A forced language from the configuration replaces detection for
    /// every input.
    #[must_use]
    pub fn classify(&self, path: &Path, bytes: &[u8]) -> Option<Language> {
        if let Some(language) = self.config.engine.force_language {
            return Some(language);
        }
        self.classifier.classify(path, bytes)
    }

    /// Scans every input in parallel and returns the ordered report.
    #[must_use]
    pub fn scan(&self, inputs: &[SourceInput]) -> ScanReport {
        info!("Scanning {} file(s)", inputs.len());
        let partial: Vec<ScanReport> = self
            .pool
            .install(|| inputs.par_iter().map(|input| self.scan_input(input)).collect());

        let mut report = ScanReport::new();
        for part in partial {
            report.extend(part);
        }
        report.sort();

        info!(
            "Scan complete: {} diagnostic(s) in {} file(s)",
            report.diagnostics.len(),
            report.files_scanned
        );
        report
    }

    fn scan_input(&self, input: &SourceInput) -> ScanReport {
        let mut report = ScanReport::new();
        match self.open(input) {
            Ok(document) => {
                report.diagnostics = self.scan_document(&document).diagnostics;
                report.files_scanned = 1;
            }
            Err(note) => {
                report.files_skipped = 1;
                report.notes.extend(note);
            }
        }
        report
    }

    /// Classifies and decodes an input. Skipped inputs yield their note, if
    /// one should be recorded.
    fn open(&self, input: &SourceInput) -> Result<SourceDocument, Option<FileNote>> {
        let Some(language) = self.classify(&input.path, &input.bytes) else {
            debug!("No language for {}", input.path.display());
            return Err(self.config.engine.report_unknown_languages.then(|| {
                FileNote::new(&input.path, NoteKind::UnknownLanguage, "no registered language")
            }));
        };

        SourceDocument::decode(&input.path, language, input.bytes.clone()).map_err(|e| {
            warn!("Skipping {}: {e}", input.path.display());
            Some(FileNote::new(&input.path, NoteKind::Unreadable, e.to_string()))
        })
    }

    /// Scans one document and collects its diagnostics and fix selection.
    #[must_use]
    pub fn scan_document(&self, document: &SourceDocument) -> Collected {
        self.collect_excluding(document, &HashSet::new())
    }

    fn collect_excluding(&self, document: &SourceDocument, rejected: &HashSet<String>) -> Collected {
        let Some(matcher) = self.matchers.get(&document.language()) else {
            return Collected::default();
        };
        debug!("Scanning {}", document.path().display());
        let matches = matcher.scan(document, self.rules_for(document.language()));
        collect(document, matches, rejected)
    }

    /// Fixes every input in parallel; each document is fixed serially.
    #[must_use]
    pub fn fix(&self, inputs: &[SourceInput]) -> FixReport {
        info!("Fixing {} file(s)", inputs.len());
        let results: Vec<Result<FixOutcome, Option<FileNote>>> = self.pool.install(|| {
            inputs
                .par_iter()
                .map(|input| self.open(input).map(|doc| self.fix_document(doc)))
                .collect()
        });

        let mut report = FixReport::default();
        for result in results {
            match result {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(note) => {
                    report.files_skipped += 1;
                    report.notes.extend(note);
                }
            }
        }
        report.outcomes.sort_by(|a, b| a.path.cmp(&b.path));
        report
            .notes
            .sort_by(|a, b| a.file.cmp(&b.file).then(a.message.cmp(&b.message)));

        info!(
            "Fix complete: {} fix(es) applied in {} file(s)",
            report.applied_count(),
            report.changed().count()
        );
        report
    }

    /// Runs scan, fix and rescan cycles until nothing is left to fix or the
    /// pass limit is reached.
    #[must_use]
    pub fn fix_document(&self, mut document: SourceDocument) -> FixOutcome {
        let original = document.text().to_string();
        let max_passes = self.config.engine.max_fix_passes;
        let annotate = self.config.engine.annotate_fixes;

        let mut excluded = HashSet::new();
        let mut applied = Vec::new();
        let mut rejected = Vec::new();
        let mut warnings = Vec::new();
        let mut passes = 0;

        let residual = loop {
            let collected = self.collect_excluding(&document, &excluded);
            if collected.is_settled() {
                break collected.diagnostics;
            }
            if passes == max_passes {
                let still_fixable: Vec<Diagnostic> =
                    collected.diagnostics.iter().filter(|d| d.fixable).cloned().collect();
                warn!(
                    "{}: {} fixable diagnostic(s) left after {} pass(es)",
                    document.path().display(),
                    still_fixable.len(),
                    passes
                );
                warnings.push(FixWarning::MaxFixPassesExceeded { still_fixable });
                break collected.diagnostics;
            }

            passes += 1;
            let outcome = FixPass::new(&mut document)
                .annotate(annotate)
                .plan(&collected)
                .and_then(FixPass::apply);
            match outcome {
                Ok(outcome) => {
                    for r in &outcome.rejected {
                        excluded.insert(r.fingerprint.clone());
                        if let FixError::VerificationFailed { rule_id, line, .. } = &r.error {
                            warnings.push(FixWarning::VerificationFailed {
                                rule_id: rule_id.clone(),
                                line: *line,
                                message: r.error.to_string(),
                            });
                        }
                    }
                    applied.extend(outcome.applied);
                    rejected.extend(outcome.rejected);
                }
                Err(e) => {
                    warn!("{}: fix pass aborted: {e}", document.path().display());
                    let mut diagnostics = collected.diagnostics;
                    for d in &mut diagnostics {
                        d.fixable = false;
                    }
                    break diagnostics;
                }
            }
        };

        debug!(
            "{}: {} fix(es) in {} pass(es)",
            document.path().display(),
            applied.len(),
            passes
        );

        let path = document.path().to_path_buf();
        let language = document.language();
        let text = document.into_text();
        FixOutcome {
            changed: text != original,
            path,
            language,
            text,
            applied,
            residual,
            rejected,
            passes,
            warnings,
        }
    }
}
