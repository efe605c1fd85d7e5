//! Assembles the engine a configuration describes.

use std::path::{Path, PathBuf};

use pactfix_core::{
    read_rules, CatalogBuilder, Config, DuplicateRuleError, Engine, EngineError,
    LoadCatalogError, RuleCatalog,
};
use pactfix_rules::{BuiltinCatalogError, Preset, UnknownPresetError};
use tracing::{debug, info};

/// Errors that prevent an engine from being assembled.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The configured preset does not exist.
    #[error(transparent)]
    Preset(#[from] UnknownPresetError),

    /// An embedded catalog failed to load.
    #[error(transparent)]
    Builtin(#[from] BuiltinCatalogError),

    /// An extra catalog named in the configuration failed to load.
    #[error("catalog {path}: {source}")]
    Catalog {
        /// Resolved catalog path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: LoadCatalogError,
    },

    /// Selecting rules from the loaded catalog produced a duplicate.
    #[error(transparent)]
    Duplicate(#[from] DuplicateRuleError),

    /// The engine could not be built.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Builds the rule catalog `config` selects.
///
/// Loads the built-in catalog unless `engine.builtin-rules` is off, then
/// every extra catalog, resolving relative paths against `base_dir`. An
/// explicit `enabled` for a rule id wins; every other rule is kept when its
/// severity is part of the preset.
///
/// # Errors
///
/// Returns an error if the preset is unknown, a catalog cannot be loaded,
/// or two catalogs define the same rule for one language.
pub fn standard_catalog(config: &Config, base_dir: &Path) -> Result<RuleCatalog, SetupError> {
    let preset = match config.preset.as_deref() {
        Some(name) => name.parse::<Preset>()?,
        None => Preset::default(),
    };

    let mut builder = CatalogBuilder::new();
    if config.engine.builtin_rules {
        pactfix_rules::register_builtin(&mut builder)?;
    }
    for relative in &config.engine.catalogs {
        let path = base_dir.join(relative);
        let loaded = read_rules(&path).and_then(|rules| {
            builder.extend(rules)?;
            Ok(())
        });
        if let Err(source) = loaded {
            return Err(SetupError::Catalog { path, source });
        }
        debug!(path = %path.display(), "loaded extra catalog");
    }

    let full = builder.build();
    let explicit = |id: &str| config.rules.get(id).and_then(|r| r.enabled);
    let mut selected = CatalogBuilder::new();
    selected.extend(
        full.iter()
            .filter(|rule| explicit(rule.id().as_str()).unwrap_or_else(|| preset.includes(rule)))
            .map(|rule| (**rule).clone()),
    )?;
    let catalog = selected.build();
    info!(
        preset = preset.name(),
        rules = catalog.len(),
        available = full.len(),
        "rule catalog ready"
    );
    Ok(catalog)
}

/// Builds every rule `config` can load, ignoring the preset and per-rule
/// switches.
///
/// # Errors
///
/// Same as [`standard_catalog`].
pub fn available_catalog(config: &Config, base_dir: &Path) -> Result<RuleCatalog, SetupError> {
    let mut everything = config.clone();
    everything.preset = Some(Preset::Strict.name().to_string());
    everything.rules.clear();
    standard_catalog(&everything, base_dir)
}

/// Builds an engine with the catalog [`standard_catalog`] selects, every
/// language matcher and the rule overrides of `config`.
///
/// # Errors
///
/// Returns an error if the catalog cannot be assembled or the engine
/// cannot be built.
pub fn standard_engine(config: Config, base_dir: &Path) -> Result<Engine, SetupError> {
    let catalog = standard_catalog(&config, base_dir)?;
    let engine = Engine::builder()
        .catalog(catalog)
        .matchers(pactfix_lang::all_matchers())
        .config(config)
        .build()?;
    Ok(engine)
}
