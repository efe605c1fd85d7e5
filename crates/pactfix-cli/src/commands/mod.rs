//! Subcommand implementations.

pub mod check;
pub mod fix;
pub mod init;
pub mod list_rules;
pub mod output;

use anyhow::{Context, Result};
use pactfix::{available_catalog, standard_engine, Config, Engine, FileNote, NoteKind, SourceInput};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::{config_resolver, discovery, TargetArgs};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Completed with nothing to report.
    Clean,
    /// Completed with diagnostics.
    Findings,
    /// Configuration, catalog or I/O failure.
    Failure,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Clean => Self::SUCCESS,
            Status::Findings => Self::from(1),
            Status::Failure => Self::from(2),
        }
    }
}

/// Engine and inputs for one `check` or `fix` run.
pub struct Session {
    /// Engine built from the resolved configuration.
    pub engine: Engine,
    /// Files read from disk.
    pub inputs: Vec<SourceInput>,
    /// Files that could not be read.
    pub notes: Vec<FileNote>,
}

/// Directory a run's configuration is looked up in.
fn project_dir(paths: &[PathBuf]) -> PathBuf {
    match paths.first() {
        Some(p) if p.is_dir() => p.clone(),
        Some(p) => p
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        None => PathBuf::from("."),
    }
}

/// Loads the configuration, builds the engine and reads every target file.
///
/// `adjust` runs on the configuration after the CLI flags are merged in.
pub fn open_session(
    target: &TargetArgs,
    config_path: Option<&Path>,
    adjust: impl FnOnce(&mut Config),
) -> Result<Session> {
    let loaded = config_resolver::load(&project_dir(&target.paths), config_path)?;
    let mut config = loaded.config;
    config.engine.exclude.extend(target.exclude.iter().cloned());
    if target.force_language.is_some() {
        config.engine.force_language = target.force_language;
    }
    adjust(&mut config);
    if let Some(filter) = &target.rules {
        select_rules(&mut config, filter, &loaded.base_dir)?;
    }

    let engine =
        standard_engine(config, &loaded.base_dir).context("Failed to build the engine")?;
    let files = discovery::discover(&target.paths, &engine.config().engine)?;
    tracing::info!(
        config = ?loaded.origin.file(),
        "Analyzing {} file(s) with {} rules",
        files.len(),
        engine.rule_count()
    );

    let mut inputs = Vec::with_capacity(files.len());
    let mut notes = Vec::new();
    for path in files {
        match std::fs::read(&path) {
            Ok(bytes) => {
                let wanted = target.language.is_empty()
                    || engine
                        .classify(&path, &bytes)
                        .is_some_and(|l| target.language.contains(&l));
                if wanted {
                    inputs.push(SourceInput::new(path, bytes));
                }
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {e}", path.display());
                notes.push(FileNote::new(path, NoteKind::Unreadable, e.to_string()));
            }
        }
    }

    Ok(Session {
        engine,
        inputs,
        notes,
    })
}

/// Restricts `config` to the rules named in `filter`, by id or name.
///
/// Named rules run even when the preset would leave them out.
fn select_rules(config: &mut Config, filter: &str, base_dir: &Path) -> Result<()> {
    let wanted: BTreeSet<&str> = filter
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let catalog = available_catalog(config, base_dir).context("Failed to load rules")?;

    let mut seen = BTreeSet::new();
    for rule in catalog.iter() {
        let id = rule.id().as_str();
        let mut selected = false;
        for key in [id, rule.name()] {
            if wanted.contains(key) {
                seen.insert(key);
                selected = true;
            }
        }
        config.rules.entry(id.to_string()).or_default().enabled = Some(selected);
    }
    for name in wanted.difference(&seen) {
        tracing::warn!("Unknown rule: {name}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactfix::standard_catalog;

    #[test]
    fn exit_codes_follow_the_contract() {
        assert_eq!(ExitCode::from(Status::Clean), ExitCode::SUCCESS);
        assert_eq!(ExitCode::from(Status::Findings), ExitCode::from(1));
        assert_eq!(ExitCode::from(Status::Failure), ExitCode::from(2));
    }

    #[test]
    fn rule_filter_accepts_ids_and_names() {
        let mut config = Config::default();
        select_rules(&mut config, "JS001, var-declaration,loose-null-comparison", Path::new("."))
            .unwrap();
        assert!(config.is_rule_enabled("JS001"));
        assert!(!config.is_rule_enabled("JS002"));
        assert!(!config.is_rule_enabled("PHP003"));
    }

    #[test]
    fn filtered_rules_override_the_preset() {
        let info_id = pactfix::rules::builtin_rules()
            .unwrap()
            .into_iter()
            .find(|r| r.severity() == pactfix::Severity::Info)
            .map(|r| r.id().as_str().to_string())
            .unwrap();
        let mut config = Config::default();
        select_rules(&mut config, &info_id, Path::new(".")).unwrap();
        let catalog = standard_catalog(&config, Path::new(".")).unwrap();
        let ids: Vec<&str> = catalog.iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, [info_id.as_str()]);
    }

    #[test]
    fn named_rules_run_even_when_disabled_in_the_config() {
        let mut config = Config::parse("[rules.JS001]\nenabled = false\n").unwrap();
        select_rules(&mut config, "JS001", Path::new(".")).unwrap();
        let catalog = standard_catalog(&config, Path::new(".")).unwrap();
        let ids: Vec<&str> = catalog.iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, ["JS001"]);
    }

    #[test]
    fn project_dir_of_a_file_is_its_parent() {
        assert_eq!(project_dir(&[PathBuf::from("a.js")]), PathBuf::from("."));
        assert_eq!(project_dir(&[PathBuf::from("src/a.js")]), PathBuf::from("src"));
    }
}
