//! Source file discovery.

use anyhow::{bail, Context, Result};
use pactfix::EngineConfig;
use std::path::{Component, Path, PathBuf};

/// Collects the files under `paths`, honoring `.gitignore` and the exclude
/// patterns of `engine`.
///
/// Paths named explicitly are always included. Directory entries that
/// cannot be read are logged and skipped.
///
/// # Errors
///
/// Returns an error if a path does not exist or an exclude pattern is
/// invalid.
pub fn discover(paths: &[PathBuf], engine: &EngineConfig) -> Result<Vec<PathBuf>> {
    let excludes = engine
        .exclude
        .iter()
        .map(|p| glob::Pattern::new(p).with_context(|| format!("Invalid exclude pattern: {p}")))
        .collect::<Result<Vec<_>>>()?;

    let mut files = Vec::new();
    for root in paths {
        if root.is_file() {
            files.push(clean(root));
            continue;
        }
        if !root.is_dir() {
            bail!("Path does not exist: {}", root.display());
        }

        let mut builder = ignore::WalkBuilder::new(root);
        builder
            .git_ignore(engine.respect_gitignore)
            .git_global(engine.respect_gitignore)
            .git_exclude(engine.respect_gitignore)
            .require_git(false);

        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            let rel = path.strip_prefix(root).unwrap_or(path);
            if excludes.iter().any(|p| p.matches_path(rel)) {
                tracing::debug!("Excluded {}", path.display());
                continue;
            }
            files.push(clean(path));
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Drops `./` components so reported paths read naturally.
fn clean(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
