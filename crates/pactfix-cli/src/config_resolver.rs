//! Locates and loads `pactfix.toml`.
//!
//! A `--config` path always wins. Otherwise the search starts in the
//! directory being analyzed and climbs its ancestors, stopping after the
//! first directory that holds a `.git` entry. Each directory is checked for
//! `pactfix.toml`, then `.pactfix.toml`.
//!
//! Outside any project file the per-user file applies:
//! `$PACTFIX_CONFIG_DIR/config.toml`, or `~/.pactfix/config.toml` when the
//! variable is unset. With no file at all the built-in defaults are used.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pactfix::Config;
use tracing::{debug, info, warn};

/// Project file names, in order of preference.
const PROJECT_FILES: &[&str] = &["pactfix.toml", ".pactfix.toml"];

/// File name inside the user configuration directory.
const USER_FILE: &str = "config.toml";

/// Overrides the user configuration directory.
const USER_DIR_ENV: &str = "PACTFIX_CONFIG_DIR";

/// How the configuration in use was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Named by `--config`.
    Flag(PathBuf),
    /// Found in the analyzed directory or one of its ancestors.
    Project(PathBuf),
    /// The per-user file.
    User(PathBuf),
    /// No file; built-in defaults.
    Defaults,
}

impl ConfigOrigin {
    /// Path of the file, unless defaults are in use.
    #[must_use]
    pub fn file(&self) -> Option<&Path> {
        match self {
            Self::Flag(p) | Self::Project(p) | Self::User(p) => Some(p),
            Self::Defaults => None,
        }
    }
}

/// Places searched besides the project tree.
#[derive(Debug, Clone, Default)]
struct SearchRoots {
    user_dir: Option<PathBuf>,
}

impl SearchRoots {
    fn from_env() -> Self {
        let user_dir = std::env::var_os(USER_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| home::home_dir().map(|h| h.join(".pactfix")));
        Self { user_dir }
    }
}

fn locate(start: &Path, flag: Option<&Path>, roots: &SearchRoots) -> ConfigOrigin {
    if let Some(path) = flag {
        return ConfigOrigin::Flag(path.to_path_buf());
    }
    if let Some(path) = project_file(start) {
        return ConfigOrigin::Project(path);
    }
    roots
        .user_dir
        .as_ref()
        .map(|dir| dir.join(USER_FILE))
        .filter(|path| path.is_file())
        .map_or(ConfigOrigin::Defaults, ConfigOrigin::User)
}

/// The nearest project file at or above `start`, up to the repository root.
fn project_file(start: &Path) -> Option<PathBuf> {
    for dir in start.ancestors() {
        let mut present = PROJECT_FILES
            .iter()
            .map(|name| dir.join(name))
            .filter(|path| path.is_file());
        if let Some(path) = present.next() {
            if let Some(shadowed) = present.next() {
                warn!(
                    used = %path.display(),
                    ignored = %shadowed.display(),
                    "two project configs in one directory"
                );
            }
            return Some(path);
        }
        if dir.join(".git").exists() {
            debug!(root = %dir.display(), "no project config below the repository root");
            break;
        }
    }
    None
}

/// A loaded configuration and the directory its relative paths start from.
#[derive(Debug)]
pub struct LoadedConfig {
    /// Parsed configuration.
    pub config: Config,
    /// Directory of the config file, or the start directory for defaults.
    pub base_dir: PathBuf,
    /// How the file was chosen.
    pub origin: ConfigOrigin,
}

/// Resolves and loads the configuration for the tree rooted at `start`.
///
/// # Errors
///
/// Returns an error if the chosen file cannot be read or parsed.
pub fn load(start: &Path, flag: Option<&Path>) -> Result<LoadedConfig> {
    load_with(start, flag, &SearchRoots::from_env())
}

fn load_with(start: &Path, flag: Option<&Path>, roots: &SearchRoots) -> Result<LoadedConfig> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    let origin = locate(&start, flag, roots);
    let Some(file) = origin.file().map(Path::to_path_buf) else {
        debug!(dir = %start.display(), "no configuration file, using defaults");
        return Ok(LoadedConfig {
            config: Config::default(),
            base_dir: start,
            origin,
        });
    };

    if matches!(origin, ConfigOrigin::User(_)) {
        info!(path = %file.display(), "using the user configuration");
    } else {
        debug!(path = %file.display(), "using configuration");
    }
    let config = Config::from_file(&file)
        .with_context(|| format!("Failed to load config: {}", file.display()))?;
    let base_dir = file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok(LoadedConfig {
        config,
        base_dir,
        origin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// A canonical temporary repository root holding `.git`.
    fn repository() -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        (tmp, root)
    }

    fn dir(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }

    fn no_user_dir() -> SearchRoots {
        SearchRoots::default()
    }

    #[test]
    fn flag_wins_over_project_files() {
        let (_tmp, root) = repository();
        fs::write(root.join("pactfix.toml"), "").unwrap();
        let flag = root.join("ci.toml");

        let origin = locate(&root, Some(&flag), &no_user_dir());
        assert_eq!(origin, ConfigOrigin::Flag(flag));
    }

    #[test]
    fn nearest_project_file_wins() {
        let (_tmp, root) = repository();
        fs::write(root.join(".pactfix.toml"), "").unwrap();
        let app = dir(&root, "services/app");
        fs::write(app.join("pactfix.toml"), "").unwrap();

        let origin = locate(&dir(&app, "src"), None, &no_user_dir());
        assert_eq!(origin, ConfigOrigin::Project(app.join("pactfix.toml")));
    }

    #[test]
    fn search_climbs_to_the_repository_root() {
        let (_tmp, root) = repository();
        fs::write(root.join(".pactfix.toml"), "").unwrap();

        let origin = locate(&dir(&root, "src/handlers"), None, &no_user_dir());
        assert_eq!(origin, ConfigOrigin::Project(root.join(".pactfix.toml")));
    }

    #[test]
    fn search_stops_at_the_repository_root() {
        let tmp = TempDir::new().unwrap();
        let outer = tmp.path().canonicalize().unwrap();
        fs::write(outer.join("pactfix.toml"), "").unwrap();
        let repo = dir(&outer, "repo");
        fs::create_dir(repo.join(".git")).unwrap();

        let origin = locate(&dir(&repo, "src"), None, &no_user_dir());
        assert_eq!(origin, ConfigOrigin::Defaults);
    }

    #[test]
    fn plain_name_shadows_the_dot_name() {
        let (_tmp, root) = repository();
        fs::write(root.join("pactfix.toml"), "").unwrap();
        fs::write(root.join(".pactfix.toml"), "").unwrap();

        let origin = locate(&root, None, &no_user_dir());
        assert_eq!(origin, ConfigOrigin::Project(root.join("pactfix.toml")));
    }

    #[test]
    fn user_file_applies_outside_projects() {
        let (_tmp, root) = repository();
        let user = TempDir::new().unwrap();
        fs::write(user.path().join("config.toml"), "").unwrap();
        let roots = SearchRoots {
            user_dir: Some(user.path().to_path_buf()),
        };

        let origin = locate(&root, None, &roots);
        assert_eq!(origin, ConfigOrigin::User(user.path().join("config.toml")));

        fs::write(root.join(".pactfix.toml"), "").unwrap();
        assert!(matches!(locate(&root, None, &roots), ConfigOrigin::Project(_)));
    }

    #[test]
    fn empty_user_dir_means_defaults() {
        let (_tmp, root) = repository();
        let user = TempDir::new().unwrap();
        let roots = SearchRoots {
            user_dir: Some(user.path().to_path_buf()),
        };
        assert_eq!(locate(&root, None, &roots), ConfigOrigin::Defaults);
        assert!(ConfigOrigin::Defaults.file().is_none());
    }

    #[test]
    fn defaults_resolve_against_the_start_directory() {
        let (_tmp, root) = repository();
        let src = dir(&root, "src");
        let loaded = load_with(&src, None, &no_user_dir()).unwrap();
        assert_eq!(loaded.origin, ConfigOrigin::Defaults);
        assert_eq!(loaded.base_dir, src);
        assert!(loaded.config.engine.builtin_rules);
    }

    #[test]
    fn relative_paths_start_at_the_config_file() {
        let (_tmp, root) = repository();
        fs::write(
            root.join(".pactfix.toml"),
            "preset = \"strict\"\n\n[engine]\ncatalogs = [\"rules/team.toml\"]\n",
        )
        .unwrap();

        let loaded = load_with(&dir(&root, "src"), None, &no_user_dir()).unwrap();
        assert_eq!(loaded.base_dir, root);
        assert_eq!(loaded.config.preset.as_deref(), Some("strict"));
        assert_eq!(loaded.config.engine.catalogs, [PathBuf::from("rules/team.toml")]);
    }

    #[test]
    fn broken_project_file_is_reported_with_its_path() {
        let (_tmp, root) = repository();
        fs::write(root.join("pactfix.toml"), "preset = [").unwrap();
        let err = load_with(&root, None, &no_user_dir()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to load config"));
        assert!(err.to_string().contains("pactfix.toml"));
    }

    #[test]
    fn missing_flag_file_is_an_error() {
        let (_tmp, root) = repository();
        let missing = root.join("missing.toml");
        assert!(load_with(&root, Some(&missing), &no_user_dir()).is_err());
    }
}
