//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

use super::Status;

const DEFAULT_CONFIG: &str = r#"# pactfix configuration

# minimal | recommended | strict
preset = "recommended"

[engine]
# Glob patterns to exclude from analysis
exclude = [
    "**/vendor/**",
    "**/node_modules/**",
]

# Respect .gitignore files
respect-gitignore = true

# Worker threads (default: one per core)
# parallelism = 4

# Fix passes per file before giving up
max-fix-passes = 8

# Insert a comment above every fixed line
annotate-fixes = false

# Note files no language matched
report-unknown-languages = false

# Load the built-in rules
builtin-rules = true

# Scan every file as one language instead of classifying it
# force-language = "yaml"

# Extra catalog documents, relative to this file
# catalogs = ["rules/team.toml"]

# Rule overrides, keyed by rule id

# [rules.JS003]
# enabled = false

# [rules.PHP005]
# severity = "error"

# [rules.GO001]
# min-confidence = 0.9
"#;

/// Config file written by `init`.
const CONFIG_NAME: &str = "pactfix.toml";

/// Runs the init command in `dir`.
pub fn run(dir: &Path, force: bool) -> Result<Status> {
    let config_path = dir.join(CONFIG_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created {CONFIG_NAME}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_NAME} to configure rules");
    println!("  2. Run: pactfix check");
    println!("  3. Run: pactfix fix --dry-run");

    Ok(Status::Clean)
}
