//! List rules command implementation.

use anyhow::{Context, Result};
use pactfix::{available_catalog, standard_catalog, Config, Language, RuleCatalog, Severity};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

use super::{output, Status};
use crate::{config_resolver, ListFormat};

/// One row of the listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RuleSummary<'a> {
    id: &'a str,
    name: &'a str,
    language: Language,
    severity: Severity,
    message: &'a str,
    fixable: bool,
    enabled: bool,
}

/// Runs the list-rules command.
pub fn run(languages: &[Language], format: ListFormat, config_path: Option<&Path>) -> Result<Status> {
    let loaded = config_resolver::load(Path::new("."), config_path)?;
    let (available, active) = catalogs(&loaded.config, &loaded.base_dir)?;
    let rows = summaries(&available, &active, &loaded.config, languages);

    match format {
        ListFormat::Text => print!("{}", render_table(&rows)),
        ListFormat::Json => println!("{}", output::render_json(&rows)?),
    }
    Ok(Status::Clean)
}

/// Every loadable rule, and the rules the configuration runs.
fn catalogs(config: &Config, base_dir: &Path) -> Result<(RuleCatalog, RuleCatalog)> {
    let available = available_catalog(config, base_dir).context("Failed to load rules")?;
    let active = standard_catalog(config, base_dir).context("Failed to load rules")?;
    Ok((available, active))
}

fn summaries<'a>(
    available: &'a RuleCatalog,
    active: &RuleCatalog,
    config: &Config,
    languages: &[Language],
) -> Vec<RuleSummary<'a>> {
    available
        .iter()
        .filter(|rule| languages.is_empty() || languages.contains(&rule.language()))
        .map(|rule| {
            let id = rule.id().as_str();
            RuleSummary {
                id,
                name: rule.name(),
                language: rule.language(),
                severity: config.rule_severity(id).unwrap_or(rule.severity()),
                message: rule.message(),
                fixable: rule.is_fixable(),
                enabled: active.get(rule.language(), id).is_some() && config.is_rule_enabled(id),
            }
        })
        .collect()
}

fn render_table(rows: &[RuleSummary<'_>]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<9} {:<11} {:<9} {:<4} {:<3} Name",
        "ID", "Language", "Severity", "Fix", "On"
    );
    let _ = writeln!(out, "{}", "-".repeat(72));
    for row in rows {
        let _ = writeln!(
            out,
            "{:<9} {:<11} {:<9} {:<4} {:<3} {}",
            row.id,
            row.language.id(),
            row.severity.as_str(),
            if row.fixable { "yes" } else { "-" },
            if row.enabled { "on" } else { "-" },
            row.name,
        );
    }
    let enabled = rows.iter().filter(|r| r.enabled).count();
    let _ = writeln!(out, "\n{} rule(s), {enabled} enabled", rows.len());

    out.push_str("\nPresets:\n");
    out.push_str("  minimal      - security and error rules (for gradual adoption)\n");
    out.push_str("  recommended  - warnings and above (default)\n");
    out.push_str("  strict       - every rule\n");
    out.push_str("\nUse --rules to filter specific rules, e.g.:\n");
    out.push_str("  pactfix check --rules PHP002,JS001\n");
    out.push_str("  pactfix check --rules loose-null-comparison\n");
    out
}
