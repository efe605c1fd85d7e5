//! Fix command implementation.

use anyhow::{Context, Result};
use pactfix::{FixOutcome, FixReport, ScanReport};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

use super::{open_session, output, Status};
use crate::{OutputFormat, TargetArgs};

/// Flags of the fix command.
#[derive(Debug, Clone, Copy)]
pub struct FixOptions {
    /// Report rewrites without writing files.
    pub dry_run: bool,
    /// Insert a comment above fixed lines.
    pub annotate: bool,
    /// Override of `engine.max-fix-passes`.
    pub max_passes: Option<usize>,
    /// Format of the residual report.
    pub format: OutputFormat,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonFixReport<'a> {
    dry_run: bool,
    #[serde(flatten)]
    report: &'a FixReport,
}

/// Runs the fix command.
pub fn run(target: &TargetArgs, options: &FixOptions, config_path: Option<&Path>) -> Result<Status> {
    let session = open_session(target, config_path, |config| {
        if options.annotate {
            config.engine.annotate_fixes = true;
        }
        if let Some(passes) = options.max_passes {
            config.engine.max_fix_passes = passes;
        }
    })?;

    let mut report = session.engine.fix(&session.inputs);
    report.files_skipped += session.notes.len();
    report.notes.extend(session.notes);

    if !options.dry_run {
        for outcome in report.changed() {
            std::fs::write(&outcome.path, &outcome.text)
                .with_context(|| format!("Failed to write {}", outcome.path.display()))?;
            tracing::debug!("Wrote {}", outcome.path.display());
        }
    }

    if options.format == OutputFormat::Json {
        let json = JsonFixReport {
            dry_run: options.dry_run,
            report: &report,
        };
        println!("{}", output::render_json(&json)?);
    } else {
        print!("{}", render_changes(&report, options.dry_run));
        let residual = residual_report(&report);
        let source = |path: &Path| {
            report
                .outcomes
                .iter()
                .find(|o| o.path == path)
                .map(|o| o.text.clone())
        };
        output::print(&residual, options.format, &source)?;
    }

    Ok(if report.residual().is_empty() {
        Status::Clean
    } else {
        Status::Findings
    })
}

/// Lists every changed file with its rewrites and warnings.
fn render_changes(report: &FixReport, dry_run: bool) -> String {
    let verb = if dry_run { "Would fix" } else { "Fixed" };
    let mut out = String::new();
    for outcome in &report.outcomes {
        if outcome.changed {
            let _ = writeln!(
                out,
                "{verb} {} ({} fix(es))",
                outcome.path.display(),
                outcome.applied.len()
            );
            if dry_run {
                render_rewrites(outcome, &mut out);
            }
        }
        for warning in &outcome.warnings {
            let _ = writeln!(out, "warning: {}: {warning}", outcome.path.display());
        }
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn render_rewrites(outcome: &FixOutcome, out: &mut String) {
    for fix in &outcome.applied {
        let _ = writeln!(out, "  {}: [{}] {}", fix.line, fix.rule_id, fix.description);
        for line in fix.before.lines() {
            let _ = writeln!(out, "  - {line}");
        }
        for line in fix.after.lines() {
            let _ = writeln!(out, "  + {line}");
        }
    }
}

fn residual_report(report: &FixReport) -> ScanReport {
    let mut residual = ScanReport::new();
    residual.diagnostics = report.residual().into_iter().cloned().collect();
    residual.notes = report.notes.clone();
    residual.files_scanned = report.outcomes.len();
    residual.files_skipped = report.files_skipped;
    residual
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactfix::{AppliedFix, Language};
    use std::path::PathBuf;

    fn outcome(dry_text: &str) -> FixOutcome {
        FixOutcome {
            path: PathBuf::from("src/app.js"),
            language: Language::JavaScript,
            text: dry_text.to_string(),
            changed: true,
            applied: vec![AppliedFix {
                rule_id: "JS001".to_string(),
                line: 1,
                description: "replace var with let".to_string(),
                before: "var a = 1;".to_string(),
                after: "let a = 1;".to_string(),
            }],
            residual: Vec::new(),
            rejected: Vec::new(),
            passes: 1,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn dry_run_shows_each_rewrite() {
        let report = FixReport {
            outcomes: vec![outcome("let a = 1;\n")],
            ..FixReport::default()
        };
        insta::assert_snapshot!(render_changes(&report, true).trim_end(), @r"
        Would fix src/app.js (1 fix(es))
          1: [JS001] replace var with let
          - var a = 1;
          + let a = 1;
        ");
    }

    #[test]
    fn written_files_are_listed_without_rewrites() {
        let report = FixReport {
            outcomes: vec![outcome("let a = 1;\n")],
            ..FixReport::default()
        };
        assert_eq!(render_changes(&report, false), "Fixed src/app.js (1 fix(es))\n\n");
    }

    #[test]
    fn unchanged_runs_print_nothing() {
        assert!(render_changes(&FixReport::default(), false).is_empty());
    }
}
