//! Shared output formatting for reports.

use anyhow::Result;
use pactfix::{DiagnosticReport, ScanReport, Severity};
use serde::Serialize;
use std::fmt::Write;
use std::io::IsTerminal;
use std::path::Path;

use crate::OutputFormat;

/// Print a report in the specified format.
///
/// `source` returns the text a diagnostic's file had when it was found; the
/// pretty format falls back to text blocks without it.
pub fn print(
    report: &ScanReport,
    format: OutputFormat,
    source: &dyn Fn(&Path) -> Option<String>,
) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_text(report, std::io::stdout().is_terminal())),
        OutputFormat::Json => println!("{}", render_json(report)?),
        OutputFormat::Compact => print!("{}", render_compact(report)),
        OutputFormat::Pretty => print_pretty(report, source),
    }
    Ok(())
}

/// One block per diagnostic, one line per note, then a summary line.
pub fn render_text(report: &ScanReport, color: bool) -> String {
    let mut out = String::new();
    for diagnostic in &report.diagnostics {
        out.push_str(&diagnostic.format());
        out.push('\n');
    }
    render_notes(report, &mut out);
    out.push_str(&summary(report, color));
    out.push('\n');
    out
}

/// `file:line:col: severity [ID] message`, one line per diagnostic.
pub fn render_compact(report: &ScanReport) -> String {
    report
        .diagnostics
        .iter()
        .fold(String::new(), |mut out, d| {
            let _ = writeln!(out, "{d}");
            out
        })
}

/// Pretty-printed JSON.
pub fn render_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn print_pretty(report: &ScanReport, source: &dyn Fn(&Path) -> Option<String>) {
    for diagnostic in &report.diagnostics {
        match source(&diagnostic.file) {
            Some(text) => {
                let rendered = miette::Report::new(DiagnosticReport::new(diagnostic, text));
                println!("{rendered:?}");
            }
            None => println!("{}", diagnostic.format()),
        }
    }
    let mut notes = String::new();
    render_notes(report, &mut notes);
    print!("{notes}");
    println!("{}", summary(report, std::io::stdout().is_terminal()));
}

fn render_notes(report: &ScanReport, out: &mut String) {
    for note in &report.notes {
        let _ = writeln!(
            out,
            "{}: skipped {}: {}",
            note.level(),
            note.file.display(),
            note.message
        );
    }
    if !report.notes.is_empty() {
        out.push('\n');
    }
}

fn summary(report: &ScanReport, color: bool) -> String {
    let counts = report.counts();
    let text = if counts.total() == 0 {
        format!("No issues found in {} file(s)", report.files_scanned)
    } else {
        format!("Found {counts} in {} file(s)", report.files_scanned)
    };
    if !color {
        return text;
    }
    let code = match report.diagnostics.iter().map(|d| d.severity).max() {
        Some(Severity::Security | Severity::Error) => "\x1b[31m",
        Some(Severity::Warning) => "\x1b[33m",
        Some(Severity::Info) => "\x1b[34m",
        None => "\x1b[32m",
    };
    format!("{code}{text}\x1b[0m")
}
