//! Check command implementation.

use anyhow::Result;
use std::path::Path;

use super::{open_session, output, Status};
use crate::{OutputFormat, TargetArgs};

/// Runs the check command.
pub fn run(target: &TargetArgs, format: OutputFormat, config_path: Option<&Path>) -> Result<Status> {
    let session = open_session(target, config_path, |_| {})?;

    let mut report = session.engine.scan(&session.inputs);
    report.files_skipped += session.notes.len();
    report.notes.extend(session.notes);

    let source = |path: &Path| {
        session
            .inputs
            .iter()
            .find(|input| input.path == path)
            .map(|input| String::from_utf8_lossy(&input.bytes).into_owned())
    };
    output::print(&report, format, &source)?;

    Ok(if report.has_diagnostics() {
        Status::Findings
    } else {
        Status::Clean
    })
}
