//! Check command: validate annotations against files on disk.

use std::path::{Path, PathBuf};

use super::Workspace;
use crate::storage::{AnnotationStore, JsonStore};
use crate::tracking::{RangeTracker, TrackingReport};

/// Outcome for one file.
pub struct FileCheck {
    pub path: PathBuf,
    pub report: Option<TrackingReport>,
}

/// Run document-open validation on each file, or on every annotated file
/// when `files` is empty. Missing files are reported with no report.
pub fn check_files(
    workspace: &Workspace,
    tracker: &mut RangeTracker<JsonStore>,
    files: &[PathBuf],
) -> anyhow::Result<Vec<FileCheck>> {
    let targets = if files.is_empty() {
        tracker.store().tracked_files()
    } else {
        files
            .iter()
            .map(|f| workspace.relative(f))
            .collect::<anyhow::Result<Vec<_>>>()?
    };

    let mut results = Vec::with_capacity(targets.len());
    for path in targets {
        let report = match workspace.documents.load(&path) {
            Ok(doc) => Some(tracker.document_opened(&path, &doc)?),
            Err(e) => {
                tracing::warn!("[check] cannot read {}: {e}", path.display());
                None
            }
        };
        results.push(FileCheck { path, report });
    }
    Ok(results)
}

pub fn run_check(workspace: &Workspace, files: &[PathBuf]) -> anyhow::Result<()> {
    let mut tracker = RangeTracker::new(workspace.open_store()?);
    let results = check_files(workspace, &mut tracker, files)?;

    let mut lost = 0;
    for FileCheck { path, report } in &results {
        match report {
            None => println!("{}: missing", path.display()),
            Some(report) => {
                print_report(path, report);
                lost += report.not_found.len();
            }
        }
    }

    if lost > 0 {
        println!("{lost} annotations could not be located and keep their last position");
    }
    Ok(())
}

fn print_report(path: &Path, report: &TrackingReport) {
    if report.reanchor_attempts == 0 {
        println!("{}: ok", path.display());
        return;
    }
    println!(
        "{}: {} reanchored, {} not found",
        path.display(),
        report.reanchored.len(),
        report.not_found.len()
    );
    for id in &report.not_found {
        println!("    not found: {id}");
    }
}
