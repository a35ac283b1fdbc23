//! Annotation commands (annotate, list, remove, mv).

use std::path::Path;

use anyhow::{Context, bail};

use super::Workspace;
use super::tags::resolve_tag;
use crate::storage::JsonStore;
use crate::tracking::{AnnotationDraft, RangeTracker};
use crate::types::{Annotation, Position, TextRange};

pub fn run_annotate(
    workspace: &Workspace,
    file: &Path,
    start: Position,
    end: Position,
    tags: &[String],
    note: Option<String>,
) -> anyhow::Result<()> {
    let mut store = workspace.open_store()?;
    let relative = workspace.relative(file)?;

    let mut tag_ids = Vec::with_capacity(tags.len());
    for key in tags {
        match resolve_tag(&store, key) {
            Some(tag) => tag_ids.push(tag.id.clone()),
            None => bail!("No tag named or with id '{key}'. Create it with 'tagmire tags add {key}'"),
        }
    }

    let doc = workspace
        .documents
        .load(&relative)
        .with_context(|| format!("Cannot read {}", file.display()))?;

    let mut draft = AnnotationDraft::new(&relative, TextRange { start, end }, tag_ids);
    if let Some(note) = note {
        draft = draft.with_note(note);
    }
    let annotation = draft.capture(&doc, workspace.settings.tracking.context_lines)?;

    println!(
        "Annotated {} {} ({})",
        relative.display(),
        annotation.range(),
        annotation.id
    );
    store.add_annotation(annotation)?;
    Ok(())
}

pub fn run_list(
    workspace: &Workspace,
    file: Option<&Path>,
    tag: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let store = workspace.open_store()?;

    let mut annotations: Vec<&Annotation> = match tag {
        Some(key) => match resolve_tag(&store, key) {
            Some(tag) => store.annotations_for_tag(&tag.id),
            None => bail!("No tag named or with id '{key}'"),
        },
        None => store.annotations().iter().collect(),
    };
    if let Some(file) = file {
        let relative = workspace.relative(file)?;
        annotations.retain(|a| a.file_path == relative);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&annotations)?);
        return Ok(());
    }

    if annotations.is_empty() {
        println!("No annotations.");
        return Ok(());
    }

    for annotation in annotations {
        println!("{}", describe(&store, annotation));
    }
    Ok(())
}

fn describe(store: &JsonStore, annotation: &Annotation) -> String {
    let tags: Vec<&str> = annotation
        .tag_ids
        .iter()
        .map(|id| store.tag(id).map_or(id.as_str(), |t| t.name.as_str()))
        .collect();

    let mut line = format!(
        "{}:{} [{}] {}",
        annotation.file_path.display(),
        annotation.range(),
        tags.join(", "),
        annotation.id
    );
    if !annotation.note.is_empty() {
        line.push_str(&format!("\n    {}", annotation.note));
    }
    line
}

pub fn run_remove(workspace: &Workspace, file: &Path, position: Position) -> anyhow::Result<()> {
    let mut store = workspace.open_store()?;
    let relative = workspace.relative(file)?;

    let ids: Vec<_> = store
        .annotations_at(&relative, position)
        .into_iter()
        .map(|a| a.id.clone())
        .collect();
    if ids.is_empty() {
        bail!("No annotation covers {}:{position}", relative.display());
    }

    for id in &ids {
        store.delete_annotation(id)?;
        println!("Removed {id}");
    }
    Ok(())
}

pub fn run_mv(workspace: &Workspace, old: &Path, new: &Path) -> anyhow::Result<()> {
    let store = workspace.open_store()?;
    let old = workspace.relative(old)?;
    let new = workspace.relative(new)?;

    let mut tracker = RangeTracker::new(store);
    let report = tracker.files_renamed(&[(old.clone(), new.clone())])?;
    if report.renamed == 0 {
        println!("No annotations on {}", old.display());
    } else {
        println!(
            "Moved {} annotations from {} to {}",
            report.renamed,
            old.display(),
            new.display()
        );
    }

    // Ranges may be stale if the file was edited along with the move
    if workspace.documents.absolute(&new).exists() {
        let doc = workspace.documents.load(&new)?;
        let checked = tracker.document_opened(&new, &doc)?;
        if !checked.is_unchanged() {
            println!("Reanchored {} annotations", checked.persisted);
        }
    }

    Ok(())
}
