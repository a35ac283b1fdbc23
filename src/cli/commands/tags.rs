//! Tag management commands (tags add, edit, list, delete).

use anyhow::bail;

use super::Workspace;
use crate::cli::TagAction;
use crate::storage::JsonStore;
use crate::types::{Tag, TagId};

/// Find a tag by id, or by name ignoring case.
pub fn resolve_tag<'a>(store: &'a JsonStore, key: &str) -> Option<&'a Tag> {
    store
        .tag(&TagId::new(key))
        .or_else(|| store.tags().iter().find(|t| t.name.eq_ignore_ascii_case(key)))
}

pub fn run_tags(workspace: &Workspace, action: TagAction) -> anyhow::Result<()> {
    let mut store = workspace.open_store()?;

    match action {
        TagAction::Add {
            name,
            color,
            description,
        } => {
            if resolve_tag(&store, &name).is_some() {
                bail!("Tag '{name}' already exists");
            }
            let tag = store.create_tag(&name, color, description)?;
            println!("Created tag {} ({}) {}", tag.name, tag.id, tag.color);
        }

        TagAction::Edit {
            tag,
            name,
            color,
            description,
        } => {
            let Some(id) = resolve_tag(&store, &tag).map(|t| t.id.clone()) else {
                bail!("No tag named or with id '{tag}'");
            };
            if name.is_none() && color.is_none() && description.is_none() {
                bail!("Nothing to change. Pass --name, --color, or --description");
            }
            if let Some(new_name) = &name {
                if resolve_tag(&store, new_name).is_some_and(|other| other.id != id) {
                    bail!("Tag '{new_name}' already exists");
                }
            }
            let updated = store.update_tag(&id, name, color, description)?;
            println!("Updated tag {} ({}) {}", updated.name, updated.id, updated.color);
        }

        TagAction::List => {
            if store.tags().is_empty() {
                println!("No tags. Create one with 'tagmire tags add <name>'.");
                return Ok(());
            }
            for tag in store.tags() {
                let uses = store
                    .annotations()
                    .iter()
                    .filter(|a| a.has_tag(&tag.id))
                    .count();
                print!("{:<20} {} {}  {uses} annotations", tag.name, tag.id, tag.color);
                if tag.description.is_empty() {
                    println!();
                } else {
                    println!("  - {}", tag.description);
                }
            }
        }

        TagAction::Delete { tag } => {
            let Some(id) = resolve_tag(&store, &tag).map(|t| t.id.clone()) else {
                bail!("No tag named or with id '{tag}'");
            };
            let dropped = store.delete_tag(&id)?;
            println!("Deleted tag {tag}");
            if dropped > 0 {
                println!("Removed {dropped} annotations left without tags");
            }
        }
    }

    Ok(())
}
