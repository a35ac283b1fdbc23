//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod annotations;
pub mod check;
pub mod init;
pub mod tags;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::Settings;
use crate::document::FileSystemDocuments;
use crate::storage::JsonStore;

/// Loaded settings plus the workspace they point at.
pub struct Workspace {
    pub settings: Settings,
    pub documents: FileSystemDocuments,
}

impl Workspace {
    pub fn new(settings: Settings) -> Self {
        let documents = FileSystemDocuments::new(settings.resolved_root());
        Self {
            settings,
            documents,
        }
    }

    pub fn open_store(&self) -> anyhow::Result<JsonStore> {
        let path = self.settings.resolved_store_path();
        JsonStore::open(&path)
            .with_context(|| format!("Failed to open annotation store {}", path.display()))
    }

    /// Workspace-relative form of a path given on the command line.
    pub fn relative(&self, arg: &Path) -> anyhow::Result<PathBuf> {
        let absolute = if arg.is_absolute() {
            arg.to_path_buf()
        } else {
            std::env::current_dir()
                .context("Cannot determine current directory")?
                .join(arg)
        };
        Ok(self.documents.relative(&absolute))
    }
}
