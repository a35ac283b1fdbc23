//! Maps watched absolute paths back to the workspace-relative paths that
//! annotations are stored under, and computes the directories to watch.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Registry of annotated files.
#[derive(Debug)]
pub struct PathRegistry {
    root: PathBuf,
    /// absolute -> relative
    paths: HashMap<PathBuf, PathBuf>,
    /// Parent directories of tracked files (absolute).
    watch_dirs: HashSet<PathBuf>,
}

impl PathRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            paths: HashMap::new(),
            watch_dirs: HashSet::new(),
        }
    }

    /// Register workspace-relative paths, returning directories that
    /// weren't previously being watched.
    pub fn add_paths(&mut self, relative: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
        let mut new_dirs = Vec::new();

        for rel in relative {
            let absolute = self.root.join(&rel);
            let parent = absolute
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.root.clone());

            if self.paths.insert(absolute, rel).is_none() && self.watch_dirs.insert(parent.clone())
            {
                new_dirs.push(parent);
            }
        }

        new_dirs
    }

    /// Replace the tracked set, returning directories not watched before.
    ///
    /// Directories are never unwatched; a stale directory only costs
    /// ignored events.
    pub fn rebuild(&mut self, relative: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
        let previous = std::mem::take(&mut self.watch_dirs);
        self.paths.clear();
        self.add_paths(relative);

        let new_dirs = self.watch_dirs.difference(&previous).cloned().collect();
        self.watch_dirs.extend(previous);
        new_dirs
    }

    /// Workspace-relative path of a watched absolute path.
    pub fn relative(&self, absolute: &Path) -> Option<&Path> {
        self.paths.get(absolute).map(PathBuf::as_path)
    }

    pub fn contains(&self, absolute: &Path) -> bool {
        self.paths.contains_key(absolute)
    }

    /// Workspace-relative form of any path under the root.
    pub fn to_relative(&self, absolute: &Path) -> Option<PathBuf> {
        absolute.strip_prefix(&self.root).ok().map(Path::to_path_buf)
    }

    /// Tracked files as `(absolute, relative)`.
    pub fn paths(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.paths
            .iter()
            .map(|(abs, rel)| (abs.as_path(), rel.as_path()))
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn dir_count(&self) -> usize {
        self.watch_dirs.len()
    }
}
