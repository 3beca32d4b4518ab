//! Destination paths that keep the original folder layout.
//!
//! An image found in `<top>/Animals/Cats` and classified as `HDTV` ends up in
//! `<dest>/HDTV/Animals/Cats`.

use crate::error::{SortError, SortResult};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Components leading from `top_level` down to `path`, root first.
///
/// Returns an empty list when both are the same directory.
pub fn relative_tree(top_level: &Path, path: &Path) -> SortResult<Vec<OsString>> {
    if !top_level.is_dir() {
        return Err(SortError::InvalidArgument(format!(
            "top level '{}' is not an existing directory",
            top_level.display()
        )));
    }

    let mut tree = Vec::new();
    let mut current = path;
    while current != top_level {
        let (Some(name), Some(parent)) = (current.file_name(), current.parent()) else {
            return Err(SortError::InvalidArgument(format!(
                "'{}' is not inside '{}'",
                path.display(),
                top_level.display()
            )));
        };
        tree.push(name.to_os_string());
        current = parent;
    }

    tree.reverse();
    Ok(tree)
}

/// Join `components` onto `root`, creating each missing directory.
pub fn build_tree<S: AsRef<Path>>(root: &Path, components: &[S]) -> SortResult<PathBuf> {
    if !root.is_dir() {
        return Err(SortError::InvalidArgument(format!(
            "'{}' is not an existing directory",
            root.display()
        )));
    }

    let mut path = root.to_path_buf();
    for component in components {
        path.push(component);
        match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                // Symlinks to directories are fine; anything else is in the way.
                if !path.is_dir() {
                    return Err(SortError::InvalidArgument(format!(
                        "'{}' exists and is not a directory",
                        path.display()
                    )));
                }
            }
            Err(_) => match fs::create_dir(&path) {
                Ok(()) => tracing::debug!(dir = %path.display(), "created directory"),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(SortError::io(&path, e)),
            },
        }
    }

    Ok(path)
}

/// Computes where images of one target directory go.
#[derive(Debug, Clone)]
pub struct DestinationPlanner {
    dest_root: PathBuf,
    top_level: PathBuf,
    labels: Vec<String>,
    flatten: bool,
}

impl DestinationPlanner {
    /// `labels` lists every folder name the run can produce; a relative tree
    /// that already starts with one of them is re-labelled instead of nested.
    pub fn new(dest_root: PathBuf, top_level: PathBuf, labels: Vec<String>, flatten: bool) -> Self {
        Self {
            dest_root,
            top_level,
            labels,
            flatten,
        }
    }

    /// Folder components below the destination root for an image in
    /// `current_dir` filed under `label`.
    ///
    /// Images already below a destination root that sits inside the top
    /// level are measured from the destination root, so a sorted folder
    /// maps back onto itself.
    pub fn tree_for(&self, current_dir: &Path, label: &str) -> SortResult<Vec<OsString>> {
        let inside_dest =
            self.dest_root != self.top_level && current_dir.starts_with(&self.dest_root);
        let base = if inside_dest {
            &self.dest_root
        } else {
            &self.top_level
        };
        let mut tree = relative_tree(base, current_dir)?;

        if let Some(first) = tree.first() {
            if self.labels.iter().any(|l| first.as_os_str() == l.as_str()) {
                tree.remove(0);
            }
        }

        if !self.flatten {
            tree.insert(0, OsString::from(label));
        }

        Ok(tree)
    }

    /// Destination directory without touching the filesystem.
    pub fn plan(&self, current_dir: &Path, label: &str) -> SortResult<PathBuf> {
        let tree = self.tree_for(current_dir, label)?;
        Ok(tree.iter().fold(self.dest_root.clone(), |path, c| path.join(c)))
    }

    /// Destination directory, created on disk if needed.
    pub fn destination_for(&self, current_dir: &Path, label: &str) -> SortResult<PathBuf> {
        let tree = self.tree_for(current_dir, label)?;
        build_tree(&self.dest_root, &tree)
    }
}
