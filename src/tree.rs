//! In-memory snapshot of a wallpaper directory.
//!
//! A node is filled once by [`DirNode::scan`]. Afterwards only its parent
//! removes children from it, mirroring what the sorter did on disk.

use crate::error::{SortError, SortResult};
use crate::wallpaper::{DimensionProbe, Wallpaper};
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub struct DirNode {
    pub path: PathBuf,
    pub name: String,
    /// Keyed by the raw entry name; lossy names are for display only.
    dirs: BTreeMap<OsString, DirNode>,
    files: BTreeMap<OsString, Wallpaper>,
    /// Entries we do not manage: non-images, unreadable entries,
    /// sub-directories skipped by a non-recursive scan.
    untracked: usize,
    /// Images that were processed but are still physically here.
    residents: usize,
}

impl DirNode {
    /// List `path` once, probing files and descending into sub-directories
    /// when `recursive` is set.
    pub fn scan(path: &Path, recursive: bool, probe: &dyn DimensionProbe) -> SortResult<Self> {
        let path = std::path::absolute(path).map_err(|e| SortError::io(path, e))?;
        if !path.is_dir() {
            return Err(SortError::InvalidArgument(format!(
                "'{}' is not a directory",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut node = Self {
            path: path.clone(),
            name,
            dirs: BTreeMap::new(),
            files: BTreeMap::new(),
            untracked: 0,
            residents: 0,
        };

        for entry in WalkDir::new(&path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                    return Err(SortError::io(&path, source));
                }
                Err(e) => {
                    tracing::warn!(dir = %path.display(), error = %e, "skipping unreadable entry");
                    node.untracked += 1;
                    continue;
                }
            };

            let entry_name = entry.file_name().to_os_string();

            if entry.file_type().is_dir() {
                if !recursive {
                    node.untracked += 1;
                    continue;
                }
                match Self::scan(entry.path(), recursive, probe) {
                    Ok(child) => {
                        node.dirs.insert(entry_name, child);
                    }
                    Err(e) => {
                        tracing::warn!(
                            dir = %entry.path().display(),
                            error = %e,
                            "cannot scan directory"
                        );
                        node.untracked += 1;
                    }
                }
                continue;
            }

            match Wallpaper::discover(entry.path(), probe) {
                Ok(wp) => {
                    node.files.insert(entry_name, wp);
                }
                Err(e) => {
                    tracing::trace!(file = %entry.path().display(), reason = %e, "not a wallpaper");
                    node.untracked += 1;
                }
            }
        }

        tracing::debug!(
            dir = %node.path.display(),
            images = node.files.len(),
            dirs = node.dirs.len(),
            other = node.untracked,
            "scanned directory"
        );
        Ok(node)
    }

    /// True when nothing is left here, neither tracked nor untracked.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty() && self.untracked == 0 && self.residents == 0
    }

    #[cfg(test)]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    #[cfg(test)]
    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }

    #[cfg(test)]
    pub fn file(&self, name: &str) -> Option<&Wallpaper> {
        self.files.get(OsStr::new(name))
    }

    #[cfg(test)]
    pub fn child(&self, name: &str) -> Option<&DirNode> {
        self.dirs.get(OsStr::new(name))
    }

    pub fn child_mut(&mut self, name: &OsStr) -> Option<&mut DirNode> {
        self.dirs.get_mut(name)
    }

    /// Names of sub-directories, in name order.
    pub fn child_names(&self) -> Vec<OsString> {
        self.dirs.keys().cloned().collect()
    }

    /// Take every image out of this node for processing.
    pub fn take_files(&mut self) -> Vec<Wallpaper> {
        std::mem::take(&mut self.files).into_values().collect()
    }

    /// Record that a processed image is still in this directory.
    pub fn keep_resident(&mut self) {
        self.residents += 1;
    }

    /// Detach the child `name` and, when `remove_on_disk`, delete its
    /// (empty) directory. A failed removal leaves the directory counted here.
    pub fn remove_child(
        &mut self,
        name: &OsStr,
        remove_on_disk: bool,
    ) -> SortResult<Option<DirNode>> {
        let Some(child) = self.dirs.remove(name) else {
            return Ok(None);
        };

        if remove_on_disk {
            if let Err(source) = fs::remove_dir(&child.path) {
                self.untracked += 1;
                return Err(SortError::DirectoryRemoval {
                    path: child.path,
                    source,
                });
            }
        }

        Ok(Some(child))
    }

    /// Indented listing of directories and images, used by spider runs.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        out.push_str(&format!("{}{}/\n", indent, self.name));
        for child in self.dirs.values() {
            child.render_into(out, depth + 1);
        }
        for wp in self.files.values() {
            out.push_str(&format!(
                "{}  {} ({}x{}, {:.3})\n",
                indent,
                wp.name(),
                wp.width,
                wp.height,
                wp.ratio
            ));
        }
    }
}
