use super::Wallpaper;
use crate::error::{SortError, SortResult};
use std::fs;
use std::io;
use std::path::Path;

/// How a relocation should behave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocateMode {
    /// Copy instead of move
    pub copy: bool,
    /// Replace a same-named file at the destination
    pub overwrite: bool,
    /// Only report what would happen
    pub dry_run: bool,
}

impl Default for RelocateMode {
    fn default() -> Self {
        Self {
            copy: false,
            overwrite: true,
            dry_run: false,
        }
    }
}

impl Wallpaper {
    /// Move or copy this file into `dest_dir`.
    ///
    /// Returns `true` when the file was (or, in dry-run, would be) relocated,
    /// `false` when it is already there or a same-named file blocks it and
    /// overwriting is off. On failure the recorded path is left unchanged.
    pub fn relocate(&mut self, dest_dir: &Path, mode: RelocateMode) -> SortResult<bool> {
        match fs::metadata(dest_dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(SortError::InvalidArgument(format!(
                    "'{}' is not a directory",
                    dest_dir.display()
                )))
            }
            // A dry run never creates the destination, so it may be missing.
            Err(_) if mode.dry_run => {}
            Err(_) => {
                return Err(SortError::InvalidArgument(format!(
                    "destination '{}' does not exist",
                    dest_dir.display()
                )))
            }
        }

        if fs::symlink_metadata(&self.path).is_err() {
            return Err(SortError::NotFound(self.path.clone()));
        }

        let dest_dir = std::path::absolute(dest_dir).map_err(|e| SortError::io(dest_dir, e))?;
        if same_entry(&dest_dir, &self.dir) {
            return Ok(false);
        }

        self.destination = Some(dest_dir.clone());
        let target = dest_dir.join(&self.filename);

        if fs::symlink_metadata(&target).is_ok() {
            if !mode.overwrite {
                tracing::debug!(target = %target.display(), "destination exists, not overwriting");
                return Ok(false);
            }
            if !mode.dry_run {
                fs::remove_file(&target).map_err(|source| SortError::Relocation {
                    from: self.path.clone(),
                    to: target.clone(),
                    source,
                })?;
            }
        }

        if mode.dry_run {
            return Ok(true);
        }

        let result = if mode.copy {
            fs::copy(&self.path, &target).map(|_| ())
        } else {
            move_file(&self.path, &target)
        };
        result.map_err(|source| SortError::Relocation {
            from: self.path.clone(),
            to: target.clone(),
            source,
        })?;

        tracing::debug!(
            from = %self.path.display(),
            to = %target.display(),
            copy = mode.copy,
            "relocated"
        );
        self.path = target;
        self.dir = dest_dir;
        Ok(true)
    }
}

/// Rename, falling back to copy + remove when the rename fails
/// (e.g. across filesystems).
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::debug!(error = %e, "rename failed, falling back to copy+remove");
            fs::copy(from, to)?;
            if let Err(e) = fs::remove_file(from) {
                let _ = fs::remove_file(to);
                return Err(e);
            }
            Ok(())
        }
    }
}

/// Whether two paths name the same directory on disk.
fn same_entry(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
