use std::path::PathBuf;

/// Errors raised by the sorting engine.
///
/// Per-file variants are caught by the sorter and reported; only `Config`
/// aborts a run, and it does so before anything on disk is touched.
#[derive(Debug, thiserror::Error)]
pub enum SortError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to relocate {} to {}: {source}", from.display(), to.display())]
    Relocation {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove directory {}: {source}", path.display())]
    DirectoryRemoval {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SortError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            SortError::NotFound(path)
        } else {
            SortError::Io { path, source }
        }
    }
}

pub type SortResult<T> = std::result::Result<T, SortError>;
