use std::ffi::OsString;
use std::path::{Path, PathBuf};

mod relocate;

pub use relocate::RelocateMode;

/// Anything smaller is not treated as a wallpaper
pub const MIN_WIDTH: u32 = 640;
pub const MIN_HEIGHT: u32 = 480;

/// Reads pixel dimensions of a file, `None` when it is not an image.
pub trait DimensionProbe {
    fn dimensions(&self, path: &Path) -> Option<(u32, u32)>;
}

/// Reads dimensions from the image header only (no full decode).
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageHeaderProbe;

impl DimensionProbe for ImageHeaderProbe {
    fn dimensions(&self, path: &Path) -> Option<(u32, u32)> {
        if !crate::utils::is_image_file(path) {
            return None;
        }
        match image::image_dimensions(path) {
            Ok(dims) => Some(dims),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "not a readable image");
                None
            }
        }
    }
}

/// Why a path did not become a [`Wallpaper`]
#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    #[error("not an image")]
    NotAnImage,

    #[error("too small to be a wallpaper ({width}x{height})")]
    TooSmall { width: u32, height: u32 },

    #[error("cannot resolve path: {0}")]
    Unresolvable(#[from] std::io::Error),
}

/// One image file found during a scan
#[derive(Debug, Clone, PartialEq)]
pub struct Wallpaper {
    pub path: PathBuf,
    /// Directory currently holding the file
    pub dir: PathBuf,
    pub filename: OsString,
    pub width: u32,
    pub height: u32,
    /// width / height, 0 for zero-height images
    pub ratio: f64,
    /// Directory the file was last planned to go to
    pub destination: Option<PathBuf>,
}

impl Wallpaper {
    /// Probe `path` and build a wallpaper if it is a large enough image.
    pub fn discover(path: &Path, probe: &dyn DimensionProbe) -> Result<Self, DiscoverError> {
        let path = std::path::absolute(path)?;
        let (Some(filename), Some(dir)) = (path.file_name(), path.parent()) else {
            return Err(DiscoverError::NotAnImage);
        };

        let (width, height) = probe
            .dimensions(&path)
            .ok_or(DiscoverError::NotAnImage)?;
        if width < MIN_WIDTH || height < MIN_HEIGHT {
            return Err(DiscoverError::TooSmall { width, height });
        }

        Ok(Self {
            filename: filename.to_os_string(),
            dir: dir.to_path_buf(),
            width,
            height,
            ratio: crate::classify::ratio(width, height),
            destination: None,
            path,
        })
    }

    /// "1920x1080" style resolution string
    pub fn resolution(&self, separator: char) -> String {
        format!("{}{}{}", self.width, separator, self.height)
    }

    /// Display name for messages
    pub fn name(&self) -> String {
        self.filename.to_string_lossy().into_owned()
    }
}
