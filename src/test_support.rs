//! Shared fixtures for unit tests.

use crate::wallpaper::DimensionProbe;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Probe that answers from a table keyed by file name.
#[derive(Debug, Default)]
pub struct FakeProbe {
    sizes: HashMap<String, (u32, u32)>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, width: u32, height: u32) -> Self {
        self.sizes.insert(name.to_string(), (width, height));
        self
    }
}

impl DimensionProbe for FakeProbe {
    fn dimensions(&self, path: &Path) -> Option<(u32, u32)> {
        let name = path.file_name()?.to_str()?;
        self.sizes.get(name).copied()
    }
}

/// Create `path` (and its parents) with placeholder content.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"img").unwrap();
}
