use crate::classify::{self, RatioTarget, RatioTargets};
use crate::error::{SortError, SortResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sorting: SortingConfig,
    /// Ratio table, checked in this order
    #[serde(default = "default_ratios")]
    pub ratios: Vec<RatioEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortingConfig {
    /// Maximum absolute difference for a ratio to count as a match
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Character between width and height ("1920x1080")
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Replace same-named files at the destination
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
    #[serde(default)]
    pub recursive: bool,
}

/// One `[[ratios]]` entry: `ratio = "16:9"`, `label = "HDTV"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioEntry {
    pub ratio: String,
    pub label: String,
}

fn default_threshold() -> f64 {
    classify::DEFAULT_THRESHOLD
}

fn default_separator() -> String {
    classify::DEFAULT_SEPARATOR.to_string()
}

fn default_overwrite() -> bool {
    true
}

fn default_ratios() -> Vec<RatioEntry> {
    [
        ("16:9", "HDTV"),
        ("16:10", "Wide Screen"),
        ("4:3", "Normal Screen"),
        ("5:4", "Normal Screen"),
    ]
    .iter()
    .map(|&(ratio, label)| RatioEntry {
        ratio: ratio.to_string(),
        label: label.to_string(),
    })
    .collect()
}

impl Default for SortingConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            separator: default_separator(),
            overwrite: default_overwrite(),
            recursive: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sorting: SortingConfig::default(),
            ratios: default_ratios(),
        }
    }
}

impl Config {
    /// Return the path to the configuration file.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "sortpaper", "sortpaper")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Load config from the default location, creating it if missing.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            Self::read_or_default(&path)
        } else {
            let config = Config::default();
            if let Err(e) = config.save_to(&path) {
                tracing::debug!(
                    path = %path.display(),
                    error = %e,
                    "could not write default config"
                );
            }
            Ok(config)
        }
    }

    /// Load an explicitly requested config file; it must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.is_file() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        Self::read_or_default(path)
    }

    fn read_or_default(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        match toml::from_str::<Config>(&data) {
            Ok(config) => Ok(config),
            Err(e) => {
                eprintln!(
                    "Warning: Failed to parse config at {}: {}",
                    path.display(),
                    e
                );
                eprintln!("Using default configuration.");
                Ok(Config::default())
            }
        }
    }

    /// Save config to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = toml::to_string_pretty(self)?;
        fs::write(path, data)?;

        Ok(())
    }

    /// Parse the `[[ratios]]` table into ordered targets.
    pub fn ratio_targets(&self) -> SortResult<RatioTargets> {
        let targets = self
            .ratios
            .iter()
            .map(|entry| {
                Ok(RatioTarget {
                    ratio: classify::parse_ratio(&entry.ratio)?,
                    label: entry.label.trim().to_string(),
                })
            })
            .collect::<SortResult<Vec<_>>>()?;

        RatioTargets::new(targets).map_err(|e| match e {
            SortError::Config(msg) => SortError::Config(format!("[[ratios]]: {}", msg)),
            other => other,
        })
    }
}
