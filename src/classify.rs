//! Aspect ratio and resolution classification.
//!
//! Pure functions: given pixel dimensions and the active target set, decide
//! which folder (if any) an image belongs to. No I/O happens here.

use crate::error::{SortError, SortResult};

/// Folder for images that match none of the configured ratios
pub const NO_MATCH_LABEL: &str = "Non-matching";

/// Default maximum absolute difference between two ratios
pub const DEFAULT_THRESHOLD: f64 = 0.0001;

/// Default character between width and height ("1920x1080")
pub const DEFAULT_SEPARATOR: char = 'x';

/// Width divided by height. A zero height yields 0 instead of dividing.
pub fn ratio(width: u32, height: u32) -> f64 {
    if height == 0 {
        0.0
    } else {
        width as f64 / height as f64
    }
}

/// Outcome of classifying one image
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// A configured ratio or resolution matched
    Matched(String),
    /// Ratio mode found nothing close enough
    Unmatched,
    /// Resolution mode found nothing; the image stays where it is
    LeaveInPlace,
}

impl Classification {
    /// Folder name the image should be filed under, `None` when it stays put.
    pub fn folder(&self) -> Option<&str> {
        match self {
            Classification::Matched(label) => Some(label),
            Classification::Unmatched => Some(NO_MATCH_LABEL),
            Classification::LeaveInPlace => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatioTarget {
    pub ratio: f64,
    pub label: String,
}

/// Ordered ratio table. Lookup order is insertion order so tie-breaks are
/// reproducible between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioTargets {
    targets: Vec<RatioTarget>,
}

impl RatioTargets {
    pub fn new(targets: Vec<RatioTarget>) -> SortResult<Self> {
        if targets.is_empty() {
            return Err(SortError::Config("no ratio targets configured".into()));
        }
        for target in &targets {
            validate_label(&target.label)?;
            if !target.ratio.is_finite() || target.ratio < 0.0 {
                return Err(SortError::Config(format!(
                    "ratio for '{}' must be a finite, non-negative number",
                    target.label
                )));
            }
        }
        Ok(Self { targets })
    }

    /// 16:9, 16:10, 4:3 and 5:4, the usual desktop shapes.
    pub fn stock() -> Self {
        let stock = [
            (16.0 / 9.0, "HDTV"),
            (16.0 / 10.0, "Wide Screen"),
            (4.0 / 3.0, "Normal Screen"),
            (5.0 / 4.0, "Normal Screen"),
        ];
        Self {
            targets: stock
                .iter()
                .map(|&(ratio, label)| RatioTarget {
                    ratio,
                    label: label.to_string(),
                })
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RatioTarget> {
        self.targets.iter()
    }

    /// Exact hit first, then the first target strictly within `threshold`.
    pub fn find(&self, ratio: f64, threshold: f64) -> Option<&str> {
        if let Some(exact) = self.targets.iter().find(|t| t.ratio == ratio) {
            return Some(&exact.label);
        }
        self.targets
            .iter()
            .find(|t| (t.ratio - ratio).abs() < threshold)
            .map(|t| t.label.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionTarget {
    pub width: u32,
    pub height: u32,
    pub label: String,
}

/// Exact resolutions requested by the operator, keyed by "WIDTH<sep>HEIGHT".
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionTargets {
    separator: char,
    targets: Vec<ResolutionTarget>,
}

impl ResolutionTargets {
    /// Parse a colon separated list such as `"1920x1080:1440x900"`.
    ///
    /// Each entry may carry its own folder name (`"1920x1080=Full HD"`);
    /// otherwise the entry text is the folder name. When an entry does not
    /// contain `separator`, the first non-digit character is used instead.
    pub fn parse(list: &str, separator: char) -> SortResult<Self> {
        let mut targets = Vec::new();

        for entry in list.split(':').map(str::trim).filter(|e| !e.is_empty()) {
            let (resolution, label) = match entry.split_once('=') {
                Some((res, label)) => (res.trim(), label.trim()),
                None => (entry, entry),
            };

            let sep = if resolution.contains(separator) {
                separator
            } else {
                infer_separator(resolution).ok_or_else(|| {
                    SortError::Config(format!(
                        "resolution '{}' is not in WIDTH{}HEIGHT format",
                        resolution, separator
                    ))
                })?
            };

            let (width, height): (u32, u32) = resolution
                .split_once(sep)
                .and_then(|(w, h)| Some((w.trim().parse().ok()?, h.trim().parse().ok()?)))
                .ok_or_else(|| {
                    SortError::Config(format!(
                        "resolution '{}' is not in WIDTH{}HEIGHT format",
                        resolution, separator
                    ))
                })?;

            validate_label(label)?;
            targets.push(ResolutionTarget {
                width,
                height,
                label: label.to_string(),
            });
        }

        if targets.is_empty() {
            return Err(SortError::Config("no resolutions given".into()));
        }

        Ok(Self { separator, targets })
    }

    #[cfg(test)]
    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolutionTarget> {
        self.targets.iter()
    }

    /// Format dimensions the way lookup keys are built.
    pub fn key(&self, width: u32, height: u32) -> String {
        format!("{}{}{}", width, self.separator, height)
    }

    pub fn lookup(&self, width: u32, height: u32) -> Option<&str> {
        let wanted = self.key(width, height);
        self.targets
            .iter()
            .find(|t| self.key(t.width, t.height) == wanted)
            .map(|t| t.label.as_str())
    }
}

/// Which target set drives this run
#[derive(Debug, Clone, PartialEq)]
pub enum TargetMode {
    Ratio(RatioTargets),
    Resolution(ResolutionTargets),
}

impl TargetMode {
    /// Every folder name this mode can produce.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = match self {
            TargetMode::Ratio(targets) => {
                let mut labels: Vec<String> = targets.iter().map(|t| t.label.clone()).collect();
                labels.push(NO_MATCH_LABEL.to_string());
                labels
            }
            TargetMode::Resolution(targets) => targets.iter().map(|t| t.label.clone()).collect(),
        };
        labels.sort();
        labels.dedup();
        labels
    }
}

/// Classify an image of `width` x `height` against the active targets.
pub fn classify(width: u32, height: u32, mode: &TargetMode, threshold: f64) -> Classification {
    match mode {
        TargetMode::Resolution(targets) => match targets.lookup(width, height) {
            Some(label) => Classification::Matched(label.to_string()),
            None => Classification::LeaveInPlace,
        },
        TargetMode::Ratio(targets) => match targets.find(ratio(width, height), threshold) {
            Some(label) => Classification::Matched(label.to_string()),
            None => Classification::Unmatched,
        },
    }
}

/// Parse a ratio written as `"16:9"`, `"16/9"` or a plain number.
pub fn parse_ratio(text: &str) -> SortResult<f64> {
    let text = text.trim();
    let invalid = || SortError::Config(format!("'{}' is not a valid ratio", text));

    let value = match text.split_once([':', '/']) {
        Some((w, h)) => {
            let w: f64 = w.trim().parse().map_err(|_| invalid())?;
            let h: f64 = h.trim().parse().map_err(|_| invalid())?;
            if h == 0.0 {
                0.0
            } else {
                w / h
            }
        }
        None => text.parse().map_err(|_| invalid())?,
    };

    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(invalid())
    }
}

/// First character that is not an ASCII digit.
pub fn infer_separator(text: &str) -> Option<char> {
    text.chars().find(|c| !c.is_ascii_digit())
}

/// Labels become folder names, so they must be a single path component.
pub fn validate_label(label: &str) -> SortResult<()> {
    if label.trim().is_empty()
        || label == "."
        || label == ".."
        || label.contains('/')
        || label.contains('\\')
    {
        return Err(SortError::Config(format!(
            "'{}' cannot be used as a folder name",
            label
        )));
    }
    Ok(())
}
