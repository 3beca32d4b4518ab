//! The resolved, immutable settings of one run.
//!
//! Built once from the command line and the config file; every component
//! receives it by reference and nothing changes it afterwards.

use crate::classify::{ResolutionTargets, TargetMode, DEFAULT_SEPARATOR};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::{SortError, SortResult};
use crate::wallpaper::RelocateMode;
use std::path::{Path, PathBuf};

/// A directory to sort and where its images go
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub source: PathBuf,
    pub dest: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SortOptions {
    pub targets: Vec<Target>,
    pub mode: TargetMode,
    pub threshold: f64,
    pub separator: char,
    pub recursive: bool,
    /// No per-classification folder
    pub flatten: bool,
    /// Copy instead of move; keep every folder
    pub no_delete: bool,
    /// Report only, change nothing
    pub dry_run: bool,
    pub quiet: bool,
    pub overwrite: bool,
}

impl SortOptions {
    /// Merge command line and config file into run options.
    ///
    /// Targets that are not directories are dropped with a warning; having
    /// none left is an error.
    pub fn from_cli(cli: &Cli, config: &Config) -> SortResult<Self> {
        let raw_separator = cli.res_sep.as_deref().unwrap_or(&config.sorting.separator);
        let separator = resolve_separator(raw_separator)?;

        let threshold = cli.threshold.unwrap_or(config.sorting.threshold);
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(SortError::Config(format!(
                "threshold must be a positive number, got {}",
                threshold
            )));
        }

        let mode = match &cli.resolutions {
            Some(list) => TargetMode::Resolution(ResolutionTargets::parse(list, separator)?),
            None => TargetMode::Ratio(config.ratio_targets()?),
        };

        let sources: Vec<PathBuf> = cli
            .targets
            .iter()
            .map(|t| normalize(&t.to_string_lossy()))
            .collect::<SortResult<_>>()?;
        let dests = resolve_destinations(&cli.dest, &sources, &mode)?;

        let targets: Vec<Target> = sources
            .into_iter()
            .zip(dests)
            .filter(|(source, _)| {
                let ok = source.is_dir();
                if !ok {
                    tracing::warn!(
                        target = %source.display(),
                        "target is not a directory, skipping"
                    );
                }
                ok
            })
            .map(|(source, dest)| Target { source, dest })
            .collect();

        if targets.is_empty() {
            return Err(SortError::Config(
                "the TARGET or TARGETS must be a path to a directory".into(),
            ));
        }

        Ok(Self {
            targets,
            mode,
            threshold,
            separator,
            recursive: cli.recursive || config.sorting.recursive,
            flatten: cli.flatten,
            no_delete: cli.no_delete,
            dry_run: cli.spider,
            quiet: cli.quiet,
            overwrite: !cli.no_overwrite && config.sorting.overwrite,
        })
    }

    /// Relocation behaviour for every image of the run.
    ///
    /// Dry-run wins over everything: with both `--spider` and `--nd` nothing
    /// is copied either.
    pub fn relocate_mode(&self) -> RelocateMode {
        RelocateMode {
            copy: self.no_delete,
            overwrite: self.overwrite,
            dry_run: self.dry_run,
        }
    }

    /// Emptied directories are removed only when neither switch is set.
    pub fn removes_directories(&self) -> bool {
        !self.no_delete && !self.dry_run
    }
}

/// Single character separator; anything longer falls back to `x`.
fn resolve_separator(raw: &str) -> SortResult<char> {
    let mut chars = raw.chars();
    let separator = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => {
            tracing::warn!(separator = raw, "separator must be a single character, using 'x'");
            DEFAULT_SEPARATOR
        }
    };

    if separator.is_ascii_digit() || separator == ':' || separator == '=' {
        return Err(SortError::Config(format!(
            "'{}' cannot be used as a resolution separator",
            separator
        )));
    }
    Ok(separator)
}

/// Pair each target with its destination.
///
/// Resolution mode sends everything to the first destination. Otherwise
/// destinations are matched to targets by position and empty or missing
/// entries fall back to the target itself.
fn resolve_destinations(
    raw: &[String],
    sources: &[PathBuf],
    mode: &TargetMode,
) -> SortResult<Vec<PathBuf>> {
    let entries: Vec<&str> = raw
        .iter()
        .flat_map(|d| d.split(':'))
        .map(str::trim)
        .collect();

    let dests: Vec<PathBuf> = match mode {
        TargetMode::Resolution(_) => {
            let first = entries
                .iter()
                .find(|e| !e.is_empty())
                .ok_or_else(|| SortError::Config("--res requires --dest".into()))?;
            let dest = normalize(first)?;
            vec![dest; sources.len()]
        }
        TargetMode::Ratio(_) => {
            if entries.len() > sources.len() {
                return Err(SortError::Config(format!(
                    "{} destinations given for {} targets",
                    entries.len(),
                    sources.len()
                )));
            }
            sources
                .iter()
                .enumerate()
                .map(|(i, source)| match entries.get(i) {
                    Some(entry) if !entry.is_empty() => normalize(entry),
                    _ => Ok(source.clone()),
                })
                .collect::<SortResult<_>>()?
        }
    };

    for dest in &dests {
        if !dest.is_dir() && sources.iter().all(|s| s != dest) {
            return Err(SortError::Config(format!(
                "destination '{}' must be an existing directory",
                dest.display()
            )));
        }
    }

    Ok(dests)
}

/// Expand `~` and make the path absolute.
fn normalize(raw: &str) -> SortResult<PathBuf> {
    let expanded = crate::utils::expand_tilde(raw);
    std::path::absolute(&expanded).map_err(|e| SortError::io(Path::new(raw), e))
}
