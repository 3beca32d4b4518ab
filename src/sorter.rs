//! Drives a sorting run: scan, classify, relocate, prune.

use crate::classify::classify;
use crate::error::SortResult;
use crate::options::{SortOptions, Target};
use crate::planner::DestinationPlanner;
use crate::tree::DirNode;
use crate::wallpaper::{DimensionProbe, Wallpaper};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

/// Counters for one run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub targets: usize,
    pub scanned: usize,
    pub moved: usize,
    pub copied: usize,
    /// Already in place or blocked by an existing file
    pub skipped: usize,
    /// Resolution mode misses
    pub left_in_place: usize,
    pub failed: usize,
    pub dirs_removed: usize,
    pub dry_run: bool,
}

impl RunSummary {
    fn merge(&mut self, other: RunSummary) {
        self.targets += other.targets;
        self.scanned += other.scanned;
        self.moved += other.moved;
        self.copied += other.copied;
        self.skipped += other.skipped;
        self.left_in_place += other.left_in_place;
        self.failed += other.failed;
        self.dirs_removed += other.dirs_removed;
    }
}

/// Whether an image is still in the directory it was found in
enum Outcome {
    Left,
    Stayed,
}

/// Mutable bookkeeping of one target
#[derive(Default)]
struct TargetState {
    summary: RunSummary,
    /// Every destination directory used so far; none of them, nor their
    /// parents, may be pruned.
    destinations: BTreeSet<PathBuf>,
}

impl TargetState {
    fn holds_destination(&self, dir: &Path) -> bool {
        self.destinations.iter().any(|d| d.starts_with(dir))
    }
}

pub struct Sorter<'a> {
    options: &'a SortOptions,
    probe: &'a dyn DimensionProbe,
}

impl<'a> Sorter<'a> {
    pub fn new(options: &'a SortOptions, probe: &'a dyn DimensionProbe) -> Self {
        Self { options, probe }
    }

    /// Sort every target; a failing target is reported and the rest continue.
    pub fn run(&self) -> RunSummary {
        let mut total = RunSummary {
            dry_run: self.options.dry_run,
            ..RunSummary::default()
        };

        if self.options.dry_run {
            self.say("Spider mode: nothing will be changed");
        }

        for target in &self.options.targets {
            match self.sort_target(target) {
                Ok(summary) => total.merge(summary),
                Err(e) => {
                    tracing::warn!(
                        target = %target.source.display(),
                        error = %e,
                        "cannot sort target"
                    );
                    total.failed += 1;
                }
            }
        }

        total
    }

    pub fn sort_target(&self, target: &Target) -> SortResult<RunSummary> {
        let mut root = DirNode::scan(&target.source, self.options.recursive, self.probe)?;
        if self.options.dry_run {
            self.say(root.render().trim_end());
        }

        let planner = DestinationPlanner::new(
            target.dest.clone(),
            root.path.clone(),
            self.options.mode.labels(),
            self.options.flatten,
        );

        let mut state = TargetState::default();
        state.summary.targets = 1;
        self.process_dir(&mut root, &planner, &mut state);

        let prunable = root.is_empty() && !state.holds_destination(&root.path);
        if prunable && !self.options.no_delete {
            self.say(format!("Removing {} since it's empty", root.path.display()));
            if !self.options.removes_directories() {
                state.summary.dirs_removed += 1;
            } else {
                match fs::remove_dir(&root.path) {
                    Ok(()) => state.summary.dirs_removed += 1,
                    Err(e) => {
                        tracing::warn!(
                            dir = %root.path.display(),
                            error = %e,
                            "cannot remove directory"
                        );
                        state.summary.failed += 1;
                    }
                }
            }
        }

        Ok(state.summary)
    }

    /// Files first, then sub-directories depth-first; emptied
    /// sub-directories are pruned through this node.
    fn process_dir(
        &self,
        node: &mut DirNode,
        planner: &DestinationPlanner,
        state: &mut TargetState,
    ) {
        self.say(format!("Processing directory {}", node.path.display()));

        for wp in node.take_files() {
            state.summary.scanned += 1;
            let path = wp.path.clone();
            match self.process_image(wp, planner, state) {
                Ok(Outcome::Left) => {}
                Ok(Outcome::Stayed) => node.keep_resident(),
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "cannot relocate image");
                    state.summary.failed += 1;
                    node.keep_resident();
                }
            }
        }

        for name in node.child_names() {
            let Some(child) = node.child_mut(&name) else {
                continue;
            };
            self.process_dir(child, planner, state);

            let prunable = child.is_empty() && !state.holds_destination(&child.path);
            if !prunable || self.options.no_delete {
                continue;
            }

            self.say(format!("Removing {} since it's empty", child.path.display()));
            match node.remove_child(&name, self.options.removes_directories()) {
                Ok(_) => state.summary.dirs_removed += 1,
                Err(e) => {
                    tracing::warn!(error = %e, "cannot prune directory");
                    state.summary.failed += 1;
                }
            }
        }
    }

    fn process_image(
        &self,
        mut wp: Wallpaper,
        planner: &DestinationPlanner,
        state: &mut TargetState,
    ) -> SortResult<Outcome> {
        let classification = classify(
            wp.width,
            wp.height,
            &self.options.mode,
            self.options.threshold,
        );
        let Some(label) = classification.folder() else {
            tracing::debug!(
                file = %wp.path.display(),
                resolution = %wp.resolution(self.options.separator),
                "no matching resolution, leaving in place"
            );
            state.summary.left_in_place += 1;
            return Ok(Outcome::Stayed);
        };

        let dest = if self.options.dry_run {
            planner.plan(&wp.dir, label)?
        } else {
            planner.destination_for(&wp.dir, label)?
        };
        state.destinations.insert(dest.clone());

        let mode = self.options.relocate_mode();
        let from = wp.path.clone();

        if !wp.relocate(&dest, mode)? {
            state.summary.skipped += 1;
            if wp.destination.is_some() {
                self.say(format!(
                    "Skipping {}: {} already exists",
                    from.display(),
                    dest.join(&wp.filename).display()
                ));
            } else {
                self.say(format!("Skipping {}: already in place", from.display()));
            }
            return Ok(Outcome::Stayed);
        }

        let verb = if mode.copy { "Copying" } else { "Relocating" };
        self.say(format!(
            "{} {} to {}",
            verb,
            from.display(),
            dest.join(&wp.filename).display()
        ));

        if mode.copy {
            state.summary.copied += 1;
            Ok(Outcome::Stayed)
        } else {
            state.summary.moved += 1;
            Ok(Outcome::Left)
        }
    }

    fn say(&self, msg: impl Display) {
        if !self.options.quiet {
            println!("{}", msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{RatioTarget, RatioTargets, ResolutionTargets, TargetMode};
    use crate::test_support::{touch, FakeProbe};
    use tempfile::TempDir;

    fn ratio_options(root: &Path, targets: &[(f64, &str)]) -> SortOptions {
        let targets = RatioTargets::new(
            targets
                .iter()
                .map(|&(ratio, label)| RatioTarget {
                    ratio,
                    label: label.to_string(),
                })
                .collect(),
        )
        .unwrap();
        SortOptions {
            targets: vec![Target {
                source: root.to_path_buf(),
                dest: root.to_path_buf(),
            }],
            mode: TargetMode::Ratio(targets),
            threshold: 0.0001,
            separator: 'x',
            recursive: true,
            flatten: false,
            no_delete: false,
            dry_run: false,
            quiet: true,
            overwrite: true,
        }
    }

    fn probe() -> FakeProbe {
        FakeProbe::new()
            .with("a.jpg", 1920, 1080)
            .with("b.jpg", 800, 600)
            .with("cat.jpg", 1920, 1200)
            .with("odd.jpg", 2560, 1080)
            .with("xga.jpg", 1024, 768)
    }

    #[test]
    fn test_sorts_by_ratio() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("wallpapers");
        touch(&root.join("a.jpg"));
        touch(&root.join("b.jpg"));

        let opts = ratio_options(&root, &[(16.0 / 9.0, "HDTV"), (4.0 / 3.0, "Normal")]);
        let summary = Sorter::new(&opts, &probe()).run();

        assert!(root.join("HDTV").join("a.jpg").is_file());
        assert!(root.join("Normal").join("b.jpg").is_file());
        assert!(!root.join("a.jpg").exists());
        assert_eq!(summary.moved, 2);
        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.failed, 0);
    }

    #[test]
    fn test_nested_tree_is_preserved_and_pruned() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("wallpapers");
        touch(&root.join("Animals").join("cat.jpg"));

        let opts = ratio_options(&root, &[(1.6, "WideScreen")]);
        let summary = Sorter::new(&opts, &probe()).run();

        assert!(root.join("WideScreen").join("Animals").join("cat.jpg").is_file());
        assert!(!root.join("Animals").exists());
        assert_eq!(summary.dirs_removed, 1);
        assert!(root.is_dir(), "root holds the new label folder");
    }

    #[test]
    fn test_unmatched_goes_to_non_matching() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("wallpapers");
        touch(&root.join("odd.jpg"));

        let opts = ratio_options(&root, &[(16.0 / 9.0, "HDTV")]);
        Sorter::new(&opts, &probe()).run();
        assert!(root.join("Non-matching").join("odd.jpg").is_file());
    }

    #[test]
    fn test_second_run_moves_nothing() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("wallpapers");
        touch(&root.join("a.jpg"));
        touch(&root.join("Animals").join("cat.jpg"));
        touch(&root.join("odd.jpg"));

        let opts = ratio_options(&root, &[(16.0 / 9.0, "HDTV"), (1.6, "WideScreen")]);
        let first = Sorter::new(&opts, &probe()).run();
        assert_eq!(first.moved, 3);

        let second = Sorter::new(&opts, &probe()).run();
        assert_eq!(second.moved, 0);
        assert_eq!(second.skipped, 3);
        assert_eq!(second.dirs_removed, 0);
        assert!(root.join("WideScreen").join("Animals").join("cat.jpg").is_file());
        assert!(!root.join("WideScreen").join("WideScreen").exists());
    }

    #[test]
    fn test_resolution_mode_leaves_misses() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("wallpapers");
        let out = tmp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        touch(&root.join("a.jpg"));
        touch(&root.join("xga.jpg"));

        let mut opts = ratio_options(&root, &[(1.0, "unused")]);
        let resolutions = ResolutionTargets::parse("1920x1080:1440x900", 'x').unwrap();
        opts.mode = TargetMode::Resolution(resolutions);
        opts.targets[0].dest = out.clone();
        let summary = Sorter::new(&opts, &probe()).run();

        assert!(out.join("1920x1080").join("a.jpg").is_file());
        assert!(root.join("xga.jpg").is_file());
        assert_eq!(summary.left_in_place, 1);
        assert!(root.is_dir());
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("wallpapers");
        touch(&root.join("Animals").join("cat.jpg"));

        let mut opts = ratio_options(&root, &[(1.6, "WideScreen")]);
        opts.dry_run = true;
        let summary = Sorter::new(&opts, &probe()).run();

        assert!(root.join("Animals").join("cat.jpg").is_file());
        assert!(!root.join("WideScreen").exists());
        assert_eq!(summary.moved, 1);
        assert_eq!(summary.dirs_removed, 1);
        assert!(summary.dry_run);
    }

    #[test]
    fn test_no_delete_copies_and_keeps_folders() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("wallpapers");
        touch(&root.join("Animals").join("cat.jpg"));

        let mut opts = ratio_options(&root, &[(1.6, "WideScreen")]);
        opts.no_delete = true;
        let summary = Sorter::new(&opts, &probe()).run();

        assert!(root.join("Animals").join("cat.jpg").is_file());
        assert!(root.join("WideScreen").join("Animals").join("cat.jpg").is_file());
        assert_eq!(summary.copied, 1);
        assert_eq!(summary.dirs_removed, 0);
    }

    #[test]
    fn test_no_overwrite_skips_existing() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("wallpapers");
        touch(&root.join("a.jpg"));
        fs::create_dir_all(root.join("HDTV")).unwrap();
        fs::write(root.join("HDTV").join("a.jpg"), b"older").unwrap();

        let mut opts = ratio_options(&root, &[(16.0 / 9.0, "HDTV")]);
        opts.overwrite = false;
        let summary = Sorter::new(&opts, &probe()).run();

        assert!(root.join("a.jpg").is_file());
        assert_eq!(fs::read(root.join("HDTV").join("a.jpg")).unwrap(), b"older");
        // the blocked file plus the one already filed under HDTV
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.moved, 0);
    }

    #[test]
    fn test_separate_destination_removes_emptied_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("incoming");
        let out = tmp.path().join("sorted");
        fs::create_dir_all(&out).unwrap();
        touch(&root.join("Animals").join("cat.jpg"));

        let mut opts = ratio_options(&root, &[(1.6, "WideScreen")]);
        opts.targets[0].dest = out.clone();
        let summary = Sorter::new(&opts, &probe()).run();

        assert!(out.join("WideScreen").join("Animals").join("cat.jpg").is_file());
        assert!(!root.exists());
        assert_eq!(summary.dirs_removed, 2);
    }

    #[test]
    fn test_foreign_files_keep_directory() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("wallpapers");
        touch(&root.join("Animals").join("cat.jpg"));
        touch(&root.join("Animals").join("readme.txt"));

        let opts = ratio_options(&root, &[(1.6, "WideScreen")]);
        let summary = Sorter::new(&opts, &probe()).run();

        assert!(root.join("Animals").join("readme.txt").is_file());
        assert_eq!(summary.dirs_removed, 0);
        assert_eq!(summary.failed, 0);
    }

    #[test]
    fn test_non_recursive_leaves_subdirectories() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("wallpapers");
        touch(&root.join("a.jpg"));
        touch(&root.join("Animals").join("cat.jpg"));

        let mut opts = ratio_options(&root, &[(16.0 / 9.0, "HDTV"), (1.6, "WideScreen")]);
        opts.recursive = false;
        Sorter::new(&opts, &probe()).run();

        assert!(root.join("HDTV").join("a.jpg").is_file());
        assert!(root.join("Animals").join("cat.jpg").is_file());
    }

    #[test]
    fn test_flatten_into_other_destination() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("incoming");
        let out = tmp.path().join("sorted");
        fs::create_dir_all(&out).unwrap();
        touch(&root.join("Animals").join("cat.jpg"));

        let mut opts = ratio_options(&root, &[(1.6, "WideScreen")]);
        opts.targets[0].dest = out.clone();
        opts.flatten = true;
        Sorter::new(&opts, &probe()).run();

        assert!(out.join("Animals").join("cat.jpg").is_file());
    }

    #[test]
    fn test_destination_inside_target_is_stable() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("wallpapers");
        let sorted = root.join("sorted");
        fs::create_dir_all(&sorted).unwrap();
        touch(&root.join("a.jpg"));

        let mut opts = ratio_options(&root, &[(16.0 / 9.0, "HDTV")]);
        opts.targets[0].dest = sorted.clone();

        let first = Sorter::new(&opts, &probe()).run();
        assert_eq!(first.moved, 1);
        assert!(sorted.join("HDTV").join("a.jpg").is_file());

        for _ in 0..2 {
            let again = Sorter::new(&opts, &probe()).run();
            assert_eq!(again.moved, 0);
            assert_eq!(again.skipped, 1);
        }
        assert!(sorted.join("HDTV").join("a.jpg").is_file());
        assert!(!sorted.join("HDTV").join("sorted").exists());
    }

    #[test]
    fn test_failed_image_does_not_stop_the_walk() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("wallpapers");
        touch(&root.join("Animals").join("a.jpg"));
        touch(&root.join("Animals").join("b.jpg"));
        // A plain file where the HDTV folder would go
        fs::write(root.join("HDTV"), b"in the way").unwrap();

        let opts = ratio_options(&root, &[(16.0 / 9.0, "HDTV"), (4.0 / 3.0, "Normal")]);
        let summary = Sorter::new(&opts, &probe()).run();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.moved, 1);
        assert!(root.join("Normal").join("Animals").join("b.jpg").is_file());
        assert!(root.join("Animals").join("a.jpg").is_file());
        assert_eq!(summary.dirs_removed, 0);
    }

    #[test]
    fn test_missing_target_counts_as_failure() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("gone");
        let opts = ratio_options(&root, &[(1.6, "WideScreen")]);
        let summary = Sorter::new(&opts, &probe()).run();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.targets, 0);
    }

    #[test]
    fn test_summary_serializes() {
        let summary = RunSummary {
            moved: 2,
            ..RunSummary::default()
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["moved"], 2);
        assert_eq!(json["dry_run"], false);
    }
}
