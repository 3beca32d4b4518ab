use anyhow::Result;

use crate::options::SortOptions;
use crate::sorter::{RunSummary, Sorter};
use crate::wallpaper::ImageHeaderProbe;

pub fn cmd_sort(options: &SortOptions, json: bool) -> Result<()> {
    let summary = Sorter::new(options, &ImageHeaderProbe).run();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !options.quiet {
        print_summary(&summary);
    }

    if summary.failed > 0 {
        eprintln!("{} item(s) could not be processed", summary.failed);
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let heading = if summary.dry_run {
        "Spider run finished, nothing was changed:"
    } else {
        "Sorting finished:"
    };
    println!();
    println!("{}", heading);
    println!("  Scanned:       {}", summary.scanned);
    println!("  Moved:         {}", summary.moved);
    println!("  Copied:        {}", summary.copied);
    println!("  Skipped:       {}", summary.skipped);
    println!("  Left in place: {}", summary.left_in_place);
    println!("  Dirs removed:  {}", summary.dirs_removed);
    println!("  Failed:        {}", summary.failed);
}
