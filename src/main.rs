mod classify;
mod cli;
mod cli_cmds;
mod config;
mod error;
mod options;
mod planner;
mod sorter;
#[cfg(test)]
mod test_support;
mod tree;
mod utils;
mod wallpaper;

use anyhow::Result;

fn main() -> Result<()> {
    cli::run()
}
