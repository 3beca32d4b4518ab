use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sortpaper")]
#[command(author = "MrMattias")]
#[command(version)]
#[command(about = "Sort wallpapers into folders by resolution or aspect ratio")]
pub(crate) struct Cli {
    /// Directories to sort
    #[arg(required = true, value_name = "TARGET")]
    pub(crate) targets: Vec<PathBuf>,

    /// Character between width and height in resolutions [default: x]
    #[arg(long = "res-sep", value_name = "CHAR")]
    pub(crate) res_sep: Option<String>,

    /// Resolutions to extract, e.g. "1920x1080:1920x1200:1440x900" (requires --dest)
    #[arg(long = "res", visible_alias = "resolutions", value_name = "LIST")]
    pub(crate) resolutions: Option<String>,

    /// Destination folder. Repeat it or separate with ':' for several targets;
    /// empty or missing entries default to the target itself
    #[arg(long = "dest", value_name = "DIR")]
    pub(crate) dest: Vec<String>,

    /// Process TARGET recursively
    #[arg(short = 'r')]
    pub(crate) recursive: bool,

    /// Do not create a folder per resolution / ratio
    #[arg(short = 'f')]
    pub(crate) flatten: bool,

    /// Copy files instead of moving them and never delete folders
    #[arg(long = "nd", visible_alias = "no-delete")]
    pub(crate) no_delete: bool,

    /// Crawl TARGET and report every action without changing anything
    #[arg(short, long)]
    pub(crate) spider: bool,

    /// Print as little as possible
    #[arg(short, long)]
    pub(crate) quiet: bool,

    /// How far a ratio may deviate and still match (above 0.01 risks
    /// misplacing images) [default: 0.0001]
    #[arg(short, long, value_name = "FLOAT")]
    pub(crate) threshold: Option<f64>,

    /// Do not overwrite files that already exist at the destination
    #[arg(long)]
    pub(crate) no_overwrite: bool,

    /// Use this config file instead of the default one
    #[arg(long, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}
