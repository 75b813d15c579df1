//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;
use clap_num::number_range;

/// Upper bound accepted for `--jobs`
const MAX_JOBS: usize = 64;

fn parse_jobs(s: &str) -> Result<usize, String> {
    number_range(s, 1, MAX_JOBS)
}

/// Arguments for the download command
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Link to the video page
    #[arg(short, long)]
    pub link: String,

    /// Opaque id of the requesting user
    #[arg(short, long)]
    pub owner: String,

    /// Start time (SS[.ms], MM:SS[.ms] or HH:MM:SS[.ms])
    #[arg(short, long)]
    pub start: Option<String>,

    /// End time (SS[.ms], MM:SS[.ms] or HH:MM:SS[.ms])
    #[arg(short, long)]
    pub end: Option<String>,

    /// Comma separated format selectors to try in order
    #[arg(long)]
    pub format_ladder: Option<String>,

    /// Print a one-line summary instead of JSON
    #[arg(long)]
    pub summary: bool,
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Owner whose artifacts to list
    #[arg(short, long)]
    pub owner: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the batch command
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON array of {"link", "owner", "start"?, "end"?} objects
    #[arg(short, long)]
    pub file: PathBuf,

    /// Maximum number of jobs running at once
    #[arg(short, long, value_parser = parse_jobs)]
    pub jobs: Option<usize>,
}

/// Arguments for the sweep command
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Only remove files untouched for at least this many seconds
    #[arg(long, default_value_t = 3600)]
    pub older_than_secs: u64,
}
