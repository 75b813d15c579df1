//! CLI module for ClipCut
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::adapters::LogFormat;

pub mod args;
pub mod commands;

/// ClipCut video clipper
///
/// Downloads videos from hosting sites, optionally trims them to a time range
/// and keeps a per-owner registry of the produced files.
#[derive(Parser, Debug)]
#[command(name = "clipcut")]
#[command(about = "ClipCut - Download and trim online videos")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (TOML with a [clipcut] table)
    #[arg(long, global = true, env = "CLIPCUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level or filter directive; RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Log output format
    #[arg(long, default_value = "pretty", global = true)]
    pub log_format: LogFormat,

    /// Directory for working files and finished artifacts
    #[arg(long, global = true)]
    pub downloads_dir: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download a video, optionally trimmed to a time range
    Download(args::DownloadArgs),
    /// List an owner's artifacts, newest first
    List(args::ListArgs),
    /// Run a JSON file of download requests concurrently
    Batch(args::BatchArgs),
    /// Remove stray working files left by interrupted runs
    Sweep(args::SweepArgs),
    /// Print the effective configuration
    Config,
}
