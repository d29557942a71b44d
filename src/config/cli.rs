//! Command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ytfex",
    about = "Batch audio feature extraction for YouTube-sourced tracks",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Base directory holding the sharded audio tree
    #[arg(short = 'i', long = "input-dir", global = true, default_value = ".")]
    pub input_dir: PathBuf,

    /// Comma-separated feature keys (default: all)
    #[arg(long, global = true, value_delimiter = ',')]
    pub features: Vec<String>,

    /// Recompute requested features even when already stored
    #[arg(long, global = true)]
    pub force: bool,

    /// Process tracks sequentially instead of across all cores
    #[arg(long, global = true)]
    pub serial: bool,

    /// Worker threads (0 = one per core)
    #[arg(long, global = true, default_value_t = 0)]
    pub threads: usize,

    /// Disable the progress bar
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process every audio file found under the base directory
    Dir,

    /// Process the identifiers in a list file (txt, csv, or parquet)
    List {
        /// Path to the list file
        #[arg(short = 'l', long = "list-file")]
        list_file: PathBuf,

        /// CSV delimiter (single character; autodetected when omitted)
        #[arg(long)]
        delimiter: Option<char>,
    },

    /// Process a single track identifier
    Single {
        /// Track identifier
        #[arg(short = 'y', long = "yt-id")]
        yt_id: String,
    },
}
