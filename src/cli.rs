//! Command-line interface for SonicScan
//!
//! Handles argument parsing and logging configuration.

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

/// SonicScan - find songs that sound like what you hear
#[derive(Parser, Debug)]
#[command(name = "sonicscan")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase logging verbosity
    /// -v = info, -vv = debug, -vvv = trace, -vvvv = include HTTP internals
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Backend base URL (overrides the stored setting)
    #[arg(long, env = "SONICSCAN_BACKEND_URL", global = true)]
    pub backend_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record from the microphone and list similar songs
    Identify {
        /// Stop after this many seconds instead of waiting for Enter
        #[arg(long)]
        seconds: Option<u64>,

        /// Send an existing WAV file instead of recording
        #[arg(long)]
        file: Option<PathBuf>,

        /// Keep a copy of the recorded clip
        #[arg(long)]
        keep: bool,

        /// Record without echo cancellation, noise suppression or gain
        #[arg(long)]
        raw: bool,
    },

    /// Add a song by link, or search by text and pick candidates
    Add {
        /// A YouTube link, another provider's link, or free text
        input: String,

        /// Candidate numbers to add from the search results (1-based)
        #[arg(long, num_args = 1..)]
        pick: Vec<usize>,
    },

    /// Show the stored library
    Library,

    /// Delete a stored song by id
    Delete { id: String },

    /// Check that the backend is reachable
    Ping,

    /// List archived clips
    Clips,

    /// Show or change stored settings
    Config {
        #[arg(long)]
        backend_url: Option<String>,

        #[arg(long)]
        archive_clips: Option<bool>,
    },
}

impl Args {
    /// Get the log level filter based on verbosity flags
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else {
            match self.verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }

    /// HTTP client internals are only shown at -vvvv
    pub fn http_verbose(&self) -> bool {
        !self.quiet && self.verbose >= 4
    }
}

/// Initialize the logging system based on CLI arguments
pub fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    // Keep dependencies at warn
    builder.filter_level(LevelFilter::Warn);

    builder.filter_module("sonicscan", args.log_level());

    if args.http_verbose() {
        builder.filter_module("reqwest", args.log_level());
        builder.filter_module("hyper", args.log_level());
        builder.filter_module("hyper_util", args.log_level());
    }

    builder.format_timestamp_millis().init();
}
