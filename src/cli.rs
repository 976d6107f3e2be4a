//! Command-line interface for podium
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Analyze recorded presentations for delivery feedback
#[derive(Parser, Debug)]
#[command(
    name = "podium",
    version,
    about = "Analyze a recorded presentation: pace, pauses, fillers, intonation"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress status output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: job progress, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a wait-timeout string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers
/// (seconds), single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`).
fn parse_wait_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a recording and print the report as JSON
    Analyze {
        /// Features document (.json) or raw recording (.wav)
        input: PathBuf,

        /// Metric to compute; repeat for several (default: all)
        #[arg(long = "metric", value_name = "NAME")]
        metrics: Vec<String>,

        /// Language tag recorded in the transcript
        #[arg(long, value_name = "LANG")]
        language: Option<String>,

        /// Maximum time to wait for the analysis. Examples: 30s, 5m
        #[arg(long, value_name = "DURATION", default_value = "60s", value_parser = parse_wait_secs)]
        wait_timeout: u64,

        /// Compact single-line JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
