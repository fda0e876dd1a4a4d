// mediaprobe-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "mediaprobe: Media container inspection tool",
    long_about = "Prints the container format, duration and per-stream codec parameters \
                  of media files without decoding them."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log output (-v for info, -vv for debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Shows container and stream information for one or more files
    Info(InfoArgs),
}

#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Media files to probe
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Print the result as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Skip reading codec extension data
    #[arg(long)]
    pub no_extradata: bool,

    /// ffprobe executable to use (defaults to MEDIAPROBE_FFPROBE, then `ffprobe`)
    #[arg(long, value_name = "PATH")]
    pub ffprobe: Option<PathBuf>,

    /// Bytes to read while detecting the container format
    #[arg(long, value_name = "BYTES")]
    pub probesize: Option<u64>,

    /// Microseconds of media to analyse while discovering streams
    #[arg(long, value_name = "MICROS")]
    pub analyzeduration: Option<u64>,

    /// Probe through linked libavformat (requires the ffmpeg-native feature)
    #[arg(long)]
    pub native: bool,
}
