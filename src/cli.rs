use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "convid")]
#[command(author, version, about = "Batch convert videos to MP4 (H.264/AAC) with ffmpeg")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert files, or every supported file under directories
    Convert {
        /// Files or directories to convert
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write outputs under this directory instead of next to the sources
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Replace outputs that already exist
        #[arg(long)]
        overwrite: bool,

        /// Only look at the top level of directories
        #[arg(long)]
        no_recursive: bool,

        /// Print the ffmpeg command for each file without running it
        #[arg(long)]
        dry_run: bool,

        /// Only print failures and the final summary
        #[arg(short, long)]
        quiet: bool,

        /// Exit with an error if any file failed to convert
        #[arg(long)]
        strict: bool,
    },

    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the encoding plan and ffmpeg command for a file
    Plan {
        /// File to plan
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
