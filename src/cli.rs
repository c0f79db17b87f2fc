use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "datamosh")]
#[command(author, version, about = "Datamosh a video by breaking its prediction chain")]
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
    /// Mosh a single video file
    Mosh(MoshArgs),

    /// Check that required external tools are available
    CheckTools {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

/// Flags for `mosh`. Anything left unset falls back to the config file,
/// then to the built-in defaults.
#[derive(Args, Debug, Default)]
pub struct MoshArgs {
    /// File to be moshed
    #[arg(required = true)]
    pub input: PathBuf,

    /// Time the video starts on the original footage's timeline. Trims preceding footage.
    #[arg(long, alias = "video_start", allow_negative_numbers = true)]
    pub video_start: Option<f64>,

    /// Time on the original footage's timeline where it is trimmed.
    #[arg(long, alias = "video_end", allow_negative_numbers = true)]
    pub video_end: Option<f64>,

    /// Time the effect starts, on the original footage's timeline.
    #[arg(long, alias = "effect_start", allow_negative_numbers = true)]
    pub effect_start: Option<f64>,

    /// Time the effect ends, on the original footage's timeline.
    #[arg(long, alias = "effect_end", allow_negative_numbers = true)]
    pub effect_end: Option<f64>,

    /// Copies of each predictive frame inside the effect. 0 keeps only the frames outside it.
    #[arg(long, alias = "repeat_frames")]
    pub repeat_frames: Option<u32>,

    /// Frames per second the video is converted to before moshing
    #[arg(long)]
    pub fps: Option<u32>,

    /// Output directory (created if missing)
    #[arg(short, long, alias = "output_dir")]
    pub output_dir: Option<PathBuf>,

    /// Scale the final video to this width, keeping aspect ratio
    #[arg(long)]
    pub width: Option<u32>,

    /// Copy the intermediate AVI files into the output directory
    #[arg(long)]
    pub keep_intermediates: bool,

    /// Show what would be done without executing
    #[arg(long)]
    pub dry_run: bool,
}
