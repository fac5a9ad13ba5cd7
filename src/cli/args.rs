//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the run command
///
/// Flags left unset fall back to the config file, then to built-in
/// defaults.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Folder holding the source clips
    #[arg(short, long)]
    pub source_dir: Option<PathBuf>,

    /// Intro video prepended to the compilation
    #[arg(long)]
    pub intro: Option<PathBuf>,

    /// Background music track mixed under the compilation
    #[arg(long)]
    pub music: Option<PathBuf>,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Seconds before the end of each clip where its segment starts
    #[arg(long)]
    pub tail_start: Option<f64>,

    /// Seconds before the end of each clip where its segment ends
    #[arg(long)]
    pub tail_end: Option<f64>,

    /// Maximum concurrent extractions (default: CPU count)
    #[arg(short = 'j', long)]
    pub parallelism: Option<usize>,

    /// Volume of the original clip audio in the mix
    #[arg(long)]
    pub original_volume: Option<f64>,

    /// Volume of the background music in the mix
    #[arg(long)]
    pub music_volume: Option<f64>,

    /// Music fade-out length in seconds
    #[arg(long)]
    pub fade_seconds: Option<f64>,

    /// Fail the run when the music cannot be mixed in
    #[arg(long)]
    pub mix_required: bool,

    /// Skip source clips larger than this many megabytes
    #[arg(long)]
    pub max_clip_mb: Option<u64>,

    /// Grace period before a cancelled engine invocation is killed
    #[arg(long)]
    pub kill_grace_seconds: Option<f64>,

    /// Output width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Output height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Output frame rate
    #[arg(long)]
    pub fps: Option<f64>,

    /// Video encoder
    #[arg(long)]
    pub video_codec: Option<String>,

    /// Audio encoder
    #[arg(long)]
    pub audio_codec: Option<String>,

    /// Constant Rate Factor (0-51)
    #[arg(long)]
    pub crf: Option<u8>,

    /// Encoding preset
    #[arg(long)]
    pub preset: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long, env = "REELSTITCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the run report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments for the scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Folder holding the source clips
    #[arg(short, long)]
    pub source_dir: PathBuf,

    /// Skip source clips larger than this many megabytes
    #[arg(long, default_value = "500")]
    pub max_clip_mb: u64,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
