// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::errors::{PipelineError, PipelineResult};

/// Why a clip was left out of the compilation without being treated as a fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SkipReason {
    /// Extension is not on the supported allowlist
    UnsupportedExtension,
    /// File exceeds the configured size cap
    Oversize { size_bytes: u64, limit_bytes: u64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedExtension => write!(f, "unsupported extension"),
            SkipReason::Oversize {
                size_bytes,
                limit_bytes,
            } => write!(f, "oversize ({} bytes, limit {})", size_bytes, limit_bytes),
        }
    }
}

/// Pipeline stage at which a clip-local failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Probe,
    Extract,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Probe => write!(f, "probe"),
            FailureStage::Extract => write!(f, "extract"),
        }
    }
}

/// Per-clip status; transitions strictly forward through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ClipStatus {
    /// Discovered, duration not yet known
    Pending,
    /// Duration probed and trim window planned
    Planned,
    /// Segment extracted and waiting for assembly
    Extracted,
    /// Present in the final artifact
    Succeeded,
    /// Extracted but thrown away because the run was cancelled
    Discarded,
    /// Excluded up front, with the reason recorded
    Skipped { reason: SkipReason },
    /// Clip-local fault; the rest of the run continues
    Failed {
        stage: FailureStage,
        diagnostic: String,
    },
}

impl ClipStatus {
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, ClipStatus::Skipped { .. } | ClipStatus::Failed { .. })
    }
}

/// One candidate source clip. Path and order index are fixed at scan time;
/// only the status (and probed duration) change as the pipeline advances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipEntry {
    pub path: PathBuf,
    /// Position in the deterministic scan order (lexicographic by file name)
    pub order: usize,
    pub size_bytes: u64,
    /// Seconds; populated by the probe, absent when probing failed
    pub duration: Option<f64>,
    /// Whether the source carries an audio stream
    pub has_audio: bool,
    pub status: ClipStatus,
}

impl ClipEntry {
    pub fn new(path: PathBuf, order: usize, size_bytes: u64) -> Self {
        Self {
            path,
            order,
            size_bytes,
            duration: None,
            has_audio: false,
            status: ClipStatus::Pending,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Configured tail window offsets, both measured in seconds before the end
/// of a clip. `start_offset` is N1, `end_offset` is N2, with N1 > N2 >= 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailWindow {
    pub start_offset: f64,
    pub end_offset: f64,
}

impl TailWindow {
    pub fn new(start_offset: f64, end_offset: f64) -> PipelineResult<Self> {
        if end_offset < 0.0 {
            return Err(PipelineError::Config(format!(
                "tail end offset must be non-negative, got {}",
                end_offset
            )));
        }
        if start_offset <= end_offset {
            return Err(PipelineError::Config(format!(
                "tail start offset ({}) must exceed tail end offset ({})",
                start_offset, end_offset
            )));
        }
        Ok(Self {
            start_offset,
            end_offset,
        })
    }
}

/// Concrete extraction window inside one clip, in seconds from its start.
/// Invariant: 0 <= start < end <= clip duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimWindow {
    pub start: f64,
    pub end: f64,
}

impl TrimWindow {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// True when the window covers the clip from its first second
    pub fn is_whole_clip(&self) -> bool {
        self.start == 0.0
    }
}

impl fmt::Display for TrimWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}s..{:.3}s]", self.start, self.end)
    }
}

/// Stream parameters that must be uniform across every assembly input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamParams {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub video_codec: String,
    pub has_audio: bool,
}

impl StreamParams {
    /// Compare against another parameter set, returning the first difference
    /// as a human-readable detail. Frame rates match within a small tolerance
    /// to absorb rational rates like 30000/1001.
    pub fn mismatch_against(&self, expected: &StreamParams) -> Option<String> {
        if self.width != expected.width || self.height != expected.height {
            return Some(format!(
                "resolution {}x{} (expected {}x{})",
                self.width, self.height, expected.width, expected.height
            ));
        }
        if (self.fps - expected.fps).abs() > 0.5 {
            return Some(format!(
                "frame rate {:.2} (expected {:.2})",
                self.fps, expected.fps
            ));
        }
        if self.video_codec != expected.video_codec {
            return Some(format!(
                "video codec {} (expected {})",
                self.video_codec, expected.video_codec
            ));
        }
        if self.has_audio != expected.has_audio {
            return Some(if expected.has_audio {
                "missing audio stream".to_string()
            } else {
                "unexpected audio stream".to_string()
            });
        }
        None
    }
}

/// Target encoding parameters for extracted segments and the final output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeParams {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub video_codec: String,
    pub audio_codec: String,
    pub crf: u8,
    pub preset: String,
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30.0,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            crf: 18,
            preset: "medium".to_string(),
        }
    }
}

impl EncodeParams {
    /// The stream parameters an input must present after decoding to be
    /// concatenable with segments produced under these settings.
    pub fn expected_stream_params(&self) -> StreamParams {
        StreamParams {
            width: self.width,
            height: self.height,
            fps: self.fps,
            video_codec: decoded_codec_name(&self.video_codec),
            has_audio: true,
        }
    }
}

/// Map encoder names to the codec name a probe reports back.
fn decoded_codec_name(encoder: &str) -> String {
    match encoder {
        "libx264" | "h264_nvenc" | "h264_qsv" => "h264".to_string(),
        "libx265" | "hevc_nvenc" => "hevc".to_string(),
        "libvpx-vp9" => "vp9".to_string(),
        other => other.to_string(),
    }
}

/// An extracted intermediate artifact, owned by the job's temp directory.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Order index of the source clip entry
    pub order: usize,
    pub path: PathBuf,
    /// Source clip the segment was cut from, kept for diagnostics
    pub source: PathBuf,
    /// Planned duration in seconds
    pub duration: f64,
}

impl Segment {
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

/// Behavior when the music track cannot be mixed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixPolicy {
    /// A mix failure fails the whole run
    Required,
    /// Fall back to a visual-only artifact and record the degradation
    BestEffort,
}

/// Root aggregate configuration for one pipeline invocation.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub source_dir: PathBuf,
    pub intro: Option<PathBuf>,
    pub music: Option<PathBuf>,
    pub output: PathBuf,
    pub tail: TailWindow,
    pub encode: EncodeParams,
    /// Upper bound on concurrent extractions
    pub parallelism: usize,
    /// Relative level of the original clip audio in the mix
    pub original_volume: f64,
    /// Relative level of the background music in the mix
    pub music_volume: f64,
    /// Fade-out applied to the music over the final seconds
    pub fade_seconds: f64,
    pub mix_policy: MixPolicy,
    /// Clips above this size are tagged oversize and skipped
    pub max_clip_bytes: u64,
    /// How long a cancelled extraction may keep running before being killed
    pub kill_grace_seconds: f64,
    pub report_path: Option<PathBuf>,
}

impl JobConfig {
    /// Effective worker count for the extraction stage
    pub fn effective_parallelism(&self, clip_count: usize) -> usize {
        self.parallelism.min(clip_count).max(1)
    }
}

/// Final state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Done,
    Failed,
}

/// Outcome of one clip, in scan order, as persisted in the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipOutcome {
    pub path: PathBuf,
    pub order: usize,
    #[serde(flatten)]
    pub status: ClipStatus,
}

/// Summary of one end-to-end run. Produced exactly once, including on
/// failure and cancellation, so the caller always learns which clips worked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub state: RunState,
    /// Set when the run ended by user abort rather than a fault
    pub cancelled: bool,
    /// Fatal error rendered for the caller, absent on success
    pub error: Option<String>,
    pub clips: Vec<ClipOutcome>,
    /// Duration of the final artifact in seconds, when one was produced
    pub total_duration: Option<f64>,
    pub artifact: Option<PathBuf>,
    /// True when the music could not be mixed and the run fell back to
    /// a visual-only artifact
    pub audio_degraded: bool,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

impl RunReport {
    pub fn succeeded_count(&self) -> usize {
        self.clips
            .iter()
            .filter(|c| c.status == ClipStatus::Succeeded)
            .count()
    }

    pub fn write_json(&self, path: &Path) -> PipelineResult<()> {
        let rendered = serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("report serialization failed: {}", e)))?;
        std::fs::write(path, rendered)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
