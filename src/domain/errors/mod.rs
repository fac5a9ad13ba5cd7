//! Error taxonomy for the compilation pipeline

use thiserror::Error;

/// Fatal pipeline errors. Per-clip faults (probe, extract) are recovered
/// locally and recorded on the clip entry instead of surfacing here.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid configuration surface values
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Source folder missing or holding zero eligible clips
    #[error("scan failed: {0}")]
    Scan(String),

    /// An assembly input does not match the configured output parameters
    #[error("format mismatch in {input}: {detail}")]
    FormatMismatch { input: String, detail: String },

    /// Music track missing, unreadable, or the mix invocation failed
    #[error("audio mix failed: {0}")]
    AudioMix(String),

    /// Extraction left fewer than one surviving clip
    #[error("no clips survived extraction; nothing to assemble")]
    NothingToAssemble,

    /// User-initiated abort; reported as cancellation, not as a fault
    #[error("run cancelled")]
    Cancelled,

    /// External transcoding engine failure outside the per-clip scope
    #[error("engine error: {0}")]
    Engine(#[from] crate::ports::EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
