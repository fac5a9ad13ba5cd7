// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::domain::model::{EncodeParams, StreamParams, TrimWindow};

/// Failure of one external engine invocation. The diagnostic carries the
/// tail of the engine's stderr so per-clip failures can be reported with
/// the engine's own words.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// Engine binary not found on PATH
    #[error("{tool} not found on PATH")]
    NotFound { tool: String },

    /// Engine exited with a failure status
    #[error("{tool} exited with status {code:?}: {diagnostic}")]
    Failed {
        tool: String,
        code: Option<i32>,
        diagnostic: String,
    },

    /// Invocation was aborted before the engine finished
    #[error("engine invocation aborted")]
    Aborted,

    /// Engine output could not be interpreted
    #[error("unreadable engine output: {0}")]
    Malformed(String),
}

impl EngineError {
    /// Transient failures (non-zero exit with no diagnostic content) are
    /// retried once; anything with a concrete diagnostic is considered
    /// deterministic and not worth repeating.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::Failed { diagnostic, .. } if diagnostic.trim().is_empty()
        )
    }
}

/// What the engine learned about a media file.
#[derive(Debug, Clone)]
pub struct MediaProbe {
    /// Container duration in seconds
    pub duration: f64,
    pub params: StreamParams,
}

/// One segment extraction: re-encode the trim window of a source clip to
/// the configured output parameters.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub source: PathBuf,
    pub window: TrimWindow,
    pub output: PathBuf,
    pub encode: EncodeParams,
    /// Whether the source has an audio stream; silence is synthesized
    /// otherwise so every segment is concatenable
    pub source_has_audio: bool,
}

/// Ordered, lossless concatenation of uniform inputs.
#[derive(Debug, Clone)]
pub struct ConcatRequest {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

/// Mix a background track under an assembled stream.
#[derive(Debug, Clone)]
pub struct MixRequest {
    pub video: PathBuf,
    pub music: PathBuf,
    pub output: PathBuf,
    /// Duration of the assembled stream; music is looped or truncated to it
    pub total_duration: f64,
    pub original_volume: f64,
    pub music_volume: f64,
    /// Fade-out window applied to the music before the end
    pub fade_seconds: f64,
    pub audio_codec: String,
}

/// Port for the external transcoding engine.
///
/// Every long-running pipeline step goes through this interface so the
/// engine stays swappable and the pipeline testable against a fake.
#[async_trait]
pub trait EnginePort: Send + Sync {
    /// Probe a file for duration and stream parameters
    async fn probe(&self, path: &Path) -> Result<MediaProbe, EngineError>;

    /// Extract one trim window into a segment artifact. Checks the abort
    /// token while the engine runs; a killed invocation returns `Aborted`.
    async fn extract(&self, req: &ExtractRequest, abort: &AbortToken) -> Result<(), EngineError>;

    /// Concatenate uniform inputs in the given order without re-encoding
    async fn concat(&self, req: &ConcatRequest) -> Result<(), EngineError>;

    /// Overlay the music track under the assembled stream
    async fn mix(&self, req: &MixRequest) -> Result<(), EngineError>;
}

/// Controller side of the cancellation channel.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Signal every in-flight and queued job to stop
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }
}

/// Worker side of the cancellation channel. Cheap to clone; every job holds
/// one and checks it before and during engine invocations.
#[derive(Debug, Clone)]
pub struct AbortToken {
    rx: watch::Receiver<bool>,
}

impl AbortToken {
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve when an abort is signalled. Never resolves otherwise.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without aborting; park forever
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a linked abort handle/token pair for one run.
pub fn abort_channel() -> (AbortHandle, AbortToken) {
    let (tx, rx) = watch::channel(false);
    (AbortHandle { tx }, AbortToken { rx })
}
