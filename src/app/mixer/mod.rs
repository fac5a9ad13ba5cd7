// Audio mixer - background music overlay on the assembled stream

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::model::JobConfig;
use crate::ports::{EnginePort, MixRequest};

/// Overlays the configured music track under the assembled stream. The
/// music is looped or truncated to the assembled duration and faded out
/// over the final seconds.
pub struct AudioMixer {
    engine: Arc<dyn EnginePort>,
}

impl AudioMixer {
    pub fn new(engine: Arc<dyn EnginePort>) -> Self {
        Self { engine }
    }

    pub async fn mix(
        &self,
        config: &JobConfig,
        music: &Path,
        assembled: &Path,
        output: &Path,
        total_duration: f64,
    ) -> PipelineResult<()> {
        if !music.is_file() {
            return Err(PipelineError::AudioMix(format!(
                "music track not found: {}",
                music.display()
            )));
        }

        self.engine
            .mix(&MixRequest {
                video: assembled.to_path_buf(),
                music: music.to_path_buf(),
                output: output.to_path_buf(),
                total_duration,
                original_volume: config.original_volume,
                music_volume: config.music_volume,
                fade_seconds: config.fade_seconds,
                audio_codec: config.encode.audio_codec.clone(),
            })
            .await
            .map_err(|e| PipelineError::AudioMix(e.to_string()))?;

        info!(music = %music.display(), "music mixed into final artifact");
        Ok(())
    }
}
