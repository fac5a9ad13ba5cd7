// TOML config adapter - optional configuration file layered under CLI flags

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::errors::{PipelineError, PipelineResult};

/// Partial configuration loaded from a TOML file. Every field is optional;
/// command-line flags always win over file values, which win over defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub source_dir: Option<PathBuf>,
    pub intro: Option<PathBuf>,
    pub music: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub tail_start: Option<f64>,
    pub tail_end: Option<f64>,
    pub parallelism: Option<usize>,
    pub original_volume: Option<f64>,
    pub music_volume: Option<f64>,
    pub fade_seconds: Option<f64>,
    pub mix_required: Option<bool>,
    pub max_clip_mb: Option<u64>,
    pub kill_grace_seconds: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub crf: Option<u8>,
    pub preset: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("could not read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            PipelineError::Config(format!("could not parse config file {}: {}", path.display(), e))
        })
    }
}
