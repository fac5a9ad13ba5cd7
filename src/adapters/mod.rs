// Adapters - Concrete implementations of the ports

pub mod engine_ffmpeg;
pub mod toml_config;

pub use engine_ffmpeg::FfmpegEngine;
pub use toml_config::FileConfig;
