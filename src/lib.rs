//! Reelstitch library
//!
//! Compiles the closing moments of a folder of video clips into one
//! continuous video, with an optional intro and background music mixed
//! underneath.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use domain::errors::{PipelineError, PipelineResult};
pub use domain::model::{ClipEntry, ClipStatus, JobConfig, RunReport, RunState};
pub use ports::{abort_channel, AbortHandle, AbortToken, EnginePort};
