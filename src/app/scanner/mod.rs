// Clip scanner - discovers and orders candidate source clips

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::model::*;
use crate::domain::rules;
use crate::ports::EnginePort;

/// Enumerates candidate clips in a folder, tags unsupported and oversize
/// files, and probes durations through the engine.
///
/// Ordering is lexicographic by file name and assigned once at scan time;
/// everything downstream keys off the resulting order index.
pub struct ClipScanner {
    engine: Arc<dyn EnginePort>,
    max_clip_bytes: u64,
}

impl ClipScanner {
    pub fn new(engine: Arc<dyn EnginePort>, max_clip_bytes: u64) -> Self {
        Self {
            engine,
            max_clip_bytes,
        }
    }

    /// Scan a folder and return entries in deterministic order, with
    /// durations populated for every probeable clip.
    ///
    /// Fails with a scan error when the folder is missing or holds zero
    /// eligible clips. A probe failure on a single file marks that entry
    /// failed and keeps scanning; one corrupt clip never aborts the run.
    pub async fn scan(&self, dir: &Path) -> PipelineResult<Vec<ClipEntry>> {
        if !dir.is_dir() {
            return Err(PipelineError::Scan(format!(
                "source folder does not exist: {}",
                dir.display()
            )));
        }

        let mut entries = Vec::new();
        for item in WalkDir::new(dir).max_depth(1).into_iter() {
            let item = item.map_err(|e| {
                PipelineError::Scan(format!("could not read source folder: {}", e))
            })?;
            if !item.file_type().is_file() {
                continue;
            }
            let size_bytes = item.metadata().map(|m| m.len()).unwrap_or(0);
            entries.push(ClipEntry::new(item.into_path(), 0, size_bytes));
        }

        rules::order_by_file_name(&mut entries);

        let mut eligible = 0usize;
        for entry in entries.iter_mut() {
            if !rules::is_supported_extension(&entry.path) {
                entry.status = ClipStatus::Skipped {
                    reason: SkipReason::UnsupportedExtension,
                };
                debug!(clip = %entry.file_name(), "tagged unsupported");
                continue;
            }
            if entry.size_bytes > self.max_clip_bytes {
                entry.status = ClipStatus::Skipped {
                    reason: SkipReason::Oversize {
                        size_bytes: entry.size_bytes,
                        limit_bytes: self.max_clip_bytes,
                    },
                };
                warn!(
                    clip = %entry.file_name(),
                    size_bytes = entry.size_bytes,
                    "skipping oversize clip"
                );
                continue;
            }
            eligible += 1;
        }

        if eligible == 0 {
            return Err(PipelineError::Scan(format!(
                "no eligible clips found in {}",
                dir.display()
            )));
        }

        for entry in entries.iter_mut() {
            if entry.status != ClipStatus::Pending {
                continue;
            }
            match self.engine.probe(&entry.path).await {
                Ok(probe) => {
                    entry.duration = Some(probe.duration);
                    entry.has_audio = probe.params.has_audio;
                    debug!(
                        clip = %entry.file_name(),
                        duration = probe.duration,
                        "probed clip"
                    );
                }
                Err(e) => {
                    warn!(clip = %entry.file_name(), error = %e, "probe failed");
                    entry.status = ClipStatus::Failed {
                        stage: FailureStage::Probe,
                        diagnostic: e.to_string(),
                    };
                }
            }
        }

        Ok(entries)
    }
}
