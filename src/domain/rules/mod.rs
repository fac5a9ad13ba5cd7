// Domain rules - Trim planning and assembly preconditions

use std::path::Path;

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::model::*;

/// Computes the extraction window for each clip from its probed duration
/// and the configured tail offsets.
pub struct TrimPlanner;

impl TrimPlanner {
    /// Window is `[duration - N1, duration - N2]`, clamped to clip bounds.
    ///
    /// A clip shorter than (or equal to) the tail-start offset is still valid
    /// content: the window degrades to the whole clip instead of failing.
    pub fn plan_window(duration: f64, tail: &TailWindow) -> TrimWindow {
        if duration <= tail.start_offset {
            return TrimWindow {
                start: 0.0,
                end: duration,
            };
        }
        let start = duration - tail.start_offset;
        let end = (duration - tail.end_offset).min(duration);
        TrimWindow { start, end }
    }
}

/// Deterministic clip ordering: lexicographic by file name, byte-wise.
///
/// The ordering rule is pinned here (and by tests) so the final artifact is
/// reproducible across runs and platforms regardless of directory iteration
/// or extraction completion order.
pub fn order_by_file_name(paths: &mut [ClipEntry]) {
    paths.sort_by(|a, b| {
        a.path
            .file_name()
            .unwrap_or_default()
            .cmp(b.path.file_name().unwrap_or_default())
    });
    for (idx, entry) in paths.iter_mut().enumerate() {
        entry.order = idx;
    }
}

/// Supported source extensions (lowercase, without the dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "flv", "wmv"];

/// Tag a path as supported or not by its extension. Explicit allowlist
/// check; unsupported files are recorded, never silently dropped.
pub fn is_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lower = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// Validates the uniform-parameters precondition for concatenation.
pub struct AssemblyPreflight;

impl AssemblyPreflight {
    /// Check one assembly input against the expected parameters, failing
    /// with a `FormatMismatch` that names the offending input. Silently
    /// dropping a mismatched input here would hide a configuration bug
    /// upstream, so the whole run fails instead.
    pub fn check_input(
        name: &str,
        actual: &StreamParams,
        expected: &StreamParams,
    ) -> PipelineResult<()> {
        if let Some(detail) = actual.mismatch_against(expected) {
            return Err(PipelineError::FormatMismatch {
                input: name.to_string(),
                detail,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
