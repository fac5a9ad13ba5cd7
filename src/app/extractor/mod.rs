// Segment extractor - parallel tail-window extraction with per-clip isolation

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::domain::model::*;
use crate::ports::{AbortToken, EnginePort, ExtractRequest};

/// One planned extraction, derived from a probed clip entry.
#[derive(Debug, Clone)]
pub struct ExtractionPlan {
    pub order: usize,
    pub source: PathBuf,
    pub window: TrimWindow,
    pub source_has_audio: bool,
}

/// How one extraction ended.
#[derive(Debug)]
pub enum ExtractionOutcome {
    Extracted(Segment),
    /// Engine failure after the single retry; carries the diagnostic
    Failed(String),
    /// Stopped by the abort token before completing
    Aborted,
}

/// Result for one clip, keyed by its scan-order index.
#[derive(Debug)]
pub struct ExtractionResult {
    pub order: usize,
    pub outcome: ExtractionOutcome,
}

/// Runs extraction jobs concurrently over a bounded worker pool.
///
/// Failures are isolated per clip: a corrupt source or engine fault marks
/// that clip failed and never touches its siblings. Transient engine
/// failures get exactly one retry. Completion order is unconstrained;
/// results are re-sorted into scan order before being handed back.
pub struct SegmentExtractor {
    engine: Arc<dyn EnginePort>,
    encode: EncodeParams,
    parallelism: usize,
}

impl SegmentExtractor {
    pub fn new(engine: Arc<dyn EnginePort>, encode: EncodeParams, parallelism: usize) -> Self {
        Self {
            engine,
            encode,
            parallelism: parallelism.max(1),
        }
    }

    pub async fn extract_all(
        &self,
        plans: Vec<ExtractionPlan>,
        segment_dir: &Path,
        abort: &AbortToken,
    ) -> Vec<ExtractionResult> {
        let permits = Arc::new(Semaphore::new(self.parallelism.min(plans.len().max(1))));
        let mut tasks = JoinSet::new();

        for plan in plans {
            let engine = Arc::clone(&self.engine);
            let encode = self.encode.clone();
            let permits = Arc::clone(&permits);
            let abort = abort.clone();
            let output = segment_dir.join(format!("seg_{:04}.mp4", plan.order));

            tasks.spawn(async move {
                // Closing the semaphore is not part of this design; acquire
                // only fails if it were, so treat that as an abort.
                let _permit = match permits.acquire().await {
                    Ok(p) => p,
                    Err(_) => {
                        return ExtractionResult {
                            order: plan.order,
                            outcome: ExtractionOutcome::Aborted,
                        }
                    }
                };
                if abort.is_aborted() {
                    return ExtractionResult {
                        order: plan.order,
                        outcome: ExtractionOutcome::Aborted,
                    };
                }
                let outcome = extract_one(&*engine, &plan, &encode, output, &abort).await;
                ExtractionResult {
                    order: plan.order,
                    outcome,
                }
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => warn!(error = %e, "extraction task panicked"),
            }
        }

        // Assembly consumes segments in the original clip order, never in
        // completion order
        results.sort_by_key(|r| r.order);
        results
    }
}

async fn extract_one(
    engine: &dyn EnginePort,
    plan: &ExtractionPlan,
    encode: &EncodeParams,
    output: PathBuf,
    abort: &AbortToken,
) -> ExtractionOutcome {
    let request = ExtractRequest {
        source: plan.source.clone(),
        window: plan.window,
        output: output.clone(),
        encode: encode.clone(),
        source_has_audio: plan.source_has_audio,
    };

    debug!(
        clip = %plan.source.display(),
        window = %plan.window,
        "extracting segment"
    );

    let mut attempt = engine.extract(&request, abort).await;
    if let Err(e) = &attempt {
        if e.is_transient() && !abort.is_aborted() {
            warn!(clip = %plan.source.display(), "transient engine failure, retrying once");
            attempt = engine.extract(&request, abort).await;
        }
    }

    match attempt {
        Ok(()) => ExtractionOutcome::Extracted(Segment {
            order: plan.order,
            path: output,
            source: plan.source.clone(),
            duration: plan.window.duration(),
        }),
        Err(crate::ports::EngineError::Aborted) => ExtractionOutcome::Aborted,
        Err(e) => ExtractionOutcome::Failed(e.to_string()),
    }
}
