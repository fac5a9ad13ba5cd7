// Pipeline controller - drives one run through its stages

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::app::assembler::Assembler;
use crate::app::extractor::{ExtractionOutcome, ExtractionPlan, SegmentExtractor};
use crate::app::mixer::AudioMixer;
use crate::app::scanner::ClipScanner;
use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::model::*;
use crate::domain::rules::TrimPlanner;
use crate::ports::{AbortToken, EnginePort};

/// Pipeline stages, in execution order. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Scanning,
    Planning,
    Extracting,
    Assembling,
    Mixing,
    Done,
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Scanning => "scanning",
            Stage::Planning => "planning",
            Stage::Extracting => "extracting",
            Stage::Assembling => "assembling",
            Stage::Mixing => "mixing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Logs stage transitions and keeps them forward-only.
struct StageTracker {
    current: Stage,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            current: Stage::Scanning,
        }
    }

    fn advance(&mut self, next: Stage) {
        if next > self.current {
            info!(from = %self.current, to = %next, "stage transition");
            self.current = next;
        }
    }
}

/// What a successful run produced.
struct RunSuccess {
    artifact: PathBuf,
    total_duration: f64,
    audio_degraded: bool,
}

/// Drives one compilation run end to end and always yields a `RunReport`,
/// whether the run finished, failed, or was cancelled.
pub struct PipelineController {
    engine: Arc<dyn EnginePort>,
    config: JobConfig,
}

impl PipelineController {
    pub fn new(engine: Arc<dyn EnginePort>, config: JobConfig) -> Self {
        Self { engine, config }
    }

    pub async fn run(&self, abort: AbortToken) -> RunReport {
        let mut entries: Vec<ClipEntry> = Vec::new();
        let result = self.execute(&mut entries, &abort).await;

        let report = build_report(&self.config, entries, result);
        if let Some(path) = &self.config.report_path {
            if let Err(e) = report.write_json(path) {
                warn!(path = %path.display(), error = %e, "could not write run report");
            }
        }
        report
    }

    async fn execute(
        &self,
        entries: &mut Vec<ClipEntry>,
        abort: &AbortToken,
    ) -> PipelineResult<RunSuccess> {
        let mut stage = StageTracker::new();

        let scanner = ClipScanner::new(Arc::clone(&self.engine), self.config.max_clip_bytes);
        *entries = scanner.scan(&self.config.source_dir).await?;
        info!(clips = entries.len(), "scan complete");

        if abort.is_aborted() {
            return Err(PipelineError::Cancelled);
        }

        stage.advance(Stage::Planning);
        let mut plans = Vec::new();
        for entry in entries.iter_mut() {
            if entry.status != ClipStatus::Pending {
                continue;
            }
            let Some(duration) = entry.duration else {
                continue;
            };
            let window = TrimPlanner::plan_window(duration, &self.config.tail);
            entry.status = ClipStatus::Planned;
            plans.push(ExtractionPlan {
                order: entry.order,
                source: entry.path.clone(),
                window,
                source_has_audio: entry.has_audio,
            });
        }

        stage.advance(Stage::Extracting);
        // Owns every intermediate artifact; dropped (and cleaned) when the
        // run ends, on any path out of this function
        let workdir = tempfile::Builder::new()
            .prefix("reelstitch-")
            .tempdir()?;

        let extractor = SegmentExtractor::new(
            Arc::clone(&self.engine),
            self.config.encode.clone(),
            self.config.effective_parallelism(plans.len()),
        );
        let results = extractor.extract_all(plans, workdir.path(), abort).await;

        let mut segments: Vec<Segment> = Vec::new();
        for result in results {
            let Some(entry) = entries.iter_mut().find(|e| e.order == result.order) else {
                continue;
            };
            match result.outcome {
                ExtractionOutcome::Extracted(segment) => {
                    entry.status = ClipStatus::Extracted;
                    segments.push(segment);
                }
                ExtractionOutcome::Failed(diagnostic) => {
                    error!(clip = %entry.file_name(), %diagnostic, "extraction failed");
                    entry.status = ClipStatus::Failed {
                        stage: FailureStage::Extract,
                        diagnostic,
                    };
                }
                ExtractionOutcome::Aborted => {}
            }
        }

        if abort.is_aborted() {
            // Partial segments are never assembled; mark what was already
            // extracted as discarded so the report tells the truth
            for entry in entries.iter_mut() {
                if entry.status == ClipStatus::Extracted {
                    entry.status = ClipStatus::Discarded;
                }
            }
            return Err(PipelineError::Cancelled);
        }

        if segments.is_empty() {
            return Err(PipelineError::NothingToAssemble);
        }
        segments.sort_by_key(|s| s.order);

        stage.advance(Stage::Assembling);
        let assembled_path = workdir.path().join("assembled.mp4");
        let assembler = Assembler::new(Arc::clone(&self.engine), self.config.encode.clone());
        let total_duration = assembler
            .assemble(self.config.intro.as_deref(), &segments, &assembled_path)
            .await?;

        stage.advance(Stage::Mixing);
        let mut audio_degraded = false;
        match &self.config.music {
            Some(music) => {
                let mixer = AudioMixer::new(Arc::clone(&self.engine));
                let mixed = mixer
                    .mix(
                        &self.config,
                        music,
                        &assembled_path,
                        &self.config.output,
                        total_duration,
                    )
                    .await;
                match mixed {
                    Ok(()) => {}
                    Err(e) if self.config.mix_policy == MixPolicy::BestEffort => {
                        warn!(error = %e, "mix failed, finishing without music");
                        tokio::fs::copy(&assembled_path, &self.config.output).await?;
                        audio_degraded = true;
                    }
                    Err(e) => return Err(e),
                }
            }
            None => {
                tokio::fs::copy(&assembled_path, &self.config.output).await?;
            }
        }

        for entry in entries.iter_mut() {
            if entry.status == ClipStatus::Extracted {
                entry.status = ClipStatus::Succeeded;
            }
        }

        stage.advance(Stage::Done);
        info!(
            artifact = %self.config.output.display(),
            duration = total_duration,
            "run complete"
        );
        Ok(RunSuccess {
            artifact: self.config.output.clone(),
            total_duration,
            audio_degraded,
        })
    }
}

fn build_report(
    config: &JobConfig,
    mut entries: Vec<ClipEntry>,
    result: PipelineResult<RunSuccess>,
) -> RunReport {
    entries.sort_by_key(|e| e.order);
    let clips = entries
        .into_iter()
        .map(|e| ClipOutcome {
            path: e.path,
            order: e.order,
            status: e.status,
        })
        .collect();

    match result {
        Ok(success) => RunReport {
            state: RunState::Done,
            cancelled: false,
            error: None,
            clips,
            total_duration: Some(success.total_duration),
            artifact: Some(success.artifact),
            audio_degraded: success.audio_degraded,
            finished_at: chrono::Utc::now(),
        },
        Err(e) => {
            let cancelled = e.is_cancellation();
            if cancelled {
                info!(stage = %Stage::Failed, "run cancelled before completion");
            } else {
                error!(stage = %Stage::Failed, error = %e, output = %config.output.display(), "run failed");
            }
            RunReport {
                state: RunState::Failed,
                cancelled,
                error: Some(e.to_string()),
                clips,
                total_duration: None,
                artifact: None,
                audio_degraded: false,
                finished_at: chrono::Utc::now(),
            }
        }
    }
}
