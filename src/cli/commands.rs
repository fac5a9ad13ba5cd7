//! Command implementations

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::adapters::{FfmpegEngine, FileConfig};
use crate::app::{ClipScanner, PipelineController};
use crate::cli::args::{RunArgs, ScanArgs};
use crate::domain::model::*;
use crate::ports::abort_channel;

const DEFAULT_OUTPUT: &str = "compilation.mp4";
const DEFAULT_TAIL_START: f64 = 30.0;
const DEFAULT_TAIL_END: f64 = 5.0;
const DEFAULT_ORIGINAL_VOLUME: f64 = 1.0;
const DEFAULT_MUSIC_VOLUME: f64 = 0.3;
const DEFAULT_FADE_SECONDS: f64 = 2.0;
const DEFAULT_MAX_CLIP_MB: u64 = 500;
const DEFAULT_KILL_GRACE_SECONDS: f64 = 5.0;

/// Execute the run command: scan, plan, extract, assemble, mix.
pub async fn run(args: RunArgs) -> Result<()> {
    let config = build_job_config(args)?;

    info!(
        source = %config.source_dir.display(),
        output = %config.output.display(),
        "starting compilation run"
    );

    let engine = FfmpegEngine::discover(Duration::from_secs_f64(config.kill_grace_seconds))
        .context("transcoding engine not available")?;

    let (abort, token) = abort_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling run");
            abort.abort();
        }
    });

    let controller = PipelineController::new(Arc::new(engine), config);
    let report = controller.run(token).await;

    print_report_summary(&report);

    match report.state {
        RunState::Done => Ok(()),
        RunState::Failed if report.cancelled => Err(anyhow::anyhow!("run cancelled")),
        RunState::Failed => Err(anyhow::anyhow!(
            "run failed: {}",
            report.error.as_deref().unwrap_or("unknown error")
        )),
    }
}

/// Execute the scan command: preview what a run would pick up.
pub async fn scan(args: ScanArgs) -> Result<()> {
    let engine = FfmpegEngine::discover(Duration::from_secs_f64(DEFAULT_KILL_GRACE_SECONDS))
        .context("transcoding engine not available")?;

    let scanner = ClipScanner::new(Arc::new(engine), args.max_clip_mb * 1024 * 1024);
    let entries = scanner.scan(&args.source_dir).await?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&entries)
            .context("could not serialize scan results")?;
        println!("{}", rendered);
        return Ok(());
    }

    println!("Scan of {}", args.source_dir.display());
    println!("=================");
    for entry in &entries {
        let detail = match &entry.status {
            ClipStatus::Pending => match entry.duration {
                Some(d) => format!("{:.1}s", d),
                None => "unprobed".to_string(),
            },
            ClipStatus::Skipped { reason } => format!("skipped: {}", reason),
            ClipStatus::Failed { diagnostic, .. } => format!("failed: {}", diagnostic),
            other => format!("{:?}", other),
        };
        println!("  {:>3}. {} ({})", entry.order, entry.file_name(), detail);
    }
    Ok(())
}

/// Merge CLI flags over the optional config file over built-in defaults.
fn build_job_config(args: RunArgs) -> Result<JobConfig> {
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let source_dir = args
        .source_dir
        .or(file.source_dir)
        .context("no source folder given (use --source-dir or a config file)")?;

    let tail = TailWindow::new(
        args.tail_start
            .or(file.tail_start)
            .unwrap_or(DEFAULT_TAIL_START),
        args.tail_end.or(file.tail_end).unwrap_or(DEFAULT_TAIL_END),
    )?;

    let defaults = EncodeParams::default();
    let encode = EncodeParams {
        width: args.width.or(file.width).unwrap_or(defaults.width),
        height: args.height.or(file.height).unwrap_or(defaults.height),
        fps: args.fps.or(file.fps).unwrap_or(defaults.fps),
        video_codec: args
            .video_codec
            .or(file.video_codec)
            .unwrap_or(defaults.video_codec),
        audio_codec: args
            .audio_codec
            .or(file.audio_codec)
            .unwrap_or(defaults.audio_codec),
        crf: args.crf.or(file.crf).unwrap_or(defaults.crf),
        preset: args.preset.or(file.preset).unwrap_or(defaults.preset),
    };

    let mix_policy = if args.mix_required || file.mix_required.unwrap_or(false) {
        MixPolicy::Required
    } else {
        MixPolicy::BestEffort
    };

    Ok(JobConfig {
        source_dir,
        intro: args.intro.or(file.intro),
        music: args.music.or(file.music),
        output: args
            .output
            .or(file.output)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
        tail,
        encode,
        parallelism: args
            .parallelism
            .or(file.parallelism)
            .unwrap_or_else(num_cpus::get),
        original_volume: args
            .original_volume
            .or(file.original_volume)
            .unwrap_or(DEFAULT_ORIGINAL_VOLUME),
        music_volume: args
            .music_volume
            .or(file.music_volume)
            .unwrap_or(DEFAULT_MUSIC_VOLUME),
        fade_seconds: args
            .fade_seconds
            .or(file.fade_seconds)
            .unwrap_or(DEFAULT_FADE_SECONDS),
        mix_policy,
        max_clip_bytes: args
            .max_clip_mb
            .or(file.max_clip_mb)
            .unwrap_or(DEFAULT_MAX_CLIP_MB)
            * 1024
            * 1024,
        kill_grace_seconds: args
            .kill_grace_seconds
            .or(file.kill_grace_seconds)
            .unwrap_or(DEFAULT_KILL_GRACE_SECONDS),
        report_path: args.report,
    })
}

/// Display the run outcome in human-readable form.
fn print_report_summary(report: &RunReport) {
    println!("Run Summary");
    println!("===========");
    println!(
        "State: {}{}",
        match report.state {
            RunState::Done => "done",
            RunState::Failed => "failed",
        },
        if report.cancelled { " (cancelled)" } else { "" }
    );
    if let Some(artifact) = &report.artifact {
        println!("Artifact: {}", artifact.display());
    }
    if let Some(duration) = report.total_duration {
        println!("Duration: {:.1}s", duration);
    }
    if report.audio_degraded {
        println!("Audio: music could not be mixed; artifact has original audio only");
    }
    if let Some(error) = &report.error {
        println!("Error: {}", error);
    }
    println!(
        "Clips: {} succeeded / {} total",
        report.succeeded_count(),
        report.clips.len()
    );
    for clip in &report.clips {
        let name = clip
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| clip.path.display().to_string());
        let status = match &clip.status {
            ClipStatus::Succeeded => "ok".to_string(),
            ClipStatus::Discarded => "discarded".to_string(),
            ClipStatus::Skipped { reason } => format!("skipped: {}", reason),
            ClipStatus::Failed { stage, diagnostic } => {
                format!("failed at {}: {}", stage, diagnostic)
            }
            other => format!("{:?}", other).to_ascii_lowercase(),
        };
        println!("  {:>3}. {} - {}", clip.order, name, status);
    }
}
