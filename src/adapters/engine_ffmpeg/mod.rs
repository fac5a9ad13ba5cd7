//! FFmpeg engine adapter
//!
//! Implements the engine port by shelling out to `ffmpeg`/`ffprobe`.
//! Probing parses ffprobe's JSON output; extraction, concatenation and
//! mixing build explicit argument lists so every invocation is inspectable
//! and unit-testable without spawning the engine.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::ports::*;

/// How many trailing stderr lines to keep as the failure diagnostic
const DIAGNOSTIC_TAIL_LINES: usize = 40;

/// FFmpeg-based engine adapter
pub struct FfmpegEngine {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    /// Grace period a cancelled invocation gets before being killed
    kill_grace: Duration,
}

impl FfmpegEngine {
    /// Locate the engine binaries on PATH
    pub fn discover(kill_grace: Duration) -> Result<Self, EngineError> {
        let ffmpeg = which::which("ffmpeg").map_err(|_| EngineError::NotFound {
            tool: "ffmpeg".to_string(),
        })?;
        let ffprobe = which::which("ffprobe").map_err(|_| EngineError::NotFound {
            tool: "ffprobe".to_string(),
        })?;
        Ok(Self {
            ffmpeg,
            ffprobe,
            kill_grace,
        })
    }

    /// Run one ffmpeg invocation, collecting the stderr tail for diagnostics.
    /// With an abort token, a signalled abort lets the engine finish within
    /// the grace period, then kills it; either way the invocation reports
    /// `Aborted` so partial artifacts are never treated as results.
    async fn run_ffmpeg(
        &self,
        args: &[String],
        abort: Option<&AbortToken>,
    ) -> Result<(), EngineError> {
        debug!(target: "reelstitch::engine", "ffmpeg {}", args.join(" "));

        let mut child = Command::new(&self.ffmpeg)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error("ffmpeg", e))?;

        let stderr = child.stderr.take();
        let collector = tokio::spawn(async move {
            let mut tail: VecDeque<String> = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tail.len() == DIAGNOSTIC_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }
            tail.into_iter().collect::<Vec<_>>().join("\n")
        });

        let status = if let Some(abort) = abort {
            tokio::select! {
                status = child.wait() => status,
                _ = abort.aborted() => {
                    match tokio::time::timeout(self.kill_grace, child.wait()).await {
                        Ok(_) => {
                            debug!("cancelled engine invocation finished within grace period");
                        }
                        Err(_) => {
                            warn!("cancelled engine invocation exceeded grace period, killing");
                            let _ = child.kill().await;
                        }
                    }
                    let _ = collector.await;
                    return Err(EngineError::Aborted);
                }
            }
        } else {
            child.wait().await
        };

        let diagnostic = collector.await.unwrap_or_default();
        let status = status.map_err(|e| EngineError::Failed {
            tool: "ffmpeg".to_string(),
            code: None,
            diagnostic: format!("wait failed: {}", e),
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(EngineError::Failed {
                tool: "ffmpeg".to_string(),
                code: status.code(),
                diagnostic,
            })
        }
    }
}

fn spawn_error(tool: &str, e: std::io::Error) -> EngineError {
    if e.kind() == std::io::ErrorKind::NotFound {
        EngineError::NotFound {
            tool: tool.to_string(),
        }
    } else {
        EngineError::Failed {
            tool: tool.to_string(),
            code: None,
            diagnostic: format!("spawn failed: {}", e),
        }
    }
}

#[async_trait]
impl EnginePort for FfmpegEngine {
    async fn probe(&self, path: &Path) -> Result<MediaProbe, EngineError> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| spawn_error("ffprobe", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Failed {
                tool: "ffprobe".to_string(),
                code: output.status.code(),
                diagnostic: stderr.trim().to_string(),
            });
        }

        let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| EngineError::Malformed(format!("ffprobe JSON: {}", e)))?;
        parse_probe(&probe)
    }

    async fn extract(&self, req: &ExtractRequest, abort: &AbortToken) -> Result<(), EngineError> {
        if abort.is_aborted() {
            return Err(EngineError::Aborted);
        }
        let args = build_extract_args(req);
        self.run_ffmpeg(&args, Some(abort)).await
    }

    async fn concat(&self, req: &ConcatRequest) -> Result<(), EngineError> {
        let list_path = concat_list_path(&req.output);
        std::fs::write(&list_path, concat_list_body(&req.inputs)).map_err(|e| {
            EngineError::Failed {
                tool: "ffmpeg".to_string(),
                code: None,
                diagnostic: format!("could not write concat list: {}", e),
            }
        })?;
        let args = build_concat_args(&list_path, &req.output);
        self.run_ffmpeg(&args, None).await
    }

    async fn mix(&self, req: &MixRequest) -> Result<(), EngineError> {
        let args = build_mix_args(req);
        self.run_ffmpeg(&args, None).await
    }
}

// --- ffprobe JSON ----------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

fn parse_probe(probe: &FfprobeOutput) -> Result<MediaProbe, EngineError> {
    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| EngineError::Malformed("no video stream found".to_string()))?;

    let has_audio = probe.streams.iter().any(|s| s.codec_type == "audio");

    let duration = probe
        .format
        .duration
        .as_deref()
        .or(video.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| *d > 0.0)
        .ok_or_else(|| EngineError::Malformed("could not determine duration".to_string()))?;

    let fps = video
        .avg_frame_rate
        .as_deref()
        .or(video.r_frame_rate.as_deref())
        .and_then(parse_frame_rate)
        .unwrap_or(30.0);

    Ok(MediaProbe {
        duration,
        params: crate::domain::model::StreamParams {
            width: video.width.unwrap_or(0),
            height: video.height.unwrap_or(0),
            fps,
            video_codec: video.codec_name.clone().unwrap_or_default(),
            has_audio,
        },
    })
}

/// Parse a frame rate string like "30/1", "30000/1001" or "29.97".
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    s.parse().ok()
}

// --- argument construction -------------------------------------------------

fn build_extract_args(req: &ExtractRequest) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-v".into(),
        "error".into(),
        "-ss".into(),
        format!("{:.3}", req.window.start),
        "-t".into(),
        format!("{:.3}", req.window.duration()),
        "-i".into(),
        req.source.to_string_lossy().into_owned(),
    ];

    // Sources without audio get synthesized silence so every segment carries
    // a uniform audio stream into concatenation
    if !req.source_has_audio {
        args.extend([
            "-f".into(),
            "lavfi".into(),
            "-i".into(),
            "anullsrc=channel_layout=stereo:sample_rate=48000".into(),
        ]);
    }

    let audio_input = if req.source_has_audio { 0 } else { 1 };
    args.extend([
        "-map".into(),
        "0:v:0".into(),
        "-map".into(),
        format!("{}:a:0", audio_input),
    ]);

    let e = &req.encode;
    args.extend([
        "-vf".into(),
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,fps={fps}",
            w = e.width,
            h = e.height,
            fps = e.fps
        ),
        "-c:v".into(),
        e.video_codec.clone(),
        "-crf".into(),
        e.crf.to_string(),
        "-preset".into(),
        e.preset.clone(),
        "-c:a".into(),
        e.audio_codec.clone(),
        "-b:a".into(),
        "192k".into(),
        "-ar".into(),
        "48000".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
    ]);

    if !req.source_has_audio {
        // anullsrc is unbounded; stop at the video stream's end
        args.push("-shortest".into());
    }

    args.push(req.output.to_string_lossy().into_owned());
    args
}

fn concat_list_path(output: &Path) -> PathBuf {
    output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("concat_list.txt")
}

/// Body of the concat demuxer list file, one `file '...'` line per input,
/// in assembly order. Single quotes need the ffmpeg escape dance.
fn concat_list_body(inputs: &[PathBuf]) -> String {
    let mut body = String::new();
    for input in inputs {
        let escaped = input.to_string_lossy().replace('\'', "'\\''");
        body.push_str(&format!("file '{}'\n", escaped));
    }
    body
}

fn build_concat_args(list_path: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-v".into(),
        "error".into(),
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        list_path.to_string_lossy().into_owned(),
        "-c".into(),
        "copy".into(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Filter graph for the music overlay: level both tracks, fade the music
/// out before the end, and mix. `duration=first` pins the mix to the
/// assembled stream, truncating the looped music.
fn mix_filter(req: &MixRequest) -> String {
    let fade_start = (req.total_duration - req.fade_seconds).max(0.0);
    format!(
        "[1:a]volume={mv},afade=t=out:st={st:.3}:d={fade:.3}[bg];\
         [0:a]volume={ov}[fg];\
         [fg][bg]amix=inputs=2:duration=first:dropout_transition=0[mixed]",
        mv = req.music_volume,
        ov = req.original_volume,
        st = fade_start,
        fade = req.fade_seconds,
    )
}

fn build_mix_args(req: &MixRequest) -> Vec<String> {
    vec![
        "-y".into(),
        "-v".into(),
        "error".into(),
        "-i".into(),
        req.video.to_string_lossy().into_owned(),
        // Loop the music as often as needed; the mix truncates it
        "-stream_loop".into(),
        "-1".into(),
        "-i".into(),
        req.music.to_string_lossy().into_owned(),
        "-filter_complex".into(),
        mix_filter(req),
        "-map".into(),
        "0:v:0".into(),
        "-map".into(),
        "[mixed]".into(),
        "-c:v".into(),
        "copy".into(),
        "-c:a".into(),
        req.audio_codec.clone(),
        "-b:a".into(),
        "192k".into(),
        "-t".into(),
        format!("{:.3}", req.total_duration),
        req.output.to_string_lossy().into_owned(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{EncodeParams, TrimWindow};

    fn extract_request(has_audio: bool) -> ExtractRequest {
        ExtractRequest {
            source: PathBuf::from("/clips/a.mp4"),
            window: TrimWindow {
                start: 20.0,
                end: 45.0,
            },
            output: PathBuf::from("/tmp/seg_0.mp4"),
            encode: EncodeParams::default(),
            source_has_audio: has_audio,
        }
    }

    #[test]
    fn extract_args_seek_before_input_and_window_duration() {
        let args = build_extract_args(&extract_request(true));
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss < input, "seek must be an input option");
        assert_eq!(args[ss + 1], "20.000");
        let t = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "25.000");
        assert_eq!(args.last().unwrap(), "/tmp/seg_0.mp4");
    }

    #[test]
    fn extract_args_scale_to_configured_output() {
        let args = build_extract_args(&extract_request(true));
        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert!(args[vf + 1].contains("scale=1920:1080"));
        assert!(args[vf + 1].contains("fps=30"));
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"aac".to_string()));
    }

    #[test]
    fn extract_args_synthesize_silence_for_mute_sources() {
        let args = build_extract_args(&extract_request(false));
        assert!(args.iter().any(|a| a.starts_with("anullsrc=")));
        assert!(args.contains(&"1:a:0".to_string()));
        assert!(args.contains(&"-shortest".to_string()));

        let with_audio = build_extract_args(&extract_request(true));
        assert!(!with_audio.iter().any(|a| a.starts_with("anullsrc=")));
        assert!(with_audio.contains(&"0:a:0".to_string()));
    }

    #[test]
    fn concat_list_preserves_order_and_escapes_quotes() {
        let body = concat_list_body(&[
            PathBuf::from("/tmp/intro.mp4"),
            PathBuf::from("/tmp/it's.mp4"),
            PathBuf::from("/tmp/seg_1.mp4"),
        ]);
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[0], "file '/tmp/intro.mp4'");
        assert_eq!(lines[1], "file '/tmp/it'\\''s.mp4'");
        assert_eq!(lines[2], "file '/tmp/seg_1.mp4'");
    }

    #[test]
    fn concat_args_use_stream_copy() {
        let args = build_concat_args(Path::new("/tmp/list.txt"), Path::new("/tmp/out.mp4"));
        assert!(args.contains(&"concat".to_string()));
        let c = args.iter().position(|a| a == "-c").unwrap();
        assert_eq!(args[c + 1], "copy");
    }

    #[test]
    fn mix_filter_levels_loops_and_fades() {
        let req = MixRequest {
            video: PathBuf::from("/tmp/assembled.mp4"),
            music: PathBuf::from("/music/track.mp3"),
            output: PathBuf::from("/out/final.mp4"),
            total_duration: 63.0,
            original_volume: 1.0,
            music_volume: 0.3,
            fade_seconds: 2.0,
            audio_codec: "aac".to_string(),
        };
        let filter = mix_filter(&req);
        assert!(filter.contains("volume=0.3"));
        assert!(filter.contains("volume=1"));
        assert!(filter.contains("afade=t=out:st=61.000:d=2.000"));
        assert!(filter.contains("amix=inputs=2:duration=first"));

        let args = build_mix_args(&req);
        assert!(args.contains(&"-stream_loop".to_string()));
        let t = args.iter().rposition(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "63.000");
    }

    #[test]
    fn mix_fade_start_clamps_at_zero() {
        let req = MixRequest {
            video: PathBuf::from("v"),
            music: PathBuf::from("m"),
            output: PathBuf::from("o"),
            total_duration: 1.0,
            original_volume: 1.0,
            music_volume: 0.5,
            fade_seconds: 2.0,
            audio_codec: "aac".to_string(),
        };
        assert!(mix_filter(&req).contains("st=0.000"));
    }

    #[test]
    fn frame_rate_parsing() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("0/0").is_none());
        assert!(parse_frame_rate("nope").is_none());
    }

    #[test]
    fn probe_parsing_picks_video_stream_and_audio_presence() {
        let raw = r#"{
            "format": {"duration": "50.04"},
            "streams": [
                {"codec_type": "video", "codec_name": "h264", "width": 1920,
                 "height": 1080, "avg_frame_rate": "30/1"},
                {"codec_type": "audio", "codec_name": "aac"}
            ]
        }"#;
        let parsed: FfprobeOutput = serde_json::from_str(raw).unwrap();
        let probe = parse_probe(&parsed).unwrap();
        assert!((probe.duration - 50.04).abs() < 1e-9);
        assert_eq!(probe.params.video_codec, "h264");
        assert_eq!(probe.params.width, 1920);
        assert!(probe.params.has_audio);
    }

    #[test]
    fn probe_parsing_rejects_audio_only_files() {
        let raw = r#"{
            "format": {"duration": "180.0"},
            "streams": [{"codec_type": "audio", "codec_name": "mp3"}]
        }"#;
        let parsed: FfprobeOutput = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            parse_probe(&parsed),
            Err(EngineError::Malformed(_))
        ));
    }
}
