use super::*;

#[test]
fn tail_window_rejects_negative_end_offset() {
    assert!(TailWindow::new(30.0, -1.0).is_err());
}

#[test]
fn tail_window_requires_start_beyond_end() {
    assert!(TailWindow::new(5.0, 5.0).is_err());
    assert!(TailWindow::new(5.0, 30.0).is_err());
    assert!(TailWindow::new(30.0, 5.0).is_ok());
}

#[test]
fn tail_window_allows_zero_end_offset() {
    let tail = TailWindow::new(10.0, 0.0).unwrap();
    assert_eq!(tail.end_offset, 0.0);
}

#[test]
fn trim_window_duration_and_whole_clip() {
    let window = TrimWindow {
        start: 20.0,
        end: 45.0,
    };
    assert_eq!(window.duration(), 25.0);
    assert!(!window.is_whole_clip());

    let whole = TrimWindow {
        start: 0.0,
        end: 3.0,
    };
    assert!(whole.is_whole_clip());
}

#[test]
fn stream_params_match_within_fps_tolerance() {
    let expected = StreamParams {
        width: 1920,
        height: 1080,
        fps: 30.0,
        video_codec: "h264".to_string(),
        has_audio: true,
    };
    let ntsc = StreamParams {
        fps: 29.97,
        ..expected.clone()
    };
    assert!(ntsc.mismatch_against(&expected).is_none());
}

#[test]
fn stream_params_report_first_difference() {
    let expected = StreamParams {
        width: 1920,
        height: 1080,
        fps: 30.0,
        video_codec: "h264".to_string(),
        has_audio: true,
    };

    let wrong_size = StreamParams {
        width: 1280,
        height: 720,
        ..expected.clone()
    };
    let detail = wrong_size.mismatch_against(&expected).unwrap();
    assert!(detail.contains("1280x720"));
    assert!(detail.contains("1920x1080"));

    let wrong_codec = StreamParams {
        video_codec: "hevc".to_string(),
        ..expected.clone()
    };
    assert!(wrong_codec
        .mismatch_against(&expected)
        .unwrap()
        .contains("hevc"));

    let mute = StreamParams {
        has_audio: false,
        ..expected.clone()
    };
    assert_eq!(
        mute.mismatch_against(&expected).unwrap(),
        "missing audio stream"
    );
}

#[test]
fn encode_params_expect_decoded_codec_name() {
    let encode = EncodeParams::default();
    let expected = encode.expected_stream_params();
    assert_eq!(expected.video_codec, "h264");
    assert!(expected.has_audio);
    assert_eq!(expected.width, 1920);

    let hevc = EncodeParams {
        video_codec: "libx265".to_string(),
        ..EncodeParams::default()
    };
    assert_eq!(hevc.expected_stream_params().video_codec, "hevc");
}

#[test]
fn clip_status_serializes_with_tags() {
    let skipped = ClipStatus::Skipped {
        reason: SkipReason::Oversize {
            size_bytes: 600,
            limit_bytes: 500,
        },
    };
    let json = serde_json::to_value(&skipped).unwrap();
    assert_eq!(json["status"], "skipped");
    assert_eq!(json["reason"]["kind"], "oversize");
    assert_eq!(json["reason"]["size_bytes"], 600);

    let failed = ClipStatus::Failed {
        stage: FailureStage::Probe,
        diagnostic: "moov atom not found".to_string(),
    };
    let json = serde_json::to_value(&failed).unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["stage"], "probe");
}

#[test]
fn terminal_failure_classification() {
    assert!(ClipStatus::Skipped {
        reason: SkipReason::UnsupportedExtension
    }
    .is_terminal_failure());
    assert!(ClipStatus::Failed {
        stage: FailureStage::Extract,
        diagnostic: String::new()
    }
    .is_terminal_failure());
    assert!(!ClipStatus::Succeeded.is_terminal_failure());
    assert!(!ClipStatus::Discarded.is_terminal_failure());
}

#[test]
fn segment_names_its_source_clip() {
    let segment = Segment {
        order: 3,
        path: PathBuf::from("/tmp/work/seg_0003.mp4"),
        source: PathBuf::from("/clips/match_b.mp4"),
        duration: 25.0,
    };
    assert_eq!(segment.source_name(), "match_b.mp4");
}

#[test]
fn effective_parallelism_is_bounded_by_clip_count() {
    let config = sample_config(8);
    assert_eq!(config.effective_parallelism(3), 3);
    assert_eq!(config.effective_parallelism(20), 8);
    assert_eq!(config.effective_parallelism(0), 1);
}

#[test]
fn run_report_round_trips_through_json() {
    let report = RunReport {
        state: RunState::Done,
        cancelled: false,
        error: None,
        clips: vec![ClipOutcome {
            path: PathBuf::from("/clips/a.mp4"),
            order: 0,
            status: ClipStatus::Succeeded,
        }],
        total_duration: Some(55.0),
        artifact: Some(PathBuf::from("compilation.mp4")),
        audio_degraded: true,
        finished_at: chrono::Utc::now(),
    };
    assert_eq!(report.succeeded_count(), 1);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    report.write_json(&path).unwrap();

    let rendered = std::fs::read_to_string(&path).unwrap();
    let parsed: RunReport = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed.state, RunState::Done);
    assert!(parsed.audio_degraded);
    assert_eq!(parsed.clips[0].status, ClipStatus::Succeeded);
}

fn sample_config(parallelism: usize) -> JobConfig {
    JobConfig {
        source_dir: PathBuf::from("/clips"),
        intro: None,
        music: None,
        output: PathBuf::from("compilation.mp4"),
        tail: TailWindow::new(30.0, 5.0).unwrap(),
        encode: EncodeParams::default(),
        parallelism,
        original_volume: 1.0,
        music_volume: 0.3,
        fade_seconds: 2.0,
        mix_policy: MixPolicy::BestEffort,
        max_clip_bytes: 500 * 1024 * 1024,
        kill_grace_seconds: 5.0,
        report_path: None,
    }
}
