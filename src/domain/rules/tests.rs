use super::*;
use std::path::PathBuf;

fn tail(start: f64, end: f64) -> TailWindow {
    TailWindow::new(start, end).unwrap()
}

#[test]
fn window_covers_the_configured_tail() {
    let window = TrimPlanner::plan_window(50.0, &tail(30.0, 5.0));
    assert_eq!(window.start, 20.0);
    assert_eq!(window.end, 45.0);
    assert_eq!(window.duration(), 25.0);
}

#[test]
fn short_clip_degrades_to_whole_clip() {
    let window = TrimPlanner::plan_window(3.0, &tail(30.0, 5.0));
    assert_eq!(window.start, 0.0);
    assert_eq!(window.end, 3.0);
    assert!(window.is_whole_clip());
}

#[test]
fn boundary_duration_equal_to_start_offset_takes_the_whole_clip() {
    let window = TrimPlanner::plan_window(30.0, &tail(30.0, 5.0));
    assert_eq!(window.start, 0.0);
    assert_eq!(window.end, 30.0);
}

#[test]
fn mid_length_clip_keeps_both_offsets() {
    let window = TrimPlanner::plan_window(40.0, &tail(30.0, 5.0));
    assert_eq!(window.start, 10.0);
    assert_eq!(window.end, 35.0);
}

#[test]
fn zero_end_offset_runs_to_the_clip_end() {
    let window = TrimPlanner::plan_window(100.0, &tail(30.0, 0.0));
    assert_eq!(window.start, 70.0);
    assert_eq!(window.end, 100.0);
}

#[test]
fn window_is_always_within_clip_bounds() {
    for duration in [0.5, 3.0, 29.9, 30.0, 30.1, 50.0, 3600.0] {
        let window = TrimPlanner::plan_window(duration, &tail(30.0, 5.0));
        assert!(window.start >= 0.0, "start negative for {}", duration);
        assert!(window.end <= duration, "end past clip for {}", duration);
        assert!(window.start < window.end, "empty window for {}", duration);
    }
}

#[test]
fn ordering_is_lexicographic_and_reindexes() {
    let mut entries = vec![
        ClipEntry::new(PathBuf::from("/clips/round_c.mp4"), 0, 10),
        ClipEntry::new(PathBuf::from("/clips/round_a.mp4"), 0, 10),
        ClipEntry::new(PathBuf::from("/clips/round_b.mp4"), 0, 10),
    ];
    order_by_file_name(&mut entries);

    let names: Vec<String> = entries.iter().map(|e| e.file_name()).collect();
    assert_eq!(names, ["round_a.mp4", "round_b.mp4", "round_c.mp4"]);
    for (idx, entry) in entries.iter().enumerate() {
        assert_eq!(entry.order, idx);
    }
}

#[test]
fn ordering_ignores_parent_directories() {
    let mut entries = vec![
        ClipEntry::new(PathBuf::from("/z/alpha.mp4"), 0, 10),
        ClipEntry::new(PathBuf::from("/a/beta.mp4"), 0, 10),
    ];
    order_by_file_name(&mut entries);
    assert_eq!(entries[0].file_name(), "alpha.mp4");
}

#[test]
fn extension_allowlist_is_case_insensitive() {
    assert!(is_supported_extension(Path::new("a.mp4")));
    assert!(is_supported_extension(Path::new("a.MOV")));
    assert!(is_supported_extension(Path::new("a.Mkv")));
    assert!(is_supported_extension(Path::new("a.wmv")));
    assert!(!is_supported_extension(Path::new("a.webm")));
    assert!(!is_supported_extension(Path::new("a.txt")));
    assert!(!is_supported_extension(Path::new("noextension")));
}

#[test]
fn preflight_accepts_matching_input() {
    let expected = EncodeParams::default().expected_stream_params();
    assert!(AssemblyPreflight::check_input("intro.mp4", &expected.clone(), &expected).is_ok());
}

#[test]
fn preflight_names_the_mismatched_input() {
    let expected = EncodeParams::default().expected_stream_params();
    let actual = StreamParams {
        width: 1280,
        height: 720,
        ..expected.clone()
    };
    let err = AssemblyPreflight::check_input("intro.mp4", &actual, &expected).unwrap_err();
    match err {
        PipelineError::FormatMismatch { input, detail } => {
            assert_eq!(input, "intro.mp4");
            assert!(detail.contains("1280x720"));
        }
        other => panic!("unexpected error: {}", other),
    }
}
