use mixcut_core::annotation::events::{map_event, reconcile, OVERLAY_TAIL_PADDING_SECS};
use mixcut_core::annotation::{find_tag, strip_tags, AnnotationKind, AnnotationTag};
use mixcut_core::*;
use std::path::PathBuf;
use std::time::Duration;

// --- Formatting helpers ---

#[test]
fn test_format_duration() {
    assert_eq!(format_duration(Duration::from_secs(0)), "0h 0m 0s");
    assert_eq!(format_duration(Duration::from_secs(61)), "0h 1m 1s");
    assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
}

#[test]
fn test_format_bytes() {
    assert_eq!(format_bytes(1023), "1023 B");
    assert_eq!(format_bytes(1024 * 1024), "1.00 MiB");
}

// --- Timeline over the public API ---

fn normalized(durations: &[f64]) -> Vec<NormalizedClip> {
    durations
        .iter()
        .enumerate()
        .map(|(i, &duration)| NormalizedClip {
            path: PathBuf::from(format!("/work/clip{i}.mp4")),
            duration,
        })
        .collect()
}

#[test]
fn timeline_matches_worked_example() {
    // Three clips of [6s, 8s, 5s] yield windows [0,6), [6,14), [14,19).
    let timeline = Timeline::build(normalized(&[6.0, 8.0, 5.0]));
    let entries = timeline.entries();
    assert_eq!(entries[0].start_time, 0.0);
    assert_eq!(entries[1].start_time, 6.0);
    assert_eq!(entries[1].end_time, 14.0);
    assert_eq!(entries[2].end_time, 19.0);

    // The 19s total covers an 18.5s narration; a 20s narration must have
    // kept the selector going instead.
    assert!(timeline.ensure_covers(18.5).is_ok());
    assert!(matches!(
        timeline.ensure_covers(20.0),
        Err(CoreError::SelectionExhausted { .. })
    ));
}

// --- End-to-end event mapping ---

#[test]
fn event_mapping_matches_worked_example() {
    // 12 characters over a 6.0s segment starting at t=10.0s: 0.5s per
    // character; 3 tagged characters at offset 7 begin at 13.5s and end at
    // 15.0s plus the overlay tail padding.
    let segment = AlignedSegment {
        text: "abcdefghijkl".to_string(),
        begin_time: 10.0,
        end_time: 16.0,
    };
    let tag = find_tag("before [I-kw]hij[/I] after", AnnotationKind::Overlay)
        .unwrap()
        .unwrap();
    let event = map_event(&tag, &segment, PathBuf::from("/assets/kw.png"), None).unwrap();
    assert!((event.begin_time - 13.5).abs() < 1e-9);
    assert!((event.end_time - (15.0 + OVERLAY_TAIL_PADDING_SECS)).abs() < 1e-9);
}

#[test]
fn event_spanning_adjacent_windows_clamps_per_clip() {
    let timeline = Timeline::build(normalized(&[6.0, 8.0, 5.0]));
    let event = map_event(
        &AnnotationTag {
            kind: AnnotationKind::Overlay,
            keyword: "kw".to_string(),
            content: "hij".to_string(),
        },
        &AlignedSegment {
            text: "abcdefghijkl".to_string(),
            begin_time: 10.0,
            end_time: 16.0,
        },
        PathBuf::from("/assets/kw.png"),
        None,
    )
    .unwrap();

    let windows = reconcile(&[event], &timeline);
    // The 13.5s..16.5s event touches the second and third windows only.
    assert!(windows[0].is_none());
    let second = windows[1].as_ref().unwrap();
    let third = windows[2].as_ref().unwrap();
    // Each window is clamped to its clip's local [0, duration).
    assert!(second.rel_start >= 0.0 && second.rel_end <= 8.0);
    assert!(third.rel_start == 0.0 && third.rel_end <= 5.0);
}

#[test]
fn tag_grammar_round_trip() {
    let text = "the [I-trunk]boot space[/I] takes [S-chime]ding[/S] bags";
    assert_eq!(strip_tags(text), "the boot space takes ding bags");

    let overlay = find_tag(text, AnnotationKind::Overlay).unwrap().unwrap();
    assert_eq!(overlay.keyword, "trunk");
    // The stripped text still contains the tagged content verbatim, which
    // is what anchors the event inside the aligned segment.
    assert!(strip_tags(text).contains(&overlay.content));
}

// --- Configuration ---

#[test]
fn config_validation_guards_feature_combinations() {
    let mut config = MixConfig::new(PathBuf::from("/tmp/out"));
    assert!(config.validate().is_ok());

    config.transition = Some(TransitionConfig {
        kind: "fade".to_string(),
        duration_secs: 5.0,
    });
    // A crossfade longer than the shortest permissible clip can never fit.
    assert!(config.validate().is_err());

    config.transition = Some(TransitionConfig {
        kind: "fade".to_string(),
        duration_secs: 1.0,
    });
    config.background_music = Some(BackgroundMusic {
        path: PathBuf::from("/music/bed.mp3"),
        volume: 0.5,
    });
    assert!(config.validate().is_ok());

    config.background_music = Some(BackgroundMusic {
        path: PathBuf::from("/music/bed.mp3"),
        volume: 1.5,
    });
    assert!(config.validate().is_err());
}

// --- Alignment ---

#[test]
fn alignment_segments_accumulate() {
    let segments = alignment::segments_from_scenes(
        &["scene one".to_string(), "scene two".to_string()],
        &[6.5, 4.0],
    )
    .unwrap();
    assert_eq!(segments[1].begin_time, 6.5);
    assert_eq!(segments[1].end_time, 10.5);

    let srt = alignment::to_srt(&segments);
    assert!(srt.contains("00:00:06,500 --> 00:00:10,500"));
}
