//! Mapping parsed tags to narration time and reconciling them against the
//! timeline.
//!
//! Character offsets into the aligned segment text convert to absolute
//! narration time proportionally: every character of a segment is assumed
//! to take the same share of the segment's duration. Absolute event windows
//! are then clipped to per-entry local windows for overlay burn-in.

use crate::alignment::AlignedSegment;
use crate::annotation::{AnnotationKind, AnnotationTag};
use crate::error::{CoreError, CoreResult};
use crate::timeline::Timeline;
use std::path::PathBuf;

/// Extra seconds an overlay stays visible past its spoken content.
pub const OVERLAY_TAIL_PADDING_SECS: f64 = 1.5;

/// A time-boundable annotation in absolute narration time.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationEvent {
    pub kind: AnnotationKind,
    pub keyword: String,
    pub content: String,
    /// Character offset of the content within the segment text.
    pub text_offset: usize,
    /// Content length in characters.
    pub content_len: usize,
    pub begin_time: f64,
    pub end_time: f64,
    /// Resolved asset: overlay image or sound-effect file.
    pub asset: PathBuf,
}

impl AnnotationEvent {
    pub fn duration(&self) -> f64 {
        self.end_time - self.begin_time
    }
}

/// A prior event in the same scene that physically lengthens playback,
/// shifting every later offset by its duration.
#[derive(Debug, Clone, Copy)]
pub struct PriorEvent {
    pub text_offset: usize,
    pub duration_secs: f64,
}

/// Converts a tag's character anchor into absolute narration time.
///
/// Returns the soft `EventLocateFailure` when the tag content is not a
/// verbatim substring of the aligned text (upstream text mismatch); the
/// caller skips the event and continues the scene.
pub fn map_event(
    tag: &AnnotationTag,
    segment: &AlignedSegment,
    asset: PathBuf,
    prior: Option<PriorEvent>,
) -> CoreResult<AnnotationEvent> {
    let total_chars = segment.text.chars().count();
    if total_chars == 0 || tag.content.is_empty() {
        return Err(CoreError::EventLocateFailure {
            content: tag.content.clone(),
        });
    }

    let byte_offset = segment.text.find(&tag.content).ok_or_else(|| {
        CoreError::EventLocateFailure {
            content: tag.content.clone(),
        }
    })?;
    let text_offset = segment.text[..byte_offset].chars().count();
    let content_len = tag.content.chars().count();

    let per_char = segment.duration() / total_chars as f64;
    let mut begin_time = segment.begin_time + text_offset as f64 * per_char;
    if let Some(prior) = prior {
        if prior.text_offset < text_offset {
            begin_time += prior.duration_secs;
        }
    }

    let mut end_time = begin_time + content_len as f64 * per_char;
    if tag.kind == AnnotationKind::Overlay {
        end_time += OVERLAY_TAIL_PADDING_SECS;
    }

    Ok(AnnotationEvent {
        kind: tag.kind,
        keyword: tag.keyword.clone(),
        content: tag.content.clone(),
        text_offset,
        content_len,
        begin_time,
        end_time,
        asset,
    })
}

/// An overlay event's window expressed relative to one timeline entry's
/// local `[0, duration)` range.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayWindow {
    pub image: PathBuf,
    pub rel_start: f64,
    pub rel_end: f64,
}

/// Clips each overlay event against every timeline entry, producing zero or
/// one window per entry. Events are not expected to overlap; the first
/// event matching an entry wins.
pub fn reconcile(events: &[AnnotationEvent], timeline: &Timeline) -> Vec<Option<OverlayWindow>> {
    timeline
        .entries()
        .iter()
        .map(|entry| {
            let (start, end) = (entry.start_time, entry.end_time);
            for event in events.iter().filter(|e| e.kind == AnnotationKind::Overlay) {
                // Event already running when this entry starts.
                if event.begin_time <= start && event.end_time > start {
                    return Some(OverlayWindow {
                        image: event.asset.clone(),
                        rel_start: 0.0,
                        rel_end: event.end_time.min(end) - start,
                    });
                }
                // Event begins inside this entry.
                if event.begin_time > start && event.begin_time < end {
                    return Some(OverlayWindow {
                        image: event.asset.clone(),
                        rel_start: event.begin_time - start,
                        rel_end: event.end_time.min(end) - start,
                    });
                }
            }
            None
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::NormalizedClip;
    use crate::timeline::TIME_EPSILON;

    fn overlay_tag(keyword: &str, content: &str) -> AnnotationTag {
        AnnotationTag {
            kind: AnnotationKind::Overlay,
            keyword: keyword.to_string(),
            content: content.to_string(),
        }
    }

    fn segment(text: &str, begin: f64, end: f64) -> AlignedSegment {
        AlignedSegment {
            text: text.to_string(),
            begin_time: begin,
            end_time: end,
        }
    }

    fn timeline(durations: &[f64]) -> Timeline {
        Timeline::build(
            durations
                .iter()
                .enumerate()
                .map(|(i, &duration)| NormalizedClip {
                    path: PathBuf::from(format!("/work/clip{i}.mp4")),
                    duration,
                })
                .collect(),
        )
    }

    #[test]
    fn proportional_mapping_matches_worked_example() {
        // 12 characters over a 6.0s segment starting at t=10.0 gives 0.5s
        // per character; 3 characters at offset 7 begin at 13.5s.
        let seg = segment("abcdefghijkl", 10.0, 16.0);
        let event = map_event(
            &overlay_tag("kw", "hij"),
            &seg,
            PathBuf::from("/assets/kw.png"),
            None,
        )
        .unwrap();
        assert_eq!(event.text_offset, 7);
        assert_eq!(event.content_len, 3);
        assert!((event.begin_time - 13.5).abs() < TIME_EPSILON);
        assert!((event.end_time - (15.0 + OVERLAY_TAIL_PADDING_SECS)).abs() < TIME_EPSILON);
    }

    #[test]
    fn sound_effect_events_get_no_tail_padding() {
        let seg = segment("abcdefghijkl", 0.0, 6.0);
        let tag = AnnotationTag {
            kind: AnnotationKind::SoundEffect,
            keyword: "chime".to_string(),
            content: "hij".to_string(),
        };
        let event = map_event(&tag, &seg, PathBuf::from("/assets/chime.mp3"), None).unwrap();
        assert!((event.begin_time - 3.5).abs() < TIME_EPSILON);
        assert!((event.end_time - 5.0).abs() < TIME_EPSILON);
    }

    #[test]
    fn prior_event_shifts_later_offsets_only() {
        let seg = segment("abcdefghijkl", 10.0, 16.0);
        let prior = PriorEvent {
            text_offset: 2,
            duration_secs: 0.8,
        };
        let shifted = map_event(
            &overlay_tag("kw", "hij"),
            &seg,
            PathBuf::from("/assets/kw.png"),
            Some(prior),
        )
        .unwrap();
        assert!((shifted.begin_time - 14.3).abs() < TIME_EPSILON);

        // A prior event after the anchor leaves the timing untouched.
        let later = PriorEvent {
            text_offset: 9,
            duration_secs: 0.8,
        };
        let unshifted = map_event(
            &overlay_tag("kw", "cde"),
            &seg,
            PathBuf::from("/assets/kw.png"),
            Some(later),
        )
        .unwrap();
        assert!((unshifted.begin_time - 11.0).abs() < TIME_EPSILON);
    }

    #[test]
    fn unlocatable_content_is_a_soft_failure() {
        let seg = segment("completely different text", 0.0, 5.0);
        let result = map_event(
            &overlay_tag("kw", "missing words"),
            &seg,
            PathBuf::from("/assets/kw.png"),
            None,
        );
        assert!(matches!(
            result,
            Err(CoreError::EventLocateFailure { .. })
        ));
    }

    #[test]
    fn multibyte_text_counts_characters_not_bytes() {
        let seg = segment("日本語のテキストです", 0.0, 10.0);
        let tag = overlay_tag("kw", "テキスト");
        let event = map_event(&tag, &seg, PathBuf::from("/a.png"), None).unwrap();
        assert_eq!(event.text_offset, 4);
        assert_eq!(event.content_len, 4);
        assert!((event.begin_time - 4.0).abs() < TIME_EPSILON);
    }

    #[test]
    fn event_spanning_two_windows_yields_one_window_per_clip() {
        let tl = timeline(&[6.0, 8.0, 5.0]);
        let event = AnnotationEvent {
            kind: AnnotationKind::Overlay,
            keyword: "kw".to_string(),
            content: "hij".to_string(),
            text_offset: 7,
            content_len: 3,
            begin_time: 13.5,
            end_time: 16.5,
            asset: PathBuf::from("/a.png"),
        };
        let windows = reconcile(&[event], &tl);
        assert_eq!(windows.len(), 3);
        assert!(windows[0].is_none());

        let second = windows[1].as_ref().unwrap();
        assert!((second.rel_start - 7.5).abs() < TIME_EPSILON);
        assert!((second.rel_end - 8.0).abs() < TIME_EPSILON);

        let third = windows[2].as_ref().unwrap();
        assert_eq!(third.rel_start, 0.0);
        assert!((third.rel_end - 2.5).abs() < TIME_EPSILON);
    }

    #[test]
    fn event_containing_an_entry_covers_it_fully() {
        let tl = timeline(&[4.0, 2.0, 4.0]);
        let event = AnnotationEvent {
            kind: AnnotationKind::Overlay,
            keyword: "kw".to_string(),
            content: "x".to_string(),
            text_offset: 0,
            content_len: 1,
            begin_time: 3.0,
            end_time: 7.0,
            asset: PathBuf::from("/a.png"),
        };
        let windows = reconcile(&[event], &tl);
        let middle = windows[1].as_ref().unwrap();
        assert_eq!(middle.rel_start, 0.0);
        assert!((middle.rel_end - 2.0).abs() < TIME_EPSILON);
    }

    #[test]
    fn sound_effect_events_never_produce_windows() {
        let tl = timeline(&[5.0]);
        let event = AnnotationEvent {
            kind: AnnotationKind::SoundEffect,
            keyword: "chime".to_string(),
            content: "ding".to_string(),
            text_offset: 0,
            content_len: 4,
            begin_time: 1.0,
            end_time: 2.0,
            asset: PathBuf::from("/chime.mp3"),
        };
        let windows = reconcile(&[event], &tl);
        assert!(windows[0].is_none());
    }

    #[test]
    fn event_ending_at_entry_start_does_not_touch_it() {
        let tl = timeline(&[6.0, 6.0]);
        let event = AnnotationEvent {
            kind: AnnotationKind::Overlay,
            keyword: "kw".to_string(),
            content: "x".to_string(),
            text_offset: 0,
            content_len: 1,
            begin_time: 2.0,
            end_time: 6.0,
            asset: PathBuf::from("/a.png"),
        };
        let windows = reconcile(&[event], &tl);
        assert!(windows[0].is_some());
        assert!(windows[1].is_none());
    }
}
