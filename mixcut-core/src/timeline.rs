//! Cumulative timeline accounting over normalized clips.
//!
//! Pure arithmetic, no media I/O: an ordered clip list becomes cumulative
//! `[start_time, end_time)` windows. The timeline is only ever appended to
//! during construction and never reordered afterwards.

use crate::error::{CoreError, CoreResult};
use crate::normalize::NormalizedClip;

/// Tolerance for floating-point comparisons over accumulated durations.
pub const TIME_EPSILON: f64 = 1e-6;

/// One clip's window on the job timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub clip: NormalizedClip,
    pub start_time: f64,
    pub end_time: f64,
}

impl TimelineEntry {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// The cumulative, concatenation-order time view of a job's clips.
///
/// Invariants established by construction: the first entry starts at 0 and
/// each entry's end equals the next entry's start.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    /// Builds the timeline as a running sum of clip durations.
    pub fn build(clips: Vec<NormalizedClip>) -> Timeline {
        let mut entries = Vec::with_capacity(clips.len());
        let mut current_time = 0.0;
        for clip in clips {
            let start_time = current_time;
            let end_time = current_time + clip.duration;
            entries.push(TimelineEntry {
                clip,
                start_time,
                end_time,
            });
            current_time = end_time;
        }
        Timeline { entries }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total covered duration; equals the last entry's end time.
    pub fn total_duration(&self) -> f64 {
        self.entries.last().map_or(0.0, |e| e.end_time)
    }

    /// Verifies the timeline covers the narration target. A deficit is a
    /// fatal selection error, never silently truncated.
    pub fn ensure_covers(&self, narration_secs: f64) -> CoreResult<()> {
        let total = self.total_duration();
        if total + TIME_EPSILON < narration_secs {
            return Err(CoreError::SelectionExhausted {
                shortfall_secs: narration_secs - total,
            });
        }
        Ok(())
    }

    /// Checks the adjacency invariant; useful as a debug assertion after
    /// any code path that constructs entries.
    pub fn check_invariants(&self) -> CoreResult<()> {
        if let Some(first) = self.entries.first() {
            if first.start_time.abs() > TIME_EPSILON {
                return Err(CoreError::TimelineInvariant(format!(
                    "first entry starts at {} instead of 0",
                    first.start_time
                )));
            }
        }
        for pair in self.entries.windows(2) {
            if (pair[0].end_time - pair[1].start_time).abs() > TIME_EPSILON {
                return Err(CoreError::TimelineInvariant(format!(
                    "gap between {} and {}",
                    pair[0].end_time, pair[1].start_time
                )));
            }
        }
        let sum: f64 = self.entries.iter().map(TimelineEntry::duration).sum();
        if (sum - self.total_duration()).abs() > TIME_EPSILON {
            return Err(CoreError::TimelineInvariant(format!(
                "duration sum {} diverges from end time {}",
                sum,
                self.total_duration()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn clips(durations: &[f64]) -> Vec<NormalizedClip> {
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
    fn windows_are_cumulative() {
        let timeline = Timeline::build(clips(&[6.0, 8.0, 5.0]));
        let entries = timeline.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!((entries[0].start_time, entries[0].end_time), (0.0, 6.0));
        assert_eq!((entries[1].start_time, entries[1].end_time), (6.0, 14.0));
        assert_eq!((entries[2].start_time, entries[2].end_time), (14.0, 19.0));
        assert_eq!(timeline.total_duration(), 19.0);
        timeline.check_invariants().unwrap();
    }

    #[test]
    fn adjacent_windows_share_boundaries() {
        let timeline = Timeline::build(clips(&[2.5, 3.25, 4.0, 1.75]));
        for pair in timeline.entries().windows(2) {
            assert!((pair[0].end_time - pair[1].start_time).abs() < TIME_EPSILON);
        }
        assert!((timeline.total_duration() - 11.5).abs() < TIME_EPSILON);
    }

    #[test]
    fn covers_narration_or_fails_with_shortfall() {
        let timeline = Timeline::build(clips(&[6.0, 8.0, 5.0]));
        assert!(timeline.ensure_covers(19.0).is_ok());
        assert!(timeline.ensure_covers(18.0).is_ok());
        match timeline.ensure_covers(21.5) {
            Err(CoreError::SelectionExhausted { shortfall_secs }) => {
                assert!((shortfall_secs - 2.5).abs() < TIME_EPSILON);
            }
            other => panic!("expected SelectionExhausted, got {other:?}"),
        }
    }

    #[test]
    fn empty_timeline_has_zero_duration() {
        let timeline = Timeline::build(Vec::new());
        assert!(timeline.is_empty());
        assert_eq!(timeline.total_duration(), 0.0);
        assert!(timeline.ensure_covers(0.0).is_ok());
        assert!(timeline.ensure_covers(1.0).is_err());
    }
}
