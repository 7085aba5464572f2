//! Aligned narration segments.
//!
//! The alignment collaborator hands the pipeline one `(begin, end, text)`
//! segment per scene. For prerendered narration the segments are derived
//! here by accumulating per-scene audio durations; a captioning service can
//! substitute its own, more precise segments with the same shape.

use crate::error::{CoreError, CoreResult};

/// One scene's aligned narration window.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSegment {
    /// Spoken text of the scene, tag syntax already stripped.
    pub text: String,
    pub begin_time: f64,
    pub end_time: f64,
}

impl AlignedSegment {
    pub fn duration(&self) -> f64 {
        self.end_time - self.begin_time
    }
}

/// Builds cumulative segments from per-scene texts and audio durations.
pub fn segments_from_scenes(texts: &[String], durations: &[f64]) -> CoreResult<Vec<AlignedSegment>> {
    if texts.len() != durations.len() {
        return Err(CoreError::InvalidConfig(format!(
            "{} scene texts but {} audio durations",
            texts.len(),
            durations.len()
        )));
    }

    let mut segments = Vec::with_capacity(texts.len());
    let mut current_time = 0.0;
    for (text, &duration) in texts.iter().zip(durations) {
        segments.push(AlignedSegment {
            text: text.clone(),
            begin_time: current_time,
            end_time: current_time + duration,
        });
        current_time += duration;
    }
    Ok(segments)
}

/// Renders the segments as an SRT document.
pub fn to_srt(segments: &[AlignedSegment]) -> String {
    let mut blocks = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        blocks.push(format!(
            "{}\n{} --> {}\n{}\n",
            index + 1,
            format_srt_time(segment.begin_time),
            format_srt_time(segment.end_time),
            segment.text
        ));
    }
    blocks.join("\n")
}

/// Formats seconds as the SRT timestamp `HH:MM:SS,mmm`.
fn format_srt_time(secs: f64) -> String {
    let total_millis = (secs.max(0.0) * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let seconds = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}
