//! Narration track handling.
//!
//! Per-scene narration tracks concatenate into one job-wide track; mapped
//! sound-effect events mix into it at their text-anchored offsets; and the
//! tail is aligned to the clip total with bounded trailing silence so the
//! final mux never cuts a clip mid-frame.

use crate::error::{CoreError, CoreResult};
use crate::external::ffmpeg::{self, FfmpegSpawner};
use crate::external::filters;
use crate::external::MediaProber;
use crate::temp_files;
use std::path::{Path, PathBuf};

/// Small lead-in before a sound effect so it never clips the syllable it
/// anchors to.
pub const SOUND_EFFECT_LEAD_IN_SECS: f64 = 0.1;

/// Attenuation applied to sound effects under narration.
pub const SOUND_EFFECT_GAIN_DB: f64 = -9.0;

/// Probes the duration of an audio file.
pub fn duration<P: MediaProber>(prober: &P, path: &Path) -> CoreResult<f64> {
    prober
        .media_info(path)?
        .duration
        .ok_or_else(|| {
            CoreError::FfprobeParse(format!("no duration reported for {}", path.display()))
        })
}

/// Concatenates per-scene narration tracks in scene order. A single-scene
/// job keeps its track as-is.
pub fn concat_narration<S: FfmpegSpawner>(
    spawner: &S,
    tracks: &[PathBuf],
    work_dir: &Path,
) -> CoreResult<PathBuf> {
    match tracks {
        [] => Err(CoreError::PathError(
            "no narration tracks to concatenate".to_string(),
        )),
        [single] => Ok(single.clone()),
        many => {
            let list_file = work_dir.join("narration_concat.txt");
            let paths: Vec<&Path> = many.iter().map(PathBuf::as_path).collect();
            ffmpeg::write_concat_list(&paths, &list_file)?;
            let output = temp_files::intermediate_path(work_dir, "narration", "wav");
            ffmpeg::concat_audio(spawner, &list_file, &output)?;
            Ok(output)
        }
    }
}

/// Appends trailing silence to align the narration end with a clip total
/// that overshoots it. The extension is bounded by `max_secs`; any
/// remaining overshoot is left to the mux's shortest-input rule.
pub fn align_tail<S: FfmpegSpawner>(
    spawner: &S,
    narration: &Path,
    overshoot_secs: f64,
    max_secs: f64,
    work_dir: &Path,
) -> CoreResult<PathBuf> {
    let pad = overshoot_secs.min(max_secs);
    if pad <= 0.0 {
        return Ok(narration.to_path_buf());
    }
    log::debug!("padding narration tail with {pad:.2}s of silence");
    let output = temp_files::intermediate_path(work_dir, "narration_padded", "wav");
    ffmpeg::pad_audio_tail(spawner, narration, &output, pad)?;
    Ok(output)
}

/// Mixes one sound effect into the narration at an absolute offset.
pub fn mix_sound_effect<S: FfmpegSpawner>(
    spawner: &S,
    narration: &Path,
    effect: &Path,
    begin_time: f64,
    work_dir: &Path,
) -> CoreResult<PathBuf> {
    let offset = (begin_time + SOUND_EFFECT_LEAD_IN_SECS).max(0.0);
    let filter = filters::sound_effect_filter(offset, SOUND_EFFECT_GAIN_DB);
    let output = temp_files::intermediate_path(work_dir, "narration_fx", "wav");
    ffmpeg::mix_sound_effect(spawner, narration, effect, &output, &filter)?;
    Ok(output)
}
