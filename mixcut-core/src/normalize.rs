//! Duration and resolution normalization of selected clips.
//!
//! One `Clip` in, one `NormalizedClip` out: still images expand into
//! fixed-length video, overlong clips are trimmed from the start to their
//! effective duration, and everything is conformed to the target
//! resolution and frame rate with source audio stripped. Playback speed is
//! never altered; a source that is genuinely too short is the selector's
//! problem, not this stage's.

use crate::config::MixConfig;
use crate::error::CoreResult;
use crate::external::ffmpeg::{self, FfmpegSpawner};
use crate::external::filters;
use crate::selection::Clip;
use crate::temp_files;
use crate::timeline::TIME_EPSILON;
use std::path::{Path, PathBuf};

/// A clip conformed to pipeline-wide targets. All later stages operate on
/// these only.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedClip {
    pub path: PathBuf,
    pub duration: f64,
}

/// Normalizes clips into the job working directory.
pub struct Normalizer<'a, S: FfmpegSpawner> {
    config: &'a MixConfig,
    spawner: &'a S,
}

impl<'a, S: FfmpegSpawner> Normalizer<'a, S> {
    pub fn new(config: &'a MixConfig, spawner: &'a S) -> Self {
        Normalizer { config, spawner }
    }

    /// Produces the normalized rendition of one selected clip.
    ///
    /// Any encode error is fatal for this clip; the caller decides whether
    /// to substitute another clip or fail the scene. No retry happens here.
    pub fn normalize(&self, clip: &Clip, work_dir: &Path) -> CoreResult<NormalizedClip> {
        let output = temp_files::intermediate_path(work_dir, "norm", "mp4");
        let (width, height, fps) = (
            self.config.target_width,
            self.config.target_height,
            self.config.fps,
        );
        let wider = source_wider(clip.width, clip.height, width, height);

        if clip.is_image {
            log::debug!(
                "expanding image {} to {:.1}s",
                clip.path.display(),
                self.config.image_duration_secs
            );
            ffmpeg::expand_image(
                self.spawner,
                &clip.path,
                &output,
                width,
                height,
                fps,
                self.config.image_duration_secs,
                wider,
            )?;
        } else if clip.duration + TIME_EPSILON < clip.source_duration {
            log::debug!(
                "trimming {} from {:.1}s to {:.1}s",
                clip.path.display(),
                clip.source_duration,
                clip.duration
            );
            ffmpeg::normalize_video(
                self.spawner,
                &clip.path,
                &output,
                fps,
                &filters::scale_crop_filter(width, height, wider),
                Some(clip.duration),
            )?;
        } else {
            ffmpeg::normalize_video(
                self.spawner,
                &clip.path,
                &output,
                fps,
                &filters::scale_pad_filter(width, height),
                None,
            )?;
        }

        Ok(NormalizedClip {
            path: output,
            duration: clip.duration,
        })
    }
}

/// Whether the source aspect is wider than the target aspect.
fn source_wider(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> bool {
    // cross-multiplied comparison avoids division by zero on bad probes
    (src_w as u64) * (target_h as u64) > (target_w as u64) * (src_h as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_comparison_cross_multiplies() {
        // 21:9 source against a 16:9 target is wider
        assert!(source_wider(2560, 1080, 1920, 1080));
        // 9:16 source against a 16:9 target is taller
        assert!(!source_wider(1080, 1920, 1920, 1080));
        // equal aspect is not "wider"
        assert!(!source_wider(1280, 720, 1920, 1080));
        // degenerate probe values fall on the "taller" side
        assert!(!source_wider(0, 0, 1920, 1080));
    }
}
