//! Per-clip overlay substitution.
//!
//! Consumes the reconciled overlay windows and burns each one into its
//! clip, producing the substituted file list the assembler concatenates.
//! A failed burn keeps the original clip: the overlay is decoration, the
//! scene is not.

use crate::config::MixConfig;
use crate::error::CoreResult;
use crate::external::ffmpeg::{self, FfmpegSpawner};
use crate::external::filters;
use crate::normalize::NormalizedClip;
use crate::annotation::events::OverlayWindow;
use crate::temp_files;
use crate::timeline::Timeline;
use std::path::Path;

/// Opacity of burned-in overlay images.
pub const OVERLAY_OPACITY: f64 = 0.9;

/// Horizontal edge padding in pixels reserved around overlays.
pub const OVERLAY_EDGE_PADDING_PX: u32 = 100;

/// Burns each overlay window into its clip, returning the substituted clip
/// list in timeline order. Entries without a window pass through untouched.
pub fn apply_overlays<S: FfmpegSpawner>(
    spawner: &S,
    config: &MixConfig,
    timeline: &Timeline,
    windows: &[Option<OverlayWindow>],
    work_dir: &Path,
) -> CoreResult<Vec<NormalizedClip>> {
    debug_assert_eq!(timeline.len(), windows.len());

    let mut substituted = Vec::with_capacity(timeline.len());
    for (entry, window) in timeline.entries().iter().zip(windows) {
        let Some(window) = window else {
            substituted.push(entry.clip.clone());
            continue;
        };

        let output = temp_files::intermediate_path(work_dir, "overlay", "mp4");
        let filter = filters::overlay_filter(
            window.rel_start,
            window.rel_end,
            OVERLAY_OPACITY,
            OVERLAY_EDGE_PADDING_PX,
            config.target_width,
        );
        match ffmpeg::burn_overlay(spawner, &entry.clip.path, &window.image, &output, &filter) {
            Ok(()) => {
                log::info!(
                    "burned overlay {} into {} ({:.2}s..{:.2}s)",
                    window.image.display(),
                    entry.clip.path.display(),
                    window.rel_start,
                    window.rel_end
                );
                substituted.push(NormalizedClip {
                    path: output,
                    duration: entry.clip.duration,
                });
            }
            Err(err) => {
                log::warn!(
                    "overlay burn failed for {}, keeping original: {err}",
                    entry.clip.path.display()
                );
                substituted.push(entry.clip.clone());
            }
        }
    }
    Ok(substituted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::ffmpeg::SidecarSpawner;
    use std::path::PathBuf;

    #[test]
    fn entries_without_windows_pass_through() {
        let config = MixConfig::new(PathBuf::from("/tmp/out"));
        let clips = vec![
            NormalizedClip {
                path: PathBuf::from("/work/a.mp4"),
                duration: 6.0,
            },
            NormalizedClip {
                path: PathBuf::from("/work/b.mp4"),
                duration: 5.0,
            },
        ];
        let timeline = Timeline::build(clips.clone());
        let windows = vec![None, None];

        let spawner = SidecarSpawner;
        let result =
            apply_overlays(&spawner, &config, &timeline, &windows, Path::new("/tmp")).unwrap();
        assert_eq!(result, clips);
    }
}
