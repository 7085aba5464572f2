//! FFprobe integration for media analysis and integrity checks.
//!
//! Probing is exposed behind the `MediaProber` trait so pipeline stages can
//! be exercised with canned metadata in tests. The production implementation
//! delegates to the ffprobe crate, which runs the `ffprobe` binary and
//! deserializes its JSON output.

use crate::error::{command_start_error, CoreError, CoreResult};
use ffprobe::{ffprobe, FfProbeError};
use std::path::Path;

/// Struct containing probed media information.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MediaInfo {
    /// Duration of the media in seconds. Still images probe without one.
    pub duration: Option<f64>,
    /// Width of the first video stream
    pub width: Option<i64>,
    /// Height of the first video stream
    pub height: Option<i64>,
}

impl MediaInfo {
    /// Dimensions as unsigned values, when both are present and sane.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w as u32, h as u32)),
            _ => None,
        }
    }
}

/// Trait for probing media files.
pub trait MediaProber {
    /// Returns duration and dimensions for the file.
    fn media_info(&self, path: &Path) -> CoreResult<MediaInfo>;

    /// Integrity check: succeeds only when ffprobe can fully read the file.
    fn verify(&self, path: &Path) -> CoreResult<()>;
}

/// Production `MediaProber` backed by the ffprobe crate.
#[derive(Debug, Clone, Default)]
pub struct CrateFfprobeProber;

impl MediaProber for CrateFfprobeProber {
    fn media_info(&self, path: &Path) -> CoreResult<MediaInfo> {
        log::debug!("Running ffprobe for media info on: {}", path.display());
        match ffprobe(path) {
            Ok(metadata) => {
                let duration = metadata
                    .format
                    .duration
                    .as_deref()
                    .and_then(|d| d.parse::<f64>().ok());

                let mut info = MediaInfo {
                    duration,
                    ..Default::default()
                };

                if let Some(video_stream) = metadata
                    .streams
                    .iter()
                    .find(|s| s.codec_type.as_deref() == Some("video"))
                {
                    info.width = video_stream.width;
                    info.height = video_stream.height;
                }

                Ok(info)
            }
            Err(err) => {
                log::warn!("ffprobe failed for {}: {err:?}", path.display());
                Err(map_ffprobe_error(err, "media info"))
            }
        }
    }

    fn verify(&self, path: &Path) -> CoreResult<()> {
        if !path.exists() {
            return Err(CoreError::ProbeInvalid(path.to_path_buf()));
        }
        match ffprobe(path) {
            Ok(_) => Ok(()),
            Err(err) => {
                log::warn!(
                    "integrity probe rejected {}: {err:?}",
                    path.display()
                );
                Err(CoreError::ProbeInvalid(path.to_path_buf()))
            }
        }
    }
}

fn map_ffprobe_error(err: FfProbeError, context: &str) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error(format!("ffprobe ({context})"), io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            crate::error::command_failed_error(format!("ffprobe ({context})"), output.status, stderr)
        }
        FfProbeError::Deserialize(err) => CoreError::JsonParse(format!(
            "ffprobe {context} output deserialization: {err}"
        )),
        _ => CoreError::FfprobeParse(format!("unknown ffprobe error during {context}: {err:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_require_positive_values() {
        let info = MediaInfo {
            duration: Some(4.0),
            width: Some(1920),
            height: Some(1080),
        };
        assert_eq!(info.dimensions(), Some((1920, 1080)));

        let bad = MediaInfo {
            duration: None,
            width: Some(-1),
            height: Some(1080),
        };
        assert_eq!(bad.dimensions(), None);
    }

    #[test]
    fn verify_rejects_missing_file() {
        let prober = CrateFfprobeProber;
        let result = prober.verify(Path::new("/nonexistent/clip.mp4"));
        assert!(matches!(result, Err(CoreError::ProbeInvalid(_))));
    }
}
