// ============================================================================
// mixcut-core/src/config.rs
// ============================================================================
//
// CONFIGURATION: Core Configuration Structures and Constants
//
// This module defines the configuration structures and constants used
// throughout the mixcut-core library. One explicit `MixConfig` instance is
// created by the consumer (like mixcut-cli) and passed into each component
// at construction; there is no process-wide settings object.

use crate::error::{CoreError, CoreResult};
use crate::retry::RetryPolicy;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// DEFAULT CONSTANTS
// ============================================================================

/// Default minimum length in seconds a clip must reach to be usable.
pub const DEFAULT_CLIP_MIN_SECS: f64 = 2.0;

/// Default maximum length in seconds a clip may contribute; longer clips are
/// clamped here and trimmed during normalization.
pub const DEFAULT_CLIP_MAX_SECS: f64 = 15.0;

/// Default duration in seconds a still image expands to. Must stay at or
/// above the minimum clip length.
pub const DEFAULT_IMAGE_DURATION_SECS: f64 = 5.0;

/// Default bound on the trailing silence appended to narration audio when
/// aligning it to a clip total that overshoots the spoken length.
pub const DEFAULT_MAX_TRAILING_SILENCE_SECS: f64 = 3.0;

/// Default timeout for acquiring the advisory lock on a shared clip source.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// ORIENTATION FILTER
// ============================================================================

/// Orientation constraint applied to candidate clips during selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Width must exceed height.
    Landscape,
    /// Height must exceed width.
    Portrait,
    /// No constraint.
    #[default]
    Any,
}

impl Orientation {
    /// Returns true when the given dimensions satisfy this constraint.
    pub fn matches(self, width: u32, height: u32) -> bool {
        match self {
            Orientation::Landscape => width > height,
            Orientation::Portrait => height > width,
            Orientation::Any => true,
        }
    }
}

impl FromStr for Orientation {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "landscape" => Ok(Orientation::Landscape),
            "portrait" => Ok(Orientation::Portrait),
            "any" => Ok(Orientation::Any),
            other => Err(CoreError::InvalidConfig(format!(
                "unknown orientation '{other}' (expected landscape, portrait or any)"
            ))),
        }
    }
}

// ============================================================================
// FEATURE SUB-CONFIGS
// ============================================================================

/// Crossfade transition settings between adjacent clips.
#[derive(Debug, Clone)]
pub struct TransitionConfig {
    /// xfade transition name (e.g. "fade", "wipeleft").
    pub kind: String,
    /// Seconds consumed from both neighbours by each crossfade.
    pub duration_secs: f64,
}

/// Background music bed mixed under the narration at a linear gain.
#[derive(Debug, Clone)]
pub struct BackgroundMusic {
    pub path: PathBuf,
    /// Linear gain in (0, 1].
    pub volume: f64,
}

// ============================================================================
// CORE CONFIGURATION
// ============================================================================

/// Main configuration structure for the mixcut-core library.
///
/// Holds the pipeline-wide targets (resolution, fps, clip length bounds) and
/// the optional transition / background-music features. Created by the
/// consumer and passed to `process_job`.
#[derive(Debug, Clone)]
pub struct MixConfig {
    // ---- Path Configuration ----
    /// Directory where the final artifact is published.
    pub output_dir: PathBuf,

    /// Base directory for per-job working directories. Defaults to
    /// `output_dir` when unset.
    pub work_dir: Option<PathBuf>,

    // ---- Pipeline Targets ----
    pub target_width: u32,
    pub target_height: u32,
    pub fps: u32,

    // ---- Clip Length Bounds ----
    pub clip_min_secs: f64,
    pub clip_max_secs: f64,
    pub image_duration_secs: f64,

    // ---- Selection ----
    pub orientation: Orientation,

    // ---- Features ----
    pub transition: Option<TransitionConfig>,
    pub background_music: Option<BackgroundMusic>,

    // ---- Tail Alignment ----
    pub max_trailing_silence_secs: f64,

    // ---- External Calls ----
    pub lock_timeout: Duration,
    pub retry: RetryPolicy,
}

impl MixConfig {
    /// Creates a configuration with 1920x1080 @ 30fps defaults.
    pub fn new(output_dir: PathBuf) -> Self {
        MixConfig {
            output_dir,
            work_dir: None,
            target_width: 1920,
            target_height: 1080,
            fps: 30,
            clip_min_secs: DEFAULT_CLIP_MIN_SECS,
            clip_max_secs: DEFAULT_CLIP_MAX_SECS,
            image_duration_secs: DEFAULT_IMAGE_DURATION_SECS,
            orientation: Orientation::Any,
            transition: None,
            background_music: None,
            max_trailing_silence_secs: DEFAULT_MAX_TRAILING_SILENCE_SECS,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Validates field consistency. Call once before handing the config to
    /// the pipeline.
    pub fn validate(&self) -> CoreResult<()> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(CoreError::InvalidConfig(
                "target resolution must be non-zero".to_string(),
            ));
        }
        if self.target_width % 2 != 0 || self.target_height % 2 != 0 {
            return Err(CoreError::InvalidConfig(format!(
                "target resolution {}x{} must have even dimensions",
                self.target_width, self.target_height
            )));
        }
        if self.fps == 0 {
            return Err(CoreError::InvalidConfig("fps must be non-zero".to_string()));
        }
        if self.clip_min_secs <= 0.0 || self.clip_max_secs < self.clip_min_secs {
            return Err(CoreError::InvalidConfig(format!(
                "clip length bounds [{}, {}] are not a valid range",
                self.clip_min_secs, self.clip_max_secs
            )));
        }
        if self.image_duration_secs < self.clip_min_secs {
            return Err(CoreError::InvalidConfig(format!(
                "image duration {}s is below the minimum clip length {}s",
                self.image_duration_secs, self.clip_min_secs
            )));
        }
        if let Some(transition) = &self.transition {
            if transition.duration_secs <= 0.0 {
                return Err(CoreError::InvalidConfig(
                    "transition duration must be positive".to_string(),
                ));
            }
            if transition.duration_secs >= self.clip_min_secs {
                return Err(CoreError::InvalidConfig(format!(
                    "transition duration {}s must stay below the minimum clip length {}s",
                    transition.duration_secs, self.clip_min_secs
                )));
            }
        }
        if let Some(bgm) = &self.background_music {
            if !(0.0..=1.0).contains(&bgm.volume) || bgm.volume == 0.0 {
                return Err(CoreError::InvalidConfig(format!(
                    "background music volume {} must lie in (0, 1]",
                    bgm.volume
                )));
            }
        }
        if self.max_trailing_silence_secs < 0.0 {
            return Err(CoreError::InvalidConfig(
                "max trailing silence must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Seconds each crossfade consumes from the running clip total; 0 when
    /// transitions are disabled.
    pub(crate) fn transition_overlap(&self) -> f64 {
        self.transition
            .as_ref()
            .map_or(0.0, |t| t.duration_secs)
    }

    /// Base directory used for per-job working directories.
    pub(crate) fn work_base(&self) -> &PathBuf {
        self.work_dir.as_ref().unwrap_or(&self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MixConfig {
        MixConfig::new(PathBuf::from("/tmp/out"))
    }

    #[test]
    fn default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn rejects_odd_resolution() {
        let mut cfg = config();
        cfg.target_width = 1921;
        assert!(matches!(
            cfg.validate(),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_inverted_length_bounds() {
        let mut cfg = config();
        cfg.clip_min_secs = 10.0;
        cfg.clip_max_secs = 5.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_image_duration_below_min() {
        let mut cfg = config();
        cfg.image_duration_secs = 1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_transition_at_least_min_clip_length() {
        let mut cfg = config();
        cfg.transition = Some(TransitionConfig {
            kind: "fade".to_string(),
            duration_secs: 2.0,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn orientation_matching() {
        assert!(Orientation::Landscape.matches(1920, 1080));
        assert!(!Orientation::Landscape.matches(1080, 1920));
        assert!(Orientation::Portrait.matches(1080, 1920));
        assert!(Orientation::Any.matches(640, 640));
    }

    #[test]
    fn orientation_from_str() {
        assert_eq!(
            "landscape".parse::<Orientation>().unwrap(),
            Orientation::Landscape
        );
        assert_eq!("ANY".parse::<Orientation>().unwrap(), Orientation::Any);
        assert!("sideways".parse::<Orientation>().is_err());
    }

    #[test]
    fn transition_overlap_defaults_to_zero() {
        let mut cfg = config();
        assert_eq!(cfg.transition_overlap(), 0.0);
        cfg.transition = Some(TransitionConfig {
            kind: "fade".to_string(),
            duration_secs: 1.0,
        });
        assert_eq!(cfg.transition_overlap(), 1.0);
    }
}
