//! Core library for automated assembly of narrated short videos.
//!
//! This crate implements the timeline assembly and event-reconciliation
//! engine: clips are selected and duration-normalized to cover a narration
//! target, a cumulative timeline is built over them, text-anchored
//! overlay/sound-effect annotations are mapped into absolute and then
//! per-clip-relative time windows, and the pieces are concatenated, muxed
//! with narration and optionally scored with background music. All media
//! work goes through ffmpeg/ffprobe as black-box subprocesses.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use mixcut_core::{process_job, DirectoryAssets, JobSpec, MixConfig, Scene};
//! use std::path::PathBuf;
//!
//! let mut config = MixConfig::new(PathBuf::from("/path/to/output"));
//! config.fps = 30;
//! config.validate().unwrap();
//!
//! let job = JobSpec {
//!     scenes: vec![Scene {
//!         text: "the [I-trunk]boot space[/I] is huge".to_string(),
//!         narration: PathBuf::from("/path/to/scene0.wav"),
//!         clip_dir: PathBuf::from("/path/to/clips"),
//!         query: "car".to_string(),
//!     }],
//!     output_name: None,
//! };
//!
//! let assets = DirectoryAssets::new(Some(PathBuf::from("/assets/overlays")), None);
//! let report = process_job(&config, &job, &assets, &assets, None).unwrap();
//! println!("published {}", report.output.display());
//! ```

pub mod alignment;
pub mod annotation;
pub mod assembly;
pub mod assets;
pub mod audio;
pub mod config;
pub mod error;
pub mod external;
pub mod normalize;
pub mod overlay;
pub mod pipeline;
pub mod retry;
pub mod selection;
pub mod temp_files;
pub mod timeline;
pub mod util;

// Re-exports for public API
pub use alignment::AlignedSegment;
pub use annotation::events::{AnnotationEvent, OverlayWindow};
pub use annotation::AnnotationKind;
pub use assets::{DirectoryAssets, OverlayResolver, SoundEffectResolver};
pub use config::{BackgroundMusic, MixConfig, Orientation, TransitionConfig};
pub use error::{CoreError, CoreResult};
pub use normalize::NormalizedClip;
pub use pipeline::{process_job, JobReport, JobSpec, Scene};
pub use retry::RetryPolicy;
pub use selection::{resolve_provider, StockFootageProvider};
pub use timeline::{Timeline, TimelineEntry};
pub use util::{format_bytes, format_duration};
