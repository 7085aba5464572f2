// ============================================================================
// mixcut-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg and ffprobe
//
// This module encapsulates every interaction with the external media tools.
// The rest of the library treats them as a black-box subprocess contract:
// arguments in, exit status and stderr out. Codec and filter internals are
// never reimplemented here.
//
// The prober is exposed behind the `MediaProber` trait so the selector and
// assembler can be tested with canned metadata; ffmpeg execution goes
// through the `FfmpegSpawner`/`FfmpegProcess` pair for the same reason.

use crate::error::{command_start_error, CoreError, CoreResult};
use std::io;
use std::process::{Command, Stdio};

/// Pure filter-string builders for scale/pad/crop, crossfades, overlays and
/// audio mixing.
pub mod filters;

/// FFmpeg command construction and execution for every encode operation.
pub mod ffmpeg;

/// FFprobe-backed media probing and integrity checks.
pub mod ffprobe;

pub use ffmpeg::{FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner};
pub use ffprobe::{CrateFfprobeProber, MediaInfo, MediaProber};

/// Checks that a required external command is present and executable by
/// running it with `-version`.
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {cmd_name}");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{cmd_name}' not found.");
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{cmd_name}': {e}");
            Err(command_start_error(cmd_name, e))
        }
    }
}
