// ============================================================================
// mixcut-core/src/external/ffmpeg.rs
// ============================================================================
//
// FFMPEG EXECUTION: Command Construction and Process Management
//
// Every encode operation the pipeline needs lives here: still-image
// expansion, resolution/fps normalization, trimming, concatenation (stream
// copy and crossfade graph), narration muxing, background-music mixing and
// overlay burn-in. Each operation builds an FfmpegCommand, spawns it through
// the `FfmpegSpawner` abstraction and treats the exit status as the only
// completion signal.

use crate::error::{
    command_failed_error, command_start_error, command_wait_error, CoreError, CoreResult,
};
use crate::external::filters;
use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::process::ExitStatus;

// --- FFmpeg Execution Abstraction ---

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Processes events from the running command using a provided handler closure.
    fn handle_events<F>(&mut self, handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> CoreResult<ExitStatus>;
}

/// Trait representing something that can spawn an FfmpegProcess.
pub trait FfmpegSpawner {
    type Process: FfmpegProcess;

    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process>;
}

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess(SidecarChild);

impl FfmpegProcess for SidecarProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        let iterator = self.0.iter().map_err(|e| {
            log::error!("Failed to get ffmpeg event iterator: {e}");
            command_failed_error("ffmpeg (event iterator)", ExitStatus::default(), e.to_string())
        })?;
        for event in iterator {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.0.wait().map_err(|e| command_wait_error("ffmpeg", e))
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|e| command_start_error("ffmpeg", e))
    }
}

// --- Shared Execution ---

/// Runs the command to completion, collecting error-level log lines; a
/// non-zero exit becomes `EncodeFailed` with the collected stderr.
fn run<S: FfmpegSpawner>(spawner: &S, cmd: FfmpegCommand, context: &str) -> CoreResult<()> {
    log::debug!("Running ffmpeg ({context}): {cmd:?}");

    let mut process = spawner.spawn(cmd)?;
    let mut stderr = String::new();
    process.handle_events(|event| {
        match event {
            FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, line) => {
                let _ = writeln!(stderr, "{line}");
            }
            FfmpegEvent::Error(line) => {
                let _ = writeln!(stderr, "{line}");
            }
            _ => {}
        }
        Ok(())
    })?;

    let status = process.wait()?;
    if !status.success() {
        log::error!("ffmpeg ({context}) failed: {status}");
        return Err(CoreError::EncodeFailed {
            context: context.to_string(),
            stderr: if stderr.is_empty() {
                status.to_string()
            } else {
                stderr
            },
        });
    }
    Ok(())
}

// --- Encode Operations ---

/// Expands a still image into a silent video segment of the given duration
/// at the target resolution and frame rate.
pub fn expand_image<S: FfmpegSpawner>(
    spawner: &S,
    image: &Path,
    output: &Path,
    width: u32,
    height: u32,
    fps: u32,
    duration_secs: f64,
    source_wider: bool,
) -> CoreResult<()> {
    let mut cmd = FfmpegCommand::new();
    cmd.args(["-loop", "1"]);
    cmd.input(image.to_string_lossy().as_ref());
    cmd.args(["-c:v", "h264"]);
    cmd.args(["-t", &format!("{duration_secs}")]);
    cmd.args(["-r", &fps.to_string()]);
    cmd.args(["-vf", &filters::scale_crop_filter(width, height, source_wider)]);
    cmd.args(["-an", "-y"]);
    cmd.output(output.to_string_lossy().as_ref());
    run(spawner, cmd, "image expansion")
}

/// Conforms a video clip to the target resolution and frame rate, stripping
/// any source audio. When `trim_secs` is set the clip is cut from the start
/// to that length first.
pub fn normalize_video<S: FfmpegSpawner>(
    spawner: &S,
    input: &Path,
    output: &Path,
    fps: u32,
    video_filter: &str,
    trim_secs: Option<f64>,
) -> CoreResult<()> {
    let mut cmd = FfmpegCommand::new();
    cmd.input(input.to_string_lossy().as_ref());
    cmd.args(["-r", &fps.to_string()]);
    cmd.arg("-an");
    if let Some(secs) = trim_secs {
        cmd.args(["-t", &format!("{secs}")]);
    }
    cmd.args(["-vf", video_filter]);
    cmd.arg("-y");
    cmd.output(output.to_string_lossy().as_ref());
    run(spawner, cmd, "clip normalization")
}

/// Concatenates pre-normalized clips losslessly via the concat demuxer.
/// `+genpts` keeps output timestamps monotonic across segment boundaries.
pub fn concat_stream_copy<S: FfmpegSpawner>(
    spawner: &S,
    list_file: &Path,
    output: &Path,
) -> CoreResult<()> {
    let mut cmd = FfmpegCommand::new();
    cmd.args(["-f", "concat", "-safe", "0"]);
    cmd.input(list_file.to_string_lossy().as_ref());
    cmd.args(["-c", "copy"]);
    cmd.args(["-fflags", "+genpts"]);
    cmd.arg("-y");
    cmd.output(output.to_string_lossy().as_ref());
    run(spawner, cmd, "concat")
}

/// Concatenates clips through a crossfade filter graph (see
/// `filters::xfade_graph`); re-encodes the composed stream.
pub fn concat_with_transitions<S: FfmpegSpawner>(
    spawner: &S,
    inputs: &[&Path],
    graph: &str,
    output: &Path,
) -> CoreResult<()> {
    let mut cmd = FfmpegCommand::new();
    for input in inputs {
        cmd.input(input.to_string_lossy().as_ref());
    }
    cmd.args(["-filter_complex", graph]);
    cmd.args(["-map", "[video]"]);
    cmd.arg("-y");
    cmd.output(output.to_string_lossy().as_ref());
    run(spawner, cmd, "transition")
}

/// Muxes the narration track onto the concatenated video, replacing any
/// residual clip-native audio.
pub fn mux_narration<S: FfmpegSpawner>(
    spawner: &S,
    video: &Path,
    narration: &Path,
    output: &Path,
) -> CoreResult<()> {
    let mut cmd = FfmpegCommand::new();
    cmd.input(video.to_string_lossy().as_ref());
    cmd.input(narration.to_string_lossy().as_ref());
    cmd.args(["-c:v", "copy"]);
    cmd.args(["-c:a", "aac"]);
    cmd.args(["-map", "0:v:0", "-map", "1:a:0"]);
    cmd.args(["-shortest", "-y"]);
    cmd.output(output.to_string_lossy().as_ref());
    run(spawner, cmd, "mux")
}

/// Mixes a looped background-music bed under the narration; the output
/// length always equals the narration track's length.
pub fn mix_background_music<S: FfmpegSpawner>(
    spawner: &S,
    video: &Path,
    music: &Path,
    output: &Path,
    volume: f64,
) -> CoreResult<()> {
    let mut cmd = FfmpegCommand::new();
    cmd.input(video.to_string_lossy().as_ref());
    cmd.input(music.to_string_lossy().as_ref());
    cmd.args(["-filter_complex", &filters::background_music_filter(volume)]);
    cmd.args(["-map", "0:v", "-map", "[aout]"]);
    cmd.args(["-c:v", "copy"]);
    cmd.args(["-shortest", "-y"]);
    cmd.output(output.to_string_lossy().as_ref());
    run(spawner, cmd, "bgm")
}

/// Burns an overlay image onto one clip inside the given filter's time
/// window (see `filters::overlay_filter`).
pub fn burn_overlay<S: FfmpegSpawner>(
    spawner: &S,
    clip: &Path,
    image: &Path,
    output: &Path,
    filter: &str,
) -> CoreResult<()> {
    let mut cmd = FfmpegCommand::new();
    cmd.input(clip.to_string_lossy().as_ref());
    cmd.input(image.to_string_lossy().as_ref());
    cmd.args(["-filter_complex", filter]);
    cmd.args(["-map", "[vout]"]);
    cmd.arg("-an");
    cmd.arg("-y");
    cmd.output(output.to_string_lossy().as_ref());
    run(spawner, cmd, "overlay")
}

/// Concatenates per-scene narration tracks via the concat demuxer.
pub fn concat_audio<S: FfmpegSpawner>(
    spawner: &S,
    list_file: &Path,
    output: &Path,
) -> CoreResult<()> {
    let mut cmd = FfmpegCommand::new();
    cmd.args(["-f", "concat", "-safe", "0"]);
    cmd.input(list_file.to_string_lossy().as_ref());
    cmd.args(["-c", "copy"]);
    cmd.arg("-y");
    cmd.output(output.to_string_lossy().as_ref());
    run(spawner, cmd, "narration concat")
}

/// Appends trailing silence to an audio track.
pub fn pad_audio_tail<S: FfmpegSpawner>(
    spawner: &S,
    input: &Path,
    output: &Path,
    silence_secs: f64,
) -> CoreResult<()> {
    let mut cmd = FfmpegCommand::new();
    cmd.input(input.to_string_lossy().as_ref());
    cmd.args(["-af", &format!("apad=pad_dur={silence_secs}")]);
    cmd.arg("-y");
    cmd.output(output.to_string_lossy().as_ref());
    run(spawner, cmd, "audio tail pad")
}

/// Mixes a sound effect over the narration (see
/// `filters::sound_effect_filter`).
pub fn mix_sound_effect<S: FfmpegSpawner>(
    spawner: &S,
    narration: &Path,
    effect: &Path,
    output: &Path,
    filter: &str,
) -> CoreResult<()> {
    let mut cmd = FfmpegCommand::new();
    cmd.input(narration.to_string_lossy().as_ref());
    cmd.input(effect.to_string_lossy().as_ref());
    cmd.args(["-filter_complex", filter]);
    cmd.args(["-map", "[aout]"]);
    cmd.arg("-y");
    cmd.output(output.to_string_lossy().as_ref());
    run(spawner, cmd, "sound effect mix")
}

// --- Concat List Helper ---

/// Writes a concat-demuxer list file naming `paths` in order.
pub fn write_concat_list(paths: &[&Path], dest: &Path) -> CoreResult<()> {
    let mut body = String::new();
    for path in paths {
        // concat demuxer quoting: single quotes around the path, embedded
        // quotes closed-escaped-reopened
        let escaped = path.to_string_lossy().replace('\'', "'\\''");
        let _ = writeln!(body, "file '{escaped}'");
    }
    fs::write(dest, body)?;
    Ok(())
}
