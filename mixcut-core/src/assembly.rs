// ============================================================================
// mixcut-core/src/assembly.rs
// ============================================================================
//
// ASSEMBLER: Final Artifact Construction
//
// Sequential stages, each gating the next: integrity-probe every clip,
// concatenate (lossless copy or crossfade graph), mux the narration track,
// optionally mix the background-music bed, verify, publish. The permanent
// output path is populated only after verification succeeds, so a partial
// artifact is never externally visible. Intermediates are removed
// best-effort regardless of outcome.

use crate::config::MixConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::ffmpeg::{self, FfmpegSpawner};
use crate::external::filters;
use crate::external::MediaProber;
use crate::normalize::NormalizedClip;
use crate::temp_files;
use std::fs;
use std::path::{Path, PathBuf};

/// Staged assembler over normalized (and possibly overlay-substituted)
/// clips.
pub struct Assembler<'a, S: FfmpegSpawner, P: MediaProber> {
    config: &'a MixConfig,
    spawner: &'a S,
    prober: &'a P,
}

impl<'a, S: FfmpegSpawner, P: MediaProber> Assembler<'a, S, P> {
    pub fn new(config: &'a MixConfig, spawner: &'a S, prober: &'a P) -> Self {
        Assembler {
            config,
            spawner,
            prober,
        }
    }

    /// Runs all stages and publishes the verified artifact to `output`.
    pub fn assemble(
        &self,
        clips: &[NormalizedClip],
        narration: &Path,
        output: &Path,
        work_dir: &Path,
    ) -> CoreResult<PathBuf> {
        let mut intermediates: Vec<PathBuf> = Vec::new();
        let result = self.run_stages(clips, narration, output, work_dir, &mut intermediates);
        cleanup(&intermediates);
        result
    }

    fn run_stages(
        &self,
        clips: &[NormalizedClip],
        narration: &Path,
        output: &Path,
        work_dir: &Path,
        intermediates: &mut Vec<PathBuf>,
    ) -> CoreResult<PathBuf> {
        if clips.is_empty() {
            return Err(CoreError::AssemblyFailed {
                stage: "probe",
                message: "no clips to assemble".to_string(),
            });
        }

        // Stage 1: integrity-probe every clip (post overlay substitution).
        for clip in clips {
            self.prober.verify(&clip.path)?;
        }
        log::info!("assembly: {} clips passed integrity probe", clips.len());

        // Stage 2: concatenate in narration order.
        let merged = temp_files::intermediate_path(work_dir, "merged", "mp4");
        intermediates.push(merged.clone());
        match &self.config.transition {
            Some(transition) if clips.len() > 1 => {
                let durations: Vec<f64> = clips.iter().map(|c| c.duration).collect();
                let graph =
                    filters::xfade_graph(&durations, &transition.kind, transition.duration_secs);
                let inputs: Vec<&Path> = clips.iter().map(|c| c.path.as_path()).collect();
                ffmpeg::concat_with_transitions(self.spawner, &inputs, &graph, &merged)
                    .map_err(|e| stage_error("transition", e))?;
            }
            _ => {
                let list_file = work_dir.join("assembly_concat.txt");
                intermediates.push(list_file.clone());
                let paths: Vec<&Path> = clips.iter().map(|c| c.path.as_path()).collect();
                ffmpeg::write_concat_list(&paths, &list_file)
                    .map_err(|e| stage_error("concat", e))?;
                ffmpeg::concat_stream_copy(self.spawner, &list_file, &merged)
                    .map_err(|e| stage_error("concat", e))?;
            }
        }

        // Stage 3: mux the narration track. Fail fast on degenerate inputs.
        ensure_nonempty(&merged, "mux")?;
        ensure_nonempty(narration, "mux")?;
        let muxed = temp_files::intermediate_path(work_dir, "muxed", "mp4");
        intermediates.push(muxed.clone());
        ffmpeg::mux_narration(self.spawner, &merged, narration, &muxed)
            .map_err(|e| stage_error("mux", e))?;

        // Stage 4: background-music bed, pinned to the narration length.
        let finished = match &self.config.background_music {
            Some(bgm) => {
                ensure_nonempty(&bgm.path, "bgm")?;
                let with_bgm = temp_files::intermediate_path(work_dir, "with_bgm", "mp4");
                intermediates.push(with_bgm.clone());
                ffmpeg::mix_background_music(
                    self.spawner,
                    &muxed,
                    &bgm.path,
                    &with_bgm,
                    bgm.volume,
                )
                .map_err(|e| stage_error("bgm", e))?;
                with_bgm
            }
            None => muxed,
        };

        // Stage 5: verify, then populate the permanent path.
        ensure_nonempty(&finished, "verify")?;
        publish(&finished, output)?;
        log::info!("assembly: published {}", output.display());
        Ok(output.to_path_buf())
    }
}

fn stage_error(stage: &'static str, err: CoreError) -> CoreError {
    CoreError::AssemblyFailed {
        stage,
        message: err.to_string(),
    }
}

/// Fails the named stage when the file is missing or zero-length.
fn ensure_nonempty(path: &Path, stage: &'static str) -> CoreResult<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        Ok(_) => Err(CoreError::AssemblyFailed {
            stage,
            message: format!("zero-length input: {}", path.display()),
        }),
        Err(err) => Err(CoreError::AssemblyFailed {
            stage,
            message: format!("missing input {}: {err}", path.display()),
        }),
    }
}

/// Moves the verified artifact onto its permanent path. Falls back to
/// copy-and-remove across filesystems.
fn publish(from: &Path, to: &Path) -> CoreResult<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        let _ = fs::remove_file(from);
    }
    Ok(())
}

/// Stage 6: best-effort removal of intermediates; failures are logged,
/// never fatal.
fn cleanup(intermediates: &[PathBuf]) {
    for path in intermediates {
        if !path.exists() {
            continue;
        }
        if let Err(err) = fs::remove_file(path) {
            log::warn!("failed to remove intermediate {}: {err}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::ffmpeg::SidecarSpawner;
    use crate::external::MediaInfo;

    struct RejectingProber;

    impl MediaProber for RejectingProber {
        fn media_info(&self, path: &Path) -> CoreResult<MediaInfo> {
            Err(CoreError::ProbeInvalid(path.to_path_buf()))
        }

        fn verify(&self, path: &Path) -> CoreResult<()> {
            Err(CoreError::ProbeInvalid(path.to_path_buf()))
        }
    }

    #[test]
    fn invalid_clip_fails_the_probe_stage() {
        let dir = tempfile::tempdir().unwrap();
        let config = MixConfig::new(dir.path().to_path_buf());
        let spawner = SidecarSpawner;
        let prober = RejectingProber;
        let assembler = Assembler::new(&config, &spawner, &prober);

        let clips = vec![NormalizedClip {
            path: dir.path().join("clip.mp4"),
            duration: 5.0,
        }];
        let result = assembler.assemble(
            &clips,
            &dir.path().join("narration.wav"),
            &dir.path().join("final.mp4"),
            dir.path(),
        );
        assert!(matches!(result, Err(CoreError::ProbeInvalid(_))));
    }

    #[test]
    fn empty_clip_list_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = MixConfig::new(dir.path().to_path_buf());
        let spawner = SidecarSpawner;
        let prober = RejectingProber;
        let assembler = Assembler::new(&config, &spawner, &prober);

        let result = assembler.assemble(
            &[],
            &dir.path().join("narration.wav"),
            &dir.path().join("final.mp4"),
            dir.path(),
        );
        match result {
            Err(CoreError::AssemblyFailed { stage, .. }) => assert_eq!(stage, "probe"),
            other => panic!("expected AssemblyFailed, got {other:?}"),
        }
    }

    #[test]
    fn nonempty_check_names_the_stage() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.mp4");
        fs::write(&empty, b"").unwrap();
        match ensure_nonempty(&empty, "mux") {
            Err(CoreError::AssemblyFailed { stage, .. }) => assert_eq!(stage, "mux"),
            other => panic!("expected AssemblyFailed, got {other:?}"),
        }
        assert!(ensure_nonempty(&dir.path().join("missing.mp4"), "verify").is_err());

        let full = dir.path().join("full.mp4");
        fs::write(&full, b"data").unwrap();
        assert!(ensure_nonempty(&full, "mux").is_ok());
    }

    #[test]
    fn publish_lands_on_the_permanent_path() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("staged.mp4");
        fs::write(&staged, b"artifact").unwrap();
        let target = dir.path().join("final").join("out.mp4");

        publish(&staged, &target).unwrap();
        assert!(target.exists());
        assert!(!staged.exists());
        assert_eq!(fs::read(&target).unwrap(), b"artifact");
    }
}
