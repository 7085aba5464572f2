//! Job manifest parsing.
//!
//! The manifest is a JSON document describing the scenes of one job plus
//! the optional feature blocks (assets, stock provider, background music,
//! transition). Relative paths resolve against the manifest's directory.

use mixcut_core::{BackgroundMusic, JobSpec, Scene, TransitionConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub scenes: Vec<SceneEntry>,
    #[serde(default)]
    pub output_name: Option<String>,
    #[serde(default)]
    pub assets: Option<AssetDirs>,
    #[serde(default)]
    pub stock: Option<StockEntry>,
    #[serde(default)]
    pub background_music: Option<MusicEntry>,
    #[serde(default)]
    pub transition: Option<TransitionEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SceneEntry {
    pub text: String,
    pub narration: PathBuf,
    pub clip_dir: PathBuf,
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssetDirs {
    #[serde(default)]
    pub overlay_dir: Option<PathBuf>,
    #[serde(default)]
    pub sound_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct StockEntry {
    pub provider: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct MusicEntry {
    pub path: PathBuf,
    #[serde(default = "default_music_volume")]
    pub volume: f64,
}

#[derive(Debug, Deserialize)]
pub struct TransitionEntry {
    pub kind: String,
    #[serde(default = "default_transition_secs")]
    pub duration_secs: f64,
}

fn default_music_volume() -> f64 {
    0.5
}

fn default_transition_secs() -> f64 {
    1.0
}

impl Manifest {
    /// Loads and resolves a manifest; every relative path becomes absolute
    /// against the manifest's parent directory.
    pub fn load(path: &Path) -> Result<Manifest, String> {
        let body = fs::read_to_string(path)
            .map_err(|e| format!("cannot read manifest '{}': {e}", path.display()))?;
        let mut manifest: Manifest = serde_json::from_str(&body)
            .map_err(|e| format!("invalid manifest '{}': {e}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for scene in &mut manifest.scenes {
            scene.narration = resolve(base, &scene.narration);
            scene.clip_dir = resolve(base, &scene.clip_dir);
        }
        if let Some(assets) = &mut manifest.assets {
            assets.overlay_dir = assets.overlay_dir.take().map(|p| resolve(base, &p));
            assets.sound_dir = assets.sound_dir.take().map(|p| resolve(base, &p));
        }
        if let Some(music) = &mut manifest.background_music {
            music.path = resolve(base, &music.path);
        }
        Ok(manifest)
    }

    pub fn job_spec(&self) -> JobSpec {
        JobSpec {
            scenes: self
                .scenes
                .iter()
                .map(|scene| Scene {
                    text: scene.text.clone(),
                    narration: scene.narration.clone(),
                    clip_dir: scene.clip_dir.clone(),
                    query: scene.query.clone().unwrap_or_default(),
                })
                .collect(),
            output_name: self.output_name.clone(),
        }
    }

    pub fn transition_config(&self) -> Option<TransitionConfig> {
        self.transition.as_ref().map(|t| TransitionConfig {
            kind: t.kind.clone(),
            duration_secs: t.duration_secs,
        })
    }

    pub fn background_music_config(&self) -> Option<BackgroundMusic> {
        self.background_music.as_ref().map(|m| BackgroundMusic {
            path: m.path.clone(),
            volume: m.volume,
        })
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("job.json");
        fs::write(
            &manifest_path,
            r#"{
                "scenes": [
                    {"text": "hello", "narration": "audio/s0.wav", "clip_dir": "clips/s0", "query": "car"}
                ],
                "output_name": "demo.mp4",
                "assets": {"overlay_dir": "overlays"},
                "transition": {"kind": "fade"},
                "background_music": {"path": "/music/bed.mp3"}
            }"#,
        )
        .unwrap();

        let manifest = Manifest::load(&manifest_path).unwrap();
        assert_eq!(manifest.scenes.len(), 1);
        assert_eq!(
            manifest.scenes[0].narration,
            dir.path().join("audio/s0.wav")
        );
        assert_eq!(manifest.scenes[0].clip_dir, dir.path().join("clips/s0"));
        assert_eq!(
            manifest.assets.as_ref().unwrap().overlay_dir,
            Some(dir.path().join("overlays"))
        );

        // Absolute paths are kept as-is; defaults fill unset fields.
        let music = manifest.background_music_config().unwrap();
        assert_eq!(music.path, PathBuf::from("/music/bed.mp3"));
        assert_eq!(music.volume, 0.5);
        let transition = manifest.transition_config().unwrap();
        assert_eq!(transition.duration_secs, 1.0);

        let job = manifest.job_spec();
        assert_eq!(job.output_name.as_deref(), Some("demo.mp4"));
        assert_eq!(job.scenes[0].query, "car");
    }

    #[test]
    fn missing_manifest_is_a_readable_error() {
        let err = Manifest::load(Path::new("/nonexistent/job.json")).unwrap_err();
        assert!(err.contains("cannot read manifest"));
    }

    #[test]
    fn invalid_json_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("bad.json");
        fs::write(&manifest_path, "{not json").unwrap();
        let err = Manifest::load(&manifest_path).unwrap_err();
        assert!(err.contains("invalid manifest"));
    }
}
