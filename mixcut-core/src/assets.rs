//! Keyword-to-asset resolution.
//!
//! Annotation tags carry keywords; resolvers map them to an overlay image
//! or a sound-effect file, or to nothing. The directory-backed resolver
//! matches the keyword against file stems, case-insensitively.

use std::fs;
use std::path::{Path, PathBuf};

const OVERLAY_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];
const SOUND_EXTENSIONS: &[&str] = &["mp3", "wav"];

/// Maps an overlay keyword to an image file, when one exists.
pub trait OverlayResolver: Send + Sync {
    fn resolve_overlay(&self, keyword: &str) -> Option<PathBuf>;
}

/// Maps a sound-effect keyword to an audio file, when one exists.
pub trait SoundEffectResolver: Send + Sync {
    fn resolve_sound(&self, keyword: &str) -> Option<PathBuf>;
}

/// Resolver backed by flat asset directories.
#[derive(Debug, Clone, Default)]
pub struct DirectoryAssets {
    overlay_dir: Option<PathBuf>,
    sound_dir: Option<PathBuf>,
}

impl DirectoryAssets {
    pub fn new(overlay_dir: Option<PathBuf>, sound_dir: Option<PathBuf>) -> Self {
        DirectoryAssets {
            overlay_dir,
            sound_dir,
        }
    }

    fn find(dir: Option<&PathBuf>, keyword: &str, extensions: &[&str]) -> Option<PathBuf> {
        let dir = dir?;
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("cannot read asset directory {}: {err}", dir.display());
                return None;
            }
        };

        let wanted = keyword.to_lowercase();
        let mut matches: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                stem_matches(path, &wanted) && extension_in(path, extensions)
            })
            .collect();
        matches.sort();
        matches.into_iter().next()
    }
}

impl OverlayResolver for DirectoryAssets {
    fn resolve_overlay(&self, keyword: &str) -> Option<PathBuf> {
        Self::find(self.overlay_dir.as_ref(), keyword, OVERLAY_EXTENSIONS)
    }
}

impl SoundEffectResolver for DirectoryAssets {
    fn resolve_sound(&self, keyword: &str) -> Option<PathBuf> {
        Self::find(self.sound_dir.as_ref(), keyword, SOUND_EXTENSIONS)
    }
}

fn stem_matches(path: &Path, wanted_lower: &str) -> bool {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase() == wanted_lower)
        .unwrap_or(false)
}

fn extension_in(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}
