//! Temporary file management utilities.
//!
//! Each job owns an isolated working directory for intermediates, created
//! here via the tempfile crate so it is removed automatically when dropped,
//! including on error paths.

use crate::config::MixConfig;
use crate::error::CoreResult;
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, TempDir};

/// Creates a per-job working directory with prefix. Auto-cleaned when dropped.
pub fn create_job_dir(config: &MixConfig, prefix: &str) -> CoreResult<TempDir> {
    let base = config.work_base();
    std::fs::create_dir_all(base)?;

    Ok(TempFileBuilder::new().prefix(prefix).tempdir_in(base)?)
}

/// Returns an intermediate file path with a random suffix. Does not create
/// the file; the encoder's exit status decides whether it exists.
pub fn intermediate_path(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    use rand::distributions::Alphanumeric;
    use rand::{thread_rng, Rng};

    let random_suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();

    let filename = format!("{prefix}_{random_suffix}.{extension}");
    dir.join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intermediate_paths_are_unique() {
        let dir = Path::new("/tmp");
        let a = intermediate_path(dir, "seg", "mp4");
        let b = intermediate_path(dir, "seg", "mp4");
        assert_ne!(a, b);
        assert!(a.file_name().unwrap().to_string_lossy().starts_with("seg_"));
        assert!(a.extension().unwrap() == "mp4");
    }
}
