//! Advisory per-source-file locking.
//!
//! Concurrent scene workers may consider the same source clip; a sidecar
//! `<file>.lock` taken exclusively brackets the probe-and-copy window so no
//! two workers read a file mid-write. Acquisition is timeout-bounded and
//! the lock is released on every exit path via Drop.

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Poll interval while waiting for a contended lock.
const ACQUIRE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// RAII guard over the advisory lock for one source file.
#[derive(Debug)]
pub struct SourceLock {
    file: File,
    source: PathBuf,
}

impl SourceLock {
    /// Acquires the lock for `source`, waiting up to `timeout`.
    pub fn acquire(source: &Path, timeout: Duration) -> CoreResult<SourceLock> {
        let lock_path = lock_path_for(source);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&lock_path)?;

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    log::debug!("acquired source lock: {}", source.display());
                    return Ok(SourceLock {
                        file,
                        source: source.to_path_buf(),
                    });
                }
                Err(err) if is_contended(&err) => {
                    if Instant::now() >= deadline {
                        log::warn!("lock acquisition timed out: {}", source.display());
                        return Err(CoreError::LockTimeout(source.to_path_buf()));
                    }
                    thread::sleep(ACQUIRE_POLL_INTERVAL);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl Drop for SourceLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            log::warn!(
                "failed to release source lock {}: {err}",
                self.source.display()
            );
        } else {
            log::debug!("released source lock: {}", self.source.display());
        }
    }
}

/// Sidecar lock path: the source file name with `.lock` appended.
fn lock_path_for(source: &Path) -> PathBuf {
    let mut name = OsString::from(source.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

fn is_contended(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_path_appends_suffix() {
        assert_eq!(
            lock_path_for(Path::new("/clips/a.mp4")),
            PathBuf::from("/clips/a.mp4.lock")
        );
    }

    #[test]
    fn acquires_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, b"x").unwrap();

        let guard = SourceLock::acquire(&source, Duration::from_secs(1)).unwrap();
        drop(guard);

        // Re-acquisition succeeds immediately after release.
        let again = SourceLock::acquire(&source, Duration::from_millis(200));
        assert!(again.is_ok());
    }

    #[test]
    fn contended_lock_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, b"x").unwrap();

        let _held = SourceLock::acquire(&source, Duration::from_secs(1)).unwrap();
        let result = SourceLock::acquire(&source, Duration::from_millis(150));
        assert!(matches!(result, Err(CoreError::LockTimeout(_))));
    }
}
