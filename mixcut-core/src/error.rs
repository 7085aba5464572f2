//! Error types for the mixcut core library.
//!
//! One `CoreError` enum covers every failure scope: per-clip errors the
//! selector may absorb by substitution, job-fatal assembly errors carrying
//! the failing stage name, and plumbing errors from external tools.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Custom error types for mixcut
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Fatal: the clip pools (primary and stock) could not cover the
    /// narration target. Carries the remaining deficit in seconds.
    #[error("clip selection exhausted: {shortfall_secs:.2}s short of the narration target")]
    SelectionExhausted { shortfall_secs: f64 },

    /// Per-clip: the file failed the ffprobe integrity check.
    #[error("clip failed integrity probe: {0}")]
    ProbeInvalid(PathBuf),

    /// An external encode step exited unsuccessfully.
    #[error("encode failed ({context}): {stderr}")]
    EncodeFailed { context: String, stderr: String },

    /// Could not acquire the advisory lock on a shared clip source in time.
    #[error("timed out waiting for lock on {0}")]
    LockTimeout(PathBuf),

    /// Soft: annotation content was not found in the aligned segment text.
    /// The scene pipeline logs this and continues without the event.
    #[error("annotation content not present in aligned segment text: {content:?}")]
    EventLocateFailure { content: String },

    /// Scene text carries more annotation tags than the grammar supports.
    #[error("unsupported annotation input: {0}")]
    UnsupportedAnnotation(String),

    /// Fatal to the job; names the assembly stage that failed.
    #[error("assembly failed at stage '{stage}': {message}")]
    AssemblyFailed {
        stage: &'static str,
        message: String,
    },

    #[error("external dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("failed to start command '{0}': {1}")]
    CommandStart(String, #[source] std::io::Error),

    #[error("command '{cmd}' failed ({status}): {stderr}")]
    CommandFailed {
        cmd: String,
        status: String,
        stderr: String,
    },

    #[error("failed waiting for command '{0}': {1}")]
    CommandWait(String, #[source] std::io::Error),

    #[error("ffprobe output parse error: {0}")]
    FfprobeParse(String),

    #[error("no usable clips found in source")]
    NoClipsFound,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid path: {0}")]
    PathError(String),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("timeline invariant violated: {0}")]
    TimelineInvariant(String),
}

/// Result type for mixcut operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Builds a `CommandFailed` error from an exit status and captured stderr.
pub(crate) fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        cmd: cmd.into(),
        status: status
            .code()
            .map_or_else(|| "terminated by signal".to_string(), |c| c.to_string()),
        stderr: stderr.into(),
    }
}

/// Builds a `CommandStart` error for a command that could not be spawned.
pub(crate) fn command_start_error(cmd: impl Into<String>, err: std::io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

/// Builds a `CommandWait` error for a command that could not be awaited.
pub(crate) fn command_wait_error(cmd: impl Into<String>, err: std::io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}
