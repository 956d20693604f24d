//! Error types for git operations.
//!
//! [`GitError`] is the single error type returned by all [`GitRepo`](crate::GitRepo) trait
//! methods. Callers match on the variant to tell a failed `git` process apart
//! from a missing revision or a filesystem problem without parsing messages.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`GitRepo`](crate::GitRepo) operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// A `git` (or `tar`) process exited unsuccessfully.
    ///
    /// `stderr` is the trimmed diagnostic output of the process, kept so the
    /// failure can be triaged without re-running it.
    #[error("`{command}` failed{}: {stderr}", exit_code.map(|c| format!(" (exit code {c})")).unwrap_or_default())]
    CommandFailed {
        /// The full command line, e.g. `"git submodule add file:///tmp/x sub"`.
        command: String,
        /// Process exit code, `None` if it was killed by a signal.
        exit_code: Option<i32>,
        /// Captured stderr.
        stderr: String,
    },

    /// A requested revision, ref, or path was not found.
    #[error("not found: {message}")]
    NotFound {
        /// Human-readable description of what was missing.
        message: String,
    },

    /// An OID string could not be parsed or was otherwise invalid.
    #[error("invalid OID `{value}`: {reason}")]
    InvalidOid {
        /// The raw value that failed validation.
        value: String,
        /// Why validation failed.
        reason: String,
    },

    /// The path is not inside a git repository.
    #[error("not a git repository: {}", path.display())]
    NotARepository {
        /// The path that was opened.
        path: PathBuf,
    },

    /// An I/O error occurred (file system, process spawn, etc.).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// gix returned an unclassified error.
    #[error("git backend error: {message}")]
    BackendError {
        /// Freeform error description from the backend.
        message: String,
    },
}
