//! Error types
//!
//! Only environment-level failures (bad roots, missing page-count tool) stop a
//! run. Missing PDFs, count mismatches and unreadable PDFs are ordinary
//! outcomes and live in `ComparisonRecord`, not here.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A root path could not be used for this run.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot read directory {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("archive root is required when moving files")]
    ArchiveMissing,

    #[error("archive root {} must not be inside input root {}", archive.display(), input.display())]
    ArchiveInsideInput { archive: PathBuf, input: PathBuf },

    #[error("failed to create {}: {source}", path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The page count of a PDF could not be determined.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageCountError {
    #[error("PDF not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("page-count tool failed: {0}")]
    ToolInvocationFailed(String),

    #[error("unparseable page-count output: {0}")]
    UnparseableOutput(String),

    #[error("page-count lookup timed out after {0:?}")]
    TimedOut(Duration),
}

/// A single file (or a folder's destination) could not be moved.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("failed to create destination {}: {source}", path.display())]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors that terminate a run early.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("page-count backend '{backend}' is unavailable: {source}")]
    ToolUnavailable {
        backend: String,
        #[source]
        source: PageCountError,
    },

    #[error("background task failed: {0}")]
    Task(String),
}
