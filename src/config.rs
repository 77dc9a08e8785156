//! Run configuration
//!
//! A `RunConfig` is built once (from CLI flags or by a caller) and passed into
//! a single run. There is no interactive re-entry.

use crate::dispatch::Dispatch;
use crate::error::PathError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What a run does with folders that fail verification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Only count and report
    #[default]
    CountOnly,
    /// Count, report, and move failing folders' images into the archive tree
    CountAndMove,
}

/// Configuration for one verification run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: Mode,

    /// Root of the scanned TIFF folders
    pub input_root: PathBuf,

    /// Root of the OCR output PDFs
    pub output_root: PathBuf,

    /// Where failing folders are mirrored to. Required for `CountAndMove`.
    pub archive_root: Option<PathBuf>,

    pub dispatch: Dispatch,

    /// Per-lookup limit for the page-count tool (None = wait forever)
    pub page_count_timeout: Option<Duration>,
}

impl RunConfig {
    /// Count-only configuration with sequential dispatch
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            mode: Mode::CountOnly,
            input_root: input_root.into(),
            output_root: output_root.into(),
            archive_root: None,
            dispatch: Dispatch::Sequential,
            page_count_timeout: None,
        }
    }

    /// Enable move mode with the given archive root
    pub fn with_archive(mut self, archive_root: impl Into<PathBuf>) -> Self {
        self.mode = Mode::CountAndMove;
        self.archive_root = Some(archive_root.into());
        self
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.page_count_timeout = timeout;
        self
    }

    /// Whether failing folders get moved
    pub fn moves_enabled(&self) -> bool {
        self.mode == Mode::CountAndMove
    }

    /// Check the roots before anything touches the filesystem.
    ///
    /// Creates the archive root when it does not exist yet.
    pub fn validate(&self) -> Result<(), PathError> {
        require_dir(&self.input_root)?;
        require_dir(&self.output_root)?;

        if !self.moves_enabled() {
            return Ok(());
        }

        let archive = self.archive_root.as_ref().ok_or(PathError::ArchiveMissing)?;
        // Checked before creation through the nearest existing ancestor, then
        // again once the archive itself exists
        let input = canonical(&self.input_root);
        self.reject_nested_archive(archive, canonical_prospective(archive).starts_with(&input))?;

        if !archive.exists() {
            fs::create_dir_all(archive).map_err(|source| PathError::CreateFailed {
                path: archive.clone(),
                source,
            })?;
            tracing::info!(archive = %archive.display(), "Created archive root");
        }
        require_dir(archive)?;

        self.reject_nested_archive(archive, canonical(archive).starts_with(&input))
    }

    fn reject_nested_archive(&self, archive: &Path, nested: bool) -> Result<(), PathError> {
        if nested {
            return Err(PathError::ArchiveInsideInput {
                archive: archive.to_path_buf(),
                input: self.input_root.clone(),
            });
        }
        Ok(())
    }
}

fn require_dir(path: &Path) -> Result<(), PathError> {
    if !path.exists() {
        return Err(PathError::NotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(PathError::NotADirectory(path.to_path_buf()));
    }
    fs::read_dir(path).map_err(|source| PathError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Canonical form of a path that may not exist yet: its nearest existing
/// ancestor is canonicalized and the missing tail re-appended.
fn canonical_prospective(path: &Path) -> PathBuf {
    for ancestor in path.ancestors() {
        if let Ok(base) = ancestor.canonicalize() {
            let rest = path.strip_prefix(ancestor).unwrap_or(Path::new(""));
            return base.join(rest);
        }
    }
    path.to_path_buf()
}
