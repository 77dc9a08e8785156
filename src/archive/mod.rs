//! Archive Module
//!
//! Relocates the page images of a folder that failed verification into an
//! archive tree mirroring the input hierarchy, then prunes directories the
//! move left empty: the folder itself and at most its parent.
//!
//! Per-file failures are recorded and never stop the remaining files.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MoveError;
use crate::scan::{list_images, ImageFolder};

/// Outcome of archiving one folder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderMove {
    /// Folder the images came from
    pub source: PathBuf,

    /// Mirrored directory under the archive root
    pub destination: PathBuf,

    /// Number of image files moved
    pub moved: usize,

    /// Number of image files that could not be moved
    pub failed: usize,

    /// Whether the source folder was removed afterwards
    pub source_removed: bool,

    /// Whether the source's parent was removed afterwards
    pub parent_removed: bool,

    /// Error messages from failed moves
    pub errors: Vec<String>,
}

impl FolderMove {
    /// Directories removed by pruning
    pub fn pruned(&self) -> usize {
        usize::from(self.source_removed) + usize::from(self.parent_removed)
    }

    /// Whether every image was moved
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    fn record_failure(&mut self, err: MoveError) {
        tracing::warn!(error = %err, "Move failed");
        self.failed += 1;
        self.errors.push(err.to_string());
    }
}

/// Moves failing folders from the input tree into the archive tree
#[derive(Debug, Clone)]
pub struct Archiver {
    input_root: PathBuf,
    archive_root: PathBuf,
}

impl Archiver {
    pub fn new(input_root: impl Into<PathBuf>, archive_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            archive_root: archive_root.into(),
        }
    }

    /// Destination directory for `folder`: its relative path re-rooted on the archive
    pub fn destination_for(&self, folder: &ImageFolder) -> PathBuf {
        self.archive_root.join(&folder.relative_path)
    }

    /// Move every image of `folder` into the archive and prune what is left empty
    pub fn archive_folder(&self, folder: &ImageFolder) -> FolderMove {
        let destination = self.destination_for(folder);
        let mut outcome = FolderMove {
            source: folder.path.clone(),
            destination: destination.clone(),
            ..FolderMove::default()
        };

        let images = match list_images(&folder.path) {
            Ok(images) => images,
            Err(e) => {
                // Nothing can be moved if the folder cannot be listed
                outcome.failed = folder.image_count;
                outcome.errors.push(format!(
                    "Failed to list {}: {}",
                    folder.path.display(),
                    e
                ));
                tracing::warn!(folder = %folder.path.display(), error = %e, "Cannot list folder");
                return outcome;
            }
        };

        if let Err(source) = fs::create_dir_all(&destination) {
            let err = MoveError::CreateDestination {
                path: destination.clone(),
                source,
            };
            tracing::warn!(error = %err, "Archiving aborted for folder");
            outcome.failed = images.len();
            outcome.errors.push(err.to_string());
            return outcome;
        }

        for image in &images {
            let Some(file_name) = image.file_name() else {
                continue;
            };
            let target = destination.join(file_name);

            match move_file(image, &target) {
                Ok(()) => {
                    outcome.moved += 1;
                    tracing::debug!(from = %image.display(), to = %target.display(), "Moved image");
                }
                Err(err) => outcome.record_failure(err),
            }
        }

        self.prune(folder, &mut outcome);

        tracing::info!(
            folder = %folder.path.display(),
            destination = %destination.display(),
            moved = outcome.moved,
            failed = outcome.failed,
            pruned = outcome.pruned(),
            "Archived folder"
        );

        outcome
    }

    /// Remove the folder if empty, then its parent if that became empty too.
    ///
    /// Never removes the input root or anything outside it.
    fn prune(&self, folder: &ImageFolder, outcome: &mut FolderMove) {
        if !self.is_prunable(&folder.path) || !remove_if_empty(&folder.path) {
            return;
        }
        outcome.source_removed = true;

        if let Some(parent) = folder.path.parent() {
            if self.is_prunable(parent) && remove_if_empty(parent) {
                outcome.parent_removed = true;
            }
        }
    }

    fn is_prunable(&self, dir: &Path) -> bool {
        dir != self.input_root && dir.starts_with(&self.input_root)
    }
}

/// Remove `dir` when it has no entries left. Returns whether it was removed.
fn remove_if_empty(dir: &Path) -> bool {
    let is_empty = fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);

    if !is_empty {
        return false;
    }

    match fs::remove_dir(dir) {
        Ok(()) => {
            tracing::debug!(dir = %dir.display(), "Removed empty directory");
            true
        }
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Failed to remove empty directory");
            false
        }
    }
}

/// Move one file, refusing to overwrite. Falls back to copy + delete across devices.
fn move_file(source: &Path, destination: &Path) -> Result<(), MoveError> {
    if destination.exists() {
        return Err(MoveError::DestinationExists(destination.to_path_buf()));
    }

    let io_err = |source_err| MoveError::Io {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: source_err,
    };

    // Try rename first (same filesystem), fall back to copy+delete
    if fs::rename(source, destination).is_err() {
        fs::copy(source, destination).map_err(io_err)?;
        if let Err(e) = fs::remove_file(source) {
            // Roll back so the image exists exactly once
            rollback_copy(destination);
            return Err(io_err(e));
        }
    }

    Ok(())
}

/// Remove a copy whose source could not be deleted. Returns whether it was removed.
fn rollback_copy(copy: &Path) -> bool {
    match fs::remove_file(copy) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                copy = %copy.display(),
                error = %e,
                "Rollback failed; image now exists in both trees"
            );
            false
        }
    }
}
