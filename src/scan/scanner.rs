//! Folder Scanner
//!
//! Walks the input root with walkdir and collects every directory that
//! directly contains page images. Results are ordered by path so repeated
//! scans of an unchanged tree produce identical logs.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use walkdir::WalkDir;

use super::folder::{is_image_file, FolderId, ImageFolder};
use crate::error::PathError;

/// Configuration for image folder discovery
#[derive(Debug, Clone)]
pub struct FolderScanner {
    /// Maximum depth to scan (0 = unlimited)
    max_depth: usize,
}

impl Default for FolderScanner {
    fn default() -> Self {
        Self { max_depth: 0 }
    }
}

/// Statistics from a scan
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    pub dirs_visited: usize,
    pub images_found: usize,
    /// Entries skipped because they could not be read
    pub errors: usize,
    pub scan_duration_ms: u64,
}

impl FolderScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum scan depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Discover image folders under `root`
    pub fn scan(&self, root: &Path) -> Result<Vec<ImageFolder>, PathError> {
        self.scan_with_stats(root).map(|(folders, _)| folders)
    }

    /// Discover image folders and report walk statistics
    pub fn scan_with_stats(&self, root: &Path) -> Result<(Vec<ImageFolder>, ScanStats), PathError> {
        let start = Instant::now();
        let mut stats = ScanStats::default();

        if !root.exists() {
            return Err(PathError::NotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(PathError::NotADirectory(root.to_path_buf()));
        }
        fs::read_dir(root).map_err(|source| PathError::Unreadable {
            path: root.to_path_buf(),
            source,
        })?;

        // Symlinked directories are not followed
        let mut walker = WalkDir::new(root).sort_by_file_name();
        if self.max_depth > 0 {
            walker = walker.max_depth(self.max_depth);
        }

        // directory -> number of images directly inside it
        let mut counts: BTreeMap<PathBuf, usize> = BTreeMap::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(
                        path = ?e.path(),
                        error = %e,
                        "Skipping unreadable entry"
                    );
                    stats.errors += 1;
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                stats.dirs_visited += 1;
                continue;
            }

            if !entry.file_type().is_file() || !is_image_file(entry.path()) {
                continue;
            }

            if let Some(parent) = entry.path().parent() {
                *counts.entry(parent.to_path_buf()).or_insert(0) += 1;
                stats.images_found += 1;
            }
        }

        let root_name = folder_name(root);
        let folders: Vec<ImageFolder> = counts
            .into_iter()
            .enumerate()
            .map(|(idx, (path, image_count))| {
                let relative_path = path
                    .strip_prefix(root)
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                let name = if relative_path.as_os_str().is_empty() {
                    root_name.clone()
                } else {
                    folder_name(&path)
                };

                ImageFolder {
                    id: FolderId(idx),
                    path,
                    name,
                    relative_path,
                    image_count,
                }
            })
            .collect();

        stats.scan_duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            root = %root.display(),
            folders = folders.len(),
            images = stats.images_found,
            dirs = stats.dirs_visited,
            errors = stats.errors,
            duration_ms = stats.scan_duration_ms,
            "Discovery finished"
        );

        Ok((folders, stats))
    }
}

/// Discover image folders under `root` with default settings
pub fn discover(root: &Path) -> Result<Vec<ImageFolder>, PathError> {
    FolderScanner::new().scan(root)
}

/// Basename of a directory, resolving `.`-style roots through canonicalization
fn folder_name(path: &Path) -> OsString {
    path.file_name()
        .map(OsStr::to_os_string)
        .or_else(|| {
            path.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(OsStr::to_os_string))
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join("A/B")).unwrap();
        fs::create_dir_all(root.join("A/C")).unwrap();
        fs::create_dir_all(root.join("D/empty")).unwrap();
        fs::create_dir_all(root.join("E")).unwrap();

        for name in ["001.tif", "002.tif", "003.TIF"] {
            File::create(root.join("A/B").join(name)).unwrap();
        }
        File::create(root.join("A/C/001.tiff")).unwrap();
        File::create(root.join("E/readme.txt")).unwrap();

        dir
    }

    #[test]
    fn test_scan_finds_only_folders_with_images() {
        let dir = create_test_tree();
        let folders = discover(dir.path()).unwrap();

        let rel: Vec<PathBuf> = folders.iter().map(|f| f.relative_path.clone()).collect();
        assert_eq!(rel, vec![PathBuf::from("A/B"), PathBuf::from("A/C")]);

        assert_eq!(folders[0].name, "B");
        assert_eq!(folders[0].image_count, 3);
        assert_eq!(folders[0].id, FolderId(0));
        assert_eq!(folders[1].image_count, 1);
        assert_eq!(folders[1].id, FolderId(1));
    }

    #[test]
    fn test_scan_is_repeatable() {
        let dir = create_test_tree();
        let first = discover(dir.path()).unwrap();
        let second = discover(dir.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_root_with_images_is_a_folder() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("page.tif")).unwrap();

        let folders = discover(dir.path()).unwrap();
        assert_eq!(folders.len(), 1);
        assert!(folders[0].relative_path.as_os_str().is_empty());
        assert_eq!(folders[0].name.as_os_str(), dir.path().file_name().unwrap());
    }

    #[test]
    fn test_scan_missing_root() {
        let dir = TempDir::new().unwrap();
        let result = discover(&dir.path().join("missing"));
        assert!(matches!(result, Err(PathError::NotFound(_))));
    }

    #[test]
    fn test_scan_root_is_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.tif");
        File::create(&file).unwrap();
        assert!(matches!(discover(&file), Err(PathError::NotADirectory(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_dirs_not_followed() {
        let dir = create_test_tree();
        let outside = TempDir::new().unwrap();
        File::create(outside.path().join("x.tif")).unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let folders = discover(dir.path()).unwrap();
        assert!(folders.iter().all(|f| f.relative_path != Path::new("link")));
        assert_eq!(folders.len(), 2);
    }

    #[test]
    fn test_max_depth() {
        let dir = create_test_tree();
        File::create(dir.path().join("top.tif")).unwrap();

        let (folders, stats) = FolderScanner::new()
            .with_max_depth(1)
            .scan_with_stats(dir.path())
            .unwrap();

        assert_eq!(folders.len(), 1);
        assert_eq!(stats.images_found, 1);
    }
}
