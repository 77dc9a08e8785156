//! Image folder definitions
//!
//! An image folder is a directory that directly holds scanned page images.
//! Its name is the join key used to find the matching PDF.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extensions recognised as page images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: &[&str] = &["tif", "tiff"];

/// Position of a folder in the run's discovery order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(pub usize);

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A directory under the input root holding one batch of page images
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFolder {
    pub id: FolderId,

    /// Absolute (or root-joined) path to the directory
    pub path: PathBuf,

    /// Directory basename, used to derive `<name>.pdf`. Kept as raw OS bytes
    /// so non-UTF-8 names still resolve; serialized lossily.
    #[serde(with = "os_name")]
    pub name: OsString,

    /// Path relative to the input root (empty for the root itself)
    pub relative_path: PathBuf,

    /// Number of image files directly inside the directory
    pub image_count: usize,
}

impl ImageFolder {
    /// Name of the directory one level up, if it is still under the input root
    pub fn parent_name(&self) -> Option<&OsStr> {
        self.relative_path.parent().and_then(|p| p.file_name())
    }

    /// File name of the PDF this folder is expected to produce
    pub fn pdf_file_name(&self) -> OsString {
        let mut file_name = self.name.clone();
        file_name.push(".pdf");
        file_name
    }

    /// Folder name for logs and reports
    pub fn display_name(&self) -> std::borrow::Cow<'_, str> {
        self.name.to_string_lossy()
    }
}

mod os_name {
    use super::*;

    pub fn serialize<S: Serializer>(name: &OsString, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&name.to_string_lossy())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OsString, D::Error> {
        String::deserialize(deserializer).map(OsString::from)
    }
}

/// Check whether a path has a page-image extension
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// List the image files directly inside `dir`, sorted by path
pub fn list_images(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() && is_image_file(&entry.path()) {
            images.push(entry.path());
        }
    }
    images.sort();
    Ok(images)
}

/// Count the image files directly inside `dir`
pub fn count_images(dir: &Path) -> io::Result<usize> {
    list_images(dir).map(|images| images.len())
}
