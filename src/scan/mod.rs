//! Image folder discovery
//!
//! Finds every directory under the input root that directly holds page
//! images (`.tif` / `.tiff`).

pub mod folder;
pub mod scanner;

pub use folder::{count_images, is_image_file, list_images, FolderId, ImageFolder, IMAGE_EXTENSIONS};
pub use scanner::{discover, FolderScanner, ScanStats};
