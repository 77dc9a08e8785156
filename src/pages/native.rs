//! In-process page counting with lopdf, for hosts without poppler tools.

use lopdf::Document;
use std::path::Path;

use super::{ensure_exists, PageCounter};
use crate::error::PageCountError;

#[derive(Debug, Clone, Default)]
pub struct NativeCounter;

impl NativeCounter {
    pub fn new() -> Self {
        Self
    }
}

impl PageCounter for NativeCounter {
    fn name(&self) -> &str {
        "lopdf"
    }

    fn count_pages(&self, path: &Path) -> Result<u32, PageCountError> {
        ensure_exists(path)?;

        let doc = Document::load(path).map_err(|e| {
            PageCountError::UnparseableOutput(format!("cannot load {}: {}", path.display(), e))
        })?;

        let pages = doc.get_pages().len();
        u32::try_from(pages)
            .map_err(|_| PageCountError::UnparseableOutput(format!("page count {} out of range", pages)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_file_is_unparseable() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("broken.pdf");
        std::fs::write(&pdf, b"this is not a pdf").unwrap();

        let result = NativeCounter::new().count_pages(&pdf);
        assert!(matches!(result, Err(PageCountError::UnparseableOutput(_))));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = NativeCounter::new().count_pages(&dir.path().join("missing.pdf"));
        assert!(matches!(result, Err(PageCountError::NotFound(_))));
    }
}
