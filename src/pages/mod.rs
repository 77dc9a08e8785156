//! Page count backends
//!
//! The core only needs `count_pages(path) -> Result<u32, PageCountError>`.
//! Two backends are provided:
//! - `PdfInfoCounter`: runs poppler's `pdfinfo` and parses its `Pages:` field
//! - `NativeCounter`: parses the PDF in-process with lopdf

pub mod native;
pub mod pdfinfo;

#[cfg(test)]
pub(crate) mod testing;

use crate::error::PageCountError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use native::NativeCounter;
pub use pdfinfo::{parse_pdfinfo_pages, PdfInfoCounter};

/// Something that can report how many pages a PDF has.
///
/// Implementations are called from blocking worker threads and must be
/// safe to share between them.
pub trait PageCounter: Send + Sync {
    /// Short backend name for logs and diagnostics
    fn name(&self) -> &str;

    /// Check that the backend can run at all. Called once per run.
    fn probe(&self) -> Result<(), PageCountError> {
        Ok(())
    }

    /// Count the pages of the PDF at `path`
    fn count_pages(&self, path: &Path) -> Result<u32, PageCountError>;
}

/// Backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Pdfinfo,
    Lopdf,
}

impl Backend {
    /// Build a shared counter for this backend.
    ///
    /// `program` overrides the pdfinfo executable; `timeout` bounds each
    /// external invocation. Both are ignored by the in-process backend.
    pub fn build(self, program: Option<PathBuf>, timeout: Option<Duration>) -> Arc<dyn PageCounter> {
        match self {
            Backend::Pdfinfo => {
                let mut counter = PdfInfoCounter::new().with_timeout(timeout);
                if let Some(program) = program {
                    counter = counter.with_program(program);
                }
                Arc::new(counter)
            }
            Backend::Lopdf => Arc::new(NativeCounter::new()),
        }
    }
}

/// Fail with `NotFound` unless `path` is an existing file
pub(crate) fn ensure_exists(path: &Path) -> Result<(), PageCountError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PageCountError::NotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        assert_eq!(Backend::Pdfinfo.build(None, None).name(), "pdfinfo");
        assert_eq!(Backend::Lopdf.build(None, None).name(), "lopdf");
    }

    #[test]
    fn test_ensure_exists() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.pdf");
        assert_eq!(
            ensure_exists(&missing),
            Err(PageCountError::NotFound(missing.clone()))
        );
    }
}
