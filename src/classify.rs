//! Folder classification

use crate::error::PageCountError;
use crate::resolve::PdfCandidate;
use crate::scan::ImageFolder;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verification outcome for one image folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Image count equals PDF page count
    Match,
    /// Counts differ
    Mismatch,
    /// No PDF found under any layout
    Unresolved,
    /// PDF found but its page count could not be read
    ReadError,
}

impl Status {
    /// Unverified output is not assumed correct, so everything but MATCH is archived.
    pub fn needs_archival(self) -> bool {
        !matches!(self, Status::Match)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Match => "MATCH",
            Status::Mismatch => "MISMATCH",
            Status::Unresolved => "UNRESOLVED",
            Status::ReadError => "READ_ERROR",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a folder from its image count and the page-count lookup.
///
/// `None` means no PDF candidate was resolved.
pub fn classify(image_count: usize, page_count: Option<&Result<u32, PageCountError>>) -> Status {
    match page_count {
        None => Status::Unresolved,
        Some(Err(_)) => Status::ReadError,
        Some(Ok(pages)) if *pages as usize == image_count => Status::Match,
        Some(Ok(_)) => Status::Mismatch,
    }
}

/// One folder's verification result for the current run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRecord {
    pub folder: ImageFolder,
    pub candidate: Option<PdfCandidate>,
    pub page_count: Option<u32>,
    pub error: Option<String>,
    pub status: Status,
}

impl ComparisonRecord {
    pub fn new(
        folder: ImageFolder,
        candidate: Option<PdfCandidate>,
        page_count: Option<Result<u32, PageCountError>>,
    ) -> Self {
        let status = classify(folder.image_count, page_count.as_ref());
        let (page_count, error) = match page_count {
            Some(Ok(pages)) => (Some(pages), None),
            Some(Err(e)) => (None, Some(e.to_string())),
            None => (None, None),
        };

        Self {
            folder,
            candidate,
            page_count,
            error,
            status,
        }
    }
}
