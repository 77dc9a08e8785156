//! PDF path resolution
//!
//! OCR pipelines differ in whether they mirror the input hierarchy in the
//! output tree, so several layouts are tried in a fixed order. Only existence
//! checks happen here; a missing PDF is a normal `None`.

use crate::scan::ImageFolder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which layout rule located the PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfLayout {
    /// `<output>/<relative path>/<name>.pdf`
    MirroredTree,
    /// `<output>/<name>.pdf`
    OutputRoot,
    /// `<output>/<parent name>/<name>.pdf`
    ParentFolder,
}

/// A PDF believed to hold the OCR output of one image folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfCandidate {
    pub path: PathBuf,
    pub layout: PdfLayout,
}

/// Candidate paths for `folder`, in precedence order
pub fn candidate_paths(output_root: &Path, folder: &ImageFolder) -> Vec<(PdfLayout, PathBuf)> {
    let file_name = folder.pdf_file_name();
    let mut candidates = vec![
        (
            PdfLayout::MirroredTree,
            output_root.join(&folder.relative_path).join(&file_name),
        ),
        (PdfLayout::OutputRoot, output_root.join(&file_name)),
    ];

    if let Some(parent) = folder.parent_name() {
        candidates.push((
            PdfLayout::ParentFolder,
            output_root.join(parent).join(&file_name),
        ));
    }

    candidates
}

/// First existing PDF for `folder`, or None
pub fn resolve_pdf(output_root: &Path, folder: &ImageFolder) -> Option<PdfCandidate> {
    candidate_paths(output_root, folder)
        .into_iter()
        .find(|(_, path)| path.is_file())
        .map(|(layout, path)| PdfCandidate { path, layout })
}
