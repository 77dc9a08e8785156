//! pagecheck: verify that every folder of scanned TIFF pages has an OCR PDF
//! with the same number of pages, and optionally archive the folders that
//! do not.

pub mod archive;
pub mod audit;
pub mod classify;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod pages;
pub mod report;
pub mod resolve;
pub mod scan;

pub use archive::{Archiver, FolderMove};
pub use audit::Auditor;
pub use classify::{classify, ComparisonRecord, Status};
pub use config::{Mode, RunConfig};
pub use dispatch::{count_all, Dispatch, PageCountResult};
pub use error::{AuditError, MoveError, PageCountError, PathError};
pub use pages::{Backend, NativeCounter, PageCounter, PdfInfoCounter};
pub use report::{RunReport, RunSummary};
pub use resolve::{candidate_paths, resolve_pdf, PdfCandidate, PdfLayout};
pub use scan::{discover, FolderId, FolderScanner, ImageFolder};

use tracing_subscriber::EnvFilter;

/// Initialize tracing with RUST_LOG env filter
///
/// Default: warn for other crates, info for ours (per-folder results visible).
/// `verbose` switches our default to debug. Logs go to stderr so JSON output
/// on stdout stays clean.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "warn,pagecheck=debug"
    } else {
        "warn,pagecheck=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}
