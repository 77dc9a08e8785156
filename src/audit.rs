//! Run orchestration
//!
//! discovery -> resolution -> page counting -> classification -> archival.
//! Only page counting may run in parallel; every filesystem mutation happens
//! on one folder at a time, in discovery order.

use chrono::Utc;
use std::sync::Arc;

use crate::archive::{Archiver, FolderMove};
use crate::classify::{ComparisonRecord, Status};
use crate::config::RunConfig;
use crate::dispatch::count_all;
use crate::error::{AuditError, PageCountError};
use crate::pages::PageCounter;
use crate::report::{RunReport, RunSummary};
use crate::resolve::{resolve_pdf, PdfCandidate};
use crate::scan::{FolderScanner, ImageFolder};

/// Runs one verification pass over an input tree
pub struct Auditor {
    config: RunConfig,
    counter: Arc<dyn PageCounter>,
    scanner: FolderScanner,
}

impl Auditor {
    pub fn new(config: RunConfig, counter: Arc<dyn PageCounter>) -> Self {
        Self {
            config,
            counter,
            scanner: FolderScanner::new(),
        }
    }

    /// Replace the default discovery settings
    pub fn with_scanner(mut self, scanner: FolderScanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Execute the run and return its report.
    ///
    /// Errors only for bad roots or an unusable page-count backend; every
    /// per-folder problem ends up in the report instead.
    pub async fn run(&self) -> Result<RunReport, AuditError> {
        let started_at = Utc::now();
        self.config.validate()?;

        self.counter
            .probe()
            .map_err(|source| AuditError::ToolUnavailable {
                backend: self.counter.name().to_string(),
                source,
            })?;

        tracing::info!(
            input = %self.config.input_root.display(),
            output = %self.config.output_root.display(),
            mode = ?self.config.mode,
            dispatch = ?self.config.dispatch,
            backend = self.counter.name(),
            "Starting run"
        );

        let scanner = self.scanner.clone();
        let input_root = self.config.input_root.clone();
        let folders = tokio::task::spawn_blocking(move || scanner.scan(&input_root))
            .await
            .map_err(|e| AuditError::Task(e.to_string()))??;

        let mut summary = RunSummary {
            folders_discovered: folders.len(),
            ..RunSummary::default()
        };

        let candidates: Vec<Option<PdfCandidate>> = folders
            .iter()
            .map(|folder| resolve_pdf(&self.config.output_root, folder))
            .collect();

        let counts = count_all(
            Arc::clone(&self.counter),
            candidates.iter().flatten().map(|c| c.path.clone()),
            self.config.dispatch,
            self.config.page_count_timeout,
        )
        .await;

        let archiver = self.archiver();
        let mut records = Vec::with_capacity(folders.len());
        let mut moves = Vec::new();

        for (folder, candidate) in folders.into_iter().zip(candidates) {
            let page_count = candidate.as_ref().map(|c| {
                counts.get(&c.path).cloned().unwrap_or_else(|| {
                    Err(PageCountError::ToolInvocationFailed(
                        "no page-count result".to_string(),
                    ))
                })
            });

            let record = ComparisonRecord::new(folder, candidate, page_count);
            log_record(&record);
            summary.record_status(record.status);

            if let Some(archiver) = &archiver {
                if record.status.needs_archival() {
                    let outcome = archive_blocking(archiver, &record.folder).await?;
                    summary.record_move(&outcome);
                    moves.push(outcome);
                }
            }

            records.push(record);
        }

        tracing::info!(
            discovered = summary.folders_discovered,
            matched = summary.matched,
            mismatched = summary.mismatched,
            unresolved = summary.unresolved,
            read_errors = summary.read_errors,
            archived = summary.folders_archived,
            files_moved = summary.files_moved,
            move_failures = summary.move_failures,
            "Run finished"
        );

        Ok(RunReport {
            started_at,
            finished_at: Utc::now(),
            mode: self.config.mode,
            summary,
            records,
            moves,
        })
    }

    fn archiver(&self) -> Option<Archiver> {
        if !self.config.moves_enabled() {
            return None;
        }
        self.config
            .archive_root
            .as_ref()
            .map(|archive| Archiver::new(&self.config.input_root, archive))
    }
}

/// Archive one folder on the blocking pool, waiting for it to finish
async fn archive_blocking(archiver: &Archiver, folder: &ImageFolder) -> Result<FolderMove, AuditError> {
    let archiver = archiver.clone();
    let folder = folder.clone();
    tokio::task::spawn_blocking(move || archiver.archive_folder(&folder))
        .await
        .map_err(|e| AuditError::Task(e.to_string()))
}

fn log_record(record: &ComparisonRecord) {
    let folder = record.folder.path.display();
    match record.status {
        Status::Match => tracing::info!(
            %folder,
            images = record.folder.image_count,
            "MATCH"
        ),
        Status::Mismatch => tracing::warn!(
            %folder,
            images = record.folder.image_count,
            pages = record.page_count,
            "MISMATCH"
        ),
        Status::Unresolved => tracing::warn!(
            %folder,
            pdf = %record.folder.pdf_file_name().to_string_lossy(),
            "UNRESOLVED: no PDF found"
        ),
        Status::ReadError => tracing::warn!(
            %folder,
            error = record.error.as_deref().unwrap_or("unknown"),
            "READ_ERROR"
        ),
    }
}
