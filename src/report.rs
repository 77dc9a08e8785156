//! Run summary and report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::archive::FolderMove;
use crate::classify::{ComparisonRecord, Status};
use crate::config::Mode;

/// Aggregate counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub folders_discovered: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub unresolved: usize,
    pub read_errors: usize,
    pub folders_archived: usize,
    pub files_moved: usize,
    pub move_failures: usize,
    pub dirs_pruned: usize,
}

impl RunSummary {
    pub fn record_status(&mut self, status: Status) {
        match status {
            Status::Match => self.matched += 1,
            Status::Mismatch => self.mismatched += 1,
            Status::Unresolved => self.unresolved += 1,
            Status::ReadError => self.read_errors += 1,
        }
    }

    pub fn record_move(&mut self, outcome: &FolderMove) {
        self.folders_archived += 1;
        self.files_moved += outcome.moved;
        self.move_failures += outcome.failed;
        self.dirs_pruned += outcome.pruned();
    }

    /// Folders that could not be verified (no PDF, or unreadable PDF)
    pub fn unverified(&self) -> usize {
        self.unresolved + self.read_errors
    }

    /// Every discovered folder matched and no move failed
    pub fn is_clean(&self) -> bool {
        self.matched == self.folders_discovered && self.move_failures == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Folders discovered: {}", self.folders_discovered)?;
        writeln!(f, "  Matched:         {}", self.matched)?;
        writeln!(f, "  Mismatched:      {}", self.mismatched)?;
        writeln!(f, "  Unresolved:      {}", self.unresolved)?;
        writeln!(f, "  Read errors:     {}", self.read_errors)?;
        writeln!(f, "Folders archived:   {}", self.folders_archived)?;
        writeln!(f, "  Files moved:     {}", self.files_moved)?;
        writeln!(f, "  Move failures:   {}", self.move_failures)?;
        write!(f, "  Dirs pruned:     {}", self.dirs_pruned)
    }
}

/// Everything a run produced, for printing or JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub mode: Mode,
    pub summary: RunSummary,
    pub records: Vec<ComparisonRecord>,
    pub moves: Vec<FolderMove>,
}

impl RunReport {
    /// Records that did not match, in discovery order
    pub fn failures(&self) -> impl Iterator<Item = &ComparisonRecord> {
        self.records.iter().filter(|r| r.status.needs_archival())
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
