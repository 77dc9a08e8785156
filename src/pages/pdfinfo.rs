//! pdfinfo backend
//!
//! Runs `pdfinfo <file>` with separate arguments (no shell) and reads the
//! `Pages:` line from its output. A non-zero exit or a missing field is a
//! `PageCountError`, never a panic.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::{ensure_exists, PageCounter};
use crate::error::PageCountError;

/// Poll interval while waiting on a child with a timeout
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Maximum stderr characters kept in error messages
const MAX_STDERR_CHARS: usize = 200;

static PAGES_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Pages:\s+(\d+)\s*$").expect("valid regex"));

/// Page counter backed by the external `pdfinfo` program
#[derive(Debug, Clone)]
pub struct PdfInfoCounter {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl Default for PdfInfoCounter {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pdfinfo"),
            timeout: None,
        }
    }
}

impl PdfInfoCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific pdfinfo executable
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Kill the child and report `TimedOut` after this long
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn run(&self, path: &Path) -> Result<std::process::Output, PageCountError> {
        let expr = duct::cmd(&self.program, [path.as_os_str()])
            .stdout_capture()
            .stderr_capture()
            .unchecked();

        let Some(limit) = self.timeout else {
            return expr.run().map_err(|e| self.spawn_error(e));
        };

        let handle = expr.start().map_err(|e| self.spawn_error(e))?;
        let started = Instant::now();
        loop {
            match handle.try_wait() {
                Ok(Some(output)) => return Ok(output.clone()),
                Ok(None) => {}
                Err(e) => return Err(PageCountError::ToolInvocationFailed(e.to_string())),
            }

            if started.elapsed() >= limit {
                if let Err(e) = handle.kill() {
                    tracing::warn!(error = %e, pdf = %path.display(), "Failed to kill pdfinfo");
                }
                return Err(PageCountError::TimedOut(limit));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn spawn_error(&self, e: std::io::Error) -> PageCountError {
        PageCountError::ToolInvocationFailed(format!(
            "failed to run {}: {}",
            self.program.display(),
            e
        ))
    }
}

impl PageCounter for PdfInfoCounter {
    fn name(&self) -> &str {
        "pdfinfo"
    }

    /// The tool only has to start; `pdfinfo -v` exit codes vary between builds.
    fn probe(&self) -> Result<(), PageCountError> {
        duct::cmd(&self.program, ["-v"])
            .stdout_null()
            .stderr_null()
            .unchecked()
            .run()
            .map(|_| ())
            .map_err(|e| self.spawn_error(e))
    }

    fn count_pages(&self, path: &Path) -> Result<u32, PageCountError> {
        ensure_exists(path)?;

        let output = self.run(path)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr: String = stderr.trim().chars().take(MAX_STDERR_CHARS).collect();
            return Err(PageCountError::ToolInvocationFailed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr
            )));
        }

        parse_pdfinfo_pages(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Extract the page count from pdfinfo's text output
pub fn parse_pdfinfo_pages(stdout: &str) -> Result<u32, PageCountError> {
    let caps = PAGES_LINE
        .captures(stdout)
        .ok_or_else(|| PageCountError::UnparseableOutput("no Pages: field".to_string()))?;

    caps[1]
        .parse::<u32>()
        .map_err(|e| PageCountError::UnparseableOutput(format!("bad page count '{}': {}", &caps[1], e)))
}
