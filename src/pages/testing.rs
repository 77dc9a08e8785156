//! Scripted page counter for unit tests

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::PageCounter;
use crate::error::PageCountError;

/// Returns canned results keyed by file name and tracks concurrency
#[derive(Default)]
pub struct ScriptedCounter {
    results: HashMap<String, Result<u32, PageCountError>>,
    delay: Option<Duration>,
    probe_error: Option<PageCountError>,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub seen: Mutex<Vec<PathBuf>>,
}

impl ScriptedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `pages` for any PDF named `file_name`
    pub fn with_pages(mut self, file_name: &str, pages: u32) -> Self {
        self.results.insert(file_name.to_string(), Ok(pages));
        self
    }

    pub fn with_error(mut self, file_name: &str, error: PageCountError) -> Self {
        self.results.insert(file_name.to_string(), Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_probe_error(mut self, error: PageCountError) -> Self {
        self.probe_error = Some(error);
        self
    }
}

impl PageCounter for ScriptedCounter {
    fn name(&self) -> &str {
        "scripted"
    }

    fn probe(&self) -> Result<(), PageCountError> {
        match &self.probe_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn count_pages(&self, path: &Path) -> Result<u32, PageCountError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.seen.lock().unwrap().push(path.to_path_buf());

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let result = self
            .results
            .get(&name)
            .cloned()
            .unwrap_or_else(|| Err(PageCountError::NotFound(path.to_path_buf())));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
