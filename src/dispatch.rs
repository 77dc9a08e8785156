//! Page-count dispatch
//!
//! Page counting is the only step that blocks on an external process, so it
//! is the only step that may overlap. Each unique PDF path becomes one unit of
//! work; units run on tokio's blocking pool behind a semaphore sized to the
//! worker count. Results are keyed by the full PDF path and inserted only by
//! the dispatcher, after a unit has finished.
//!
//! A timeout reports the lookup as failed but cannot stop a blocking thread.
//! The unit's permit moves into the blocking closure, so a timed-out lookup
//! keeps its worker slot until the thread actually returns. `pdfinfo` kills
//! its own child at the same limit; an in-process parse runs to completion.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

use crate::error::PageCountError;
use crate::pages::PageCounter;

pub type PageCountResult = Result<u32, PageCountError>;

/// How page-count lookups are scheduled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dispatch {
    /// One lookup at a time
    #[default]
    Sequential,
    /// Up to `workers` lookups at once
    Parallel { workers: usize },
}

impl Dispatch {
    /// Parallel dispatch sized to the host's CPU count
    pub fn parallel() -> Self {
        Dispatch::Parallel {
            workers: num_cpus::get().max(1),
        }
    }

    /// Parallel dispatch with an explicit worker count (0 = CPU count)
    pub fn parallel_with(workers: usize) -> Self {
        if workers == 0 {
            Self::parallel()
        } else {
            Dispatch::Parallel { workers }
        }
    }

    pub fn worker_count(&self) -> usize {
        match self {
            Dispatch::Sequential => 1,
            Dispatch::Parallel { workers } => (*workers).max(1),
        }
    }
}

/// Count pages for every path, returning one result per unique path
pub async fn count_all(
    counter: Arc<dyn PageCounter>,
    paths: impl IntoIterator<Item = PathBuf>,
    dispatch: Dispatch,
    timeout: Option<Duration>,
) -> HashMap<PathBuf, PageCountResult> {
    let unique: BTreeSet<PathBuf> = paths.into_iter().collect();
    let start = Instant::now();

    let results = match dispatch {
        Dispatch::Sequential => count_sequential(counter, unique, timeout).await,
        Dispatch::Parallel { .. } => {
            count_parallel(counter, unique, dispatch.worker_count(), timeout).await
        }
    };

    tracing::info!(
        lookups = results.len(),
        workers = dispatch.worker_count(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Page counting finished"
    );

    results
}

async fn count_sequential(
    counter: Arc<dyn PageCounter>,
    paths: BTreeSet<PathBuf>,
    timeout: Option<Duration>,
) -> HashMap<PathBuf, PageCountResult> {
    let semaphore = Arc::new(Semaphore::new(1));
    let mut results = HashMap::with_capacity(paths.len());
    for path in paths {
        let permit = Arc::clone(&semaphore).acquire_owned().await.ok();
        let result = lookup(Arc::clone(&counter), path.clone(), timeout, permit).await;
        results.insert(path, result);
    }
    results
}

async fn count_parallel(
    counter: Arc<dyn PageCounter>,
    paths: BTreeSet<PathBuf>,
    workers: usize,
    timeout: Option<Duration>,
) -> HashMap<PathBuf, PageCountResult> {
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut tasks = JoinSet::new();

    for path in paths.iter().cloned() {
        let semaphore = Arc::clone(&semaphore);
        let counter = Arc::clone(&counter);

        tasks.spawn(async move {
            // The semaphore is never closed, so this only fails if that changes
            let permit = semaphore.acquire_owned().await.ok();
            let result = lookup(counter, path.clone(), timeout, permit).await;
            (path, result)
        });
    }

    let mut results = HashMap::with_capacity(paths.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((path, result)) => {
                results.insert(path, result);
            }
            Err(join_err) => {
                tracing::warn!(error = %join_err, "Page-count unit failed");
            }
        }
    }

    // A unit that died before reporting still needs a result for its path
    for path in paths {
        results.entry(path).or_insert_with(|| {
            Err(PageCountError::ToolInvocationFailed(
                "page-count unit did not complete".to_string(),
            ))
        });
    }

    results
}

/// Run one blocking lookup, converting panics and timeouts into errors.
///
/// `permit` is released when the blocking work returns, not when the
/// timeout fires.
async fn lookup(
    counter: Arc<dyn PageCounter>,
    path: PathBuf,
    timeout: Option<Duration>,
    permit: Option<OwnedSemaphorePermit>,
) -> PageCountResult {
    let task_path = path.clone();
    let task = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        counter.count_pages(&task_path)
    });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::warn!(pdf = %path.display(), limit = ?limit, "Page count timed out");
                return Err(PageCountError::TimedOut(limit));
            }
        },
        None => task.await,
    };

    let result = joined.unwrap_or_else(|e| {
        Err(PageCountError::ToolInvocationFailed(format!(
            "page-count task failed: {}",
            e
        )))
    });

    match &result {
        Ok(pages) => tracing::debug!(pdf = %path.display(), pages, "Counted pages"),
        Err(e) => tracing::debug!(pdf = %path.display(), error = %e, "Page count failed"),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::testing::ScriptedCounter;
    use std::path::Path;
    use std::sync::atomic::Ordering;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("/out").join(n)).collect()
    }

    struct PanickingCounter;

    impl PageCounter for PanickingCounter {
        fn name(&self) -> &str {
            "panicking"
        }

        fn count_pages(&self, _path: &Path) -> PageCountResult {
            panic!("boom");
        }
    }

    #[test]
    fn test_parallel_with_zero_uses_cpus() {
        assert!(Dispatch::parallel_with(0).worker_count() >= 1);
        assert_eq!(Dispatch::parallel_with(3).worker_count(), 3);
        assert_eq!(Dispatch::Sequential.worker_count(), 1);
    }

    #[tokio::test]
    async fn test_sequential_and_parallel_agree() {
        let build = || {
            Arc::new(
                ScriptedCounter::new()
                    .with_pages("a.pdf", 3)
                    .with_pages("b.pdf", 5)
                    .with_error("c.pdf", PageCountError::UnparseableOutput("x".to_string())),
            )
        };
        let input = paths(&["a.pdf", "b.pdf", "c.pdf", "d.pdf"]);

        let seq = count_all(build(), input.clone(), Dispatch::Sequential, None).await;
        let par = count_all(build(), input, Dispatch::Parallel { workers: 4 }, None).await;

        assert_eq!(seq, par);
        assert_eq!(seq[&PathBuf::from("/out/a.pdf")], Ok(3));
        assert!(matches!(
            seq[&PathBuf::from("/out/d.pdf")],
            Err(PageCountError::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_respects_worker_bound() {
        let counter = Arc::new(ScriptedCounter::new().with_delay(Duration::from_millis(30)));
        let input = paths(&["1.pdf", "2.pdf", "3.pdf", "4.pdf", "5.pdf", "6.pdf"]);

        let results = count_all(
            counter.clone(),
            input,
            Dispatch::Parallel { workers: 2 },
            None,
        )
        .await;

        assert_eq!(results.len(), 6);
        assert_eq!(counter.calls.load(Ordering::SeqCst), 6);
        assert!(counter.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_duplicate_paths_counted_once() {
        let counter = Arc::new(ScriptedCounter::new().with_pages("a.pdf", 1));
        let input = paths(&["a.pdf", "a.pdf", "a.pdf"]);

        let results = count_all(counter.clone(), input, Dispatch::parallel(), None).await;

        assert_eq!(results.len(), 1);
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_counter_becomes_error() {
        let results = count_all(
            Arc::new(PanickingCounter),
            paths(&["a.pdf", "b.pdf"]),
            Dispatch::Parallel { workers: 2 },
            None,
        )
        .await;

        assert_eq!(results.len(), 2);
        for result in results.values() {
            assert!(matches!(result, Err(PageCountError::ToolInvocationFailed(_))));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timed_out_lookup_keeps_worker_slot() {
        let counter = Arc::new(
            ScriptedCounter::new()
                .with_pages("1.pdf", 1)
                .with_pages("2.pdf", 1)
                .with_pages("3.pdf", 1)
                .with_delay(Duration::from_millis(150)),
        );

        let results = count_all(
            counter.clone(),
            paths(&["1.pdf", "2.pdf", "3.pdf"]),
            Dispatch::Parallel { workers: 1 },
            Some(Duration::from_millis(10)),
        )
        .await;

        assert_eq!(results.len(), 3);
        assert!(results
            .values()
            .all(|r| matches!(r, Err(PageCountError::TimedOut(_)))));
        assert_eq!(counter.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_reported() {
        let counter = Arc::new(
            ScriptedCounter::new()
                .with_pages("slow.pdf", 1)
                .with_delay(Duration::from_millis(500)),
        );

        let results = count_all(
            counter,
            paths(&["slow.pdf"]),
            Dispatch::Sequential,
            Some(Duration::from_millis(20)),
        )
        .await;

        assert_eq!(
            results[&PathBuf::from("/out/slow.pdf")],
            Err(PageCountError::TimedOut(Duration::from_millis(20)))
        );
    }
}
