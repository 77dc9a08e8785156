//! pagecheck command line
//!
//! Compares every TIFF folder under `--input` with its PDF under `--output`.
//! With `--move`, folders that do not match are moved under `--archive`.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use pagecheck::{Auditor, Backend, Dispatch, RunConfig, RunReport, RunSummary};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Exit code for configuration, path or tool errors
const EXIT_SETUP_FAILED: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "pagecheck",
    version,
    about = "Check that OCR PDFs have as many pages as their TIFF folders"
)]
struct Cli {
    /// Root folder containing the scanned TIFF folders
    #[arg(short, long, env = "PAGECHECK_INPUT")]
    input: PathBuf,

    /// Root folder containing the OCR output PDFs
    #[arg(short, long, env = "PAGECHECK_OUTPUT")]
    output: PathBuf,

    /// Archive root for folders that fail verification (required with --move)
    #[arg(short, long, env = "PAGECHECK_ARCHIVE")]
    archive: Option<PathBuf>,

    /// Move images of mismatched, unresolved and unreadable folders to the archive
    #[arg(short = 'm', long = "move", requires = "archive")]
    move_files: bool,

    /// Count pages on a worker pool instead of one at a time
    #[arg(short, long)]
    parallel: bool,

    /// Worker count for --parallel (default: number of CPUs)
    #[arg(short, long, requires = "parallel")]
    jobs: Option<usize>,

    /// Page-count backend
    #[arg(long, value_enum, default_value_t = BackendArg::Pdfinfo, env = "PAGECHECK_BACKEND")]
    backend: BackendArg,

    /// Path to the pdfinfo executable
    #[arg(long, env = "PAGECHECK_PDFINFO")]
    pdfinfo: Option<PathBuf>,

    /// Give up on a single page-count lookup after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the full report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    /// External poppler `pdfinfo`
    Pdfinfo,
    /// In-process parsing with lopdf
    Lopdf,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Pdfinfo => Backend::Pdfinfo,
            BackendArg::Lopdf => Backend::Lopdf,
        }
    }
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::new(&self.input, &self.output);
        if self.move_files {
            if let Some(archive) = &self.archive {
                config = config.with_archive(archive);
            }
        } else {
            config.archive_root = self.archive.clone();
        }

        if self.parallel {
            config = config.with_dispatch(Dispatch::parallel_with(self.jobs.unwrap_or(0)));
        }

        config.with_timeout(self.timeout_secs.map(Duration::from_secs))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Values may come from a .env file next to the working directory
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    pagecheck::init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(report) => {
            if let Err(e) = print_report(&cli, &report) {
                eprintln!("error: {:#}", e);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Run aborted");
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_SETUP_FAILED)
        }
    }
}

async fn run(cli: &Cli) -> Result<RunReport> {
    let config = cli.run_config();
    let timeout = config.page_count_timeout;
    let counter = Backend::from(cli.backend).build(cli.pdfinfo.clone(), timeout);

    Auditor::new(config, counter)
        .run()
        .await
        .context("verification run failed")
}

fn print_report(cli: &Cli, report: &RunReport) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
        println!("{}", json);
        return Ok(());
    }

    for record in report.failures() {
        let pages = record
            .page_count
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} {} (images: {}, pages: {})",
            record.status.as_str(),
            record.folder.path.display(),
            record.folder.image_count,
            pages
        );
    }

    for outcome in report.moves.iter().filter(|m| !m.is_complete()) {
        for error in &outcome.errors {
            println!("MOVE-FAIL  {}", error);
        }
    }

    println!("{}", report.summary);
    println!("{}", verdict(&report.summary));
    println!("Finished in {} ms", report.duration_ms());
    Ok(())
}

/// One-line outcome of the run
fn verdict(summary: &RunSummary) -> String {
    if summary.is_clean() {
        return format!("OK: all {} folders match", summary.folders_discovered);
    }

    let mut line = format!(
        "ATTENTION: {} of {} folders did not match ({} mismatched, {} unverified)",
        summary.folders_discovered - summary.matched,
        summary.folders_discovered,
        summary.mismatched,
        summary.unverified()
    );
    if summary.move_failures > 0 {
        line.push_str(&format!(", {} files failed to move", summary.move_failures));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecheck::Mode;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_move_requires_archive() {
        let result = Cli::try_parse_from(["pagecheck", "-i", "in", "-o", "out", "--move"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_move_mode_config() {
        let cli = Cli::try_parse_from([
            "pagecheck", "-i", "in", "-o", "out", "-a", "arch", "--move", "--parallel", "-j", "3",
        ])
        .unwrap();
        let config = cli.run_config();
        assert_eq!(config.mode, Mode::CountAndMove);
        assert_eq!(config.archive_root, Some(PathBuf::from("arch")));
        assert_eq!(config.dispatch, Dispatch::Parallel { workers: 3 });
    }

    #[test]
    fn test_verdict_lines() {
        let clean = RunSummary {
            folders_discovered: 2,
            matched: 2,
            ..RunSummary::default()
        };
        assert_eq!(verdict(&clean), "OK: all 2 folders match");

        let dirty = RunSummary {
            folders_discovered: 4,
            matched: 1,
            mismatched: 1,
            unresolved: 1,
            read_errors: 1,
            move_failures: 3,
            ..RunSummary::default()
        };
        assert_eq!(
            verdict(&dirty),
            "ATTENTION: 3 of 4 folders did not match (1 mismatched, 2 unverified), 3 files failed to move"
        );
    }

    #[test]
    fn test_count_only_by_default() {
        let cli = Cli::try_parse_from(["pagecheck", "-i", "in", "-o", "out", "-a", "arch"]).unwrap();
        let config = cli.run_config();
        assert_eq!(config.mode, Mode::CountOnly);
        assert_eq!(config.dispatch, Dispatch::Sequential);
        assert!(config.page_count_timeout.is_none());
    }
}
