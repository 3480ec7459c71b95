//! Run summaries printed after a batch

use anyhow::Result;
use rpt_reports::{registry, RunOutcome};
use serde::Serialize;

/// Everything printed with `--json`
#[derive(Debug, Serialize)]
pub struct BatchSummary<'a> {
    pub finished_at: String,
    pub succeeded: usize,
    pub failed: usize,
    pub runs: &'a [RunOutcome],
}

impl<'a> BatchSummary<'a> {
    pub fn new(runs: &'a [RunOutcome]) -> Self {
        let succeeded = runs.iter().filter(|r| r.success).count();
        Self {
            finished_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            succeeded,
            failed: runs.len() - succeeded,
            runs,
        }
    }
}

/// Print outcomes; error texts of failed runs go to stderr
pub fn print_outcomes(runs: &[RunOutcome], json: bool) -> Result<()> {
    let summary = BatchSummary::new(runs);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("═══════════════════════════════════════════════");
        println!("  Report Runs ({})", summary.finished_at);
        println!("═══════════════════════════════════════════════");
        for run in runs {
            let mark = if run.success { "✓" } else { "✗" };
            println!("{} {}", mark, run.summary());
            for path in run.file_paths() {
                println!("    {}", path.display());
            }
        }
        println!("───────────────────────────────────────────────");
        println!("  {} succeeded, {} failed", summary.succeeded, summary.failed);
    }

    for run in runs.iter().filter(|r| !r.err_msg.is_empty()) {
        eprintln!("{}", run.err_msg);
    }
    Ok(())
}

/// `--list` output
pub fn print_report_list() {
    println!("Available reports:");
    for name in registry::names() {
        let title = registry::title(name).unwrap_or_default();
        println!("  {:<20} {}", name, title);
    }
}
