// Runner behavior: failures rendered into err_msg, stop handling, output
// file policy.

mod common;

use common::*;
use rpt_reports::book::ReportBook;
use rpt_reports::{
    Column, Connections, ParamSet, Report, ReportContext, Result, RunConfig, RunStatus, Runner,
    Source, StatusFlag,
};
use tempfile::TempDir;

/// Writes `total` rows, asking the runner to stop after `stop_after`
struct CountingReport {
    status: StatusFlag,
    stop_after: usize,
    total: usize,
}

impl Report for CountingReport {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn title(&self) -> &'static str {
        "Counting"
    }

    fn sources(&self) -> &'static [Source] {
        &[]
    }

    fn set_params(&mut self, _params: &ParamSet) -> Result<()> {
        Ok(())
    }

    fn file_name(&self) -> String {
        "counting.xlsx".to_string()
    }

    fn build(&mut self, ctx: &ReportContext<'_>, book: &mut ReportBook) -> Result<()> {
        let mut sheet = book.add_sheet("Rows")?;
        sheet.header(&[Column::integer("N", 8.0)])?;
        for n in 0..self.total {
            if ctx.stopped() {
                break;
            }
            sheet.row(&[(n as i64).into()])?;
            if n + 1 == self.stop_after {
                self.status.stop();
            }
        }
        sheet.finish()?;
        Ok(())
    }
}

fn counting(runner: &Runner, stop_after: usize) -> CountingReport {
    CountingReport {
        status: runner.status_handle(),
        stop_after,
        total: 10,
    }
}

#[test]
fn test_stop_keeps_partial_output() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let runner = Runner::new(Connections::new(), RunConfig::new(dir.path()));

    let mut report = counting(&runner, 3);
    let outcome = runner.create_report(&mut report, &ParamSet::new());

    assert!(outcome.success, "{}", outcome.err_msg);
    assert_eq!(outcome.status, RunStatus::Stopped);
    assert_eq!(runner.status(), RunStatus::Stopped);
    assert_eq!(outcome.rows, 3);

    let sheet = open_sheet(&outcome.file_paths()[0], "Rows");
    let values: Vec<f64> = (1..4).map(|row| number(&sheet, row, 0)).collect();
    assert_eq!(values, vec![0.0, 1.0, 2.0]);
    assert!(is_empty(&sheet, 4, 0));
}

#[test]
fn test_stop_can_discard_output() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let config = RunConfig::new(dir.path()).with_keep_partial_on_stop(false);
    let runner = Runner::new(Connections::new(), config);

    let mut report = counting(&runner, 2);
    let outcome = runner.create_report(&mut report, &ParamSet::new());

    assert!(!outcome.success);
    assert_eq!(outcome.status, RunStatus::Stopped);
    assert!(outcome.file_names.is_empty());
    assert!(outcome.err_msg.contains("stopped before completion"));
    assert!(!dir.path().join("counting.xlsx").exists());
}

#[test]
fn test_complete_run_resets_status() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let runner = Runner::new(Connections::new(), RunConfig::new(dir.path()));

    // a stop from the previous run must not leak into the next one
    let mut report = counting(&runner, 1);
    runner.create_report(&mut report, &ParamSet::new());
    assert_eq!(runner.status(), RunStatus::Stopped);

    let mut report = counting(&runner, usize::MAX);
    let outcome = runner.create_report(&mut report, &ParamSet::new());
    assert!(outcome.success);
    assert_eq!(outcome.status, RunStatus::Complete);
    assert_eq!(outcome.rows, 10);
}

#[test]
fn test_stop_before_start_skips_the_run() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let runner = Runner::new(Connections::new(), RunConfig::new(dir.path()));

    runner.status_handle().stop();
    let mut report = counting(&runner, usize::MAX);
    let outcome = runner.create_report(&mut report, &ParamSet::new());

    assert!(!outcome.success);
    assert_eq!(outcome.status, RunStatus::Stopped);
    assert_eq!(outcome.rows, 0);
    assert!(outcome.err_msg.contains("stopped before it started"));
    assert!(!dir.path().join("counting.xlsx").exists());

    // the request is used up by the skipped run
    let mut report = counting(&runner, usize::MAX);
    let outcome = runner.create_report(&mut report, &ParamSet::new());
    assert_eq!(outcome.status, RunStatus::Complete);
    assert_eq!(outcome.rows, 10);
}

#[test]
fn test_missing_connection_fails_without_output() {
    init_logging();
    let dir = TempDir::new().unwrap();
    // cust_item_sales also needs the accounting database
    let runner = Runner::new(connections(&[Source::Edb]), RunConfig::new(dir.path()));

    let outcome = runner.run(
        "cust_item_sales",
        &ParamSet::new()
            .with("begdate", "01/01/2024")
            .with("enddate", "03/31/2024")
            .with("cust", "C100"),
    );

    assert!(!outcome.success);
    assert_eq!(outcome.status, RunStatus::Failed);
    assert!(outcome.err_msg.starts_with("Report cust_item_sales failed"));
    assert!(outcome.err_msg.contains("Parameters: begdate=01/01/2024"));
    assert!(outcome.err_msg.contains("No connection supplied for source: sage"));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn test_invalid_param_is_reported() {
    let dir = TempDir::new().unwrap();
    let outcome = runner(dir.path()).run(
        "never_out",
        &ParamSet::new().with("enddate", "2024-03-31"),
    );

    assert!(!outcome.success);
    assert!(outcome
        .err_msg
        .contains("Invalid parameter 'enddate': '2024-03-31' is not a MM/DD/YYYY date"));
}

#[test]
fn test_sql_error_carries_cause_chain() {
    init_logging();
    let dir = TempDir::new().unwrap();
    // a database without the expected tables
    let conns =
        Connections::new().with(Source::Edb, rusqlite::Connection::open_in_memory().unwrap());
    let runner = Runner::new(conns, RunConfig::new(dir.path()));

    let outcome = runner.run("never_out", &ParamSet::new().with("enddate", "03/31/2024"));

    assert!(!outcome.success);
    assert!(outcome.err_msg.contains("SQL error\n  caused by: "));
    assert_eq!(outcome.err_msg.matches("no such table").count(), 1);
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn test_overwrite_refused() {
    let dir = TempDir::new().unwrap();
    let existing = dir.path().join("vendor_adders.xlsx");
    std::fs::write(&existing, b"keep me").unwrap();

    init_logging();
    let config = RunConfig::new(dir.path()).with_overwrite(false);
    let refusing = Runner::new(connections(&Source::ALL), config);
    let outcome = refusing.run("vendor_adders", &ParamSet::new());

    assert!(!outcome.success);
    assert!(outcome.err_msg.contains("already exists"));
    assert_eq!(std::fs::read(&existing).unwrap(), b"keep me");

    // default config replaces the file
    let outcome = runner(dir.path()).run("vendor_adders", &ParamSet::new());
    assert!(outcome.success, "{}", outcome.err_msg);
    assert_ne!(std::fs::read(&existing).unwrap(), b"keep me");
}

#[test]
fn test_output_dir_is_created() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("monthly").join("2024-06");
    let outcome = runner(&nested).run(
        "rolling_cust_sales",
        &ParamSet::new().with("enddate", "06/30/2024"),
    );

    assert!(outcome.success, "{}", outcome.err_msg);
    assert!(nested.join("rolling_cust_sales_2024-06.xlsx").exists());
}

#[test]
fn test_unknown_report_outcome() {
    let dir = TempDir::new().unwrap();
    let outcome = runner(dir.path()).run("no_such_report", &ParamSet::new());
    assert_eq!(outcome.status, RunStatus::Failed);
    assert!(outcome.summary().contains("Unknown report: no_such_report"));
}
