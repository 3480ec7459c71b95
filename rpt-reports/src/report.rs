//! Report contract and runner
//!
//! Every report implements [`Report`]. The [`Runner`] drives one run:
//!
//! 1. mark the run as running
//! 2. hand the parameters to the report
//! 3. check the report's database sources were supplied
//! 4. let the report query and write its sheets
//! 5. save the workbook (skipped on error, optional when stopped)
//!
//! Errors never escape a run. They are rendered into
//! [`RunOutcome::err_msg`] for the caller to forward to an operator, and the
//! outcome reports `success == false`.

use crate::book::ReportBook;
use crate::config::RunConfig;
use crate::db::{Connections, Source};
use crate::params::ParamSet;
use crate::registry;
use crate::status::{RunStatus, StatusFlag};
use crate::types::{error_dump, ReportError, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// A parameterized report producing one workbook
pub trait Report {
    /// Registry name, e.g. `rolling_cust_sales`
    fn name(&self) -> &'static str;

    /// Human readable title used for captions
    fn title(&self) -> &'static str;

    /// Databases the report reads from
    fn sources(&self) -> &'static [Source];

    /// Read and validate parameters; derives the output file name
    fn set_params(&mut self, params: &ParamSet) -> Result<()>;

    /// Output file name (valid after `set_params`)
    fn file_name(&self) -> String;

    /// Run the queries and write the sheets
    fn build(&mut self, ctx: &ReportContext<'_>, book: &mut ReportBook) -> Result<()>;
}

/// What a report sees while it builds
pub struct ReportContext<'a> {
    conns: &'a Connections,
    status: &'a StatusFlag,
}

impl<'a> ReportContext<'a> {
    pub fn new(conns: &'a Connections, status: &'a StatusFlag) -> Self {
        Self { conns, status }
    }

    /// Connection for a source
    pub fn conn(&self, source: Source) -> Result<&'a Connection> {
        self.conns.get(source)
    }

    /// True once a stop was requested; reports check this between rows
    pub fn stopped(&self) -> bool {
        self.status.is_stopped()
    }
}

/// Result of one run, reported back to the caller
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Registry name of the report (or the requested name if unknown)
    pub report: String,
    /// True when a workbook was written
    pub success: bool,
    /// Final run status
    pub status: RunStatus,
    /// Output file names, relative to `output_dir`
    pub file_names: Vec<String>,
    /// Directory the files were written to
    pub output_dir: PathBuf,
    /// Operator-readable error text; empty on success
    pub err_msg: String,
    /// Data rows written
    pub rows: usize,
    /// Wall-clock run time in milliseconds
    pub elapsed_ms: u64,
}

impl RunOutcome {
    /// Full paths of the written files
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.file_names
            .iter()
            .map(|name| self.output_dir.join(name))
            .collect()
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        if self.success {
            format!(
                "{}: {} ({} rows) -> {}",
                self.report,
                self.status,
                self.rows,
                self.file_names.join(", ")
            )
        } else {
            let first_line = self.err_msg.lines().next().unwrap_or_default();
            format!("{}: {} - {}", self.report, self.status, first_line)
        }
    }
}

/// Drives report runs against an injected connection set
pub struct Runner {
    conns: Connections,
    config: RunConfig,
    status: StatusFlag,
}

impl Runner {
    pub fn new(conns: Connections, config: RunConfig) -> Self {
        Self {
            conns,
            config,
            status: StatusFlag::new(),
        }
    }

    /// Handle another thread can use to stop the current run
    pub fn status_handle(&self) -> StatusFlag {
        self.status.clone()
    }

    pub fn status(&self) -> RunStatus {
        self.status.get()
    }

    pub fn connections(&self) -> &Connections {
        &self.conns
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Look up a report by name and run it
    pub fn run(&self, name: &str, params: &ParamSet) -> RunOutcome {
        match registry::create(name) {
            Some(mut report) => self.create_report(report.as_mut(), params),
            None => {
                let err = ReportError::UnknownReport(name.to_string());
                log::error!("{}", err);
                self.status.finish(RunStatus::Failed);
                RunOutcome {
                    report: name.to_string(),
                    success: false,
                    status: RunStatus::Failed,
                    file_names: Vec::new(),
                    output_dir: self.config.output_dir.clone(),
                    err_msg: error_dump(&err),
                    rows: 0,
                    elapsed_ms: 0,
                }
            }
        }
    }

    /// Run a report instance
    pub fn create_report(&self, report: &mut dyn Report, params: &ParamSet) -> RunOutcome {
        let started = Instant::now();
        let mut outcome = RunOutcome {
            report: report.name().to_string(),
            success: false,
            status: RunStatus::Running,
            file_names: Vec::new(),
            output_dir: self.config.output_dir.clone(),
            err_msg: String::new(),
            rows: 0,
            elapsed_ms: 0,
        };

        if !self.status.start() {
            log::warn!("Report {} stopped before it started", report.name());
            outcome.status = RunStatus::Stopped;
            outcome.err_msg = format!(
                "Report {} was stopped before it started; no output was written",
                report.name()
            );
            self.status.finish(RunStatus::Stopped);
            return outcome;
        }
        log::info!("Running report {} [{}]", report.name(), params);

        match self.execute(report, params) {
            Ok((file_name, rows)) => {
                outcome.rows = rows;
                let stopped = self.status.is_stopped();
                match file_name {
                    Some(file_name) => {
                        outcome.success = true;
                        outcome.file_names.push(file_name);
                    }
                    None => {
                        outcome.err_msg = format!(
                            "Report {} was stopped before completion; no output was written",
                            report.name()
                        );
                    }
                }
                outcome.status = if stopped {
                    RunStatus::Stopped
                } else {
                    RunStatus::Complete
                };
            }
            Err(err) => {
                outcome.err_msg = format!(
                    "Report {} failed\nParameters: {}\n{}",
                    report.name(),
                    params,
                    error_dump(&err)
                );
                outcome.status = RunStatus::Failed;
                log::error!("Report {} failed: {}", report.name(), error_dump(&err));
            }
        }

        self.status.finish(outcome.status);
        outcome.elapsed_ms = started.elapsed().as_millis() as u64;
        log::info!("{} in {} ms", outcome.summary(), outcome.elapsed_ms);
        outcome
    }

    /// Returns the written file name (`None` when a stopped run was discarded)
    /// and the number of data rows.
    fn execute(&self, report: &mut dyn Report, params: &ParamSet) -> Result<(Option<String>, usize)> {
        report.set_params(params)?;

        for source in report.sources() {
            self.conns.get(*source)?;
        }

        let file_name = report.file_name();
        let path = self.config.output_path(&file_name);
        if !self.config.overwrite && path.exists() {
            return Err(ReportError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("output file already exists: {:?}", path),
            )));
        }

        let mut book = ReportBook::new();
        let ctx = ReportContext::new(&self.conns, &self.status);
        report.build(&ctx, &mut book)?;

        let rows = book.rows_written();
        if self.status.is_stopped() {
            log::warn!("Report {} stopped after {} rows", report.name(), rows);
            if !self.config.keep_partial_on_stop {
                return Ok((None, rows));
            }
        }

        book.save(&path)?;
        Ok((Some(file_name), rows))
    }
}

/// File name built from a report name and a tag derived from its parameters
pub fn output_file_name(report: &str, tag: &str) -> String {
    let tag: String = tag
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if tag.is_empty() {
        format!("{}.xlsx", report)
    } else {
        format!("{}_{}.xlsx", report, tag)
    }
}
