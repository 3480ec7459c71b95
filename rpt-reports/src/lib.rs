//! Report Engine Library
//!
//! Parameterized database reports rendered to Excel workbooks.
//!
//! # Architecture
//!
//! The library runs one report at a time against connections supplied by the
//! caller:
//! - Parses loosely typed `name=value` parameters into typed values
//! - Builds filtered SQL with bound placeholders
//! - Writes captioned, formatted sheets with totals, merged blocks,
//!   conditional highlights and dropdowns
//! - Reports the outcome (file names or an operator-readable error text)
//!
//! The library does NOT:
//! - Open, pool or retry database connections on its own
//! - Send the error text anywhere
//! - Schedule runs
//!
//! Configuration files, job lists and the command line are in the application
//! layer (rpt-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use rpt_reports::{Connections, ParamSet, RunConfig, Runner, Source};
//! use std::path::Path;
//!
//! let mut conns = Connections::new();
//! conns.open(Source::Edb, Path::new("edb.sqlite")).unwrap();
//!
//! let runner = Runner::new(conns, RunConfig::new("out"));
//! let params = ParamSet::new()
//!     .with("enddate", "06/30/2024")
//!     .with("rep", "JS");
//!
//! let outcome = runner.run("rolling_cust_sales", &params);
//! if outcome.success {
//!     println!("Wrote {:?}", outcome.file_paths());
//! } else {
//!     eprintln!("{}", outcome.err_msg);
//! }
//! ```

// Public modules
pub mod book;
pub mod calc;
pub mod config;
pub mod db;
pub mod params;
pub mod registry;
pub mod report;
pub mod reports;
pub mod sql;
pub mod status;
pub mod types;

// Re-export main types for convenience
pub use book::{Column, ColumnStyle, Fill, Highlight, ReportBook, SheetWriter};
pub use config::RunConfig;
pub use db::{Connections, Source};
pub use params::{Param, ParamSet};
pub use report::{Report, ReportContext, RunOutcome, Runner};
pub use status::{RunStatus, StatusFlag};
pub use types::{error_dump, CellValue, ReportError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
