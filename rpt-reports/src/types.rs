//! Core types for the report engine
//!
//! This module defines the error type every report returns and the cell values
//! reports hand to the workbook writer. A report never writes raw database
//! values directly - it converts each column into a [`CellValue`] first.

use crate::db::Source;
use chrono::NaiveDate;
use std::error::Error as StdError;
use std::fmt;

/// Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur while configuring or running a report
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParam { name: String, reason: String },

    #[error("Missing required parameter: {0}")]
    MissingParam(String),

    #[error("No connection supplied for source: {0}")]
    MissingConnection(Source),

    #[error("Unknown report: {0}")]
    UnknownReport(String),

    #[error("SQL error")]
    Sql(#[from] rusqlite::Error),

    #[error("Workbook error")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Unexpected data: {0}")]
    Data(String),
}

impl ReportError {
    /// Shorthand for an [`ReportError::InvalidParam`]
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ReportError::InvalidParam {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Render an error and its full cause chain as operator-readable text.
///
/// The first line is the error itself, followed by one `caused by:` line per
/// source in the chain.
pub fn error_dump(err: &dyn StdError) -> String {
    let mut dump = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        dump.push_str("\n  caused by: ");
        dump.push_str(&cause.to_string());
        source = cause.source();
    }
    dump
}

/// A single value destined for a worksheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Blank cell (still styled)
    Empty,
    /// Text value
    Text(String),
    /// Whole number
    Int(i64),
    /// Floating-point number (money, percentages, ratios)
    Number(f64),
    /// Calendar date, written as an Excel serial date
    Date(NaiveDate),
}

impl CellValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// True for [`CellValue::Empty`]
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(v) => write!(f, "{}", v),
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Number(v) => write!(f, "{:.2}", v),
            CellValue::Date(v) => write!(f, "{}", v.format("%m/%d/%Y")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_conversions() {
        assert_eq!(CellValue::from("abc"), CellValue::Text("abc".to_string()));
        assert_eq!(CellValue::from(7i64).as_f64(), Some(7.0));
        assert_eq!(CellValue::from(None::<f64>), CellValue::Empty);
        assert_eq!(CellValue::from(Some(1.5)), CellValue::Number(1.5));
        assert!(CellValue::Text("x".into()).as_f64().is_none());
    }

    #[test]
    fn test_cell_value_display() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(CellValue::Date(date).to_string(), "03/05/2024");
        assert_eq!(CellValue::Number(2.0 / 3.0).to_string(), "0.67");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn test_error_dump_includes_cause_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume");
        let err = ReportError::from(io);
        let dump = error_dump(&err);
        assert_eq!(dump, "IO error\n  caused by: read-only volume");

        let invalid = ReportError::invalid("begdate", "expected MM/DD/YYYY");
        assert_eq!(
            error_dump(&invalid),
            "Invalid parameter 'begdate': expected MM/DD/YYYY"
        );
    }
}
