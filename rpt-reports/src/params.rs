//! Report parameters
//!
//! Callers hand every report a loosely typed list of name/value pairs. Dates
//! arrive as `MM/DD/YYYY` strings, filters as free text, and ID filters as
//! comma-separated lists. [`ParamSet`] turns those into typed values and
//! reports a [`ReportError::InvalidParam`] naming the offending parameter when
//! a value cannot be read.

use crate::types::{ReportError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Date layout used by callers for every date parameter
pub const PARAM_DATE_FORMAT: &str = "%m/%d/%Y";

/// A single name/value parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

impl Param {
    /// Create a new parameter
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl FromStr for Param {
    type Err = ReportError;

    /// Parse `name=value`. The value may itself contain `=`.
    fn from_str(s: &str) -> Result<Self> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| ReportError::invalid(s, "expected name=value"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ReportError::invalid(s, "parameter name is empty"));
        }
        Ok(Param::new(name, value.trim()))
    }
}

/// Ordered parameter list with case-insensitive lookup
///
/// Blank values are treated the same as absent parameters, which is how
/// optional filters are left unset by callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSet {
    params: Vec<Param>,
}

impl ParamSet {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: append a parameter
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Param::new(name, value));
        self
    }

    /// Append a parameter. A later parameter with the same name wins.
    pub fn push(&mut self, param: Param) {
        self.params.push(param);
    }

    /// All parameters in the order they were supplied
    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Trimmed text value, `None` when missing or blank
    pub fn text(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value.trim())
            .filter(|v| !v.is_empty())
    }

    /// Text value that must be present
    pub fn required_text(&self, name: &str) -> Result<&str> {
        self.text(name)
            .ok_or_else(|| ReportError::MissingParam(name.to_string()))
    }

    /// Date in `MM/DD/YYYY` form
    pub fn date(&self, name: &str) -> Result<Option<NaiveDate>> {
        match self.text(name) {
            Some(raw) => parse_param_date(raw)
                .map(Some)
                .ok_or_else(|| {
                    ReportError::invalid(name, format!("'{}' is not a MM/DD/YYYY date", raw))
                }),
            None => Ok(None),
        }
    }

    /// Date that must be present
    pub fn required_date(&self, name: &str) -> Result<NaiveDate> {
        self.date(name)?
            .ok_or_else(|| ReportError::MissingParam(name.to_string()))
    }

    /// Comma-separated ID list; blanks and repeats are dropped, order is kept
    pub fn id_list(&self, name: &str) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        if let Some(raw) = self.text(name) {
            for id in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                if !ids.iter().any(|existing| existing == id) {
                    ids.push(id.to_string());
                }
            }
        }
        ids
    }

    /// Comma-separated list of whole numbers
    pub fn int_list(&self, name: &str) -> Result<Vec<i64>> {
        self.id_list(name)
            .iter()
            .map(|id| {
                id.parse::<i64>().map_err(|_| {
                    ReportError::invalid(name, format!("'{}' is not a whole number", id))
                })
            })
            .collect()
    }

    /// Decimal number
    pub fn number(&self, name: &str) -> Result<Option<f64>> {
        match self.text(name) {
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| ReportError::invalid(name, format!("'{}' is not a number", raw))),
            None => Ok(None),
        }
    }

    /// Non-negative whole number
    pub fn uint(&self, name: &str) -> Result<Option<u32>> {
        match self.text(name) {
            Some(raw) => raw.parse::<u32>().map(Some).map_err(|_| {
                ReportError::invalid(name, format!("'{}' is not a non-negative whole number", raw))
            }),
            None => Ok(None),
        }
    }
}

impl FromIterator<Param> for ParamSet {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, param) in self.params.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", param.name, param.value)?;
        }
        Ok(())
    }
}

impl From<Vec<Param>> for ParamSet {
    fn from(params: Vec<Param>) -> Self {
        Self { params }
    }
}

/// Parse a caller date. Single-digit months and days are accepted.
pub fn parse_param_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), PARAM_DATE_FORMAT).ok()
}

/// Check that a begin/end pair is ordered
pub fn check_date_range(beg: NaiveDate, end: NaiveDate) -> Result<()> {
    if beg > end {
        return Err(ReportError::invalid(
            "begdate",
            format!(
                "begin date {} is after end date {}",
                beg.format(PARAM_DATE_FORMAT),
                end.format(PARAM_DATE_FORMAT)
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_param_from_str() {
        let p: Param = "begdate=01/02/2024".parse().unwrap();
        assert_eq!(p, Param::new("begdate", "01/02/2024"));

        let p: Param = "filter=a=b".parse().unwrap();
        assert_eq!(p.value, "a=b");

        assert!("novalue".parse::<Param>().is_err());
        assert!("=x".parse::<Param>().is_err());
    }

    #[test]
    fn test_lookup_is_case_insensitive_and_last_wins() {
        let params = ParamSet::new()
            .with("Vendor", "10")
            .with("vendor", "20")
            .with("dept", "   ");

        assert_eq!(params.text("VENDOR"), Some("20"));
        assert_eq!(params.text("dept"), None); // blank counts as absent
        assert!(matches!(
            params.required_text("dept"),
            Err(ReportError::MissingParam(_))
        ));
    }

    #[test]
    fn test_dates() {
        let params = ParamSet::new()
            .with("begdate", "1/5/2024")
            .with("enddate", "12/31/2024")
            .with("bad", "2024-01-05");

        assert_eq!(params.date("begdate").unwrap(), Some(ymd(2024, 1, 5)));
        assert_eq!(params.required_date("enddate").unwrap(), ymd(2024, 12, 31));
        assert_eq!(params.date("missing").unwrap(), None);
        assert!(matches!(
            params.date("bad"),
            Err(ReportError::InvalidParam { .. })
        ));
        assert!(matches!(
            params.required_date("missing"),
            Err(ReportError::MissingParam(_))
        ));
    }

    #[test]
    fn test_id_lists() {
        let params = ParamSet::new()
            .with("cust", " C1, C2,,C1 ,C3 ")
            .with("vendor", "10,x");

        assert_eq!(params.id_list("cust"), vec!["C1", "C2", "C3"]);
        assert!(params.id_list("missing").is_empty());
        assert!(params.int_list("vendor").is_err());
        assert_eq!(
            ParamSet::new().with("v", "3, 4").int_list("v").unwrap(),
            vec![3, 4]
        );
    }

    #[test]
    fn test_numbers() {
        let params = ParamSet::new()
            .with("min_margin", "0.3")
            .with("weeks", "13")
            .with("neg", "-1");

        assert_eq!(params.number("min_margin").unwrap(), Some(0.3));
        assert_eq!(params.uint("weeks").unwrap(), Some(13));
        assert!(params.uint("neg").is_err());
        assert!(ParamSet::new().with("x", "NaN").number("x").is_err());
    }

    #[test]
    fn test_check_date_range() {
        assert!(check_date_range(ymd(2024, 1, 1), ymd(2024, 1, 1)).is_ok());
        assert!(check_date_range(ymd(2024, 2, 1), ymd(2024, 1, 1)).is_err());
    }
}
