//! Workbook assembly
//!
//! [`ReportBook`] owns the workbook being built for one report run together
//! with its shared formats. Reports add sheets through
//! [`ReportBook::add_sheet`] and write rows with the returned
//! [`SheetWriter`]. Nothing touches the disk until [`ReportBook::save`], so a
//! run that fails halfway leaves no file behind.

pub mod sheet;
pub mod styles;

pub use sheet::{excel_serial, Column, Highlight, SheetWriter, NO_DATA_TEXT};
pub use styles::{ColumnStyle, Fill, Styles};

use crate::types::Result;
use rust_xlsxwriter::Workbook;
use std::path::Path;

/// Excel sheet name maximum length
pub const SHEET_NAME_MAX_LEN: usize = 31;
/// Characters not allowed in sheet names
pub const SHEET_NAME_ILLEGAL: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];

/// Workbook under construction for one report run
pub struct ReportBook {
    workbook: Workbook,
    styles: Styles,
    sheet_names: Vec<String>,
    rows_written: usize,
}

impl ReportBook {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            styles: Styles::new(),
            sheet_names: Vec::new(),
            rows_written: 0,
        }
    }

    /// Add a worksheet. The name is cleaned up to satisfy Excel and made
    /// unique within the workbook.
    pub fn add_sheet(&mut self, name: &str) -> Result<SheetWriter<'_>> {
        let name = unique_sheet_name(&sanitize_sheet_name(name), &self.sheet_names);
        log::debug!("Adding sheet: {}", name);

        let sheet = self.workbook.add_worksheet();
        sheet.set_name(&name)?;
        self.sheet_names.push(name);

        Ok(SheetWriter::new(sheet, &self.styles, &mut self.rows_written))
    }

    /// Names of the sheets added so far, in order
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    /// Data rows written across all sheets
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Write the workbook to `path`
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if self.sheet_names.is_empty() {
            // An xlsx file needs at least one sheet
            self.add_sheet("Report")?.finish()?;
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.workbook.save(path)?;
        log::info!("Workbook saved: {:?} ({} rows)", path, self.rows_written);
        Ok(())
    }
}

impl Default for ReportBook {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace illegal characters and trim to a valid Excel sheet name
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if SHEET_NAME_ILLEGAL.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'');
    if cleaned.is_empty() {
        return "Sheet".to_string();
    }
    cleaned.chars().take(SHEET_NAME_MAX_LEN).collect()
}

/// Suffix `_2`, `_3`, ... until the name is unused (case-insensitive, as Excel)
fn unique_sheet_name(base: &str, taken: &[String]) -> String {
    let is_taken = |candidate: &str| taken.iter().any(|t| t.eq_ignore_ascii_case(candidate));
    if !is_taken(base) {
        return base.to_string();
    }

    let mut idx = 2;
    loop {
        let suffix = format!("_{}", idx);
        let keep = SHEET_NAME_MAX_LEN.saturating_sub(suffix.len()).max(1);
        let candidate: String = base.chars().take(keep).chain(suffix.chars()).collect();
        if !is_taken(&candidate) {
            return candidate;
        }
        idx += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("A/B:C"), "A_B_C");
        assert_eq!(sanitize_sheet_name("   "), "Sheet");
        assert_eq!(sanitize_sheet_name("'quoted'"), "quoted");
        let long = "x".repeat(40);
        assert_eq!(sanitize_sheet_name(&long).len(), SHEET_NAME_MAX_LEN);
    }

    #[test]
    fn test_unique_sheet_name() {
        let taken = vec!["Sales".to_string(), "sales_2".to_string()];
        assert_eq!(unique_sheet_name("Other", &taken), "Other");
        assert_eq!(unique_sheet_name("SALES", &taken), "SALES_3");

        let long = "y".repeat(31);
        let taken = vec![long.clone()];
        let unique = unique_sheet_name(&long, &taken);
        assert_eq!(unique.chars().count(), SHEET_NAME_MAX_LEN);
        assert!(unique.ends_with("_2"));
    }

    #[test]
    fn test_book_tracks_sheets_and_rows() {
        let mut book = ReportBook::new();
        {
            let mut sheet = book.add_sheet("Data").unwrap();
            sheet.header(&[Column::text("Name", 10.0)]).unwrap();
            sheet.row(&["a".into()]).unwrap();
            sheet.row(&["b".into()]).unwrap();
            assert_eq!(sheet.finish().unwrap(), 2);
        }
        book.add_sheet("Data").unwrap().finish().unwrap();

        assert_eq!(book.sheet_names(), &["Data".to_string(), "Data_2".to_string()]);
        assert_eq!(book.rows_written(), 2);
    }
}
