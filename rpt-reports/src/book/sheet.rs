//! Row-at-a-time worksheet writer
//!
//! A sheet is laid out top to bottom: optional caption lines, one header row,
//! data rows, and an optional total row. Conditional highlights and dropdowns
//! are registered up front and applied to the final data range by
//! [`SheetWriter::finish`].

use crate::book::styles::{ColumnStyle, Fill, Styles};
use crate::types::{CellValue, Result};
use chrono::NaiveDate;
use rust_xlsxwriter::{
    ConditionalFormatCell, ConditionalFormatCellRule, DataValidation, Format, FormatAlign,
    Worksheet,
};

/// Text written when a query returned nothing
pub const NO_DATA_TEXT: &str = "No data found for the selected parameters";

/// A column definition: header text, width, and value style
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub title: String,
    pub width: f64,
    pub style: ColumnStyle,
}

impl Column {
    pub fn new(title: impl Into<String>, width: f64, style: ColumnStyle) -> Self {
        Self {
            title: title.into(),
            width,
            style,
        }
    }

    pub fn text(title: impl Into<String>, width: f64) -> Self {
        Self::new(title, width, ColumnStyle::Text)
    }

    pub fn integer(title: impl Into<String>, width: f64) -> Self {
        Self::new(title, width, ColumnStyle::Integer)
    }

    pub fn number(title: impl Into<String>, width: f64) -> Self {
        Self::new(title, width, ColumnStyle::Number)
    }

    pub fn money(title: impl Into<String>, width: f64) -> Self {
        Self::new(title, width, ColumnStyle::Money)
    }

    pub fn percent(title: impl Into<String>, width: f64) -> Self {
        Self::new(title, width, ColumnStyle::Percent)
    }

    pub fn date(title: impl Into<String>, width: f64) -> Self {
        Self::new(title, width, ColumnStyle::Date)
    }
}

/// Cell rule for conditional highlighting
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Highlight {
    LessThan(f64),
    GreaterThan(f64),
    NotEqual(f64),
    /// Inclusive range
    Between(f64, f64),
}

impl Highlight {
    fn rule(&self) -> ConditionalFormatCellRule<f64> {
        match *self {
            Highlight::LessThan(v) => ConditionalFormatCellRule::LessThan(v),
            Highlight::GreaterThan(v) => ConditionalFormatCellRule::GreaterThan(v),
            Highlight::NotEqual(v) => ConditionalFormatCellRule::NotEqualTo(v),
            Highlight::Between(lo, hi) => ConditionalFormatCellRule::Between(lo, hi),
        }
    }
}

/// Writes one worksheet
pub struct SheetWriter<'a> {
    sheet: &'a mut Worksheet,
    styles: &'a Styles,
    rows_written: &'a mut usize,
    columns: Vec<Column>,
    next_row: u32,
    header_row: Option<u32>,
    last_data_row: Option<u32>,
    highlights: Vec<(u16, Highlight, Fill)>,
    dropdowns: Vec<(u16, Vec<String>)>,
}

impl<'a> SheetWriter<'a> {
    pub(crate) fn new(
        sheet: &'a mut Worksheet,
        styles: &'a Styles,
        rows_written: &'a mut usize,
    ) -> Self {
        Self {
            sheet,
            styles,
            rows_written,
            columns: Vec::new(),
            next_row: 0,
            header_row: None,
            last_data_row: None,
            highlights: Vec::new(),
            dropdowns: Vec::new(),
        }
    }

    /// Row index the next write goes to
    pub fn current_row(&self) -> u32 {
        self.next_row
    }

    /// Number of data rows written so far
    pub fn data_rows(&self) -> usize {
        match (self.header_row, self.last_data_row) {
            (Some(header), Some(last)) => (last - header) as usize,
            _ => 0,
        }
    }

    /// Bold title merged across `span` columns
    pub fn caption(&mut self, text: &str, span: u16) -> Result<()> {
        let format = self.styles.caption.clone();
        self.merged_line(text, span, &format)?;
        self.sheet.set_row_height(self.next_row - 1, 20)?;
        Ok(())
    }

    /// Secondary caption line (parameters, run date)
    pub fn sub_caption(&mut self, text: &str, span: u16) -> Result<()> {
        let format = self.styles.sub_caption.clone();
        self.merged_line(text, span, &format)
    }

    fn merged_line(&mut self, text: &str, span: u16, format: &Format) -> Result<()> {
        let row = self.next_row;
        if span > 1 {
            self.sheet.merge_range(row, 0, row, span - 1, text, format)?;
        } else {
            self.sheet.write_string_with_format(row, 0, text, format)?;
        }
        self.next_row += 1;
        Ok(())
    }

    /// Leave an empty row
    pub fn skip_row(&mut self) {
        self.next_row += 1;
    }

    /// Header row; also sets column widths and freezes everything above the data
    pub fn header(&mut self, columns: &[Column]) -> Result<()> {
        let row = self.next_row;
        for (col, column) in columns.iter().enumerate() {
            let col = col as u16;
            self.sheet
                .write_string_with_format(row, col, &column.title, &self.styles.header)?;
            self.sheet.set_column_width(col, column.width)?;
        }
        self.sheet.set_freeze_panes(row + 1, 0)?;

        self.columns = columns.to_vec();
        self.header_row = Some(row);
        self.next_row += 1;
        Ok(())
    }

    /// Data row, one value per header column
    pub fn row(&mut self, values: &[CellValue]) -> Result<()> {
        let row = self.next_row;
        for (col, value) in values.iter().enumerate() {
            let style = self.style_of(col);
            let format = self.styles.body(style);
            write_cell(self.sheet, row, col as u16, value, format)?;
        }
        self.last_data_row = Some(row);
        self.next_row += 1;
        *self.rows_written += 1;
        Ok(())
    }

    /// Total row: label in the first column, then `values` from column 1 on
    pub fn total_row(&mut self, label: &str, values: &[CellValue]) -> Result<()> {
        let row = self.next_row;
        let label_format = self.styles.total(ColumnStyle::Text);
        self.sheet.write_string_with_format(row, 0, label, label_format)?;
        for (idx, value) in values.iter().enumerate() {
            let col = idx + 1;
            let format = self.styles.total(self.style_of(col));
            write_cell(self.sheet, row, col as u16, value, format)?;
        }
        self.next_row += 1;
        Ok(())
    }

    /// Merge one column over a block of data rows, showing `value` once
    pub fn merge(
        &mut self,
        first_row: u32,
        col: u16,
        last_row: u32,
        value: &CellValue,
    ) -> Result<()> {
        if last_row <= first_row {
            return Ok(());
        }
        let format = self
            .styles
            .body(self.style_of(col as usize))
            .clone()
            .set_align(FormatAlign::VerticalCenter);
        self.sheet.merge_range(first_row, col, last_row, col, "", &format)?;
        write_cell(self.sheet, first_row, col, value, &format)?;
        Ok(())
    }

    /// Highlight data cells of `col` matching `rule`
    pub fn highlight(&mut self, col: u16, rule: Highlight, fill: Fill) {
        self.highlights.push((col, rule, fill));
    }

    /// Restrict data cells of `col` to a list of choices
    pub fn dropdown(&mut self, col: u16, choices: &[&str]) {
        self.dropdowns
            .push((col, choices.iter().map(|c| c.to_string()).collect()));
    }

    /// Apply autofilter, highlights and dropdowns to the written data range
    ///
    /// Returns the number of data rows on the sheet.
    pub fn finish(self) -> Result<usize> {
        let (Some(header), Some(last)) = (self.header_row, self.last_data_row) else {
            self.sheet
                .write_string_with_format(self.next_row, 0, NO_DATA_TEXT, &self.styles.notice)?;
            return Ok(0);
        };

        let first = header + 1;
        if !self.columns.is_empty() {
            self.sheet
                .autofilter(header, 0, last, (self.columns.len() - 1) as u16)?;
        }

        for (col, rule, fill) in &self.highlights {
            let conditional = ConditionalFormatCell::new()
                .set_rule(rule.rule())
                .set_format(self.styles.fill(*fill));
            self.sheet
                .add_conditional_format(first, *col, last, *col, &conditional)?;
        }

        for (col, choices) in &self.dropdowns {
            let validation = DataValidation::new().allow_list_strings(choices.as_slice())?;
            self.sheet
                .add_data_validation(first, *col, last, *col, &validation)?;
        }

        Ok((last - header) as usize)
    }

    fn style_of(&self, col: usize) -> ColumnStyle {
        self.columns
            .get(col)
            .map(|c| c.style)
            .unwrap_or(ColumnStyle::Text)
    }
}

/// Excel serial day number (1900 date system)
pub fn excel_serial(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN);
    (date - epoch).num_days() as f64
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: &Format,
) -> Result<()> {
    match value {
        CellValue::Empty => {
            sheet.write_blank(row, col, format)?;
        }
        CellValue::Text(text) => {
            sheet.write_string_with_format(row, col, text, format)?;
        }
        CellValue::Int(v) => {
            sheet.write_number_with_format(row, col, *v as f64, format)?;
        }
        CellValue::Number(v) if v.is_finite() => {
            sheet.write_number_with_format(row, col, *v, format)?;
        }
        CellValue::Number(_) => {
            sheet.write_blank(row, col, format)?;
        }
        CellValue::Date(date) => {
            sheet.write_number_with_format(row, col, excel_serial(*date), format)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excel_serial() {
        assert_eq!(excel_serial(NaiveDate::from_ymd_opt(1900, 3, 1).unwrap()), 61.0);
        assert_eq!(excel_serial(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), 45292.0);
    }
}
