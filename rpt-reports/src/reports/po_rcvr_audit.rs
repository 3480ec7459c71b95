//! PO receiver audit
//!
//! Purchase order lines with receipts in a date range, comparing ordered
//! against total received quantity. The range picks the lines; received
//! totals, last receipt date and receivers cover every receipt of the line.
//! Lines where ordered and received differ are highlighted.

use crate::book::{Column, Fill, Highlight, ReportBook};
use crate::db::Source;
use crate::params::{check_date_range, ParamSet};
use crate::report::{output_file_name, Report, ReportContext};
use crate::reports::{caption_block, get_date_cell, get_f64, get_text, show_date};
use crate::sql::{for_each_row, sql_date, QueryBuilder};
use crate::types::{CellValue, Result};
use chrono::NaiveDate;

const COL_VARIANCE: u16 = 8;
const COL_VARIANCE_AMT: u16 = 9;

#[derive(Debug)]
pub struct PoRcvrAudit {
    beg_date: NaiveDate,
    end_date: NaiveDate,
    vendors: Vec<i64>,
}

impl Default for PoRcvrAudit {
    fn default() -> Self {
        Self {
            beg_date: NaiveDate::MIN,
            end_date: NaiveDate::MIN,
            vendors: Vec::new(),
        }
    }
}

impl PoRcvrAudit {
    pub fn new() -> Self {
        Self::default()
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::text("PO", 10.0),
            Column::text("Vendor", 24.0),
            Column::date("PO Date", 11.0),
            Column::integer("Line", 6.0),
            Column::text("Item", 12.0),
            Column::text("Description", 30.0),
            Column::integer("Ordered", 10.0),
            Column::integer("Received", 10.0),
            Column::integer("Variance", 10.0),
            Column::money("Variance $", 12.0),
            Column::date("Last Received", 13.0),
            Column::text("Receiver(s)", 18.0),
        ]
    }
}

impl Report for PoRcvrAudit {
    fn name(&self) -> &'static str {
        "po_rcvr_audit"
    }

    fn title(&self) -> &'static str {
        "PO Receiver Audit"
    }

    fn sources(&self) -> &'static [Source] {
        &[Source::Edb]
    }

    fn set_params(&mut self, params: &ParamSet) -> Result<()> {
        self.beg_date = params.required_date("begdate")?;
        self.end_date = params.required_date("enddate")?;
        check_date_range(self.beg_date, self.end_date)?;
        self.vendors = params.int_list("vendor")?;
        Ok(())
    }

    fn file_name(&self) -> String {
        let tag = format!("{}_{}", sql_date(self.beg_date), sql_date(self.end_date));
        output_file_name(self.name(), &tag)
    }

    fn build(&mut self, ctx: &ReportContext<'_>, book: &mut ReportBook) -> Result<()> {
        let columns = Self::columns();

        let query = QueryBuilder::new(
            "SELECT h.po_nbr, v.name, h.po_date, l.line_no, l.item_id, i.description, \
                    l.qty_ordered, SUM(r.qty_received), l.unit_cost, MAX(r.rcv_date), \
                    GROUP_CONCAT(DISTINCT r.receiver) \
             FROM po_line l \
             JOIN po_receipt r ON r.po_nbr = l.po_nbr AND r.line_no = l.line_no \
             JOIN po_header h ON h.po_nbr = l.po_nbr \
             JOIN vendor v ON v.vendor_id = h.vendor_id \
             LEFT JOIN item i ON i.item_id = l.item_id",
        )
        .filter_values(
            "EXISTS (SELECT 1 FROM po_receipt x \
                     WHERE x.po_nbr = l.po_nbr AND x.line_no = l.line_no \
                       AND x.rcv_date BETWEEN ? AND ?)",
            [sql_date(self.beg_date), sql_date(self.end_date)],
        )
        .filter_in("h.vendor_id", &self.vendors)
        .group_by("h.po_nbr, v.name, h.po_date, l.line_no, l.item_id, i.description, l.qty_ordered, l.unit_cost")
        .order_by("h.po_nbr, l.line_no")
        .build();

        let detail = format!(
            "Received {} through {}",
            show_date(self.beg_date),
            show_date(self.end_date)
        );

        let mut sheet = book.add_sheet("Receipts")?;
        caption_block(&mut sheet, self.title(), &detail, columns.len() as u16)?;
        sheet.header(&columns)?;

        for_each_row(ctx.conn(Source::Edb)?, &query, |row| {
            if ctx.stopped() {
                return Ok(false);
            }

            let ordered = get_f64(row, 6)?;
            let received = get_f64(row, 7)?;
            let unit_cost = get_f64(row, 8)?;
            let variance = received - ordered;

            sheet.row(&[
                get_text(row, 0)?.into(),
                get_text(row, 1)?.into(),
                get_date_cell(row, 2)?,
                CellValue::Int(row.get(3)?),
                get_text(row, 4)?.into(),
                get_text(row, 5)?.into(),
                CellValue::Number(ordered),
                CellValue::Number(received),
                CellValue::Number(variance),
                CellValue::Number(variance * unit_cost),
                get_date_cell(row, 9)?,
                get_text(row, 10)?.replace(',', ", ").into(),
            ])?;
            Ok(true)
        })?;

        sheet.highlight(COL_VARIANCE, Highlight::NotEqual(0.0), Fill::Alert);
        sheet.highlight(COL_VARIANCE_AMT, Highlight::NotEqual(0.0), Fill::Alert);
        sheet.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReportError;

    #[test]
    fn test_params() {
        let mut report = PoRcvrAudit::new();
        report
            .set_params(
                &ParamSet::new()
                    .with("begdate", "01/01/2024")
                    .with("enddate", "01/31/2024"),
            )
            .unwrap();
        assert!(report.vendors.is_empty());
        assert_eq!(report.file_name(), "po_rcvr_audit_2024-01-01_2024-01-31.xlsx");
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let mut report = PoRcvrAudit::new();
        let err = report
            .set_params(
                &ParamSet::new()
                    .with("begdate", "02/01/2024")
                    .with("enddate", "01/31/2024"),
            )
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidParam { ref name, .. } if name == "begdate"));
    }
}
