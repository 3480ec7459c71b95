//! Never-out stock coverage
//!
//! Items flagged "never out" must always be in stock. For each such item and
//! warehouse this report shows on hand and on order quantities against the
//! average weekly demand over the trailing window, and how many weeks that
//! stock covers.

use crate::book::{Column, Fill, Highlight, ReportBook};
use crate::calc::coverage_weeks;
use crate::db::Source;
use crate::params::ParamSet;
use crate::report::{output_file_name, Report, ReportContext};
use crate::reports::{caption_block, get_f64, get_text, show_date};
use crate::sql::{for_each_row, sql_date, QueryBuilder};
use crate::types::{CellValue, ReportError, Result};
use chrono::{Days, NaiveDate};

const DEFAULT_WEEKS: u32 = 13;
const DEFAULT_MIN_WEEKS: f64 = 4.0;
const MAX_WEEKS: u32 = 104;

const COL_ON_HAND: u16 = 4;
const COL_COVERAGE: u16 = 7;

/// Coverage column text when there was no demand in the window
const NO_DEMAND: &str = "N/A";

#[derive(Debug)]
pub struct NeverOut {
    end_date: NaiveDate,
    weeks: u32,
    warehouse: Option<String>,
    min_weeks: f64,
}

impl Default for NeverOut {
    fn default() -> Self {
        Self {
            end_date: NaiveDate::MIN,
            weeks: DEFAULT_WEEKS,
            warehouse: None,
            min_weeks: DEFAULT_MIN_WEEKS,
        }
    }
}

impl NeverOut {
    pub fn new() -> Self {
        Self::default()
    }

    /// First day of the demand window
    fn begin_date(&self) -> NaiveDate {
        let days = u64::from(self.weeks) * 7 - 1;
        self.end_date
            .checked_sub_days(Days::new(days))
            .unwrap_or(NaiveDate::MIN)
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::text("Whse", 8.0),
            Column::text("Item", 12.0),
            Column::text("Description", 32.0),
            Column::text("Dept", 8.0),
            Column::integer("On Hand", 10.0),
            Column::integer("On Order", 10.0),
            Column::number("Avg Weekly", 11.0),
            Column::number("Weeks Cover", 12.0),
        ]
    }
}

impl Report for NeverOut {
    fn name(&self) -> &'static str {
        "never_out"
    }

    fn title(&self) -> &'static str {
        "Never Out Coverage"
    }

    fn sources(&self) -> &'static [Source] {
        &[Source::Edb]
    }

    fn set_params(&mut self, params: &ParamSet) -> Result<()> {
        self.end_date = params.required_date("enddate")?;
        self.weeks = params.uint("weeks")?.unwrap_or(DEFAULT_WEEKS);
        if self.weeks == 0 || self.weeks > MAX_WEEKS {
            return Err(ReportError::invalid(
                "weeks",
                format!("expected 1 to {} weeks", MAX_WEEKS),
            ));
        }
        self.warehouse = params.text("warehouse").map(str::to_string);
        self.min_weeks = params.number("min_weeks")?.unwrap_or(DEFAULT_MIN_WEEKS);
        Ok(())
    }

    fn file_name(&self) -> String {
        let mut tag = sql_date(self.end_date);
        if let Some(wh) = &self.warehouse {
            tag.push('_');
            tag.push_str(wh);
        }
        output_file_name(self.name(), &tag)
    }

    fn build(&mut self, ctx: &ReportContext<'_>, book: &mut ReportBook) -> Result<()> {
        let columns = Self::columns();
        let beg = self.begin_date();

        let query = QueryBuilder::new(
            "SELECT inv.wh_id, i.item_id, i.description, i.dept, \
                    inv.qty_on_hand, inv.qty_on_order, \
                    (SELECT SUM(s.qty) FROM sale s \
                      WHERE s.item_id = inv.item_id AND s.wh_id = inv.wh_id \
                        AND s.inv_date BETWEEN ? AND ?) AS units \
             FROM inventory inv JOIN item i ON i.item_id = inv.item_id \
             WHERE i.never_out = 1",
        )
        .bind_date(beg)
        .bind_date(self.end_date)
        .filter_opt("inv.wh_id = ?", self.warehouse.clone())
        .order_by("inv.wh_id, i.item_id")
        .build();

        let detail = format!(
            "{} weeks ending {}{}; under {} weeks highlighted",
            self.weeks,
            show_date(self.end_date),
            self.warehouse
                .as_deref()
                .map(|wh| format!(", warehouse {}", wh))
                .unwrap_or_default(),
            self.min_weeks
        );

        let mut sheet = book.add_sheet("Never Out")?;
        caption_block(&mut sheet, self.title(), &detail, columns.len() as u16)?;
        sheet.header(&columns)?;

        let weeks = f64::from(self.weeks);
        for_each_row(ctx.conn(Source::Edb)?, &query, |row| {
            if ctx.stopped() {
                return Ok(false);
            }

            let on_hand = get_f64(row, 4)?;
            let on_order = get_f64(row, 5)?;
            let avg_weekly = get_f64(row, 6)? / weeks;
            let coverage = match coverage_weeks(on_hand, on_order, avg_weekly) {
                Some(w) => CellValue::Number(w),
                None => CellValue::from(NO_DEMAND),
            };

            sheet.row(&[
                get_text(row, 0)?.into(),
                get_text(row, 1)?.into(),
                get_text(row, 2)?.into(),
                get_text(row, 3)?.into(),
                CellValue::Number(on_hand),
                CellValue::Number(on_order),
                CellValue::Number(avg_weekly),
                coverage,
            ])?;
            Ok(true)
        })?;

        sheet.highlight(COL_COVERAGE, Highlight::LessThan(self.min_weeks), Fill::Alert);
        sheet.highlight(COL_ON_HAND, Highlight::LessThan(1.0), Fill::Warn);
        sheet.finish()?;
        Ok(())
    }
}
