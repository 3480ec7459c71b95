//! Promotion margin review
//!
//! Every promotion overlapping the date range with its items, regular and
//! promo price, the markdown that represents and the margin left at the promo
//! price. Promotion columns are merged over their item rows.

use crate::book::{Column, Fill, Highlight, ReportBook, SheetWriter};
use crate::calc::{margin_pct, markdown_pct};
use crate::db::Source;
use crate::params::{check_date_range, ParamSet};
use crate::report::{output_file_name, Report, ReportContext};
use crate::reports::{caption_block, get_date_cell, get_f64, get_text, show_date};
use crate::sql::{for_each_row, sql_date, QueryBuilder};
use crate::types::{CellValue, Result};
use chrono::NaiveDate;

/// Columns merged over a promotion's rows: id, description, start, end
const PROMO_COLUMNS: u16 = 4;

const COL_MARKDOWN: u16 = 9;
const COL_MARGIN: u16 = 10;
const DEEP_MARKDOWN: f64 = 0.5;

#[derive(Debug)]
pub struct PromoMargin {
    beg_date: NaiveDate,
    end_date: NaiveDate,
}

impl Default for PromoMargin {
    fn default() -> Self {
        Self {
            beg_date: NaiveDate::MIN,
            end_date: NaiveDate::MIN,
        }
    }
}

/// Promotion currently being written and the sheet row it started on
struct PromoBlock {
    promo_id: String,
    first_row: u32,
    cells: [CellValue; PROMO_COLUMNS as usize],
}

impl PromoBlock {
    fn close(self, sheet: &mut SheetWriter<'_>) -> Result<()> {
        let last_row = sheet.current_row().saturating_sub(1);
        for (col, value) in self.cells.iter().enumerate() {
            sheet.merge(self.first_row, col as u16, last_row, value)?;
        }
        Ok(())
    }
}

impl PromoMargin {
    pub fn new() -> Self {
        Self::default()
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::text("Promo", 10.0),
            Column::text("Promotion", 26.0),
            Column::date("Start", 11.0),
            Column::date("End", 11.0),
            Column::text("Item", 12.0),
            Column::text("Description", 30.0),
            Column::money("Cost", 11.0),
            Column::money("Regular", 11.0),
            Column::money("Promo Price", 12.0),
            Column::percent("Markdown %", 11.0),
            Column::percent("Promo Margin %", 14.0),
        ]
    }
}

impl Report for PromoMargin {
    fn name(&self) -> &'static str {
        "promo_margin"
    }

    fn title(&self) -> &'static str {
        "Promotion Margin Review"
    }

    fn sources(&self) -> &'static [Source] {
        &[Source::Edb]
    }

    fn set_params(&mut self, params: &ParamSet) -> Result<()> {
        self.beg_date = params.required_date("begdate")?;
        self.end_date = params.required_date("enddate")?;
        check_date_range(self.beg_date, self.end_date)
    }

    fn file_name(&self) -> String {
        let tag = format!("{}_{}", sql_date(self.beg_date), sql_date(self.end_date));
        output_file_name(self.name(), &tag)
    }

    fn build(&mut self, ctx: &ReportContext<'_>, book: &mut ReportBook) -> Result<()> {
        let columns = Self::columns();

        // overlap: starts on or before the end and ends on or after the start
        let query = QueryBuilder::new(
            "SELECT p.promo_id, p.description, p.beg_date, p.end_date, \
                    i.item_id, i.description, i.cost, i.base_price, pi.promo_price \
             FROM promotion p \
             JOIN promo_item pi ON pi.promo_id = p.promo_id \
             JOIN item i ON i.item_id = pi.item_id \
             WHERE p.beg_date <= ? AND p.end_date >= ?",
        )
        .bind_date(self.end_date)
        .bind_date(self.beg_date)
        .order_by("p.beg_date, p.promo_id, i.item_id")
        .build();

        let detail = format!(
            "Promotions active {} through {}",
            show_date(self.beg_date),
            show_date(self.end_date)
        );

        let mut sheet = book.add_sheet("Promotions")?;
        caption_block(&mut sheet, self.title(), &detail, columns.len() as u16)?;
        sheet.header(&columns)?;

        let mut block: Option<PromoBlock> = None;
        for_each_row(ctx.conn(Source::Edb)?, &query, |row| {
            if ctx.stopped() {
                return Ok(false);
            }

            let promo_id = get_text(row, 0)?;
            let promo_cells = [
                CellValue::from(promo_id.as_str()),
                get_text(row, 1)?.into(),
                get_date_cell(row, 2)?,
                get_date_cell(row, 3)?,
            ];

            if block.as_ref().map_or(true, |b| b.promo_id != promo_id) {
                if let Some(done) = block.take() {
                    done.close(&mut sheet)?;
                }
                block = Some(PromoBlock {
                    promo_id,
                    first_row: sheet.current_row(),
                    cells: promo_cells.clone(),
                });
            }

            let cost = get_f64(row, 6)?;
            let regular = get_f64(row, 7)?;
            let promo_price = get_f64(row, 8)?;

            let [id, desc, start, end] = promo_cells;
            sheet.row(&[
                id,
                desc,
                start,
                end,
                get_text(row, 4)?.into(),
                get_text(row, 5)?.into(),
                CellValue::Number(cost),
                CellValue::Number(regular),
                CellValue::Number(promo_price),
                markdown_pct(regular, promo_price).into(),
                margin_pct(promo_price, cost).into(),
            ])?;
            Ok(true)
        })?;
        if let Some(done) = block.take() {
            done.close(&mut sheet)?;
        }

        sheet.highlight(COL_MARGIN, Highlight::LessThan(0.0), Fill::Alert);
        sheet.highlight(COL_MARKDOWN, Highlight::GreaterThan(DEEP_MARKDOWN), Fill::Warn);
        sheet.finish()?;
        Ok(())
    }
}
