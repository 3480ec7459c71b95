//! ACE article review
//!
//! Lists items with their landed cost (cost plus the vendor's freight adder for
//! the item weight) and the margin that leaves against the base price. Rows
//! under the margin threshold are highlighted and every row gets an "Action"
//! dropdown for the buyer to fill in.

use crate::book::{Column, Fill, Highlight, ReportBook};
use crate::calc::{freight_adder, margin_pct, AdderBracket};
use crate::db::Source;
use crate::params::ParamSet;
use crate::report::{output_file_name, Report, ReportContext};
use crate::reports::{caption_block, get_f64, get_text};
use crate::sql::{for_each_row, query_rows, QueryBuilder};
use crate::types::{CellValue, ReportError, Result};
use std::collections::HashMap;

const DEFAULT_MIN_MARGIN: f64 = 0.25;
const ACTIONS: [&str; 3] = ["Keep", "Reprice", "Discontinue"];

const COL_MARGIN: u16 = 9;
const COL_ACTION: u16 = 10;

#[derive(Debug, Default)]
pub struct AceArticleReview {
    vendors: Vec<i64>,
    dept: Option<String>,
    min_margin: f64,
}

impl AceArticleReview {
    pub fn new() -> Self {
        Self {
            min_margin: DEFAULT_MIN_MARGIN,
            ..Self::default()
        }
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::text("Item", 12.0),
            Column::text("Description", 32.0),
            Column::text("Vendor", 24.0),
            Column::text("Dept", 8.0),
            Column::number("Weight", 10.0),
            Column::money("Cost", 11.0),
            Column::money("Freight Adder", 12.0),
            Column::money("Landed Cost", 12.0),
            Column::money("Base Price", 12.0),
            Column::percent("Margin %", 10.0),
            Column::text("Action", 14.0),
        ]
    }

    /// Freight brackets per vendor, ordered by lower bound
    fn load_brackets(&self, ctx: &ReportContext<'_>) -> Result<HashMap<i64, Vec<AdderBracket>>> {
        let query = QueryBuilder::new(
            "SELECT vendor_id, min_weight, max_weight, adder FROM freight_adder",
        )
        .filter_in("vendor_id", &self.vendors)
        .order_by("vendor_id, min_weight")
        .build();

        let rows = query_rows(ctx.conn(Source::Edb)?, &query, |row| {
            Ok((
                row.get::<_, i64>(0)?,
                AdderBracket {
                    min_weight: get_f64(row, 1)?,
                    max_weight: row.get::<_, Option<f64>>(2)?,
                    adder: get_f64(row, 3)?,
                },
            ))
        })?;

        let mut brackets: HashMap<i64, Vec<AdderBracket>> = HashMap::new();
        for (vendor_id, bracket) in rows {
            brackets.entry(vendor_id).or_default().push(bracket);
        }
        log::debug!("Loaded freight adders for {} vendors", brackets.len());
        Ok(brackets)
    }

    fn detail(&self) -> String {
        let vendors = if self.vendors.is_empty() {
            "all vendors".to_string()
        } else {
            format!(
                "vendors {}",
                self.vendors
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        };
        let dept = self
            .dept
            .as_deref()
            .map(|d| format!(", dept {}", d))
            .unwrap_or_default();
        format!(
            "{}{}; margin below {:.0}% highlighted",
            vendors,
            dept,
            self.min_margin * 100.0
        )
    }
}

impl Report for AceArticleReview {
    fn name(&self) -> &'static str {
        "ace_article_review"
    }

    fn title(&self) -> &'static str {
        "ACE Article Review"
    }

    fn sources(&self) -> &'static [Source] {
        &[Source::Edb]
    }

    fn set_params(&mut self, params: &ParamSet) -> Result<()> {
        self.vendors = params.int_list("vendor")?;
        self.dept = params.text("dept").map(str::to_string);
        self.min_margin = params.number("min_margin")?.unwrap_or(DEFAULT_MIN_MARGIN);
        if !(0.0..1.0).contains(&self.min_margin) {
            return Err(ReportError::invalid(
                "min_margin",
                "expected a fraction between 0 and 1",
            ));
        }
        Ok(())
    }

    fn file_name(&self) -> String {
        let tag = if self.vendors.is_empty() {
            "all".to_string()
        } else {
            self.vendors
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("-")
        };
        output_file_name(self.name(), &tag)
    }

    fn build(&mut self, ctx: &ReportContext<'_>, book: &mut ReportBook) -> Result<()> {
        let brackets = self.load_brackets(ctx)?;
        let columns = Self::columns();

        let query = QueryBuilder::new(
            "SELECT i.item_id, i.description, v.vendor_id, v.name, i.dept, \
                    i.weight, i.cost, i.base_price \
             FROM item i JOIN vendor v ON v.vendor_id = i.vendor_id",
        )
        .filter_in("i.vendor_id", &self.vendors)
        .filter_opt("i.dept = ?", self.dept.clone())
        .order_by("v.name, i.item_id")
        .build();

        let mut sheet = book.add_sheet("Article Review")?;
        caption_block(&mut sheet, self.title(), &self.detail(), columns.len() as u16)?;
        sheet.header(&columns)?;

        for_each_row(ctx.conn(Source::Edb)?, &query, |row| {
            if ctx.stopped() {
                return Ok(false);
            }

            let vendor_id: i64 = row.get(2)?;
            let weight = get_f64(row, 5)?;
            let cost = get_f64(row, 6)?;
            let base_price = get_f64(row, 7)?;

            let adder = brackets
                .get(&vendor_id)
                .map_or(0.0, |table| freight_adder(table, weight));
            let landed = cost + adder;

            sheet.row(&[
                get_text(row, 0)?.into(),
                get_text(row, 1)?.into(),
                get_text(row, 3)?.into(),
                get_text(row, 4)?.into(),
                weight.into(),
                cost.into(),
                adder.into(),
                landed.into(),
                base_price.into(),
                margin_pct(base_price, landed).into(),
                CellValue::Empty,
            ])?;
            Ok(true)
        })?;

        sheet.highlight(COL_MARGIN, Highlight::LessThan(self.min_margin), Fill::Alert);
        sheet.dropdown(COL_ACTION, &ACTIONS);
        sheet.finish()?;
        Ok(())
    }
}
