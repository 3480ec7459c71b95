//! Customer item sales
//!
//! One sheet per requested customer listing the items sold in the date range
//! with quantity, sales, cost and margin, followed by a total row. The sheet
//! caption carries the customer's credit limit and open balance from the
//! accounting database.

use crate::book::{Column, ReportBook};
use crate::calc::margin_pct;
use crate::db::Source;
use crate::params::{check_date_range, ParamSet};
use crate::report::{output_file_name, Report, ReportContext};
use crate::reports::{caption_block, get_f64, get_text, show_date};
use crate::sql::{query_rows, sql_date, QueryBuilder};
use crate::types::{CellValue, ReportError, Result};
use chrono::NaiveDate;

#[derive(Debug)]
pub struct CustItemSales {
    beg_date: NaiveDate,
    end_date: NaiveDate,
    customers: Vec<String>,
}

impl Default for CustItemSales {
    fn default() -> Self {
        Self {
            beg_date: NaiveDate::MIN,
            end_date: NaiveDate::MIN,
            customers: Vec::new(),
        }
    }
}

/// Accounting standing of a customer
#[derive(Debug, Clone, Copy, PartialEq)]
struct Credit {
    limit: f64,
    balance: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct ItemLine {
    item_id: String,
    description: String,
    qty: f64,
    sales: f64,
    cost: f64,
}

impl CustItemSales {
    pub fn new() -> Self {
        Self::default()
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::text("Item", 12.0),
            Column::text("Description", 34.0),
            Column::integer("Qty", 9.0),
            Column::money("Sales", 13.0),
            Column::money("Cost", 13.0),
            Column::percent("Margin %", 10.0),
        ]
    }

    fn customer_name(&self, ctx: &ReportContext<'_>, cust_id: &str) -> Result<Option<String>> {
        let query = QueryBuilder::new("SELECT name FROM customer")
            .filter("cust_id = ?", cust_id.to_string())
            .build();
        let names = query_rows(ctx.conn(Source::Edb)?, &query, |row| get_text(row, 0))?;
        Ok(names.into_iter().next())
    }

    fn credit(&self, ctx: &ReportContext<'_>, cust_id: &str) -> Result<Option<Credit>> {
        let query = QueryBuilder::new("SELECT credit_limit, balance FROM ar_customer")
            .filter("cust_id = ?", cust_id.to_string())
            .build();
        let rows = query_rows(ctx.conn(Source::Sage)?, &query, |row| {
            Ok(Credit {
                limit: get_f64(row, 0)?,
                balance: get_f64(row, 1)?,
            })
        })?;
        Ok(rows.into_iter().next())
    }

    fn item_lines(&self, ctx: &ReportContext<'_>, cust_id: &str) -> Result<Vec<ItemLine>> {
        let query = QueryBuilder::new(
            "SELECT s.item_id, i.description, SUM(s.qty), SUM(s.amount), SUM(s.cost) \
             FROM sale s LEFT JOIN item i ON i.item_id = s.item_id",
        )
        .filter("s.cust_id = ?", cust_id.to_string())
        .filter_date_range("s.inv_date", self.beg_date, self.end_date)
        .group_by("s.item_id, i.description")
        .order_by("SUM(s.amount) DESC, s.item_id")
        .build();

        query_rows(ctx.conn(Source::Edb)?, &query, |row| {
            Ok(ItemLine {
                item_id: get_text(row, 0)?,
                description: get_text(row, 1)?,
                qty: get_f64(row, 2)?,
                sales: get_f64(row, 3)?,
                cost: get_f64(row, 4)?,
            })
        })
    }
}

impl Report for CustItemSales {
    fn name(&self) -> &'static str {
        "cust_item_sales"
    }

    fn title(&self) -> &'static str {
        "Customer Item Sales"
    }

    fn sources(&self) -> &'static [Source] {
        &[Source::Edb, Source::Sage]
    }

    fn set_params(&mut self, params: &ParamSet) -> Result<()> {
        self.beg_date = params.required_date("begdate")?;
        self.end_date = params.required_date("enddate")?;
        check_date_range(self.beg_date, self.end_date)?;
        self.customers = params.id_list("cust");
        if self.customers.is_empty() {
            return Err(ReportError::MissingParam("cust".to_string()));
        }
        Ok(())
    }

    fn file_name(&self) -> String {
        let tag = if self.customers.len() == 1 {
            format!("{}_{}", self.customers[0], sql_date(self.end_date))
        } else {
            format!("{}_{}", sql_date(self.beg_date), sql_date(self.end_date))
        };
        output_file_name(self.name(), &tag)
    }

    fn build(&mut self, ctx: &ReportContext<'_>, book: &mut ReportBook) -> Result<()> {
        let columns = Self::columns();
        let span = columns.len() as u16;

        for cust_id in &self.customers {
            if ctx.stopped() {
                break;
            }

            let Some(name) = self.customer_name(ctx, cust_id)? else {
                log::warn!("Customer {} not found, skipped", cust_id);
                continue;
            };
            let credit = self.credit(ctx, cust_id)?;
            let lines = self.item_lines(ctx, cust_id)?;
            log::debug!("Customer {}: {} items", cust_id, lines.len());

            let title = format!("{} - {} {}", self.title(), cust_id, name);
            let mut detail = format!(
                "{} through {}",
                show_date(self.beg_date),
                show_date(self.end_date)
            );
            match credit {
                Some(credit) => detail.push_str(&format!(
                    "; credit limit ${:.2}, balance ${:.2}",
                    credit.limit, credit.balance
                )),
                None => detail.push_str("; no accounting record"),
            }

            let mut sheet = book.add_sheet(cust_id)?;
            caption_block(&mut sheet, &title, &detail, span)?;
            sheet.header(&columns)?;

            let (mut qty, mut sales, mut cost) = (0.0, 0.0, 0.0);
            for line in &lines {
                if ctx.stopped() {
                    break;
                }
                sheet.row(&[
                    line.item_id.as_str().into(),
                    line.description.as_str().into(),
                    CellValue::Number(line.qty),
                    CellValue::Number(line.sales),
                    CellValue::Number(line.cost),
                    margin_pct(line.sales, line.cost).into(),
                ])?;
                qty += line.qty;
                sales += line.sales;
                cost += line.cost;
            }

            if sheet.data_rows() > 0 {
                sheet.total_row(
                    "Total",
                    &[
                        CellValue::Empty,
                        CellValue::Number(qty),
                        CellValue::Number(sales),
                        CellValue::Number(cost),
                        margin_pct(sales, cost).into(),
                    ],
                )?;
            }
            sheet.finish()?;
        }

        if book.sheet_names().is_empty() && !ctx.stopped() {
            return Err(ReportError::Data(format!(
                "none of the customers {} exist",
                self.customers.join(", ")
            )));
        }
        Ok(())
    }
}
