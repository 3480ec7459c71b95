//! Rolling twelve month customer sales
//!
//! Pivot of invoiced sales per customer over the twelve calendar months ending
//! with the month of `enddate`, with a total column and a totals row.

use crate::book::{Column, ReportBook};
use crate::calc::MonthWindow;
use crate::db::Source;
use crate::params::ParamSet;
use crate::report::{output_file_name, Report, ReportContext};
use crate::reports::{caption_block, get_f64, get_text, show_date};
use crate::sql::{parse_sql_date, query_rows, QueryBuilder};
use crate::types::{CellValue, Result};
use chrono::NaiveDate;

const WINDOW_MONTHS: u32 = 12;

#[derive(Debug)]
pub struct RollingCustSales {
    end_date: NaiveDate,
    customers: Vec<String>,
    rep: Option<String>,
}

impl Default for RollingCustSales {
    fn default() -> Self {
        Self {
            end_date: NaiveDate::MIN,
            customers: Vec::new(),
            rep: None,
        }
    }
}

/// Sales of one customer across the window
#[derive(Debug, Clone, PartialEq)]
struct CustomerLine {
    cust_id: String,
    name: String,
    months: Vec<f64>,
}

impl CustomerLine {
    fn total(&self) -> f64 {
        self.months.iter().sum()
    }
}

impl RollingCustSales {
    pub fn new() -> Self {
        Self::default()
    }

    fn window(&self) -> MonthWindow {
        MonthWindow::ending(self.end_date, WINDOW_MONTHS)
    }

    fn columns(window: &MonthWindow) -> Vec<Column> {
        let mut columns = vec![
            Column::text("Customer", 12.0),
            Column::text("Name", 30.0),
        ];
        columns.extend(window.labels().into_iter().map(|l| Column::money(l, 12.0)));
        columns.push(Column::money("Total", 14.0));
        columns
    }

    /// Query monthly totals and fold them into one line per customer
    fn load(&self, ctx: &ReportContext<'_>, window: &MonthWindow) -> Result<Vec<CustomerLine>> {
        let query = QueryBuilder::new(
            "SELECT c.cust_id, c.name, substr(s.inv_date, 1, 7) || '-01' AS month, \
                    SUM(s.amount) \
             FROM sale s JOIN customer c ON c.cust_id = s.cust_id",
        )
        .filter_date_range("s.inv_date", window.first_day(), window.last_day())
        .filter_in("c.cust_id", &self.customers)
        .filter_opt("c.sales_rep = ?", self.rep.clone())
        .group_by("c.cust_id, c.name, month")
        .order_by("c.name, c.cust_id, month")
        .build();

        let rows = query_rows(ctx.conn(Source::Edb)?, &query, |row| {
            Ok((
                get_text(row, 0)?,
                get_text(row, 1)?,
                get_text(row, 2)?,
                get_f64(row, 3)?,
            ))
        })?;

        let mut lines: Vec<CustomerLine> = Vec::new();
        for (cust_id, name, month, amount) in rows {
            let Some(idx) = parse_sql_date(&month).and_then(|m| window.index_of(m))
            else {
                log::warn!("Sale month {} for {} outside window", month, cust_id);
                continue;
            };
            if lines.last().map_or(true, |line| line.cust_id != cust_id) {
                lines.push(CustomerLine {
                    cust_id,
                    name,
                    months: vec![0.0; window.len()],
                });
            }
            if let Some(line) = lines.last_mut() {
                line.months[idx] += amount;
            }
        }
        Ok(lines)
    }
}

impl Report for RollingCustSales {
    fn name(&self) -> &'static str {
        "rolling_cust_sales"
    }

    fn title(&self) -> &'static str {
        "Rolling 12 Month Customer Sales"
    }

    fn sources(&self) -> &'static [Source] {
        &[Source::Edb]
    }

    fn set_params(&mut self, params: &ParamSet) -> Result<()> {
        self.end_date = params.required_date("enddate")?;
        self.customers = params.id_list("cust");
        self.rep = params.text("rep").map(str::to_string);
        Ok(())
    }

    fn file_name(&self) -> String {
        output_file_name(self.name(), &self.end_date.format("%Y-%m").to_string())
    }

    fn build(&mut self, ctx: &ReportContext<'_>, book: &mut ReportBook) -> Result<()> {
        let window = self.window();
        let columns = Self::columns(&window);
        let lines = self.load(ctx, &window)?;
        log::debug!("{} customers with sales in window", lines.len());

        let mut detail = format!(
            "{} through {}",
            show_date(window.first_day()),
            show_date(window.last_day())
        );
        if let Some(rep) = &self.rep {
            detail.push_str(&format!(", rep {}", rep));
        }

        let mut sheet = book.add_sheet("Rolling Sales")?;
        caption_block(&mut sheet, self.title(), &detail, columns.len() as u16)?;
        sheet.header(&columns)?;

        let mut totals = vec![0.0; window.len() + 1];
        for line in &lines {
            if ctx.stopped() {
                break;
            }
            let mut values: Vec<CellValue> =
                vec![line.cust_id.as_str().into(), line.name.as_str().into()];
            values.extend(line.months.iter().map(|v| CellValue::Number(*v)));
            values.push(CellValue::Number(line.total()));
            sheet.row(&values)?;

            for (idx, amount) in line.months.iter().enumerate() {
                totals[idx] += amount;
            }
            totals[window.len()] += line.total();
        }

        if sheet.data_rows() > 0 {
            // values start under "Name"
            let mut values = vec![CellValue::Empty];
            values.extend(totals.into_iter().map(CellValue::Number));
            sheet.total_row("Total", &values)?;
        }
        sheet.finish()?;
        Ok(())
    }
}
