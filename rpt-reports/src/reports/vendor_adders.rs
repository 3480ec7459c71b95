//! Vendor freight adder tables
//!
//! Two sheets from the vendor side database: a vendor summary with item and
//! bracket counts and the adder range, and the full bracket table with the
//! vendor cells merged over each vendor's brackets.

use crate::book::{Column, ReportBook};
use crate::calc::AdderBracket;
use crate::db::Source;
use crate::params::ParamSet;
use crate::report::{output_file_name, Report, ReportContext};
use crate::reports::{caption_block, get_f64, get_text};
use crate::sql::{query_rows, QueryBuilder};
use crate::types::{CellValue, Result};

#[derive(Debug, Default)]
pub struct VendorAdders {
    vendors: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq)]
struct VendorTable {
    vendor_id: i64,
    name: String,
    items: i64,
    brackets: Vec<AdderBracket>,
}

impl VendorTable {
    fn adder_range(&self) -> Option<(f64, f64)> {
        let mut adders = self.brackets.iter().map(|b| b.adder);
        let first = adders.next()?;
        Some(adders.fold((first, first), |(lo, hi), a| (lo.min(a), hi.max(a))))
    }
}

impl VendorAdders {
    pub fn new() -> Self {
        Self::default()
    }

    fn load(&self, ctx: &ReportContext<'_>) -> Result<Vec<VendorTable>> {
        let conn = ctx.conn(Source::Oracle)?;

        let query = QueryBuilder::new(
            "SELECT v.vendor_id, v.name, \
                    (SELECT COUNT(*) FROM item i WHERE i.vendor_id = v.vendor_id) \
             FROM vendor v",
        )
        .filter_in("v.vendor_id", &self.vendors)
        .order_by("v.name, v.vendor_id")
        .build();
        let mut tables = query_rows(conn, &query, |row| {
            Ok(VendorTable {
                vendor_id: row.get(0)?,
                name: get_text(row, 1)?,
                items: row.get(2)?,
                brackets: Vec::new(),
            })
        })?;

        let query = QueryBuilder::new(
            "SELECT vendor_id, min_weight, max_weight, adder FROM freight_adder",
        )
        .filter_in("vendor_id", &self.vendors)
        .order_by("vendor_id, min_weight")
        .build();
        let brackets = query_rows(conn, &query, |row| {
            Ok((
                row.get::<_, i64>(0)?,
                AdderBracket {
                    min_weight: get_f64(row, 1)?,
                    max_weight: row.get(2)?,
                    adder: get_f64(row, 3)?,
                },
            ))
        })?;

        for (vendor_id, bracket) in brackets {
            match tables.iter_mut().find(|t| t.vendor_id == vendor_id) {
                Some(table) => table.brackets.push(bracket),
                None => log::warn!("Freight adder for unknown vendor {}", vendor_id),
            }
        }
        Ok(tables)
    }

    fn scope(&self) -> String {
        if self.vendors.is_empty() {
            "All vendors".to_string()
        } else {
            let ids: Vec<String> = self.vendors.iter().map(|v| v.to_string()).collect();
            format!("Vendors {}", ids.join(", "))
        }
    }

    fn write_vendors(
        &self,
        ctx: &ReportContext<'_>,
        book: &mut ReportBook,
        tables: &[VendorTable],
    ) -> Result<()> {
        let columns = vec![
            Column::integer("Vendor", 10.0),
            Column::text("Name", 30.0),
            Column::integer("Items", 9.0),
            Column::integer("Brackets", 10.0),
            Column::money("Min Adder", 12.0),
            Column::money("Max Adder", 12.0),
        ];

        let mut sheet = book.add_sheet("Vendors")?;
        caption_block(&mut sheet, self.title(), &self.scope(), columns.len() as u16)?;
        sheet.header(&columns)?;

        for table in tables {
            if ctx.stopped() {
                break;
            }
            let (min, max) = match table.adder_range() {
                Some((lo, hi)) => (CellValue::Number(lo), CellValue::Number(hi)),
                None => (CellValue::Empty, CellValue::Empty),
            };
            sheet.row(&[
                CellValue::Int(table.vendor_id),
                table.name.as_str().into(),
                CellValue::Int(table.items),
                CellValue::Int(table.brackets.len() as i64),
                min,
                max,
            ])?;
        }
        sheet.finish()?;
        Ok(())
    }

    fn write_adders(
        &self,
        ctx: &ReportContext<'_>,
        book: &mut ReportBook,
        tables: &[VendorTable],
    ) -> Result<()> {
        let columns = vec![
            Column::integer("Vendor", 10.0),
            Column::text("Name", 30.0),
            Column::number("Min Weight", 12.0),
            Column::text("Max Weight", 12.0),
            Column::money("Adder", 10.0),
        ];

        let mut sheet = book.add_sheet("Adders")?;
        caption_block(&mut sheet, "Freight Adder Brackets", &self.scope(), columns.len() as u16)?;
        sheet.header(&columns)?;

        for table in tables.iter().filter(|t| !t.brackets.is_empty()) {
            if ctx.stopped() {
                break;
            }
            let vendor = CellValue::Int(table.vendor_id);
            let name = CellValue::from(table.name.as_str());
            let first_row = sheet.current_row();

            for bracket in &table.brackets {
                let max = match bracket.max_weight {
                    Some(max) => CellValue::Text(format!("{:.2}", max)),
                    None => CellValue::from("and up"),
                };
                sheet.row(&[
                    vendor.clone(),
                    name.clone(),
                    CellValue::Number(bracket.min_weight),
                    max,
                    CellValue::Number(bracket.adder),
                ])?;
            }

            let last_row = sheet.current_row() - 1;
            sheet.merge(first_row, 0, last_row, &vendor)?;
            sheet.merge(first_row, 1, last_row, &name)?;
        }
        sheet.finish()?;
        Ok(())
    }
}

impl Report for VendorAdders {
    fn name(&self) -> &'static str {
        "vendor_adders"
    }

    fn title(&self) -> &'static str {
        "Vendor Freight Adders"
    }

    fn sources(&self) -> &'static [Source] {
        &[Source::Oracle]
    }

    fn set_params(&mut self, params: &ParamSet) -> Result<()> {
        self.vendors = params.int_list("vendor")?;
        Ok(())
    }

    fn file_name(&self) -> String {
        let ids: Vec<String> = self.vendors.iter().map(|v| v.to_string()).collect();
        output_file_name(self.name(), &ids.join("-"))
    }

    fn build(&mut self, ctx: &ReportContext<'_>, book: &mut ReportBook) -> Result<()> {
        let tables = self.load(ctx)?;
        log::debug!("{} vendors loaded", tables.len());

        self.write_vendors(ctx, book, &tables)?;
        if !ctx.stopped() {
            self.write_adders(ctx, book, &tables)?;
        }
        Ok(())
    }
}
