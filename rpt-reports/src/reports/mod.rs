//! Concrete reports
//!
//! Each report is independent: it reads its parameters, runs its queries and
//! writes its sheets. Shared bits live here: caption blocks and small row
//! readers.

pub mod ace_article_review;
pub mod cust_item_sales;
pub mod never_out;
pub mod po_rcvr_audit;
pub mod promo_margin;
pub mod rolling_cust_sales;
pub mod vendor_adders;

pub use ace_article_review::AceArticleReview;
pub use cust_item_sales::CustItemSales;
pub use never_out::NeverOut;
pub use po_rcvr_audit::PoRcvrAudit;
pub use promo_margin::PromoMargin;
pub use rolling_cust_sales::RollingCustSales;
pub use vendor_adders::VendorAdders;

use crate::book::SheetWriter;
use crate::params::PARAM_DATE_FORMAT;
use crate::sql::parse_sql_date;
use crate::types::{CellValue, Result};
use chrono::{Local, NaiveDate};
use rusqlite::Row;

/// Title, detail line and run timestamp above the header row
pub(crate) fn caption_block(
    sheet: &mut SheetWriter<'_>,
    title: &str,
    detail: &str,
    span: u16,
) -> Result<()> {
    sheet.caption(title, span)?;
    if !detail.is_empty() {
        sheet.sub_caption(detail, span)?;
    }
    let run_at = Local::now().format("Run %m/%d/%Y %H:%M").to_string();
    sheet.sub_caption(&run_at, span)?;
    sheet.skip_row();
    Ok(())
}

/// `MM/DD/YYYY`, the way parameters are shown back to operators
pub(crate) fn show_date(date: NaiveDate) -> String {
    date.format(PARAM_DATE_FORMAT).to_string()
}

/// Numeric column that may be NULL; NULL reads as zero
pub(crate) fn get_f64(row: &Row<'_>, idx: usize) -> rusqlite::Result<f64> {
    Ok(row.get::<_, Option<f64>>(idx)?.unwrap_or(0.0))
}

/// Text column that may be NULL; NULL reads as empty
pub(crate) fn get_text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

/// ISO date column as a date cell; unparsable dates fall back to their text
pub(crate) fn get_date_cell(row: &Row<'_>, idx: usize) -> rusqlite::Result<CellValue> {
    let raw: Option<String> = row.get(idx)?;
    Ok(match raw {
        Some(raw) => match parse_sql_date(&raw) {
            Some(date) => CellValue::Date(date),
            None => CellValue::Text(raw),
        },
        None => CellValue::Empty,
    })
}
