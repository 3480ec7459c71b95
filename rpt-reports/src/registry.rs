//! Report lookup by name

use crate::report::Report;
use crate::reports::{
    AceArticleReview, CustItemSales, NeverOut, PoRcvrAudit, PromoMargin, RollingCustSales,
    VendorAdders,
};

/// Registered report names, in listing order
pub const REPORT_NAMES: [&str; 7] = [
    "ace_article_review",
    "cust_item_sales",
    "never_out",
    "po_rcvr_audit",
    "promo_margin",
    "rolling_cust_sales",
    "vendor_adders",
];

pub fn names() -> &'static [&'static str] {
    &REPORT_NAMES
}

/// Create a fresh report instance
///
/// Matching ignores case, `_` and `-`, so `Never-Out` and `neverout` both find
/// `never_out`.
pub fn create(name: &str) -> Option<Box<dyn Report>> {
    let report: Box<dyn Report> = match normalize(name).as_str() {
        "acearticlereview" => Box::new(AceArticleReview::new()),
        "custitemsales" => Box::new(CustItemSales::new()),
        "neverout" => Box::new(NeverOut::new()),
        "porcvraudit" => Box::new(PoRcvrAudit::new()),
        "promomargin" => Box::new(PromoMargin::new()),
        "rollingcustsales" => Box::new(RollingCustSales::new()),
        "vendoradders" => Box::new(VendorAdders::new()),
        _ => return None,
    };
    Some(report)
}

/// Title of a registered report
pub fn title(name: &str) -> Option<&'static str> {
    create(name).map(|report| report.title())
}

fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
