//! Per-row arithmetic shared by the reports
//!
//! Freight adder lookup by weight bracket, margin and markdown percentages,
//! stock coverage, and the rolling month window used by sales pivots.

use chrono::{Datelike, Months, NaiveDate};

/// One weight bracket of a vendor's freight adder table
#[derive(Debug, Clone, PartialEq)]
pub struct AdderBracket {
    /// Lower bound (inclusive)
    pub min_weight: f64,
    /// Upper bound (exclusive); `None` means no upper bound
    pub max_weight: Option<f64>,
    /// Freight adder per unit
    pub adder: f64,
}

impl AdderBracket {
    pub fn contains(&self, weight: f64) -> bool {
        weight >= self.min_weight && self.max_weight.map_or(true, |max| weight < max)
    }
}

/// Freight adder for an item weight
///
/// The first bracket containing the weight wins. A weight outside every
/// bracket takes the adder of the highest bracket starting below it; a weight
/// below every bracket (or an empty table) has no adder.
pub fn freight_adder(brackets: &[AdderBracket], weight: f64) -> f64 {
    if let Some(bracket) = brackets.iter().find(|b| b.contains(weight)) {
        return bracket.adder;
    }

    brackets
        .iter()
        .filter(|b| weight >= b.min_weight)
        .max_by(|a, b| a.min_weight.total_cmp(&b.min_weight))
        .map_or(0.0, |b| b.adder)
}

/// Gross margin as a fraction of price
pub fn margin_pct(price: f64, cost: f64) -> Option<f64> {
    if price <= 0.0 {
        return None;
    }
    Some((price - cost) / price)
}

/// Markdown of a promo price off the regular price, as a fraction
pub fn markdown_pct(regular: f64, promo: f64) -> Option<f64> {
    if regular <= 0.0 {
        return None;
    }
    Some((regular - promo) / regular)
}

/// Weeks of supply covered by stock on hand plus on order
pub fn coverage_weeks(on_hand: f64, on_order: f64, avg_weekly: f64) -> Option<f64> {
    if avg_weekly <= 0.0 {
        return None;
    }
    Some((on_hand + on_order) / avg_weekly)
}

/// Window of consecutive calendar months ending at a given month
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthWindow {
    /// First day of every month in the window, oldest first
    months: Vec<NaiveDate>,
}

impl MonthWindow {
    /// Window of `count` months whose last month contains `end`
    pub fn ending(end: NaiveDate, count: u32) -> Self {
        let last = first_of_month(end);
        let count = count.max(1);
        let months = (0..count)
            .rev()
            .filter_map(|back| last.checked_sub_months(Months::new(back)))
            .collect();
        Self { months }
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// First day of the oldest month
    pub fn first_day(&self) -> NaiveDate {
        self.months[0]
    }

    /// Last day of the newest month
    pub fn last_day(&self) -> NaiveDate {
        let last = self.months[self.months.len() - 1];
        last.checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(last)
    }

    /// Position of the month containing `date`
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let month = first_of_month(date);
        self.months.iter().position(|m| *m == month)
    }

    /// Column labels such as `Jan 2024`
    pub fn labels(&self) -> Vec<String> {
        self.months
            .iter()
            .map(|m| m.format("%b %Y").to_string())
            .collect()
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
