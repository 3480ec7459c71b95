//! SQL query assembly
//!
//! Reports start from a base `SELECT` and append optional filter clauses
//! depending on which parameters were supplied. Filter values are always bound
//! as `?` placeholders; only the clause text written by the report itself ends
//! up in the SQL string.

use crate::types::Result;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

/// Date layout stored in the databases
pub const SQL_DATE_FORMAT: &str = "%Y-%m-%d";

/// A finished query: SQL text plus its bound values in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub sql: String,
    pub values: Vec<Value>,
}

/// Incremental query builder for optional filters
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    sql: String,
    values: Vec<Value>,
    has_where: bool,
    group_by: Option<String>,
    order_by: Option<String>,
}

impl QueryBuilder {
    /// Start from a base query. The base may already contain a `WHERE`.
    pub fn new(base: impl Into<String>) -> Self {
        let sql = base.into();
        let has_where = contains_where(&sql);
        Self {
            sql,
            values: Vec::new(),
            has_where,
            group_by: None,
            order_by: None,
        }
    }

    fn push_clause(&mut self, clause: &str) {
        if self.has_where {
            self.sql.push_str(" AND ");
        } else {
            self.sql.push_str(" WHERE ");
            self.has_where = true;
        }
        self.sql.push_str(clause);
    }

    /// Bind a value for a placeholder already present in the base query
    ///
    /// Must be called before any filter, since values are bound in order.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Bind an ISO date for a placeholder already present in the base query
    pub fn bind_date(self, date: NaiveDate) -> Self {
        self.bind(sql_date(date))
    }

    /// Append a clause with exactly one `?` placeholder
    pub fn filter(mut self, clause: &str, value: impl Into<Value>) -> Self {
        self.push_clause(clause);
        self.values.push(value.into());
        self
    }

    /// Append a clause with one `?` placeholder per value, bound in order
    pub fn filter_values<V, I>(mut self, clause: &str, values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        self.push_clause(clause);
        self.values.extend(values.into_iter().map(Into::into));
        self
    }

    /// Append the clause only when a value is present
    pub fn filter_opt<V: Into<Value>>(self, clause: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.filter(clause, v),
            None => self,
        }
    }

    /// Append `column IN (?, ?, ...)`; an empty list adds nothing
    pub fn filter_in<V>(mut self, column: &str, values: &[V]) -> Self
    where
        V: Clone + Into<Value>,
    {
        if values.is_empty() {
            return self;
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.push_clause(&format!("{} IN ({})", column, placeholders));
        self.values.extend(values.iter().cloned().map(Into::into));
        self
    }

    /// Append `column BETWEEN ? AND ?` with ISO dates (inclusive)
    pub fn filter_date_range(mut self, column: &str, beg: NaiveDate, end: NaiveDate) -> Self {
        self.push_clause(&format!("{} BETWEEN ? AND ?", column));
        self.values.push(Value::Text(sql_date(beg)));
        self.values.push(Value::Text(sql_date(end)));
        self
    }

    /// Set the `GROUP BY` list
    pub fn group_by(mut self, columns: &str) -> Self {
        self.group_by = Some(columns.to_string());
        self
    }

    /// Set the `ORDER BY` list
    pub fn order_by(mut self, columns: &str) -> Self {
        self.order_by = Some(columns.to_string());
        self
    }

    /// Finish the query
    pub fn build(self) -> Query {
        let mut sql = self.sql;
        if let Some(group_by) = self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group_by);
        }
        if let Some(order_by) = self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_by);
        }
        Query {
            sql,
            values: self.values,
        }
    }
}

/// True when the query has a `WHERE` of its own, outside any parentheses
/// or string literal
fn contains_where(sql: &str) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut word = String::new();

    for c in sql.chars().chain(std::iter::once(' ')) {
        if in_string {
            in_string = c != '\'';
            continue;
        }
        if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c);
            continue;
        }
        if depth == 0 && word.eq_ignore_ascii_case("where") {
            return true;
        }
        word.clear();
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '\'' => in_string = true,
            _ => {}
        }
    }
    false
}

/// Format a date the way the databases store it
pub fn sql_date(date: NaiveDate) -> String {
    date.format(SQL_DATE_FORMAT).to_string()
}

/// Parse a stored date
pub fn parse_sql_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), SQL_DATE_FORMAT).ok()
}

/// Run a query and map every row
pub fn query_rows<T, F>(conn: &Connection, query: &Query, mut map: F) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    log::debug!("SQL: {} {:?}", query.sql, query.values);
    let mut stmt = conn.prepare(&query.sql)?;
    let mut rows = stmt.query(params_from_iter(query.values.iter()))?;

    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(map(row)?);
    }
    log::debug!("Query returned {} rows", result.len());
    Ok(result)
}

/// Run a query and visit rows one at a time until the visitor returns `false`
///
/// Returns the number of rows visited. Used by reports that poll the stop flag
/// between rows.
pub fn for_each_row<F>(conn: &Connection, query: &Query, mut visit: F) -> Result<usize>
where
    F: FnMut(&Row<'_>) -> Result<bool>,
{
    log::debug!("SQL: {} {:?}", query.sql, query.values);
    let mut stmt = conn.prepare(&query.sql)?;
    let mut rows = stmt.query(params_from_iter(query.values.iter()))?;

    let mut count = 0;
    while let Some(row) = rows.next()? {
        count += 1;
        if !visit(row)? {
            break;
        }
    }
    Ok(count)
}
