//! Injected database connections
//!
//! The caller opens one connection per logical source and hands the whole set
//! to the runner for a report run. Reports only ever borrow connections; they
//! never open, pool or close them.

use crate::types::{ReportError, Result};
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Logical database a report reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Main ERP database (customers, items, sales, purchasing)
    Edb,
    /// Oracle-side vendor and freight data
    Oracle,
    /// Accounting system
    Sage,
    /// Reporting warehouse
    Pg,
}

impl Source {
    pub const ALL: [Source; 4] = [Source::Edb, Source::Oracle, Source::Sage, Source::Pg];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Edb => "edb",
            Source::Oracle => "oracle",
            Source::Sage => "sage",
            Source::Pg => "pg",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Source {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        Source::ALL
            .into_iter()
            .find(|source| source.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ReportError::invalid("source", format!("unknown database source '{}'", s)))
    }
}

/// Connection set supplied by the caller for one run
#[derive(Default)]
pub struct Connections {
    conns: HashMap<Source, Connection>,
}

impl Connections {
    /// Create an empty connection set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the connection for a source
    pub fn insert(&mut self, source: Source, conn: Connection) {
        if self.conns.insert(source, conn).is_some() {
            log::debug!("Replaced connection for source {}", source);
        }
    }

    /// Builder method: add a connection
    pub fn with(mut self, source: Source, conn: Connection) -> Self {
        self.insert(source, conn);
        self
    }

    /// Open a file database read-only and register it for `source`
    pub fn open(&mut self, source: Source, path: &Path) -> Result<()> {
        log::info!("Opening {} database: {:?}", source, path);
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        self.insert(source, conn);
        Ok(())
    }

    /// Borrow the connection for a source
    pub fn get(&self, source: Source) -> Result<&Connection> {
        self.conns
            .get(&source)
            .ok_or(ReportError::MissingConnection(source))
    }

    pub fn contains(&self, source: Source) -> bool {
        self.conns.contains_key(&source)
    }

    /// Sources with a registered connection
    pub fn sources(&self) -> Vec<Source> {
        let mut sources: Vec<Source> = self.conns.keys().copied().collect();
        sources.sort_by_key(|s| s.as_str());
        sources
    }
}

impl fmt::Debug for Connections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connections")
            .field("sources", &self.sources())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parsing() {
        assert_eq!("EDB".parse::<Source>().unwrap(), Source::Edb);
        assert_eq!(" sage ".parse::<Source>().unwrap(), Source::Sage);
        assert!("mysql".parse::<Source>().is_err());
        assert_eq!(Source::Oracle.to_string(), "oracle");
    }

    #[test]
    fn test_missing_connection() {
        let conns = Connections::new().with(Source::Edb, Connection::open_in_memory().unwrap());
        assert!(conns.contains(Source::Edb));
        assert!(conns.get(Source::Edb).is_ok());
        assert!(matches!(
            conns.get(Source::Sage),
            Err(ReportError::MissingConnection(Source::Sage))
        ));
        assert_eq!(conns.sources(), vec![Source::Edb]);
    }
}
