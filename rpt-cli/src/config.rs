//! Configuration loading and parsing
//!
//! ```toml
//! [connections]
//! edb = "data/edb.sqlite"
//! sage = "data/sage.sqlite"
//!
//! [output]
//! output_dir = "reports"
//! keep_partial_on_stop = false
//!
//! [[jobs]]
//! report = "never_out"
//! params = { enddate = "03/31/2024", weeks = 8 }
//! ```

use anyhow::{Context, Result};
use rpt_reports::{Connections, Param, ParamSet, RunConfig, Source};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Database file per source name
    #[serde(default)]
    pub connections: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub output: RunConfig,
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

/// One report run in a batch
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobConfig {
    pub report: String,
    #[serde(default)]
    pub params: BTreeMap<String, toml::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("parameter '{0}' must be a string, number or boolean")]
    UnsupportedParam(String),

    #[error("expected source=path, got '{0}'")]
    BadConnection(String),
}

impl JobConfig {
    /// Parameters as the runner expects them; numbers and booleans are
    /// passed on as their text
    pub fn param_set(&self) -> Result<ParamSet> {
        self.params
            .iter()
            .map(|(name, value)| -> Result<Param> {
                let text = match value {
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    toml::Value::Boolean(b) => b.to_string(),
                    _ => return Err(ConfigError::UnsupportedParam(name.clone()).into()),
                };
                Ok(Param::new(name.clone(), text))
            })
            .collect()
    }
}

impl AppConfig {
    /// Parsed `[connections]` entries
    pub fn sources(&self) -> Result<Vec<(Source, PathBuf)>> {
        self.connections
            .iter()
            .map(|(name, path)| -> Result<(Source, PathBuf)> {
                let source: Source = name
                    .parse()
                    .with_context(|| format!("Invalid [connections] entry: {}", name))?;
                Ok((source, path.clone()))
            })
            .collect()
    }
}

/// Parse a `--db source=path` argument
pub fn parse_db_arg(arg: &str) -> Result<(Source, PathBuf)> {
    let (source, path) = arg
        .split_once('=')
        .filter(|(_, path)| !path.trim().is_empty())
        .ok_or_else(|| ConfigError::BadConnection(arg.to_string()))?;
    let source: Source = source
        .parse()
        .with_context(|| format!("Invalid --db argument: {}", arg))?;
    Ok((source, PathBuf::from(path.trim())))
}

/// Open every configured database
pub fn open_connections(sources: &[(Source, PathBuf)]) -> Result<Connections> {
    let mut conns = Connections::new();
    for (source, path) in sources {
        conns
            .open(*source, path)
            .with_context(|| format!("Failed to open {} database: {:?}", source, path))?;
    }
    Ok(conns)
}

/// Load configuration from TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config.sources()?;
    for job in &config.jobs {
        job.param_set()
            .with_context(|| format!("Invalid parameters for job {}", job.report))?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [connections]
            edb = "data/edb.sqlite"
            Sage = "data/sage.sqlite"

            [output]
            output_dir = "reports"
            keep_partial_on_stop = false

            [[jobs]]
            report = "never_out"
            params = { enddate = "03/31/2024", weeks = 8 }

            [[jobs]]
            report = "vendor_adders"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.output.output_dir, PathBuf::from("reports"));
        assert!(!config.output.keep_partial_on_stop);
        assert!(config.output.overwrite);

        let sources = config.sources().unwrap();
        assert_eq!(sources.len(), 2);
        assert!(sources.contains(&(Source::Sage, PathBuf::from("data/sage.sqlite"))));

        assert_eq!(config.jobs.len(), 2);
        let params = config.jobs[0].param_set().unwrap();
        assert_eq!(params.text("enddate"), Some("03/31/2024"));
        assert_eq!(params.uint("weeks").unwrap(), Some(8));
        assert!(config.jobs[1].param_set().unwrap().is_empty());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.connections.is_empty());
        assert!(config.jobs.is_empty());
        assert_eq!(config.output.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        let config: AppConfig = toml::from_str("[connections]\nmysql = \"x.db\"").unwrap();
        assert!(config.sources().is_err());
    }

    #[test]
    fn test_table_param_is_rejected() {
        let config: AppConfig = toml::from_str(
            r#"
            [[jobs]]
            report = "never_out"
            params = { enddate = { month = 3 } }
            "#,
        )
        .unwrap();
        assert!(config.jobs[0].param_set().is_err());
    }

    #[test]
    fn test_parse_db_arg() {
        let (source, path) = parse_db_arg("oracle=/data/vendors.sqlite").unwrap();
        assert_eq!(source, Source::Oracle);
        assert_eq!(path, PathBuf::from("/data/vendors.sqlite"));

        assert!(parse_db_arg("oracle").is_err());
        assert!(parse_db_arg("oracle=").is_err());
        assert!(parse_db_arg("mysql=/x").is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[[jobs]]\nreport = \"promo_margin\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.jobs[0].report, "promo_margin");
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
