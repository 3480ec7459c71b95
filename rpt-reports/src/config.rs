//! Run configuration
//!
//! This module defines the small set of settings the runner needs. Database
//! locations and job lists belong to the application layer (rpt-cli).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for report runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory output workbooks are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Save the rows written so far when a run is stopped (default: true)
    #[serde(default = "default_true")]
    pub keep_partial_on_stop: bool,

    /// Replace an existing file with the same name (default: true)
    #[serde(default = "default_true")]
    pub overwrite: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            keep_partial_on_stop: true,
            overwrite: true,
        }
    }
}

impl RunConfig {
    /// Create a configuration writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Builder method: keep or discard partial output of stopped runs
    pub fn with_keep_partial_on_stop(mut self, keep: bool) -> Self {
        self.keep_partial_on_stop = keep;
        self
    }

    /// Builder method: allow or refuse replacing existing files
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Full path for an output file name
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
