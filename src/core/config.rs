//! Layered configuration
//!
//! Values are read, lowest priority first, from the user config file
//! (`<config dir>/sawtrack/config.yaml`), the project's
//! `.sawtrack/config.yaml`, and `SAWTRACK_*` environment variables.

use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::project::Project;

/// Effective configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Branch (name, ID or short ID) used when `blade register` gets no --branch
    pub default_branch: Option<String>,

    /// Output directory for report exports
    pub report_dir: Option<PathBuf>,

    /// Tracing filter directive, e.g. "info" or "sawtrack=debug"
    pub log: Option<String>,
}

impl Config {
    /// Load the layered configuration for the current directory
    pub fn load() -> Self {
        let mut config = Self::global_path()
            .map(|p| Self::from_file(&p))
            .unwrap_or_default();

        if let Ok(project) = Project::discover() {
            config.merge(Self::from_file(&project.config_path()));
        }

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Path of the user-level config file
    pub fn global_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "sawtrack").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Read one config file; missing or malformed files yield defaults
    pub fn from_file(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_yml::from_str::<Option<Config>>(&content).ok())
            .flatten()
            .unwrap_or_default()
    }

    /// Overlay `other` on top of `self`; set fields in `other` win
    pub fn merge(&mut self, other: Config) {
        if other.default_branch.is_some() {
            self.default_branch = other.default_branch;
        }
        if other.report_dir.is_some() {
            self.report_dir = other.report_dir;
        }
        if other.log.is_some() {
            self.log = other.log;
        }
    }

    /// Apply `SAWTRACK_*` overrides using the given variable lookup
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("SAWTRACK_DEFAULT_BRANCH") {
            self.default_branch = Some(v);
        }
        if let Some(v) = lookup("SAWTRACK_REPORT_DIR") {
            self.report_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("SAWTRACK_LOG") {
            self.log = Some(v);
        }
    }

    /// Directory for report exports, defaulting to the current directory
    pub fn report_dir(&self) -> PathBuf {
        self.report_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
