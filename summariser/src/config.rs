use jtl_summary_model::ResponseClasses;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config does not define any runs")]
    NoRuns,
    #[error("Run name `{name}` is used more than once")]
    DuplicateRun { name: String },
    #[error("Run `{name}` has an empty response code prefix")]
    EmptyPrefix { name: String },
}

/// A list of named runs to summarise and compare
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SummariserConfig {
    /// The most requests expected to succeed in each run
    ///
    /// When set, each run is checked against it and the success chart draws it as a reference line.
    #[serde(default)]
    pub expected_success: Option<u64>,
    /// Where to write the reports, overridden by the command line
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Label filter for runs that do not set their own
    #[serde(default)]
    pub label_filter: Option<String>,
    #[serde(default, rename = "run")]
    pub runs: Vec<RunConfig>,
}

/// One named run and how to select its records
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub name: String,
    /// Path to the result log
    pub path: PathBuf,
    /// Only records whose label contains this text are summarised
    #[serde(default)]
    pub label_filter: Option<String>,
    #[serde(flatten)]
    pub response_classes: ResponseClasses,
}

impl RunConfig {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            label_filter: None,
            response_classes: ResponseClasses::default(),
        }
    }

    pub fn with_label_filter(mut self, label_filter: impl Into<String>) -> Self {
        self.label_filter = Some(label_filter.into());
        self
    }
}

impl SummariserConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded config from {}", path.display());

        content.parse()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.runs.is_empty() {
            return Err(ConfigError::NoRuns);
        }

        let mut names = HashSet::with_capacity(self.runs.len());
        for run in &self.runs {
            if !names.insert(run.name.as_str()) {
                return Err(ConfigError::DuplicateRun {
                    name: run.name.clone(),
                });
            }

            let classes = &run.response_classes;
            if classes.success_prefix.is_empty() || classes.expected_failure_prefix.is_empty() {
                return Err(ConfigError::EmptyPrefix {
                    name: run.name.clone(),
                });
            }
        }

        Ok(self)
    }

    /// Apply the top level label filter to runs without their own
    fn resolve_label_filters(mut self) -> Self {
        if let Some(default_filter) = &self.label_filter {
            for run in self.runs.iter_mut().filter(|r| r.label_filter.is_none()) {
                run.label_filter = Some(default_filter.clone());
            }
        }
        self
    }
}

impl std::str::FromStr for SummariserConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: SummariserConfig = toml::from_str(s)?;
        Ok(config.validate()?.resolve_label_filters())
    }
}
